use clap::Parser;
use emissary::agent::RaceAgent;
use emissary::config::Config;
use emissary::oracle::ChatOracle;
use emissary::server;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// One autonomous race agent serving its HTTP surface
#[derive(Parser, Debug)]
#[command(name = "emissary", version, about)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Race to embody (overrides config file and RACE_ID)
    #[arg(short, long)]
    race: Option<String>,

    /// Listen address (overrides config file)
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "fatal");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => {
            let mut config = Config::default();
            config.apply_env();
            config
        }
    };
    if let Some(race) = cli.race {
        config.race_id = race;
    }
    if let Some(listen) = cli.listen {
        config.listen = listen;
    }
    let config = config.with_default_peers();

    // Identity faults are fatal before any socket is bound
    config.validate()?;

    let oracle = Arc::new(ChatOracle::new(&config.oracle)?);
    let agent = Arc::new(RaceAgent::new(&config, oracle)?);

    info!(
        race = agent.race_id(),
        listen = %config.listen,
        db = %config.db_path().display(),
        peers = config.peers.len(),
        "agent starting"
    );

    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    axum::serve(listener, server::router(agent)).await?;
    Ok(())
}
