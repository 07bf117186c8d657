//! Agent configuration
//!
//! TOML file plus environment overrides. Identity faults are fatal: a process
//! with no valid race id must never serve traffic.

use crate::errors::{AgentError, Result};
use crate::races;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Default port base for peer URLs: races get 3001..=3005 in declaration order
const PEER_PORT_BASE: u16 = 3000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Which race this process embodies
    #[serde(default)]
    pub race_id: String,

    /// Listen address for the agent's HTTP surface
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Directory holding the per-race SQLite database
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Peer race id -> inbound endpoint base URL
    #[serde(default)]
    pub peers: HashMap<String, String>,

    #[serde(default)]
    pub oracle: OracleConfig,

    /// Hard wall-clock timeout for executed payloads, in seconds
    #[serde(default = "default_execution_timeout")]
    pub execution_timeout_secs: u64,

    /// How many sent and received messages each to fold into the prompt
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// OpenAI-compatible chat-completions base URL
    #[serde(default = "default_oracle_url")]
    pub base_url: String,

    /// Bearer key; the ORACLE_API_KEY environment variable takes precedence
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_listen() -> String {
    "127.0.0.1:3001".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_execution_timeout() -> u64 {
    10
}

fn default_history_limit() -> usize {
    10
}

fn default_oracle_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_temperature() -> f64 {
    0.8
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for OracleConfig {
    fn default() -> Self {
        OracleConfig {
            base_url: default_oracle_url(),
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            race_id: String::new(),
            listen: default_listen(),
            data_dir: default_data_dir(),
            peers: HashMap::new(),
            oracle: OracleConfig::default(),
            execution_timeout_secs: default_execution_timeout(),
            history_limit: default_history_limit(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| AgentError::ConfigError(format!("failed to read {}: {e}", path.display())))?;

        let mut config: Config = toml::from_str(&contents)
            .map_err(|e| AgentError::ConfigError(format!("failed to parse {}: {e}", path.display())))?;

        config.apply_env();
        Ok(config)
    }

    /// Environment variables beat file values: RACE_ID and ORACLE_API_KEY
    pub fn apply_env(&mut self) {
        if let Ok(race_id) = std::env::var("RACE_ID") {
            if !race_id.is_empty() {
                self.race_id = race_id;
            }
        }
        if let Ok(key) = std::env::var("ORACLE_API_KEY") {
            if !key.is_empty() {
                self.oracle.api_key = Some(key);
            }
        }
    }

    /// Fill in the default localhost peer map for every race except our own
    pub fn with_default_peers(mut self) -> Self {
        for (i, race) in races::RACES.iter().enumerate() {
            if race.id == self.race_id {
                continue;
            }
            self.peers
                .entry(race.id.to_string())
                .or_insert_with(|| format!("http://localhost:{}", PEER_PORT_BASE + 1 + i as u16));
        }
        self
    }

    /// Startup identity check. Failure here means the process must exit
    /// without binding a socket.
    pub fn validate(&self) -> Result<()> {
        if self.race_id.is_empty() {
            return Err(AgentError::ConfigError(
                "race_id is required (set in config file or RACE_ID env var)".to_string(),
            ));
        }
        if races::race_by_id(&self.race_id).is_none() {
            return Err(AgentError::ConfigError(format!(
                "race_id '{}' is not a known race",
                self.race_id
            )));
        }
        Ok(())
    }

    /// Path of this agent's SQLite database
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}-state.db", self.race_id))
    }
}
