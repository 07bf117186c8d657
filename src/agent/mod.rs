//! Per-agent actor
//!
//! `RaceAgent` wires one race's store, oracle, transport, and turn engine
//! together and enforces the single-writer discipline: turns for one agent
//! never overlap, while different agents run fully in parallel with no shared
//! lock.

use crate::config::Config;
use crate::engine::{TurnEngine, TurnOutcome};
use crate::errors::{AgentError, Result};
use crate::execution::PayloadRunner;
use crate::oracle::Oracle;
use crate::races::{self, RaceProfile};
use crate::store::types::{
    IncomingMessage, MessageType, OutgoingMessage, PersonalityTrait, Relationship, Resource,
    Secret,
};
use crate::store::StateStore;
use crate::transport::PeerTransport;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;

/// One autonomous race: persistent state, a stable identity, and a turn-based
/// execution cycle.
pub struct RaceAgent {
    profile: &'static RaceProfile,
    store: Arc<StateStore>,
    transport: Arc<PeerTransport>,
    engine: TurnEngine,
    /// Serializes turns. Held only across `take_turn`; receive/read paths
    /// never contend on it.
    turn_lock: Mutex<()>,
}

impl RaceAgent {
    /// Build an agent from configuration. Fails fast on identity faults.
    pub fn new(config: &Config, oracle: Arc<dyn Oracle>) -> Result<Self> {
        config.validate()?;
        let profile = races::race_by_id(&config.race_id)
            .ok_or_else(|| AgentError::UnknownRace(config.race_id.clone()))?;

        let store = Arc::new(StateStore::open(&config.db_path())?);
        let transport = Arc::new(PeerTransport::new(config.peers.clone())?);
        let runner = PayloadRunner::new(
            config.db_path(),
            config.data_dir.clone(),
            Duration::from_secs(config.execution_timeout_secs),
        );

        Self::from_parts(profile, store, oracle, transport, runner, config.history_limit)
    }

    /// Assembly seam for tests: inject any store/oracle/transport
    pub fn from_parts(
        profile: &'static RaceProfile,
        store: Arc<StateStore>,
        oracle: Arc<dyn Oracle>,
        transport: Arc<PeerTransport>,
        runner: PayloadRunner,
        history_limit: usize,
    ) -> Result<Self> {
        let peer_ids = transport.peer_ids();
        store.bootstrap(profile.id, &peer_ids)?;

        let engine = TurnEngine::new(
            profile,
            store.clone(),
            oracle,
            transport.clone(),
            runner,
            history_limit,
        );

        Ok(RaceAgent {
            profile,
            store,
            transport,
            engine,
            turn_lock: Mutex::new(()),
        })
    }

    pub fn race_id(&self) -> &'static str {
        self.profile.id
    }

    pub fn profile(&self) -> &'static RaceProfile {
        self.profile
    }

    /// Run one turn. A concurrent call for the same agent is rejected rather
    /// than queued: the caller re-consults the day counter and retries.
    pub async fn take_turn(&self) -> Result<TurnOutcome> {
        let Ok(_guard) = self.turn_lock.try_lock() else {
            return Err(AgentError::TurnInProgress {
                race: self.profile.id.to_string(),
            });
        };
        self.engine.take_turn().await
    }

    /// Accept a message from a peer, stamped with our own current day.
    /// Clocks across agents are independent.
    pub fn receive_message(
        &self,
        from_race: &str,
        message_type: MessageType,
        content: &str,
        code: Option<&str>,
    ) -> Result<i64> {
        let day = self.store.current_day()?;
        let id = self.store.insert_incoming(
            from_race,
            message_type,
            content,
            code,
            day,
            Utc::now().timestamp_millis(),
        )?;
        info!(
            race = self.profile.id,
            from = from_race,
            kind = message_type.as_str(),
            has_code = code.is_some(),
            "received message"
        );
        Ok(id)
    }

    // --- read-only views for the HTTP surface ---

    pub fn current_day(&self) -> Result<i64> {
        self.store.current_day()
    }

    pub fn last_turn_at(&self) -> Result<i64> {
        self.store.last_turn_at()
    }

    pub fn resources(&self) -> Result<Vec<Resource>> {
        self.store.resources()
    }

    pub fn relationships(&self) -> Result<Vec<Relationship>> {
        self.store.relationships()
    }

    pub fn personality(&self) -> Result<Vec<PersonalityTrait>> {
        self.store.personality()
    }

    pub fn secrets(&self) -> Result<Vec<Secret>> {
        self.store.secrets()
    }

    pub fn message_log(&self) -> Result<(Vec<OutgoingMessage>, Vec<IncomingMessage>)> {
        Ok((self.store.all_outgoing()?, self.store.all_incoming()?))
    }

    /// Wipe all state back to day 0 with the starting allocation
    pub fn reset(&self) -> Result<()> {
        // Relationships are keyed by peer; reuse the bootstrap set
        let peers = self.transport.peer_ids();
        self.store.reset(self.profile.id, &peers)?;
        info!(race = self.profile.id, "state reset");
        Ok(())
    }
}
