//! Turn engine - the per-agent state machine
//!
//! One turn is `Idle -> GatheringContext -> AwaitingDecision ->
//! ApplyingEffects -> Idle(day+1)`. The day counter is the single source of
//! truth for "did this turn complete": it advances only after every effect
//! category has been processed, so a caller can retry `take_turn` safely
//! after any earlier failure.

pub mod context;
pub mod effects;

pub use context::TurnContext;
pub use effects::{EffectApplier, EffectReport};

use crate::errors::Result;
use crate::execution::PayloadRunner;
use crate::oracle::{prompt, Decision, Oracle};
use crate::races::RaceProfile;
use crate::store::StateStore;
use crate::transport::PeerTransport;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

/// Phases of one turn, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    GatheringContext,
    AwaitingDecision,
    ApplyingEffects,
}

impl TurnPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnPhase::Idle => "idle",
            TurnPhase::GatheringContext => "gathering-context",
            TurnPhase::AwaitingDecision => "awaiting-decision",
            TurnPhase::ApplyingEffects => "applying-effects",
        }
    }
}

/// Result of one completed turn
#[derive(Debug, Clone, Copy)]
pub struct TurnOutcome {
    /// The day counter after the turn (pre-turn day + 1)
    pub day: i64,
    pub report: EffectReport,
}

/// Orchestrates turns for a single agent
pub struct TurnEngine {
    profile: &'static RaceProfile,
    store: Arc<StateStore>,
    oracle: Arc<dyn Oracle>,
    transport: Arc<PeerTransport>,
    runner: PayloadRunner,
    history_limit: usize,
}

impl TurnEngine {
    pub fn new(
        profile: &'static RaceProfile,
        store: Arc<StateStore>,
        oracle: Arc<dyn Oracle>,
        transport: Arc<PeerTransport>,
        runner: PayloadRunner,
        history_limit: usize,
    ) -> Self {
        TurnEngine {
            profile,
            store,
            oracle,
            transport,
            runner,
            history_limit,
        }
    }

    /// Run one full turn. Oracle and parse failures abort with the store
    /// untouched and the day unchanged; the call is then safely retryable.
    pub async fn take_turn(&self) -> Result<TurnOutcome> {
        let race = self.profile.id;

        debug!(race, phase = TurnPhase::GatheringContext.as_str(), "turn phase");
        let ctx = TurnContext::gather(&self.store, self.history_limit)?;
        info!(
            race,
            day = ctx.day,
            todays_messages = ctx.todays_messages.len(),
            pending_code = ctx.pending_code.len(),
            "taking turn"
        );

        // The only external call before any mutation. A failure from here
        // through parsing leaves no trace in the store.
        debug!(race, phase = TurnPhase::AwaitingDecision.as_str(), "turn phase");
        let prompt = prompt::build_prompt(self.profile, &self.transport.peer_ids(), &ctx);
        let raw = self.oracle.generate(&prompt).await?;
        let decision = Decision::parse(&raw)?;

        debug!(race, phase = TurnPhase::ApplyingEffects.as_str(), "turn phase");
        let applier = EffectApplier {
            race_id: race,
            store: &self.store,
            transport: &self.transport,
            runner: &self.runner,
            day: ctx.day,
        };
        let report = applier.apply(&decision).await?;

        let day = self.store.advance_day(Utc::now().timestamp_millis())?;
        info!(
            race,
            day,
            sent = report.messages_sent,
            resolved = report.code_resolutions,
            skipped = report.skipped,
            "turn complete"
        );

        Ok(TurnOutcome { day, report })
    }
}
