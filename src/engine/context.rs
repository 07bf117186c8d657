//! Turn context assembly
//!
//! The GatheringContext phase: a read-only snapshot of everything the oracle
//! needs to decide a turn. No external calls, no mutation.

use crate::errors::Result;
use crate::store::types::{Goal, IncomingMessage, OutgoingMessage, Relationship, Resource};
use crate::store::StateStore;

/// Everything gathered for one turn, frozen before the oracle call
#[derive(Debug, Clone)]
pub struct TurnContext {
    /// The day this turn is deciding for
    pub day: i64,

    /// Code-bearing messages still awaiting a resolution, oldest first
    pub pending_code: Vec<IncomingMessage>,

    /// All messages stamped with the current day, for narrative context
    pub todays_messages: Vec<IncomingMessage>,

    /// Last-N received messages, newest first
    pub recent_incoming: Vec<IncomingMessage>,

    /// Last-N sent messages, newest first
    pub recent_outgoing: Vec<OutgoingMessage>,

    /// Active goals, highest priority first
    pub goals: Vec<Goal>,

    pub resources: Vec<Resource>,
    pub relationships: Vec<Relationship>,
}

/// One line of merged conversation history
#[derive(Debug, Clone)]
pub enum HistoryEntry<'a> {
    Received(&'a IncomingMessage),
    Sent(&'a OutgoingMessage),
}

impl HistoryEntry<'_> {
    fn sort_key(&self) -> (i64, i64) {
        match self {
            HistoryEntry::Received(m) => (m.day_number, m.created_at),
            HistoryEntry::Sent(m) => (m.day_number, m.created_at),
        }
    }
}

impl TurnContext {
    /// Snapshot the store for the current day
    pub fn gather(store: &StateStore, history_limit: usize) -> Result<TurnContext> {
        let day = store.current_day()?;
        Ok(TurnContext {
            day,
            pending_code: store.pending_code_messages()?,
            todays_messages: store.messages_for_day(day)?,
            recent_incoming: store.recent_incoming(history_limit)?,
            recent_outgoing: store.recent_outgoing(history_limit)?,
            goals: store.active_goals()?,
            resources: store.resources()?,
            relationships: store.relationships()?,
        })
    }

    /// Sent and received history merged, newest first
    pub fn merged_history(&self) -> Vec<HistoryEntry<'_>> {
        let mut entries: Vec<HistoryEntry<'_>> = self
            .recent_incoming
            .iter()
            .map(HistoryEntry::Received)
            .chain(self.recent_outgoing.iter().map(HistoryEntry::Sent))
            .collect();
        entries.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
        entries
    }
}
