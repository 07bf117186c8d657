//! Point-to-point message transport
//!
//! Direct HTTP delivery to a peer's inbound endpoint. At-most-once,
//! best-effort, fire-and-forget: a failed delivery is logged at the sender
//! and never retried. There is no duplicate-message detection on the
//! receiving side, so adding retries here would be wrong until the protocol
//! grows idempotency keys.

use crate::errors::{AgentError, Result};
use crate::store::types::MessageType;
use serde_json::json;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Sends messages to configured peers
pub struct PeerTransport {
    client: reqwest::Client,
    /// race id -> base URL of the peer's HTTP surface
    peers: HashMap<String, String>,
}

impl PeerTransport {
    pub fn new(peers: HashMap<String, String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(PeerTransport { client, peers })
    }

    /// True when we have an endpoint for the race
    pub fn knows(&self, race_id: &str) -> bool {
        self.peers.contains_key(race_id)
    }

    /// Configured peer ids, sorted for stable prompt output
    pub fn peer_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.peers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Deliver one message. Returns Err only so callers can log the failure;
    /// delivery faults must never fail the sender's turn.
    pub async fn deliver(
        &self,
        from_race: &str,
        to_race: &str,
        message_type: MessageType,
        content: &str,
        code: Option<&str>,
    ) -> Result<()> {
        let base = self
            .peers
            .get(to_race)
            .ok_or_else(|| AgentError::UnknownRace(to_race.to_string()))?;
        let url = format!("{}/receive-message", base.trim_end_matches('/'));

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "fromRace": from_race,
                "messageType": message_type.as_str(),
                "content": content,
                "code": code,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AgentError::DeliveryFailed {
                peer: to_race.to_string(),
                reason: format!("peer answered {status}"),
            });
        }

        debug!(to = to_race, kind = message_type.as_str(), "delivered message");
        Ok(())
    }

    /// Fire-and-forget wrapper: logs and swallows any delivery fault
    pub async fn deliver_best_effort(
        &self,
        from_race: &str,
        to_race: &str,
        message_type: MessageType,
        content: &str,
        code: Option<&str>,
    ) {
        if let Err(e) = self
            .deliver(from_race, to_race, message_type, content, code)
            .await
        {
            warn!(to = to_race, error = %e, "message delivery failed, not retrying");
        }
    }
}
