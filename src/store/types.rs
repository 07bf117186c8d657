//! Row types for the per-agent state store
//!
//! These mirror the SQLite schema one-to-one and serialize straight into the
//! JSON the dashboard consumes.

use serde::{Deserialize, Serialize};

/// Visibility class of a message. A labeling convention enforced by
/// cooperating agents, not a cryptographic guarantee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Public,
    Secret,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Public => "public",
            MessageType::Secret => "secret",
        }
    }

    pub fn parse(s: &str) -> Option<MessageType> {
        match s {
            "public" => Some(MessageType::Public),
            "secret" => Some(MessageType::Secret),
            _ => None,
        }
    }
}

/// Terminal lifecycle of a code-bearing incoming message. Non-code messages
/// never enter this lifecycle (their resolution column stays NULL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "executed-success")]
    ExecutedSuccess,
    #[serde(rename = "executed-fail")]
    ExecutedFail,
    #[serde(rename = "rejected")]
    Rejected,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::Pending => "pending",
            Resolution::ExecutedSuccess => "executed-success",
            Resolution::ExecutedFail => "executed-fail",
            Resolution::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Option<Resolution> {
        match s {
            "pending" => Some(Resolution::Pending),
            "executed-success" => Some(Resolution::ExecutedSuccess),
            "executed-fail" => Some(Resolution::ExecutedFail),
            "rejected" => Some(Resolution::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Resolution::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Active,
    Completed,
    Abandoned,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
            GoalStatus::Abandoned => "abandoned",
        }
    }
}

/// Self-reported sentiment toward one peer. Unidirectional: only what this
/// agent thinks, never what peers report back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    pub race_id: String,
    pub trust_level: i64,
    pub is_ally: bool,
    pub is_enemy: bool,
    pub notes: Option<String>,
    pub last_updated_day: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: i64,
    pub description: String,
    pub priority: i64,
    pub status: GoalStatus,
    pub created_day: i64,
    pub completed_day: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Secret {
    pub id: i64,
    pub content: String,
    pub created_day: i64,
    pub revealed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalityTrait {
    pub key: String,
    pub value: f64,
    pub last_updated_day: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub resource_type: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: i64,
    pub from_race: String,
    pub message_type: MessageType,
    pub content: String,
    pub code: Option<String>,
    /// Stamped with the recipient's own clock; peers' days are independent
    pub day_number: i64,
    pub resolution: Option<Resolution>,
    pub resolution_detail: Option<String>,
    pub created_at: i64,
}

impl IncomingMessage {
    /// Still awaiting a code-execution decision
    pub fn is_pending(&self) -> bool {
        self.resolution == Some(Resolution::Pending)
    }
}

/// Mirror of `IncomingMessage` without a resolution: the sender never tracks
/// the recipient-side outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub id: i64,
    pub to_race: String,
    pub message_type: MessageType,
    pub content: String,
    pub code: Option<String>,
    pub day_number: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    pub day_number: i64,
    pub action_type: String,
    pub actor_race: Option<String>,
    /// Structured payload, JSON-encoded
    pub details: Option<String>,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_round_trip() {
        for r in [
            Resolution::Pending,
            Resolution::ExecutedSuccess,
            Resolution::ExecutedFail,
            Resolution::Rejected,
        ] {
            assert_eq!(Resolution::parse(r.as_str()), Some(r));
        }
        assert_eq!(Resolution::parse("done"), None);
    }

    #[test]
    fn test_terminal_resolutions() {
        assert!(!Resolution::Pending.is_terminal());
        assert!(Resolution::ExecutedSuccess.is_terminal());
        assert!(Resolution::ExecutedFail.is_terminal());
        assert!(Resolution::Rejected.is_terminal());
    }

    #[test]
    fn test_message_type_parse() {
        assert_eq!(MessageType::parse("public"), Some(MessageType::Public));
        assert_eq!(MessageType::parse("secret"), Some(MessageType::Secret));
        assert_eq!(MessageType::parse("broadcast"), None);
    }

    #[test]
    fn test_resolution_serde_rename() {
        let json = serde_json::to_string(&Resolution::ExecutedFail).unwrap();
        assert_eq!(json, "\"executed-fail\"");
    }
}
