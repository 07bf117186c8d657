//! The structured decision document returned by the generation oracle
//!
//! Every field is optional: an empty object is a valid (if passive) turn.
//! Anything that fails to parse as this shape is a fatal turn error; the
//! caller must leave the day counter untouched so the turn can be retried.

use crate::errors::{AgentError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Decision {
    #[serde(default)]
    pub public_messages: Vec<OutboundMessage>,
    #[serde(default)]
    pub secret_messages: Vec<OutboundMessage>,
    #[serde(default)]
    pub relationship_updates: Vec<RelationshipUpdate>,
    #[serde(default)]
    pub new_goals: Vec<String>,
    #[serde(default)]
    pub new_secrets: Vec<String>,
    #[serde(default)]
    pub personality_updates: Vec<PersonalityUpdate>,
    #[serde(default)]
    pub code_execution_decisions: Vec<CodeExecutionDecision>,
    #[serde(default)]
    pub resource_actions: Vec<ResourceAction>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub to: String,
    pub content: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipUpdate {
    pub race: String,
    pub trust_delta: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalityUpdate {
    pub key: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeExecutionDecision {
    pub message_id: i64,
    pub execute: bool,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceActionKind {
    Steal,
    Gift,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceAction {
    pub action: ResourceActionKind,
    pub target_race: String,
    pub resource_type: String,
    pub amount: i64,
}

impl Decision {
    /// Parse the oracle's raw reply. Tolerates a markdown code fence around
    /// the JSON body, nothing more.
    pub fn parse(raw: &str) -> Result<Decision> {
        let body = strip_code_fence(raw.trim());
        serde_json::from_str(body).map_err(|e| AgentError::DecisionParse {
            reason: e.to_string(),
            snippet: snippet(raw),
        })
    }
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") on the fence line
    let rest = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn snippet(raw: &str) -> String {
    const MAX: usize = 200;
    if raw.len() <= MAX {
        raw.to_string()
    } else {
        let mut end = MAX;
        while !raw.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &raw[..end])
    }
}
