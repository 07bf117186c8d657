//! Error types for the emissary agent system
//!
//! One enum per process: every subsystem reports through `AgentError` so the
//! HTTP layer can map failures onto status codes in a single place.

use thiserror::Error;

/// Main error type for the race agent system
#[derive(Error, Debug)]
pub enum AgentError {
    /// Configuration errors (fatal at startup)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// State store errors
    #[error("State store error: {0}")]
    StoreError(#[from] rusqlite::Error),

    /// Oracle transport errors (network-level failure talking to the
    /// generation service)
    #[error("Oracle request failed: {0}")]
    OracleError(String),

    /// Oracle returned something that does not parse as a decision document
    #[error("Malformed decision document: {reason}: {snippet}")]
    DecisionParse { reason: String, snippet: String },

    /// A turn is already in flight for this agent
    #[error("A turn is already in progress for {race}")]
    TurnInProgress { race: String },

    /// Race id not present in the configured population
    #[error("Unknown race: {0}")]
    UnknownRace(String),

    /// Peer reachable but refused the message
    #[error("Delivery to {peer} failed: {reason}")]
    DeliveryFailed { peer: String, reason: String },

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;

impl AgentError {
    /// True when retrying the same call may succeed without operator
    /// intervention (oracle hiccups, in-flight turns).
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AgentError::OracleError(_)
                | AgentError::DecisionParse { .. }
                | AgentError::TurnInProgress { .. }
                | AgentError::HttpError(_)
        )
    }
}
