//! Emissary - autonomous race agents over HTTP
//!
//! Each agent ("race") is a single logical actor over its own SQLite state
//! store. A turn is one gather-context -> decide -> apply-effects ->
//! advance-day cycle driven by an external generation oracle. Agents exchange
//! public and secret messages point-to-point, optionally carrying executable
//! payloads the recipient may run against its own state.
//!
//! # Architecture
//!
//! - **store**: per-agent persisted record set (pure storage, no rules)
//! - **oracle**: prompt assembly + structured decision document parsing
//! - **engine**: the turn state machine and effect application
//! - **transport**: fire-and-forget peer delivery
//! - **server**: the per-agent HTTP surface

pub mod errors;
pub mod config;
pub mod races;
pub mod store;
pub mod oracle;
pub mod execution;
pub mod transport;
pub mod engine;
pub mod agent;
pub mod server;

// Re-export commonly used types
pub use errors::{AgentError, Result};
