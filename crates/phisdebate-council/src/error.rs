//! Error types for debate orchestration.

use thiserror::Error;

/// Errors that can occur during council operations. Construction-time
/// only — a debate in progress degrades (per-agent fallback responses)
/// rather than raising one of these.
#[derive(Debug, Error)]
pub enum CouncilError {
    /// An agent's role configuration was invalid (e.g. negative weight).
    #[error("invalid agent configuration for '{0}': {1}")]
    InvalidAgentConfig(String, String),

    /// The configured roster was empty.
    #[error("debate roster must have at least one agent")]
    EmptyRoster,

    /// Orchestrator configuration failed validation.
    #[error("invalid orchestrator configuration: {0}")]
    InvalidConfig(String),
}
