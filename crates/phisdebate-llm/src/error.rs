//! Error types for the LLM gateway and classifier.

use thiserror::Error;

/// Gateway-level error type. Never surfaced to a pipeline caller directly —
/// [`crate::single_shot::SingleShotClassifier`] catches every variant and
/// degrades to a fallback verdict.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Request exceeded its bounded timeout.
    #[error("request to provider timed out after {0}ms")]
    Timeout(u64),

    /// Network or connection-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Provider responded with a non-success status.
    #[error("provider returned an unexpected status: {0}")]
    UnexpectedStatus(u16),

    /// Structured output still didn't parse after the one repair re-prompt.
    #[error("structured output could not be parsed after repair attempt: {0}")]
    ParseFailed(String),

    /// Every retry attempt failed.
    #[error("all {0} retry attempts exhausted")]
    RetriesExhausted(u32),

    /// Configuration error at construction time.
    #[error("invalid gateway configuration: {0}")]
    InvalidConfig(String),
}
