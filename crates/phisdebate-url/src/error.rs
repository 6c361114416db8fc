//! Error types for URL extraction and checking.

use thiserror::Error;

/// Errors from the security checker's network-facing layers.
///
/// None of these are fatal to a caller: [`crate::checker::URLSecurityChecker`]
/// degrades to a heuristic-only verdict rather than propagating them, per
/// spec.md §7's "network and parse errors degrade to heuristic-only" rule.
/// This type exists so that degradation can be logged with a reason.
#[derive(Debug, Error)]
pub enum UrlCheckError {
    #[error("expansion request failed: {0}")]
    ExpansionFailed(String),

    #[error("expansion timed out after {0:?}")]
    ExpansionTimeout(std::time::Duration),

    #[error("too many redirects (limit {0})")]
    TooManyRedirects(u32),

    #[error("reputation service error: {0}")]
    ReputationFailed(String),

    #[error("url could not be parsed: {0}")]
    InvalidUrl(String),
}
