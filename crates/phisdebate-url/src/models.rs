//! Core URL types shared between the extractor and the security checker.
//!
//! ## Design Principles
//!
//! 1. **Immutable evidence** — `URLInfo` records how a token looked in the
//!    original text; normalization never discards the raw form.
//! 2. **Serializable** — every type here derives Serde traits so they can
//!    ride inside a `TriageReport` or `DetectionResult` trace without a
//!    translation layer.
//! 3. **Source-tagged results** — `URLCheckResult::source` tells a caller
//!    which layer decided the verdict, which matters for audit trails and
//!    for the pipeline's "whitelist implies zero risk" invariant.

use serde::{Deserialize, Serialize};

/// A URL-like token found in free text, normalized for downstream checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct URLInfo {
    /// The token exactly as it appeared in the source text.
    pub raw: String,
    /// Scheme-normalized form (defaults to `http://` when the token had none).
    pub normalized: String,
    /// Host portion, lowercased.
    pub host: String,
    /// Effective top-level domain (the last label, or a known multi-part
    /// suffix such as `co.id`).
    pub tld: String,
    /// Number of `/`-separated path segments after the host.
    pub path_depth: usize,
    /// Whether the normalized URL uses `https`.
    pub is_secure: bool,
}

/// Which layer of the security checker produced a [`URLCheckResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckSource {
    Whitelist,
    Heuristic,
    External,
    HeuristicExternal,
    ExpandFailed,
}

impl CheckSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckSource::Whitelist => "whitelist",
            CheckSource::Heuristic => "heuristic",
            CheckSource::External => "external",
            CheckSource::HeuristicExternal => "heuristic+external",
            CheckSource::ExpandFailed => "expand_failed",
        }
    }
}

/// One hop in a redirect chain, in the order it was followed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectHop {
    pub url: String,
    pub status: u16,
}

/// Outcome of running a URL through the four-layer security checker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct URLCheckResult {
    /// The original URL as submitted for checking.
    pub original_url: String,
    /// The fully expanded URL, if the host was a known shortener and
    /// expansion succeeded. `None` otherwise.
    pub expanded_url: Option<String>,
    /// Ordered redirect chain, empty when no redirects occurred.
    pub redirect_chain: Vec<RedirectHop>,
    pub is_malicious: bool,
    /// Risk in `[0.0, 1.0]`.
    pub risk_score: f64,
    pub source: CheckSource,
}

impl URLCheckResult {
    /// Build a whitelist verdict. Always zero risk per the pipeline's
    /// `source = whitelist ⇒ risk_score = 0 ∧ !is_malicious` invariant.
    pub fn whitelisted(original_url: impl Into<String>, expanded_url: Option<String>) -> Self {
        Self {
            original_url: original_url.into(),
            expanded_url,
            redirect_chain: Vec::new(),
            is_malicious: false,
            risk_score: 0.0,
            source: CheckSource::Whitelist,
        }
    }

    pub fn expand_failed(original_url: impl Into<String>) -> Self {
        Self {
            original_url: original_url.into(),
            expanded_url: None,
            redirect_chain: Vec::new(),
            is_malicious: false,
            risk_score: 0.0,
            source: CheckSource::ExpandFailed,
        }
    }
}
