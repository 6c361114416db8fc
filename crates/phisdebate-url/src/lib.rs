//! # URL Extraction & Security Checking
//!
//! The first evidence-gathering stage of the detection pipeline. Chat
//! messages mix legitimate academic links with social-engineering lures, and
//! this crate is responsible for finding the links and deciding, as cheaply
//! as possible, whether each one is trustworthy.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         PHISDEBATE-URL                           │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │   extract_urls(text)                                             │
//! │        │                                                        │
//! │        ▼                                                        │
//! │   ┌───────────┐   ┌───────────┐   ┌───────────┐   ┌───────────┐  │
//! │   │ EXPANSION │ → │TRUST SET  │ → │ HEURISTIC │ → │ EXTERNAL  │  │
//! │   │ shorteners│   │ (bypass)  │   │  tariff   │   │ reputation│  │
//! │   └───────────┘   └───────────┘   └───────────┘   └───────────┘  │
//! │                                                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Evaluation short-circuits after the trust-set layer. Network failures
//! never propagate as errors; they degrade to a documented fallback
//! ([`models::CheckSource::ExpandFailed`] or a heuristic-only verdict).

pub mod checker;
pub mod config;
pub mod error;
pub mod extract;
pub mod models;

pub use checker::{NullReputationService, ReputationService, ReputationVerdict, URLSecurityChecker};
pub use config::{TldSuspicion, UrlCheckerConfig};
pub use error::UrlCheckError;
pub use extract::extract_urls;
pub use models::{CheckSource, RedirectHop, URLCheckResult, URLInfo};
