//! # Triage
//!
//! The deterministic second stage of the detection pipeline (after URL
//! extraction and checking): a weighted rule engine plus behavioral-baseline
//! deviation scoring, producing a [`TriageReport`] that either short-circuits
//! the pipeline (`SAFE`) or hands a risk-scored message on to the classifier
//! stages.
//!
//! ```text
//! Message + Sender + (URLCheckResult...)
//!        │
//!        ▼
//!   ┌─────────────────────────────┐
//!   │  rule flags (keywords, TLD, │
//!   │  shorteners, punctuation)   │
//!   ├─────────────────────────────┤
//!   │  behavioral deviations      │
//!   │  (time/length/url/emoji)    │
//!   └─────────────────────────────┘
//!        │
//!        ▼
//!   TriageReport { risk_score, class, flags, skip_llm }
//! ```

pub mod baseline;
pub mod message;
pub mod triage;

pub use baseline::{compute_deviations, BehavioralDeviations, Deviation, DEFAULT_MIN_OBSERVED_MESSAGES};
pub use message::{BaselineSnapshot, Message, Sender};
pub use triage::{FlagSeverity, Triage, TriageClass, TriageConfig, TriageFlag, TriageReport};
