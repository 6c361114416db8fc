//! # Detection Pipeline
//!
//! The facade that ties triage, the single-shot classifier and multi-agent
//! debate into one three-phase short-circuit: each phase either finalizes a
//! [`DetectionResult`] or escalates to the next, more expensive one.
//!
//! ```text
//! message ──▶ TRIAGE ──skip_llm──▶ done (SAFE)
//!                │
//!                ▼ (LOW_RISK / HIGH_RISK)
//!            SINGLE-SHOT ──no escalation──▶ done
//!                │
//!                ▼ (escalates)
//!              DEBATE ──▶ VOTING AGGREGATOR ──▶ done
//! ```
//!
//! Only construction-time misconfiguration surfaces as a [`PipelineError`];
//! every per-message failure degrades to a documented fallback inside the
//! [`DetectionResult`] it would otherwise have produced.

pub mod collaborators;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod result;

pub use collaborators::{BaselineStore, ResultSink};
pub use config::{MadConfig, MadMode, PipelineConfig};
pub use error::PipelineError;
pub use pipeline::Pipeline;
pub use result::{select_action, Action, DetectionResult, Stage, Trace};

pub type Result<T> = std::result::Result<T, PipelineError>;
