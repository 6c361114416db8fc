//! # Multi-Agent Debate (MAD)
//!
//! Bounded-round parallel invocation of role-specialized model agents
//! followed by weighted voting. Escalation target for anything the
//! single-shot classifier can't finalize on its own.
//!
//! ## Threat Model
//!
//! A single model call is a single point of failure: one hallucinated or
//! miscalibrated verdict becomes the system's answer. Running several
//! independently-prompted agents and requiring consensus (or falling back
//! to a weighted vote when they disagree) means no single agent's error
//! determines the outcome.
//!
//! ## Rosters
//!
//! - **Three-agent**: Content Analyzer, Security Validator (weight 1.5),
//!   Social Context Evaluator.
//! - **Five-agent**: Detector, Critic, Defender, Fact-Checker, Judge.
//!
//! ```text
//! ┌───────────────┐  ┌──────────────────┐  ┌───────────────────────┐
//! │ContentAnalyzer│  │SecurityValidator │  │SocialContextEvaluator │
//! └───────┬───────┘  └────────┬─────────┘  └───────────┬───────────┘
//!         │                   │                        │
//!         └───────────────────┼────────────────────────┘
//!                             ▼
//!                    ┌─────────────────┐
//!                    │ CONSENSUS CHECK │
//!                    └────────┬────────┘
//!                             ▼
//!                    ┌─────────────────┐
//!                    │ VOTING AGGREGATOR│
//!                    └─────────────────┘
//! ```

pub mod agent;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod voting;

pub use agent::{
    five_agent_roster, three_agent_roster, ContentAnalyzer, DebateAgent, DeliberationContext, Detector, Critic,
    Defender, FactChecker, Judge, SecurityValidator, SocialContextEvaluator,
};
pub use error::CouncilError;
pub use models::{AgentResponse, DebateRecord, DebateRound, Stance, StopReason};
pub use orchestrator::{DebateOrchestrator, OrchestratorConfig};
pub use voting::{AggregatedLabel, AggregationOutcome, VotingAggregator};

pub type Result<T> = std::result::Result<T, CouncilError>;
