//! # LLM Gateway & Single-Shot Classifier
//!
//! The provider-agnostic boundary between the detection pipeline and any
//! concrete model API, plus the single-model-call classifier that decides
//! whether a message needs the full multi-agent debate.
//!
//! ```text
//! SingleShotClassifier::classify
//!        │
//!        ▼
//!   LLMGateway::generate ──retry+backoff──▶ LlmProvider (OpenAiCompatProvider)
//!        │
//!        ▼
//!   tolerant JSON parse ──fail──▶ one re-prompt ──fail──▶ fallback verdict
//! ```

pub mod error;
pub mod gateway;
pub mod provider;
pub mod single_shot;

pub use error::LlmError;
pub use gateway::{GatewayConfig, LLMGateway};
pub use provider::{GenerationRequest, GenerationResponse, LlmProvider, OpenAiCompatProvider, TokenUsage};
pub use single_shot::{should_escalate, Label, SingleShotClassifier, SingleShotConfig, SingleShotVerdict};
