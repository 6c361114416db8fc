//! Error types for the detection pipeline.

use thiserror::Error;

/// Construction-time configuration failures are the only fatal error this
/// crate produces — per-message failures always degrade to a
/// [`crate::result::DetectionResult`] rather than propagating an error.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid pipeline configuration: {0}")]
    Config(String),

    #[error("debate orchestration error: {0}")]
    Council(#[from] phisdebate_council::CouncilError),
}
