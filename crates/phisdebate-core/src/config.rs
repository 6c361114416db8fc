//! Configuration surface for the detection pipeline, covering every row
//! of the external configuration table (`MAD_MODE`, `MAD_MAX_ROUNDS`, ...,
//! `CONSENSUS_MAJORITY_CONFIDENCE`) with the same nested-struct-with-`Default`
//! style used throughout this workspace.

use phisdebate_council::OrchestratorConfig;
use phisdebate_llm::{GatewayConfig, SingleShotConfig};
use phisdebate_triage::TriageConfig;
use phisdebate_url::UrlCheckerConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MadMode {
    Three,
    Five,
}

impl Default for MadMode {
    fn default() -> Self {
        MadMode::Three
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MadConfig {
    pub mode: MadMode,
    pub orchestrator: OrchestratorConfig,
    /// Judge weight in the five-agent roster. Open question in the source
    /// material; defaults to equal weight, tunable upward per agent
    /// construction policy documented alongside the roster.
    pub judge_weight: f64,
}

impl Default for MadConfig {
    fn default() -> Self {
        Self { mode: MadMode::default(), orchestrator: OrchestratorConfig::default(), judge_weight: 1.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub url: UrlCheckerConfig,
    pub triage: TriageConfig,
    pub single_shot: SingleShotConfig,
    pub gateway: GatewayConfig,
    pub mad: MadConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            url: UrlCheckerConfig::default(),
            triage: TriageConfig::default(),
            single_shot: SingleShotConfig::default(),
            gateway: GatewayConfig::default(),
            mad: MadConfig::default(),
        }
    }
}
