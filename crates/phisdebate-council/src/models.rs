//! Shared types for the debate: an agent's categorical judgment, its
//! structured response, and the record of a full multi-round debate.

use phisdebate_llm::TokenUsage;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stance {
    Phishing,
    Suspicious,
    Legitimate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    /// The agent's role name, e.g. `"SecurityValidator"`.
    pub agent: String,
    pub stance: Stance,
    pub confidence: f64,
    pub arguments: Vec<String>,
    pub evidence: HashMap<String, String>,
    pub round: u32,
    pub tokens_in: u32,
    pub tokens_out: u32,
}

impl AgentResponse {
    /// The degraded response synthesized when an agent exhausts all
    /// retries — never treated as a genuine stance by the aggregator's
    /// symmetry guarantees, but it still participates in voting.
    pub fn unavailable(agent: impl Into<String>, round: u32) -> Self {
        Self {
            agent: agent.into(),
            stance: Stance::Suspicious,
            confidence: 0.5,
            arguments: vec!["agent unavailable".to_string()],
            evidence: HashMap::new(),
            round,
            tokens_in: 0,
            tokens_out: 0,
        }
    }

    pub fn tokens(&self) -> TokenUsage {
        TokenUsage { input: self.tokens_in, output: self.tokens_out }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Consensus,
    MaxRounds,
    Timeout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateRound {
    pub round: u32,
    pub responses: Vec<AgentResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateRecord {
    pub rounds: Vec<DebateRound>,
    pub stop_reason: StopReason,
    /// Which round reached consensus, if any.
    pub consensus_round: Option<u32>,
    pub total_tokens_in: u32,
    pub total_tokens_out: u32,
}

impl DebateRecord {
    pub fn last_round(&self) -> &[AgentResponse] {
        self.rounds.last().map(|r| r.responses.as_slice()).unwrap_or(&[])
    }
}
