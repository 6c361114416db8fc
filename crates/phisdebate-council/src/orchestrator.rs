//! Runs the bounded multi-round debate: one `tokio::task` per agent per
//! round, a consensus check after every round, and an optional wall-clock
//! budget enforced between rounds.

use crate::agent::{DebateAgent, DeliberationContext};
use crate::error::CouncilError;
use crate::models::{AgentResponse, DebateRecord, DebateRound, Stance, StopReason};
use phisdebate_llm::{LLMGateway, SingleShotVerdict};
use phisdebate_triage::{Message, Sender, TriageReport};
use phisdebate_url::URLCheckResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub max_rounds: u32,
    pub early_termination: bool,
    #[serde(with = "millis_opt")]
    pub max_total_time: Option<Duration>,
    /// Strong-majority mean-confidence threshold (`CONSENSUS_MAJORITY_CONFIDENCE`).
    pub majority_confidence: f64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { max_rounds: 2, early_termination: true, max_total_time: None, majority_confidence: 0.75 }
    }
}

pub struct DebateOrchestrator {
    agents: Vec<Arc<dyn DebateAgent>>,
    config: OrchestratorConfig,
}

impl DebateOrchestrator {
    pub fn new(agents: Vec<Arc<dyn DebateAgent>>, config: OrchestratorConfig) -> Result<Self, CouncilError> {
        if agents.is_empty() {
            return Err(CouncilError::EmptyRoster);
        }
        if !(0.0..=1.0).contains(&config.majority_confidence) {
            return Err(CouncilError::InvalidConfig(format!(
                "majority_confidence must be between 0.0 and 1.0, got {}",
                config.majority_confidence
            )));
        }
        Ok(Self { agents, config })
    }

    pub fn agent_weight(&self, name: &str) -> f64 {
        self.agents.iter().find(|a| a.name() == name).map(|a| a.weight()).unwrap_or(1.0)
    }

    pub async fn run(
        &self,
        gateway: &LLMGateway,
        sender: &Sender,
        message: &Message,
        triage: &TriageReport,
        single_shot: &SingleShotVerdict,
        url_checks: &[URLCheckResult],
    ) -> DebateRecord {
        let started = Instant::now();
        let mut rounds: Vec<DebateRound> = Vec::new();
        let mut prior_round: Vec<AgentResponse> = Vec::new();
        let mut stop_reason = StopReason::MaxRounds;
        let mut consensus_round = None;

        for round_number in 1..=self.config.max_rounds {
            if let Some(budget) = self.config.max_total_time {
                if started.elapsed() >= budget {
                    stop_reason = StopReason::Timeout;
                    break;
                }
            }

            let responses = self.run_round(gateway, sender, message, triage, single_shot, url_checks, round_number, &prior_round).await;

            if responses.is_empty() {
                // Every agent failed this round. With a previous round on record, that
                // round's responses stand as the final word; with none (first round),
                // keep nothing to vote on and let the caller's fallback policy decide.
                stop_reason = StopReason::MaxRounds;
                break;
            }

            let consensus_holds = self.check_consensus(&responses);
            rounds.push(DebateRound { round: round_number, responses: responses.clone() });
            prior_round = responses;

            if self.config.early_termination && consensus_holds {
                stop_reason = StopReason::Consensus;
                consensus_round = Some(round_number);
                debug!(round = round_number, "debate reached consensus");
                break;
            }
        }

        let (total_in, total_out) = rounds.iter().flat_map(|r| &r.responses).fold((0u32, 0u32), |(i, o), r| (i + r.tokens_in, o + r.tokens_out));

        info!(rounds = rounds.len(), ?stop_reason, "debate complete");

        DebateRecord { rounds, stop_reason, consensus_round, total_tokens_in: total_in, total_tokens_out: total_out }
    }

    async fn run_round(
        &self,
        gateway: &LLMGateway,
        sender: &Sender,
        message: &Message,
        triage: &TriageReport,
        single_shot: &SingleShotVerdict,
        url_checks: &[URLCheckResult],
        round: u32,
        prior_round: &[AgentResponse],
    ) -> Vec<AgentResponse> {
        let futures = self.agents.iter().map(|agent| {
            let agent = Arc::clone(agent);
            let ctx = DeliberationContext {
                sender,
                message,
                triage,
                single_shot,
                url_checks,
                round,
                prior_round,
            };
            async move { agent.deliberate(gateway, &ctx).await }
        });

        let responses: Vec<AgentResponse> = futures::future::join_all(futures).await;

        let all_unavailable = responses
            .iter()
            .all(|r| r.arguments.len() == 1 && r.arguments[0] == "agent unavailable");
        if all_unavailable {
            Vec::new()
        } else {
            responses
        }
    }

    fn check_consensus(&self, responses: &[AgentResponse]) -> bool {
        if responses.is_empty() {
            return false;
        }
        let n = responses.len();
        let mut counts: HashMap<Stance, Vec<f64>> = HashMap::new();
        for r in responses {
            counts.entry(r.stance).or_default().push(r.confidence);
        }

        if counts.len() == 1 {
            return true; // unanimous
        }

        let majority_needed = n / 2 + 1;
        counts.values().any(|confidences| {
            confidences.len() >= majority_needed
                && (confidences.iter().sum::<f64>() / confidences.len() as f64) >= self.config.majority_confidence
        })
    }
}

mod millis_opt {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&(d.as_millis() as u64)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let millis: Option<u64> = Option::deserialize(d)?;
        Ok(millis.map(Duration::from_millis))
    }
}
