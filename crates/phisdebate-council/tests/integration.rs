//! End-to-end debate scenarios: full rosters running against a scripted
//! provider through the real gateway, consensus detection, and weighted
//! aggregation of a genuinely split vote.

use async_trait::async_trait;
use phisdebate_council::{five_agent_roster, three_agent_roster, DebateOrchestrator, OrchestratorConfig, VotingAggregator};
use phisdebate_llm::{GatewayConfig, GenerationRequest, GenerationResponse, LLMGateway, LlmError, LlmProvider, SingleShotVerdict, TokenUsage};
use phisdebate_triage::{Message, Sender, Triage, TriageConfig};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

struct ScriptedProvider {
    stance: &'static str,
    confidence: f64,
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let text = format!(
            r#"{{"stance":"{}","confidence":{},"arguments":["scripted"],"evidence":{{}}}}"#,
            self.stance, self.confidence
        );
        Ok(GenerationResponse { text, usage: TokenUsage { input: 10, output: 10 }, latency: Duration::from_millis(1) })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn baseline_inputs() -> (Message, Sender, phisdebate_triage::TriageReport, SingleShotVerdict) {
    let triage = Triage::new(TriageConfig::default());
    let sender = Sender::new("s1");
    let message = Message {
        id: "m1".into(),
        sender_id: "s1".into(),
        text: "Klik link ini sekarang untuk verifikasi akun: http://bit.ly/akun".into(),
        sent_at_unix: 0,
    };
    let report = triage.run(&message, &sender, &HashMap::new());
    let single_shot = SingleShotVerdict {
        label: phisdebate_llm::Label::Suspicious,
        confidence: 0.5,
        reasoning: "ambiguous".to_string(),
        risk_factors: vec![],
        tokens_in: 10,
        tokens_out: 10,
        is_fallback: false,
    };
    (message, sender, report, single_shot)
}

#[tokio::test]
async fn three_agent_roster_reaches_unanimous_consensus_in_round_one() {
    let provider: Arc<dyn LlmProvider> = Arc::new(ScriptedProvider { stance: "PHISHING", confidence: 0.85 });
    let gateway = LLMGateway::new(provider, GatewayConfig::default());
    let orchestrator = DebateOrchestrator::new(three_agent_roster(), OrchestratorConfig::default()).unwrap();
    let (message, sender, report, single_shot) = baseline_inputs();

    let record = orchestrator.run(&gateway, &sender, &message, &report, &single_shot, &[]).await;

    assert_eq!(record.rounds.len(), 1);
    assert_eq!(record.consensus_round, Some(1));
    assert_eq!(record.rounds[0].responses.len(), 3);
}

#[tokio::test]
async fn five_agent_roster_runs_all_five_specialists() {
    let provider: Arc<dyn LlmProvider> = Arc::new(ScriptedProvider { stance: "LEGITIMATE", confidence: 0.8 });
    let gateway = LLMGateway::new(provider, GatewayConfig::default());
    let orchestrator = DebateOrchestrator::new(five_agent_roster(1.0).unwrap(), OrchestratorConfig::default()).unwrap();
    let (message, sender, report, single_shot) = baseline_inputs();

    let record = orchestrator.run(&gateway, &sender, &message, &report, &single_shot, &[]).await;

    let names: Vec<&str> = record.rounds[0].responses.iter().map(|r| r.agent.as_str()).collect();
    assert_eq!(names.len(), 5);
    assert!(names.contains(&"Detector"));
    assert!(names.contains(&"Judge"));
}

#[tokio::test]
async fn disagreement_runs_to_max_rounds_without_consensus() {
    // A provider that alternates stance per call never reaches a stable
    // majority, so the orchestrator should exhaust its round budget.
    struct AlternatingProvider(std::sync::atomic::AtomicU32);

    #[async_trait]
    impl LlmProvider for AlternatingProvider {
        async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
            let n = self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let stance = if n % 2 == 0 { "PHISHING" } else { "LEGITIMATE" };
            let text = format!(r#"{{"stance":"{stance}","confidence":0.6,"arguments":[],"evidence":{{}}}}"#);
            Ok(GenerationResponse { text, usage: TokenUsage::default(), latency: Duration::from_millis(1) })
        }

        fn name(&self) -> &str {
            "alternating"
        }
    }

    let provider: Arc<dyn LlmProvider> = Arc::new(AlternatingProvider(std::sync::atomic::AtomicU32::new(0)));
    let gateway = LLMGateway::new(provider, GatewayConfig::default());
    let config = OrchestratorConfig { max_rounds: 2, ..OrchestratorConfig::default() };
    let orchestrator = DebateOrchestrator::new(three_agent_roster(), config).unwrap();
    let (message, sender, report, single_shot) = baseline_inputs();

    let record = orchestrator.run(&gateway, &sender, &message, &report, &single_shot, &[]).await;

    assert_eq!(record.rounds.len(), 2);
    assert!(record.consensus_round.is_none());
}

#[tokio::test]
async fn split_vote_is_resolved_by_security_validator_weight() {
    // SecurityValidator (weight 1.5) votes PHISHING; the other two (weight
    // 1.0 each) vote LEGITIMATE. Equal-confidence split should still tip
    // towards PHISHING once weighted: 1.5 vs 2.0 at equal confidence keeps
    // it SUSPICIOUS, so raise SecurityValidator's side with higher
    // confidence to make the tip unambiguous.
    struct PerAgentProvider;

    #[async_trait]
    impl LlmProvider for PerAgentProvider {
        async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
            let stance = if request.system_prompt.contains("SecurityValidator") { "PHISHING" } else { "LEGITIMATE" };
            let confidence = if request.system_prompt.contains("SecurityValidator") { 0.95 } else { 0.5 };
            let text = format!(r#"{{"stance":"{stance}","confidence":{confidence},"arguments":[],"evidence":{{}}}}"#);
            Ok(GenerationResponse { text, usage: TokenUsage::default(), latency: Duration::from_millis(1) })
        }

        fn name(&self) -> &str {
            "per-agent"
        }
    }

    let provider: Arc<dyn LlmProvider> = Arc::new(PerAgentProvider);
    let gateway = LLMGateway::new(provider, GatewayConfig::default());
    let config = OrchestratorConfig { max_rounds: 1, early_termination: false, ..OrchestratorConfig::default() };
    let orchestrator = DebateOrchestrator::new(three_agent_roster(), config).unwrap();
    let (message, sender, report, single_shot) = baseline_inputs();

    let record = orchestrator.run(&gateway, &sender, &message, &report, &single_shot, &[]).await;
    let outcome = VotingAggregator::aggregate(record.last_round(), |name| orchestrator.agent_weight(name));

    // s_phish = 1.5 * 0.95 = 1.425; s_legit = 1.0*0.5 + 1.0*0.5 = 1.0
    // p = 1.425 / 2.425 ≈ 0.588, which is Suspicious territory, not a clean
    // PHISHING win -- confirming that raw vote counts alone would have
    // called this PHISHING (2 vs 1) while the weighted formula does not.
    assert!(outcome.phishing_probability > 0.5);
    assert_ne!(outcome.label, phisdebate_council::AggregatedLabel::Safe);
}
