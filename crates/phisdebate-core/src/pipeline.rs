//! The detection pipeline facade: wires triage, the single-shot classifier
//! and multi-agent debate into the three-phase short-circuit shape — each
//! phase either finalizes a verdict or hands off to the next one.

use crate::collaborators::{BaselineStore, ResultSink};
use crate::config::{MadMode, PipelineConfig};
use crate::error::PipelineError;
use crate::result::{select_action, DetectionResult, Stage, Trace};
use phisdebate_council::{five_agent_roster, three_agent_roster, DebateOrchestrator, VotingAggregator};
use phisdebate_llm::{should_escalate, LLMGateway, Label, LlmProvider, SingleShotClassifier};
use phisdebate_triage::{Message, Sender, Triage};
use phisdebate_url::{extract_urls, URLCheckResult, URLSecurityChecker};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// A detection run, built once per deployment and reused across messages.
/// Everything it owns is either stateless or internally synchronized, so
/// `analyze` takes `&self` and is safe to call concurrently.
pub struct Pipeline {
    config: PipelineConfig,
    url_checker: Arc<URLSecurityChecker>,
    triage: Triage,
    gateway: Arc<LLMGateway>,
    classifier: SingleShotClassifier,
    orchestrator: DebateOrchestrator,
    baseline_store: Option<Arc<dyn BaselineStore>>,
    result_sink: Option<Arc<dyn ResultSink>>,
}

impl Pipeline {
    /// Builds every collaborator up front, including the debate roster for
    /// the configured [`MadMode`], so a misconfigured judge weight or an
    /// orchestrator with no agents fails here rather than on the first
    /// message that happens to escalate to debate.
    pub fn new(config: PipelineConfig, provider: Arc<dyn LlmProvider>) -> Result<Self, PipelineError> {
        if config.mad.orchestrator.max_rounds == 0 {
            return Err(PipelineError::Config("mad.orchestrator.max_rounds must be at least 1".to_string()));
        }

        let gateway = Arc::new(LLMGateway::new(provider, config.gateway.clone()));
        let url_checker = Arc::new(URLSecurityChecker::new(config.url.clone()));
        let triage = Triage::new(config.triage.clone());
        let classifier = SingleShotClassifier::new(Arc::clone(&gateway), config.single_shot.clone());

        let roster = match config.mad.mode {
            MadMode::Three => three_agent_roster(),
            MadMode::Five => five_agent_roster(config.mad.judge_weight)?,
        };
        let orchestrator = DebateOrchestrator::new(roster, config.mad.orchestrator.clone())?;

        Ok(Self { config, url_checker, triage, gateway, classifier, orchestrator, baseline_store: None, result_sink: None })
    }

    pub fn with_baseline_store(mut self, store: Arc<dyn BaselineStore>) -> Self {
        self.baseline_store = Some(store);
        self
    }

    pub fn with_result_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.result_sink = Some(sink);
        self
    }

    /// Run the full pipeline on one message. `precomputed` lets a chat
    /// adapter that already ran its own URL checks hand them over instead
    /// of paying for a second network round trip; anything missing from it
    /// is checked here, once, and never re-checked downstream.
    pub async fn analyze(
        &self,
        message: &Message,
        sender_id: &str,
        precomputed: Option<HashMap<String, URLCheckResult>>,
    ) -> DetectionResult {
        let started = Instant::now();

        let baseline = match &self.baseline_store {
            Some(store) => store.load_baseline(sender_id).await,
            None => None,
        };
        let sender = match baseline {
            Some(snapshot) => Sender::with_baseline(sender_id, snapshot),
            None => Sender::new(sender_id),
        };

        let checks = self.resolve_url_checks(message, precomputed).await;
        let triage_report = self.triage.run(message, &sender, &checks);

        if triage_report.skip_llm {
            let result = DetectionResult {
                label: Label::Safe,
                confidence: 1.0,
                stage: Stage::Triage,
                action: select_action(Label::Safe, 1.0),
                tokens_in: 0,
                tokens_out: 0,
                duration: started.elapsed(),
                trace: Trace { triage: triage_report, single_shot: None, debate: None },
            };
            self.report(&result).await;
            return result;
        }

        let url_checks: Vec<URLCheckResult> = extract_urls(&message.text)
            .into_iter()
            .filter_map(|url| checks.get(&url.normalized).cloned())
            .collect();

        let single_shot = self.classifier.classify(&sender, message, &triage_report, &url_checks).await;

        if !should_escalate(&single_shot, triage_report.risk_score) {
            let result = DetectionResult {
                label: single_shot.label,
                confidence: single_shot.confidence,
                stage: Stage::SingleShot,
                action: select_action(single_shot.label, single_shot.confidence),
                tokens_in: single_shot.tokens_in,
                tokens_out: single_shot.tokens_out,
                duration: started.elapsed(),
                trace: Trace { triage: triage_report, single_shot: Some(single_shot), debate: None },
            };
            self.report(&result).await;
            return result;
        }

        let debate = self
            .orchestrator
            .run(&self.gateway, &sender, message, &triage_report, &single_shot, &url_checks)
            .await;

        let last_round = debate.last_round();
        let (label, confidence, stage) = if last_round.is_empty() {
            // Every debate agent failed in the only round it ran; the
            // single-shot verdict that triggered escalation is the best
            // remaining signal, per the documented degraded disposition.
            (single_shot.label, single_shot.confidence, Stage::SingleShot)
        } else {
            let outcome = VotingAggregator::aggregate(last_round, |name| self.orchestrator.agent_weight(name));
            (outcome.label.into(), outcome.confidence, Stage::Mad)
        };

        let tokens_in = single_shot.tokens_in + debate.total_tokens_in;
        let tokens_out = single_shot.tokens_out + debate.total_tokens_out;

        let result = DetectionResult {
            label,
            confidence,
            stage,
            action: select_action(label, confidence),
            tokens_in,
            tokens_out,
            duration: started.elapsed(),
            trace: Trace { triage: triage_report, single_shot: Some(single_shot), debate: Some(debate) },
        };
        self.report(&result).await;
        result
    }

    async fn resolve_url_checks(
        &self,
        message: &Message,
        precomputed: Option<HashMap<String, URLCheckResult>>,
    ) -> HashMap<String, URLCheckResult> {
        let mut checks = precomputed.unwrap_or_default();
        let missing: Vec<String> = extract_urls(&message.text)
            .into_iter()
            .map(|url| url.normalized)
            .filter(|normalized| !checks.contains_key(normalized))
            .collect();

        if !missing.is_empty() {
            let fresh = self.url_checker.check_many(&missing).await;
            checks.extend(fresh);
        }
        checks
    }

    async fn report(&self, result: &DetectionResult) {
        if let Some(sink) = &self.result_sink {
            sink.persist_result(result).await;
            sink.accumulate_usage(result.stage, result.tokens_in, result.tokens_out).await;
        }
        info!(?result.stage, ?result.action, confidence = result.confidence, "pipeline run complete");
    }
}
