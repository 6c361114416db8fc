//! The classifier stage: one model call producing a structured verdict and
//! a routing decision. A router, not a judge — high-confidence PHISHING
//! never finalizes here, only the debate stage may confirm it.

use crate::gateway::LLMGateway;
use crate::provider::{GenerationRequest, TokenUsage};
use phisdebate_triage::{Message, Sender, TriageReport};
use phisdebate_url::URLCheckResult;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    Safe,
    Suspicious,
    Phishing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleShotVerdict {
    pub label: Label,
    pub confidence: f64,
    pub reasoning: String,
    pub risk_factors: Vec<String>,
    pub tokens_in: u32,
    pub tokens_out: u32,
    /// Set when the model call failed entirely and this verdict is the
    /// documented degraded fallback, never a genuine classification.
    pub is_fallback: bool,
}

impl SingleShotVerdict {
    fn fallback(triage_high_risk: bool) -> Self {
        Self {
            label: Label::Suspicious,
            confidence: if triage_high_risk { 0.6 } else { 0.5 },
            reasoning: "model call failed; escalating conservatively".to_string(),
            risk_factors: vec!["model_unavailable".to_string()],
            tokens_in: 0,
            tokens_out: 0,
            is_fallback: true,
        }
    }
}

/// Bare JSON shape requested from the model. Field names match the
/// contract verbatim so prompts can show the schema directly.
#[derive(Debug, Deserialize)]
struct RawVerdict {
    classification: String,
    confidence: f64,
    reasoning: String,
    #[serde(default)]
    risk_factors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleShotConfig {
    pub temperature: f32,
    pub max_tokens: u32,
    pub high_risk_threshold: u32,
}

impl Default for SingleShotConfig {
    fn default() -> Self {
        Self { temperature: 0.3, max_tokens: 500, high_risk_threshold: 50 }
    }
}

pub struct SingleShotClassifier {
    gateway: Arc<LLMGateway>,
    config: SingleShotConfig,
}

impl SingleShotClassifier {
    pub fn new(gateway: Arc<LLMGateway>, config: SingleShotConfig) -> Self {
        Self { gateway, config }
    }

    pub async fn classify(
        &self,
        sender: &Sender,
        message: &Message,
        triage: &TriageReport,
        url_checks: &[URLCheckResult],
    ) -> SingleShotVerdict {
        let prompt = build_prompt(sender, message, triage, url_checks);
        let request = GenerationRequest {
            system_prompt: SYSTEM_PROMPT.to_string(),
            user_prompt: prompt,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            require_structured: true,
        };

        match self.gateway.generate(request.clone()).await {
            Ok(response) => match parse_tolerant(&response.text) {
                Some(raw) => verdict_from_raw(raw, response.usage),
                None => {
                    warn!("single-shot response did not parse; re-prompting once");
                    self.reprompt_then_fallback(request, triage).await
                }
            },
            Err(err) => {
                warn!(error = %err, "single-shot model call failed");
                SingleShotVerdict::fallback(triage.risk_score >= self.config.high_risk_threshold)
            }
        }
    }

    async fn reprompt_then_fallback(&self, mut request: GenerationRequest, triage: &TriageReport) -> SingleShotVerdict {
        request.user_prompt.push_str("\n\nYour previous response did not parse. Respond with JSON only, no commentary, no code fences.");
        match self.gateway.generate(request).await {
            Ok(response) => match parse_tolerant(&response.text) {
                Some(raw) => verdict_from_raw(raw, response.usage),
                None => SingleShotVerdict::fallback(triage.risk_score >= self.config.high_risk_threshold),
            },
            Err(_) => SingleShotVerdict::fallback(triage.risk_score >= self.config.high_risk_threshold),
        }
    }
}

const SYSTEM_PROMPT: &str = "You are a phishing-detection classifier for Indonesian academic chat groups. \
Respond ONLY with a JSON object: {\"classification\":\"SAFE|SUSPICIOUS|PHISHING\",\"confidence\":0.0-1.0,\"reasoning\":\"...\",\"risk_factors\":[\"...\"]}. \
No markdown, no code fences, no text outside the JSON object.";

fn build_prompt(sender: &Sender, message: &Message, triage: &TriageReport, url_checks: &[URLCheckResult]) -> String {
    let baseline_summary = match &sender.baseline {
        Some(b) => format!(
            "avg_len={:.1} typical_hours={:?} url_rate={:.2} emoji_rate={:.2} observed={}",
            b.avg_message_length, b.typical_hours, b.url_sharing_rate, b.emoji_rate, b.total_observed_messages
        ),
        None => "no baseline on record".to_string(),
    };

    let flag_summary: Vec<String> = triage.flags.iter().map(|f| format!("{}(+{})", f.id, f.contribution)).collect();
    let url_summary: Vec<String> = url_checks
        .iter()
        .map(|c| format!("{} -> malicious={} risk={:.2} source={}", c.original_url, c.is_malicious, c.risk_score, c.source.as_str()))
        .collect();

    format!(
        "SENDER: id={} baseline=[{baseline_summary}]\n\
         MESSAGE: sent_hour={} length={} text=\"{}\"\n\
         TRIAGE: risk_score={} class={:?} flags={:?}\n\
         URLS: {:?}",
        sender.id,
        message.hour_of_day(),
        message.len_chars(),
        message.text,
        triage.risk_score,
        triage.class,
        flag_summary,
        url_summary,
    )
}

fn parse_tolerant(text: &str) -> Option<RawVerdict> {
    let cleaned = text.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();
    serde_json::from_str(cleaned).ok()
}

fn verdict_from_raw(raw: RawVerdict, usage: TokenUsage) -> SingleShotVerdict {
    let label = match raw.classification.to_ascii_uppercase().as_str() {
        "PHISHING" => Label::Phishing,
        "SUSPICIOUS" => Label::Suspicious,
        _ => Label::Safe,
    };
    SingleShotVerdict {
        label,
        confidence: raw.confidence.clamp(0.0, 1.0),
        reasoning: raw.reasoning,
        risk_factors: raw.risk_factors,
        tokens_in: usage.input,
        tokens_out: usage.output,
        is_fallback: false,
    }
}

/// The §4.5 routing contract: should this verdict escalate to the debate
/// stage rather than finalize here?
pub fn should_escalate(verdict: &SingleShotVerdict, triage_risk: u32) -> bool {
    match verdict.label {
        Label::Phishing => true,
        Label::Suspicious => true,
        Label::Safe => {
            verdict.confidence < 0.90 || (triage_risk >= 50 && verdict.confidence < 0.80)
        }
    }
}
