//! Role-specialized debate agents. The direct generalization of the
//! teacher's `Evaluator` trait: each agent still has a `name` and a
//! framework-style description, but now calls the LLM gateway to produce
//! its vote instead of evaluating a local rule set.

use crate::error::CouncilError;
use crate::models::{AgentResponse, Stance};
use async_trait::async_trait;
use phisdebate_llm::{GenerationRequest, LLMGateway, Label, SingleShotVerdict};
use phisdebate_triage::{Message, Sender, TriageReport};
use phisdebate_url::URLCheckResult;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Everything an agent needs to deliberate, assembled once per round by
/// the orchestrator.
pub struct DeliberationContext<'a> {
    pub sender: &'a Sender,
    pub message: &'a Message,
    pub triage: &'a TriageReport,
    pub single_shot: &'a SingleShotVerdict,
    pub url_checks: &'a [URLCheckResult],
    pub round: u32,
    /// Every other agent's response from the prior round — empty in round 1.
    pub prior_round: &'a [AgentResponse],
}

#[async_trait]
pub trait DebateAgent: Send + Sync {
    fn name(&self) -> &str;
    fn role_description(&self) -> &str;
    fn weight(&self) -> f64;

    /// Whether this agent is permitted to cite [`URLCheckResult`] evidence
    /// as objective fact rather than as one input among several — per
    /// spec, only the Security Validator may.
    fn may_cite_url_evidence_as_objective(&self) -> bool {
        false
    }

    async fn deliberate(&self, gateway: &LLMGateway, ctx: &DeliberationContext<'_>) -> AgentResponse {
        let prompt = self.build_prompt(ctx);
        let request = GenerationRequest {
            system_prompt: format!(
                "You are {}, a specialist in a multi-agent phishing-detection debate. {}\n\
                 Respond ONLY with JSON: {{\"stance\":\"PHISHING|SUSPICIOUS|LEGITIMATE\",\"confidence\":0.0-1.0,\"arguments\":[\"...\"],\"evidence\":{{}}}}",
                self.name(),
                self.role_description()
            ),
            user_prompt: prompt,
            temperature: 0.3,
            max_tokens: 400,
            require_structured: true,
        };

        match gateway.generate(request).await {
            Ok(response) => match parse_response(&response.text) {
                Some((stance, confidence, arguments, evidence)) => AgentResponse {
                    agent: self.name().to_string(),
                    stance,
                    confidence,
                    arguments,
                    evidence,
                    round: ctx.round,
                    tokens_in: response.usage.input,
                    tokens_out: response.usage.output,
                },
                None => {
                    warn!(agent = self.name(), "debate agent response did not parse");
                    AgentResponse::unavailable(self.name(), ctx.round)
                }
            },
            Err(err) => {
                warn!(agent = self.name(), error = %err, "debate agent call failed");
                AgentResponse::unavailable(self.name(), ctx.round)
            }
        }
    }

    fn build_prompt(&self, ctx: &DeliberationContext<'_>) -> String {
        let mut prompt = format!(
            "MESSAGE: \"{}\" (sent hour {}, {} chars)\n\
             SENDER: {}\n\
             TRIAGE: risk={} class={:?}\n\
             SINGLE_SHOT: label={:?} confidence={:.2} reasoning=\"{}\"\n\
             URLS: {:?}",
            ctx.message.text,
            ctx.message.hour_of_day(),
            ctx.message.len_chars(),
            ctx.sender.id,
            ctx.triage.risk_score,
            ctx.triage.class,
            ctx.single_shot.label,
            ctx.single_shot.confidence,
            ctx.single_shot.reasoning,
            ctx.url_checks.iter().map(|c| (&c.original_url, c.is_malicious, c.risk_score)).collect::<Vec<_>>(),
        );

        if !ctx.prior_round.is_empty() {
            prompt.push_str("\n\nOTHER AGENTS' PRIOR ROUND:\n");
            for other in ctx.prior_round {
                if other.agent != self.name() {
                    prompt.push_str(&format!("- {}: {:?} ({:.2}) {:?}\n", other.agent, other.stance, other.confidence, other.arguments));
                }
            }
        }

        prompt
    }
}

fn parse_response(text: &str) -> Option<(Stance, f64, Vec<String>, HashMap<String, String>)> {
    let cleaned = text.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();
    let value: serde_json::Value = serde_json::from_str(cleaned).ok()?;

    let stance = match value.get("stance")?.as_str()?.to_ascii_uppercase().as_str() {
        "PHISHING" => Stance::Phishing,
        "LEGITIMATE" => Stance::Legitimate,
        _ => Stance::Suspicious,
    };
    let confidence = value.get("confidence")?.as_f64()?.clamp(0.0, 1.0);
    let arguments = value
        .get("arguments")
        .and_then(|v| v.as_array())
        .map(|a| a.iter().filter_map(|x| x.as_str().map(String::from)).collect())
        .unwrap_or_default();
    let evidence = value
        .get("evidence")
        .and_then(|v| v.as_object())
        .map(|o| o.iter().filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string()))).collect())
        .unwrap_or_default();

    Some((stance, confidence, arguments, evidence))
}

/// Also exposes the classifier's [`Label`] mapping used when bootstrapping
/// a debate from a single-shot verdict's own stance-like label, kept here
/// since agents read `single_shot.label` directly rather than converting it.
pub fn label_as_stance_hint(label: Label) -> &'static str {
    match label {
        Label::Phishing => "PHISHING",
        Label::Suspicious => "SUSPICIOUS",
        Label::Safe => "LEGITIMATE",
    }
}

macro_rules! simple_agent {
    ($struct_name:ident, $name:expr, $desc:expr, $weight:expr) => {
        pub struct $struct_name;

        #[async_trait]
        impl DebateAgent for $struct_name {
            fn name(&self) -> &str {
                $name
            }
            fn role_description(&self) -> &str {
                $desc
            }
            fn weight(&self) -> f64 {
                $weight
            }
        }
    };
}

simple_agent!(
    ContentAnalyzer,
    "ContentAnalyzer",
    "Analyze the message text itself for manipulation tactics: urgency, authority impersonation, too-good-to-be-true offers, and linguistic register inconsistent with the sender's typical academic-group traffic.",
    1.0
);

pub struct SecurityValidator;

#[async_trait]
impl DebateAgent for SecurityValidator {
    fn name(&self) -> &str {
        "SecurityValidator"
    }
    fn role_description(&self) -> &str {
        "Assess the objective technical evidence: URL check results, redirect chains, TLD suspicion, and shortener use. You are the only agent permitted to treat URLCheckResult data as ground truth rather than as one signal among several."
    }
    fn weight(&self) -> f64 {
        1.5
    }
    fn may_cite_url_evidence_as_objective(&self) -> bool {
        true
    }
}

simple_agent!(
    SocialContextEvaluator,
    "SocialContextEvaluator",
    "Weigh the sender's behavioral baseline and the social context of an academic group chat: is this plausible coming from this sender, at this hour, with this framing?",
    1.0
);

simple_agent!(
    Detector,
    "Detector",
    "Proactively argue for the PHISHING interpretation: identify every red flag and manipulation pattern present.",
    1.0
);
simple_agent!(
    Critic,
    "Critic",
    "Scrutinize the Detector's likely claims for overreach; argue against false positives where the evidence is genuinely ambiguous.",
    1.0
);
simple_agent!(
    Defender,
    "Defender",
    "Proactively argue for the LEGITIMATE interpretation where plausible: consider benign explanations for every flag raised.",
    1.0
);
simple_agent!(
    FactChecker,
    "FactChecker",
    "Verify claims in the message against what is independently knowable: do the URLs, offers, or deadlines check out?",
    1.0
);

pub struct Judge {
    weight: f64,
}

impl Judge {
    pub fn new(weight: f64) -> Result<Self, CouncilError> {
        if weight < 0.0 {
            return Err(CouncilError::InvalidAgentConfig(
                "Judge".to_string(),
                format!("weight must be non-negative, got {weight}"),
            ));
        }
        Ok(Self { weight })
    }
}

impl Default for Judge {
    /// Open question in the source material: judge weighting is left
    /// unspecified. We default to equal weight (1.0) with the synthesis
    /// role still distinguished by its system prompt, and leave room for
    /// operators to tune it upward via `Judge::new`.
    fn default() -> Self {
        Self { weight: 1.0 }
    }
}

#[async_trait]
impl DebateAgent for Judge {
    fn name(&self) -> &str {
        "Judge"
    }
    fn role_description(&self) -> &str {
        "Synthesize the other four agents' arguments (visible to you from round 2 onward) into a final stance, weighing both the Detector/Critic and Defender/FactChecker exchanges."
    }
    fn weight(&self) -> f64 {
        self.weight
    }
}

/// The three-agent roster: Content Analyzer, Security Validator, Social
/// Context Evaluator.
pub fn three_agent_roster() -> Vec<Arc<dyn DebateAgent>> {
    vec![Arc::new(ContentAnalyzer), Arc::new(SecurityValidator), Arc::new(SocialContextEvaluator)]
}

/// The five-agent roster: Detector, Critic, Defender, Fact-Checker, Judge.
/// `judge_weight` resolves the open question on how much to elevate the
/// judge above the equal-weight default; rejected if negative.
pub fn five_agent_roster(judge_weight: f64) -> Result<Vec<Arc<dyn DebateAgent>>, CouncilError> {
    Ok(vec![
        Arc::new(Detector),
        Arc::new(Critic),
        Arc::new(Defender),
        Arc::new(FactChecker),
        Arc::new(Judge::new(judge_weight)?),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_agent_weights_match_spec() {
        let roster = three_agent_roster();
        let weights: Vec<f64> = roster.iter().map(|a| a.weight()).collect();
        assert_eq!(weights, vec![1.0, 1.5, 1.0]);
    }

    #[test]
    fn only_security_validator_cites_objective_url_evidence() {
        let roster = three_agent_roster();
        let flags: Vec<bool> = roster.iter().map(|a| a.may_cite_url_evidence_as_objective()).collect();
        assert_eq!(flags, vec![false, true, false]);
    }

    #[test]
    fn five_agent_roster_has_five_members() {
        let roster = five_agent_roster(1.5).unwrap();
        assert_eq!(roster.len(), 5);
        assert_eq!(roster.last().unwrap().weight(), 1.5);
    }

    #[test]
    fn five_agent_roster_rejects_negative_judge_weight() {
        assert!(five_agent_roster(-0.1).is_err());
    }

    #[test]
    fn parses_response_json() {
        let text = "```json\n{\"stance\":\"PHISHING\",\"confidence\":0.8,\"arguments\":[\"urgent tone\"],\"evidence\":{}}\n```";
        let (stance, confidence, arguments, _) = parse_response(text).unwrap();
        assert_eq!(stance, Stance::Phishing);
        assert!((confidence - 0.8).abs() < 1e-9);
        assert_eq!(arguments, vec!["urgent tone".to_string()]);
    }
}
