//! Weighted aggregation of the final round's agent stances into a label
//! and confidence. Pure and synchronous — never suspends.

use crate::models::{AgentResponse, Stance};
use phisdebate_llm::Label;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregatedLabel {
    Phishing,
    Suspicious,
    Safe,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregationOutcome {
    pub label: AggregatedLabel,
    pub confidence: f64,
    pub phishing_probability: f64,
}

pub struct VotingAggregator;

impl VotingAggregator {
    /// Aggregate the final round's responses using the weighted-sum
    /// formula: `p = S_phish / (S_phish + S_legit)`, with SUSPICIOUS
    /// stances contributing to neither sum and `p = 0.5` when both sums
    /// are zero.
    pub fn aggregate(responses: &[AgentResponse], weight_of: impl Fn(&str) -> f64) -> AggregationOutcome {
        let mut s_phish = 0.0;
        let mut s_legit = 0.0;

        for response in responses {
            let w = weight_of(&response.agent);
            match response.stance {
                Stance::Phishing => s_phish += w * response.confidence,
                Stance::Legitimate => s_legit += w * response.confidence,
                Stance::Suspicious => {}
            }
        }

        let p = if s_phish == 0.0 && s_legit == 0.0 { 0.5 } else { s_phish / (s_phish + s_legit) };

        let label = if p >= 0.65 {
            AggregatedLabel::Phishing
        } else if p <= 0.35 {
            AggregatedLabel::Safe
        } else {
            AggregatedLabel::Suspicious
        };

        AggregationOutcome { label, confidence: p.max(1.0 - p), phishing_probability: p }
    }
}

impl From<AggregatedLabel> for Label {
    fn from(label: AggregatedLabel) -> Self {
        match label {
            AggregatedLabel::Phishing => Label::Phishing,
            AggregatedLabel::Suspicious => Label::Suspicious,
            AggregatedLabel::Safe => Label::Safe,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn response(agent: &str, stance: Stance, confidence: f64) -> AgentResponse {
        AgentResponse {
            agent: agent.to_string(),
            stance,
            confidence,
            arguments: vec![],
            evidence: HashMap::new(),
            round: 1,
            tokens_in: 0,
            tokens_out: 0,
        }
    }

    fn equal_weights(_agent: &str) -> f64 {
        1.0
    }

    #[test]
    fn p_exactly_065_is_phishing() {
        let responses = vec![
            response("a", Stance::Phishing, 0.65),
            response("b", Stance::Legitimate, 0.35),
        ];
        // S_phish = 0.65, S_legit = 0.35, p = 0.65/1.0 = 0.65
        let outcome = VotingAggregator::aggregate(&responses, equal_weights);
        assert_eq!(outcome.label, AggregatedLabel::Phishing);
        assert!((outcome.phishing_probability - 0.65).abs() < 1e-9);
    }

    #[test]
    fn p_exactly_035_is_safe() {
        let responses = vec![
            response("a", Stance::Phishing, 0.35),
            response("b", Stance::Legitimate, 0.65),
        ];
        let outcome = VotingAggregator::aggregate(&responses, equal_weights);
        assert_eq!(outcome.label, AggregatedLabel::Safe);
    }

    #[test]
    fn all_suspicious_yields_p_half_and_suspicious_label() {
        let responses = vec![response("a", Stance::Suspicious, 0.9), response("b", Stance::Suspicious, 0.8)];
        let outcome = VotingAggregator::aggregate(&responses, equal_weights);
        assert!((outcome.phishing_probability - 0.5).abs() < 1e-9);
        assert_eq!(outcome.label, AggregatedLabel::Suspicious);
        assert_eq!(outcome.confidence, 0.5);
    }

    #[test]
    fn confidence_is_always_at_least_half() {
        let responses = vec![response("a", Stance::Legitimate, 1.0)];
        let outcome = VotingAggregator::aggregate(&responses, equal_weights);
        assert!(outcome.confidence >= 0.5);
    }

    #[test]
    fn monotone_in_phishing_voter_confidence() {
        let low = vec![response("a", Stance::Phishing, 0.4), response("b", Stance::Legitimate, 0.6)];
        let high = vec![response("a", Stance::Phishing, 0.7), response("b", Stance::Legitimate, 0.6)];
        let p_low = VotingAggregator::aggregate(&low, equal_weights).phishing_probability;
        let p_high = VotingAggregator::aggregate(&high, equal_weights).phishing_probability;
        assert!(p_high > p_low);
    }

    #[test]
    fn symmetric_under_permutation_of_equal_weight_agents() {
        let order_a = vec![
            response("x", Stance::Phishing, 0.6),
            response("y", Stance::Legitimate, 0.4),
        ];
        let order_b = vec![
            response("y", Stance::Legitimate, 0.4),
            response("x", Stance::Phishing, 0.6),
        ];
        let p_a = VotingAggregator::aggregate(&order_a, equal_weights).phishing_probability;
        let p_b = VotingAggregator::aggregate(&order_b, equal_weights).phishing_probability;
        assert_eq!(p_a, p_b);
    }
}
