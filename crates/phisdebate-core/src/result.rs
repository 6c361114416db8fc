//! The pipeline's terminal output: a label, the stage that produced it, the
//! recommended action, and a full trace for audit and appeal.

use phisdebate_council::DebateRecord;
use phisdebate_llm::{Label, SingleShotVerdict};
use phisdebate_triage::TriageReport;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which stage finalized the verdict. Determines how much of `trace` is
/// populated — `single_shot` is `None` when triage short-circuits, `debate`
/// is `None` unless the single-shot classifier escalated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Triage,
    SingleShot,
    Mad,
}

/// The recommended disposition, per the action-selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    None,
    Warn,
    FlagReview,
}

/// Everything evaluated on the way to a verdict, kept for audit and appeal
/// rather than discarded once the final label is known.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trace {
    pub triage: TriageReport,
    pub single_shot: Option<SingleShotVerdict>,
    pub debate: Option<DebateRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub label: Label,
    pub confidence: f64,
    pub stage: Stage,
    pub action: Action,
    pub tokens_in: u32,
    pub tokens_out: u32,
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    pub trace: Trace,
}

/// Maps a finalized label and confidence to the recommended action.
///
/// SAFE never warrants action. PHISHING always gets flagged for review,
/// regardless of confidence — false negatives on a confirmed phishing
/// label are costlier than the review-queue noise of a low-confidence one.
/// SUSPICIOUS splits on confidence: a warning suffices above the line, a
/// human review is warranted below it.
pub fn select_action(label: Label, confidence: f64) -> Action {
    match label {
        Label::Safe => Action::None,
        Label::Phishing => Action::FlagReview,
        Label::Suspicious if confidence >= 0.60 => Action::Warn,
        Label::Suspicious => Action::FlagReview,
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_never_actions() {
        assert_eq!(select_action(Label::Safe, 0.99), Action::None);
        assert_eq!(select_action(Label::Safe, 0.0), Action::None);
    }

    #[test]
    fn phishing_always_flags_regardless_of_confidence() {
        assert_eq!(select_action(Label::Phishing, 0.1), Action::FlagReview);
        assert_eq!(select_action(Label::Phishing, 0.99), Action::FlagReview);
    }

    #[test]
    fn suspicious_splits_on_confidence_threshold() {
        assert_eq!(select_action(Label::Suspicious, 0.60), Action::Warn);
        assert_eq!(select_action(Label::Suspicious, 0.75), Action::Warn);
        assert_eq!(select_action(Label::Suspicious, 0.59), Action::FlagReview);
        assert_eq!(select_action(Label::Suspicious, 0.0), Action::FlagReview);
    }

    #[test]
    fn result_round_trips_through_json() {
        let result = DetectionResult {
            label: Label::Suspicious,
            confidence: 0.7,
            stage: Stage::SingleShot,
            action: Action::Warn,
            tokens_in: 120,
            tokens_out: 40,
            duration: Duration::from_millis(250),
            trace: Trace {
                triage: TriageReport {
                    risk_score: 40,
                    class: phisdebate_triage::TriageClass::HighRisk,
                    flags: Vec::new(),
                    whitelisted_urls: Vec::new(),
                    non_whitelisted_urls: Vec::new(),
                    skip_llm: false,
                },
                single_shot: None,
                debate: None,
            },
        };
        let json = serde_json::to_string(&result).unwrap();
        let parsed: DetectionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.duration, result.duration);
        assert_eq!(parsed.action, Action::Warn);
    }
}
