//! Behavioral-baseline deviation scoring.
//!
//! Four deviation scores in `[0.0, 1.0]`, each independently "active" or
//! not. All four are pure functions of `(BaselineSnapshot, Message)` — no
//! I/O, matching the pipeline's requirement that Triage never suspends.
//! When the baseline is below the sufficiency threshold, every score is
//! inactive: absence of history must never be read as evidence of anomaly.

use crate::message::{BaselineSnapshot, Message};

/// Minimum observed messages before behavioral scoring is trusted at all.
pub const DEFAULT_MIN_OBSERVED_MESSAGES: u64 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Deviation {
    pub active: bool,
    pub score: f64,
}

impl Deviation {
    fn inactive() -> Self {
        Self { active: false, score: 0.0 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BehavioralDeviations {
    pub time_anomaly: Deviation,
    pub length_anomaly: Deviation,
    pub first_time_url: Deviation,
    pub emoji_anomaly: Deviation,
}

/// Compute all four deviation scores, or all-inactive if the baseline
/// doesn't meet `min_observed_messages`.
pub fn compute_deviations(
    baseline: Option<&BaselineSnapshot>,
    message: &Message,
    message_has_url: bool,
    min_observed_messages: u64,
) -> BehavioralDeviations {
    let Some(baseline) = baseline else {
        return BehavioralDeviations::default();
    };
    if !baseline.is_sufficient(min_observed_messages) {
        return BehavioralDeviations::default();
    }

    BehavioralDeviations {
        time_anomaly: time_anomaly(baseline, message),
        length_anomaly: length_anomaly(baseline, message),
        first_time_url: first_time_url(baseline, message_has_url),
        emoji_anomaly: emoji_anomaly(baseline, message),
    }
}

/// Circular hour distance to the nearest typical hour:
/// `min_t min(|h-t|, 24-|h-t|)`. Active at distance ≥ 2.
fn time_anomaly(baseline: &BaselineSnapshot, message: &Message) -> Deviation {
    if baseline.typical_hours.is_empty() {
        return Deviation::inactive();
    }
    let h = message.hour_of_day() as i32;
    let distance = baseline
        .typical_hours
        .iter()
        .map(|&t| {
            let d = (h - t as i32).abs();
            d.min(24 - d)
        })
        .min()
        .unwrap_or(0);

    if distance >= 2 {
        Deviation { active: true, score: (distance as f64 / 12.0).min(1.0) }
    } else {
        Deviation::inactive()
    }
}

/// `z = |len - mean| / sigma`, with sigma falling back to `0.3 * mean` when
/// missing. Active at `z >= 2`.
fn length_anomaly(baseline: &BaselineSnapshot, message: &Message) -> Deviation {
    let sigma = baseline
        .length_stddev
        .unwrap_or(0.3 * baseline.avg_message_length);
    if sigma <= 0.0 {
        return Deviation::inactive();
    }
    let len = message.len_chars() as f64;
    let z = (len - baseline.avg_message_length).abs() / sigma;

    if z >= 2.0 {
        Deviation { active: true, score: (z / 5.0).min(1.0) }
    } else {
        Deviation::inactive()
    }
}

/// Active when the baseline has never recorded a URL but the current
/// message carries one. Fixed deviation of 0.7 — this is a strong signal
/// regardless of how far "never" is from "always".
fn first_time_url(baseline: &BaselineSnapshot, message_has_url: bool) -> Deviation {
    if baseline.url_sharing_rate == 0.0 && message_has_url {
        Deviation { active: true, score: 0.7 }
    } else {
        Deviation::inactive()
    }
}

/// Relative difference in emoji-per-char between the current message and
/// the baseline rate. Active at a relative difference ≥ 0.3.
fn emoji_anomaly(baseline: &BaselineSnapshot, message: &Message) -> Deviation {
    let len = message.len_chars();
    if len == 0 {
        return Deviation::inactive();
    }
    let current_rate = message.emoji_count() as f64 / len as f64;
    let diff = (current_rate - baseline.emoji_rate).abs();

    if diff >= 0.3 {
        Deviation { active: true, score: diff.min(1.0) }
    } else {
        Deviation::inactive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(text: &str, hour: i64) -> Message {
        Message {
            id: "m1".into(),
            sender_id: "s1".into(),
            text: text.into(),
            sent_at_unix: hour * 3600,
        }
    }

    fn sufficient_baseline() -> BaselineSnapshot {
        BaselineSnapshot {
            avg_message_length: 50.0,
            length_stddev: Some(10.0),
            typical_hours: [8, 9, 10].into_iter().collect(),
            url_sharing_rate: 0.0,
            emoji_rate: 0.0,
            total_observed_messages: 20,
        }
    }

    #[test]
    fn insufficient_baseline_yields_no_deviations() {
        let baseline = BaselineSnapshot { total_observed_messages: 3, ..sufficient_baseline() };
        let d = compute_deviations(Some(&baseline), &msg("hello", 23), true, DEFAULT_MIN_OBSERVED_MESSAGES);
        assert_eq!(d, BehavioralDeviations::default());
    }

    #[test]
    fn missing_baseline_yields_no_deviations() {
        let d = compute_deviations(None, &msg("hello", 23), true, DEFAULT_MIN_OBSERVED_MESSAGES);
        assert_eq!(d, BehavioralDeviations::default());
    }

    #[test]
    fn time_anomaly_wraps_around_midnight() {
        let baseline = sufficient_baseline();
        // hour 23 is circular-distance 2 from hour 1 (wrap), but here typical
        // hours are {8,9,10}; distance from 23 to 8 is min(15, 9) = 9.
        let d = time_anomaly(&baseline, &msg("x", 23));
        assert!(d.active);
        assert!((d.score - (9.0 / 12.0)).abs() < 1e-9);
    }

    #[test]
    fn time_anomaly_inactive_near_typical_hour() {
        let baseline = sufficient_baseline();
        let d = time_anomaly(&baseline, &msg("x", 9));
        assert!(!d.active);
    }

    #[test]
    fn length_anomaly_uses_fallback_sigma() {
        let baseline = BaselineSnapshot { length_stddev: None, avg_message_length: 20.0, ..sufficient_baseline() };
        // sigma fallback = 0.3*20 = 6; len 40 -> z = 20/6 = 3.33 >= 2
        let long_text: String = "a".repeat(40);
        let d = length_anomaly(&baseline, &msg(&long_text, 8));
        assert!(d.active);
    }

    #[test]
    fn first_time_url_fixed_score() {
        let baseline = sufficient_baseline();
        let d = first_time_url(&baseline, true);
        assert!(d.active);
        assert_eq!(d.score, 0.7);
    }

    #[test]
    fn first_time_url_inactive_without_url() {
        let baseline = sufficient_baseline();
        let d = first_time_url(&baseline, false);
        assert!(!d.active);
    }
}
