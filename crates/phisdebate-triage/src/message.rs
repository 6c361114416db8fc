//! Message and sender identity types shared by every pipeline stage.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An immutable chat message as delivered by the chat adapter. Never
/// mutated inside the detection pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Stable identifier from the source chat (used for idempotent
    /// re-delivery, not interpreted by the pipeline).
    pub id: String,
    pub sender_id: String,
    pub text: String,
    /// Unix epoch seconds. The hour-of-day component drives time-anomaly
    /// scoring in [`crate::baseline`].
    pub sent_at_unix: i64,
}

impl Message {
    pub fn hour_of_day(&self) -> u8 {
        ((self.sent_at_unix.rem_euclid(86_400)) / 3600) as u8
    }

    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_caps_lock_abuse(&self) -> bool {
        let letters: Vec<char> = self.text.chars().filter(|c| c.is_alphabetic()).collect();
        if letters.len() < 10 {
            return false;
        }
        let upper = letters.iter().filter(|c| c.is_uppercase()).count();
        (upper as f64 / letters.len() as f64) > 0.5
    }

    pub fn emoji_count(&self) -> usize {
        self.text
            .chars()
            .filter(|c| {
                let cp = *c as u32;
                (0x1F300..=0x1FAFF).contains(&cp) || (0x2600..=0x27BF).contains(&cp)
            })
            .count()
    }

    pub fn excessive_punctuation(&self) -> bool {
        self.text.matches(|c| c == '!' || c == '?').count() >= 3
    }
}

/// A sender's historical posting profile, as loaded from the persistence
/// collaborator (§6.5). Read once per message and treated as immutable for
/// the lifetime of that message's pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineSnapshot {
    pub avg_message_length: f64,
    pub length_stddev: Option<f64>,
    pub typical_hours: HashSet<u8>,
    pub url_sharing_rate: f64,
    pub emoji_rate: f64,
    pub total_observed_messages: u64,
}

impl BaselineSnapshot {
    pub fn empty() -> Self {
        Self {
            avg_message_length: 0.0,
            length_stddev: None,
            typical_hours: HashSet::new(),
            url_sharing_rate: 0.0,
            emoji_rate: 0.0,
            total_observed_messages: 0,
        }
    }

    pub fn is_sufficient(&self, min_observed_messages: u64) -> bool {
        self.total_observed_messages >= min_observed_messages
    }
}

/// A sender identity plus its optional baseline. Absence of a baseline (or
/// one below the sufficiency threshold) is a first-class state, not an
/// error — it simply suppresses behavioral-anomaly scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sender {
    pub id: String,
    pub baseline: Option<BaselineSnapshot>,
}

impl Sender {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), baseline: None }
    }

    pub fn with_baseline(id: impl Into<String>, baseline: BaselineSnapshot) -> Self {
        Self { id: id.into(), baseline: Some(baseline) }
    }
}
