//! End-to-end triage scenarios exercising rule flags and behavioral scoring
//! together, without any model or network dependency.

use phisdebate_triage::{BaselineSnapshot, Message, Sender, Triage, TriageClass, TriageConfig};
use std::collections::{HashMap, HashSet};

fn msg(text: &str, sent_at_unix: i64) -> Message {
    Message { id: "m1".to_string(), sender_id: "s1".to_string(), text: text.to_string(), sent_at_unix }
}

#[test]
fn plain_academic_message_is_safe() {
    let triage = Triage::new(TriageConfig::default());
    let sender = Sender::new("s1");
    let message = msg("Selamat siang, berikut jadwal UAS minggu depan.", 1_700_000_000);

    let report = triage.run(&message, &sender, &HashMap::new());

    assert_eq!(report.class, TriageClass::Safe);
    assert!(report.skip_llm);
    assert_eq!(report.risk_score, 0);
}

#[test]
fn phishing_keywords_plus_urgency_and_caps_escalate_to_high_risk() {
    let triage = Triage::new(TriageConfig::default());
    let sender = Sender::new("s1");
    let message = msg(
        "SEGERA LAKUKAN VERIFIKASI AKUN ANDA SEKARANG ATAU AKUN DIBLOKIR BATAS WAKTU HARI INI JUGA!!!",
        1_700_000_000,
    );

    let report = triage.run(&message, &sender, &HashMap::new());

    assert_eq!(report.class, TriageClass::HighRisk);
    assert!(!report.skip_llm);
    assert!(report.flags.iter().any(|f| f.id == "phishing_keyword"));
    assert!(report.flags.iter().any(|f| f.id == "caps_lock_abuse"));
}

#[test]
fn deviation_from_established_baseline_raises_risk_without_keywords() {
    let triage = Triage::new(TriageConfig::default());
    let baseline = BaselineSnapshot {
        avg_message_length: 40.0,
        length_stddev: Some(5.0),
        typical_hours: HashSet::from([8, 9, 10]),
        url_sharing_rate: 0.0,
        emoji_rate: 0.0,
        total_observed_messages: 200,
    };
    let sender = Sender::with_baseline("s1", baseline);
    // Sent at 3am (hour 3), far outside the typical 8-10 window, with a
    // message far longer than the established average.
    let long_text = "a".repeat(400);
    let message = msg(&long_text, 3 * 3600);

    let report = triage.run(&message, &sender, &HashMap::new());

    assert!(report.risk_score > 0);
    assert!(report.flags.iter().any(|f| f.id.starts_with("behavioral_")));
}

#[test]
fn insufficient_observation_history_suppresses_behavioral_scoring() {
    let triage = Triage::new(TriageConfig::default());
    let baseline = BaselineSnapshot {
        avg_message_length: 40.0,
        length_stddev: Some(5.0),
        typical_hours: HashSet::from([8]),
        url_sharing_rate: 0.0,
        emoji_rate: 0.0,
        total_observed_messages: 2, // below DEFAULT_MIN_OBSERVED_MESSAGES
    };
    let sender = Sender::with_baseline("s1", baseline);
    let message = msg(&"b".repeat(400), 3 * 3600);

    let report = triage.run(&message, &sender, &HashMap::new());

    assert!(!report.flags.iter().any(|f| f.id.starts_with("behavioral_")));
}
