//! Configuration for URL extraction and the security checker.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// TLD suspicion tiers feeding Layer 3's heuristic tariff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TldSuspicion {
    Critical,
    High,
    Medium,
    Low,
}

impl TldSuspicion {
    /// Heuristic contribution in score points, per spec.md's tariff table.
    pub fn contribution(&self) -> f64 {
        match self {
            TldSuspicion::Critical => 0.40,
            TldSuspicion::High => 0.30,
            TldSuspicion::Medium => 0.20,
            TldSuspicion::Low => 0.10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlCheckerConfig {
    /// Hosts known to issue redirects to a different registered domain.
    pub shorteners: HashSet<String>,
    /// Registered suffixes bypassed around reputation checks.
    pub trusted_suffixes: HashSet<String>,
    /// Suspicious TLDs mapped to their severity tier.
    pub suspicious_tlds: Vec<(String, TldSuspicion)>,
    /// Path keywords considered suspicious for Layer 3.
    pub suspicious_path_keywords: HashSet<String>,
    #[serde(with = "duration_millis")]
    pub expand_timeout: Duration,
    pub max_redirects: u32,
    /// Heuristic score at/above which `is_malicious` is set.
    pub heuristic_block_threshold: f64,
    /// External-reputation thresholds, see Layer 4.
    pub reputation: ReputationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationConfig {
    pub min_malicious_engines: u32,
    pub reputation_block_below: f64,
    pub analysis_risk_block_above: f64,
    /// How long a Layer 4 verdict stays cached, per URL.
    #[serde(with = "duration_millis")]
    pub cache_ttl: Duration,
    /// Batch size for external rate limiting.
    pub batch_size: usize,
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            min_malicious_engines: 3,
            reputation_block_below: -50.0,
            analysis_risk_block_above: 0.15,
            cache_ttl: Duration::from_secs(3600),
            batch_size: 4,
        }
    }
}

impl Default for UrlCheckerConfig {
    fn default() -> Self {
        let shorteners = [
            "bit.ly", "tinyurl.com", "s.id", "t.co", "cutt.ly", "goo.gl", "ow.ly", "is.gd",
            "buff.ly", "rebrand.ly", "shorte.st", "adf.ly", "bl.ink", "tiny.cc", "rb.gy",
            "t.ly", "v.gd",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let trusted_suffixes = [
            "google.com",
            "classroom.google.com",
            "docs.google.com",
            "drive.google.com",
            "zoom.us",
            "microsoft.com",
            "office.com",
            "github.com",
            "ac.id",
            "sch.id",
            "go.id",
            "ui.ac.id",
            "itb.ac.id",
            "ugm.ac.id",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let suspicious_tlds = vec![
            ("tk".to_string(), TldSuspicion::Critical),
            ("ml".to_string(), TldSuspicion::Critical),
            ("ga".to_string(), TldSuspicion::Critical),
            ("cf".to_string(), TldSuspicion::Critical),
            ("gq".to_string(), TldSuspicion::Critical),
            ("xyz".to_string(), TldSuspicion::High),
            ("top".to_string(), TldSuspicion::High),
            ("work".to_string(), TldSuspicion::Medium),
            ("click".to_string(), TldSuspicion::Medium),
            ("info".to_string(), TldSuspicion::Low),
            ("biz".to_string(), TldSuspicion::Low),
        ];

        let suspicious_path_keywords = [
            "verify", "verifikasi", "login", "secure", "akun", "suspend", "klaim", "hadiah",
            "undian", "reset-password",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            shorteners,
            trusted_suffixes,
            suspicious_tlds,
            suspicious_path_keywords,
            expand_timeout: Duration::from_secs(10),
            max_redirects: 10,
            heuristic_block_threshold: 0.5,
            reputation: ReputationConfig::default(),
        }
    }
}

impl UrlCheckerConfig {
    pub fn tld_suspicion(&self, tld: &str) -> Option<TldSuspicion> {
        self.suspicious_tlds
            .iter()
            .find(|(t, _)| t.eq_ignore_ascii_case(tld))
            .map(|(_, s)| *s)
    }

    pub fn is_shortener(&self, host: &str) -> bool {
        self.shorteners.iter().any(|s| s.eq_ignore_ascii_case(host))
    }

    /// `host` matches the trust set if it equals, or is a subdomain of, any
    /// configured suffix.
    pub fn is_trusted(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.trusted_suffixes.iter().any(|suffix| {
            host == *suffix || host.ends_with(&format!(".{suffix}"))
        })
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u128(d.as_millis())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}
