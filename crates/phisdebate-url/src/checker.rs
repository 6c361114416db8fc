//! # URL Security Checker
//!
//! Four ordered layers, evaluated against the *expanded* URL so that a
//! shortener fronting a trusted domain is recognized as such:
//!
//! 1. **Expansion** — follow a known shortener's redirect chain.
//! 2. **Trust set** — bypass everything else if the final host is registered
//!    academic/corporate infrastructure.
//! 3. **Heuristic** — an additive, clamped risk tariff over cheap local
//!    signals (IP literals, punycode, shorteners, suspicious TLDs, ...).
//! 4. **External reputation** — a rate-limited, cached call to a pluggable
//!    reputation backend.
//!
//! Evaluation short-circuits after Layer 2: a whitelisted URL never reaches
//! the heuristic or external layers. The final risk is `max(heuristic,
//! external)` and `is_malicious` is their logical OR.

use crate::config::UrlCheckerConfig;
use crate::error::UrlCheckError;
use crate::models::{CheckSource, RedirectHop, URLCheckResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, warn};

/// A pluggable external reputation backend (§6.4). The checker never hard-
/// depends on a concrete vendor; tests and offline deployments can run
/// against [`NullReputationService`].
#[async_trait::async_trait]
pub trait ReputationService: Send + Sync {
    async fn check_url(&self, url: &str) -> Result<ReputationVerdict, UrlCheckError>;
}

/// Raw signal returned by a reputation backend, before combination with the
/// local heuristic score.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReputationVerdict {
    pub malicious_engines: u32,
    pub suspicious_engines: u32,
    pub engines_total: u32,
    /// Vendor-specific numeric reputation, when available. Strongly
    /// negative values (below `reputation.reputation_block_below`) count as
    /// malicious independent of the engine tally.
    pub reputation: Option<f64>,
}

/// Always reports "unknown" and never errors. The default backend and the
/// one used when no API key is configured — Layer 4 degrades to a no-op
/// rather than block the pipeline on missing credentials.
pub struct NullReputationService;

#[async_trait::async_trait]
impl ReputationService for NullReputationService {
    async fn check_url(&self, _url: &str) -> Result<ReputationVerdict, UrlCheckError> {
        Ok(ReputationVerdict::default())
    }
}

struct CacheEntry {
    result: URLCheckResult,
    stamped_at: Instant,
}

/// The four-layer checker. Owns the in-process URL cache; per spec.md §9
/// this cache belongs here, not to the pipeline, to preserve single
/// ownership of the cache key space.
pub struct URLSecurityChecker {
    config: UrlCheckerConfig,
    http: reqwest::Client,
    reputation: Arc<dyn ReputationService>,
    cache: Mutex<HashMap<String, CacheEntry>>,
    fan_out: Semaphore,
}

impl URLSecurityChecker {
    pub fn new(config: UrlCheckerConfig) -> Self {
        Self::with_reputation(config, Arc::new(NullReputationService))
    }

    pub fn with_reputation(config: UrlCheckerConfig, reputation: Arc<dyn ReputationService>) -> Self {
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(config.expand_timeout)
            .build()
            .expect("reqwest client configuration is valid");

        let concurrency = config.reputation.batch_size.max(1);
        Self {
            config,
            http,
            reputation,
            cache: Mutex::new(HashMap::new()),
            fan_out: Semaphore::new(concurrency),
        }
    }

    /// Check a single URL, consulting and updating the cache.
    pub async fn check(&self, url: &str) -> URLCheckResult {
        if let Some(cached) = self.cached(url).await {
            debug!(url, "url check cache hit");
            return cached;
        }

        let result = self.check_uncached(url).await;
        self.cache
            .lock()
            .await
            .insert(url.to_string(), CacheEntry { result: result.clone(), stamped_at: Instant::now() });
        result
    }

    /// Check many URLs concurrently, bounded by the configured reputation
    /// batch size so Layer 4's rate limit is respected even under fan-out.
    pub async fn check_many(&self, urls: &[String]) -> HashMap<String, URLCheckResult> {
        use futures::stream::{self, StreamExt};

        let results: Vec<(String, URLCheckResult)> = stream::iter(urls.iter().cloned())
            .map(|u| async move {
                let _permit = self.fan_out.acquire().await;
                let result = self.check(&u).await;
                (u, result)
            })
            .buffer_unordered(self.config.reputation.batch_size.max(1))
            .collect()
            .await;

        results.into_iter().collect()
    }

    async fn cached(&self, url: &str) -> Option<URLCheckResult> {
        let cache = self.cache.lock().await;
        let entry = cache.get(url)?;
        if entry.stamped_at.elapsed() < self.config.reputation.cache_ttl {
            Some(entry.result.clone())
        } else {
            None
        }
    }

    async fn check_uncached(&self, url: &str) -> URLCheckResult {
        let host = match url::Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_string)) {
            Some(h) => h.to_ascii_lowercase(),
            None => {
                warn!(url, "could not parse url for security check");
                return URLCheckResult {
                    original_url: url.to_string(),
                    expanded_url: None,
                    redirect_chain: Vec::new(),
                    is_malicious: false,
                    risk_score: 0.0,
                    source: CheckSource::Heuristic,
                };
            }
        };

        // Layer 1: expansion.
        let (final_url, chain, expand_failed) = if self.config.is_shortener(&host) {
            match self.expand(url).await {
                Ok((final_url, chain)) => (final_url, chain, false),
                Err(e) => {
                    warn!(url, error = %e, "url expansion failed, degrading");
                    return URLCheckResult::expand_failed(url);
                }
            }
        } else {
            (url.to_string(), Vec::new(), false)
        };

        if expand_failed {
            return URLCheckResult::expand_failed(url);
        }

        // Layer 2: trust set, evaluated against the expanded URL.
        let final_host = url::Url::parse(&final_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or(host.clone());

        if self.config.is_trusted(&final_host) {
            let mut result = URLCheckResult::whitelisted(url, Some(final_url.clone()));
            result.redirect_chain = chain;
            return result;
        }

        // Layer 3: heuristic.
        let heuristic = self.heuristic_score(&final_url, &final_host);

        // Layer 4: external reputation.
        let external = self.reputation_score(&final_url).await;

        let risk_score = heuristic.max(external.map(|r| r.0).unwrap_or(0.0));
        let is_malicious =
            risk_score >= self.config.heuristic_block_threshold || external.map(|r| r.1).unwrap_or(false);

        let source = match external {
            Some(_) if heuristic > 0.0 => CheckSource::HeuristicExternal,
            Some(_) => CheckSource::External,
            None => CheckSource::Heuristic,
        };

        URLCheckResult {
            original_url: url.to_string(),
            expanded_url: if chain.is_empty() { None } else { Some(final_url) },
            redirect_chain: chain,
            is_malicious,
            risk_score,
            source,
        }
    }

    async fn expand(&self, url: &str) -> Result<(String, Vec<RedirectHop>), UrlCheckError> {
        let mut current = url.to_string();
        let mut chain = Vec::new();

        for _ in 0..self.config.max_redirects {
            let resp = match self.http.head(&current).send().await {
                Ok(r) => r,
                Err(_) => self
                    .http
                    .get(&current)
                    .send()
                    .await
                    .map_err(|e| UrlCheckError::ExpansionFailed(e.to_string()))?,
            };

            let status = resp.status();
            if status.is_redirection() {
                let location = resp
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| UrlCheckError::ExpansionFailed("redirect missing Location".into()))?
                    .to_string();
                chain.push(RedirectHop { url: current.clone(), status: status.as_u16() });
                current = location;
                continue;
            }

            return Ok((current, chain));
        }

        Err(UrlCheckError::TooManyRedirects(self.config.max_redirects))
    }

    fn heuristic_score(&self, final_url: &str, host: &str) -> f64 {
        let mut score = 0.0;

        if host.parse::<std::net::IpAddr>().is_ok() {
            score += 0.30;
        }
        if host.starts_with("xn--") || host.split('.').any(|label| label.starts_with("xn--")) {
            score += 0.25;
        }
        if final_url.contains('@') || final_url.contains('!') {
            score += 0.20;
        }
        if self.config.is_shortener(host) {
            score += 0.20;
        }
        if host.matches('.').count() > 3 {
            score += 0.15;
        }

        let tld = host.rsplit('.').next().unwrap_or(host);
        if let Some(suspicion) = self.config.tld_suspicion(tld) {
            score += suspicion.contribution();
        }

        let path = url::Url::parse(final_url)
            .map(|u| u.path().to_ascii_lowercase())
            .unwrap_or_default();
        if self
            .config
            .suspicious_path_keywords
            .iter()
            .any(|kw| path.contains(kw.as_str()))
        {
            score += 0.10;
        }

        if !final_url.starts_with("https://") {
            score += 0.10;
        }

        let digit_count = host.chars().filter(|c| c.is_ascii_digit()).count();
        if host.len() > 0 && (digit_count as f64 / host.len() as f64) > 0.3 {
            score += 0.10;
        }

        score.clamp(0.0, 1.0)
    }

    async fn reputation_score(&self, url: &str) -> Option<(f64, bool)> {
        match self.reputation.check_url(url).await {
            Ok(verdict) if verdict.engines_total > 0 => {
                let cfg = &self.config.reputation;
                let analysis_risk = (verdict.malicious_engines as f64
                    + 0.5 * verdict.suspicious_engines as f64)
                    / verdict.engines_total as f64;

                let malicious = verdict.malicious_engines >= cfg.min_malicious_engines
                    || verdict.reputation.map(|r| r < cfg.reputation_block_below).unwrap_or(false)
                    || analysis_risk > cfg.analysis_risk_block_above;

                Some((analysis_risk.clamp(0.0, 1.0), malicious))
            }
            Ok(_) => None,
            Err(e) => {
                warn!(url, error = %e, "reputation lookup failed, heuristic stands alone");
                None
            }
        }
    }
}

impl Default for URLSecurityChecker {
    fn default() -> Self {
        Self::new(UrlCheckerConfig::default())
    }
}
