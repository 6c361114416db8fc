//! Provider-agnostic entry point: retry with backoff, RPM throttling, and
//! a bounded timeout around every call, on top of whichever
//! [`LlmProvider`] is configured.

use crate::error::LlmError;
use crate::provider::{GenerationRequest, GenerationResponse, LlmProvider};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub max_retries: u32,
    pub base_backoff_ms: u64,
    pub max_backoff_ms: u64,
    #[serde(with = "duration_millis")]
    pub call_timeout: Duration,
    /// Requests-per-minute ceiling; also used to size the throttling
    /// semaphore (`max_rpm` permits refreshed every minute would require a
    /// token-bucket task — we instead bound concurrent in-flight calls,
    /// which is the cheaper approximation the teacher's healthcheck client
    /// itself makes via a plain concurrency cap).
    pub max_rpm: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff_ms: 200,
            max_backoff_ms: 5_000,
            call_timeout: Duration::from_secs(45),
            max_rpm: 30,
        }
    }
}

pub struct LLMGateway {
    provider: Arc<dyn LlmProvider>,
    config: GatewayConfig,
    throttle: Semaphore,
    requests_issued: AtomicU32,
}

impl LLMGateway {
    pub fn new(provider: Arc<dyn LlmProvider>, config: GatewayConfig) -> Self {
        let permits = config.max_rpm.max(1);
        Self { provider, throttle: Semaphore::new(permits), config, requests_issued: AtomicU32::new(0) }
    }

    pub fn requests_issued(&self) -> u32 {
        self.requests_issued.load(Ordering::Relaxed)
    }

    /// Run one generation with retry-with-backoff-and-jitter around
    /// transient transport failures, and a bounded timeout per attempt.
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let _permit = self.throttle.acquire().await.expect("throttle semaphore closed");
        self.requests_issued.fetch_add(1, Ordering::Relaxed);

        let mut attempt = 0u32;
        loop {
            let call = self.provider.generate(request.clone_for_retry());
            let outcome = tokio::time::timeout(self.config.call_timeout, call).await;

            let result = match outcome {
                Ok(inner) => inner,
                Err(_) => Err(LlmError::Timeout(self.config.call_timeout.as_millis() as u64)),
            };

            match result {
                Ok(response) => return Ok(response),
                Err(err) if attempt < self.config.max_retries && is_retryable(&err) => {
                    attempt += 1;
                    let delay = backoff_with_jitter(attempt, self.config.base_backoff_ms, self.config.max_backoff_ms);
                    warn!(provider = self.provider.name(), attempt, error = %err, "retrying LLM call");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    debug!(provider = self.provider.name(), attempt, error = %err, "LLM call failed, no more retries");
                    return Err(if attempt >= self.config.max_retries {
                        LlmError::RetriesExhausted(self.config.max_retries)
                    } else {
                        err
                    });
                }
            }
        }
    }
}

fn is_retryable(err: &LlmError) -> bool {
    matches!(err, LlmError::Timeout(_) | LlmError::Transport(_) | LlmError::UnexpectedStatus(_))
}

fn backoff_with_jitter(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    let factor = 1u64.checked_shl(attempt.min(20)).unwrap_or(u64::MAX);
    let base = base_ms.saturating_mul(factor);
    let delay = base.min(max_ms);
    let jitter = rand::random::<u64>() % (delay / 2 + 1);
    Duration::from_millis(delay + jitter)
}

impl GenerationRequest {
    fn clone_for_retry(&self) -> Self {
        Self {
            system_prompt: self.system_prompt.clone(),
            user_prompt: self.user_prompt.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            require_structured: self.require_structured,
        }
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
