//! Retry/backoff executor for a single model.
//!
//! Only `AiError::RateLimited` is retried. Quota exhaustion and every other
//! failure are returned after the first attempt so the orchestrator can decide
//! whether to fall back.

use std::time::Duration;

use tracing::{error, info, warn};

use crate::ai::cost::{format_cost, PricingTable};
use crate::ai::error::AiError;
use crate::ai::{GenerationResult, GenerativeBackend};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total attempts = `max_retries + 1`.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            multiplier: 2.0,
            max_delay: Duration::from_millis(10_000),
        }
    }
}

impl RetryPolicy {
    /// `min(base × multiplier^attempt, max)` for a zero-based attempt number. No jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as f64;
        let delay_ms = base_ms * self.multiplier.powi(attempt as i32);
        let capped = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }
}

/// Runs one generation against `model`, retrying rate-limit failures with exponential backoff.
///
/// On success the cost is estimated from the actual prompt and response text.
/// After the final retry the last `RateLimited` error is returned unchanged.
pub async fn generate_with_retry(
    backend: &dyn GenerativeBackend,
    model: &str,
    prompt: &str,
    policy: &RetryPolicy,
    pricing: &PricingTable,
) -> Result<GenerationResult, AiError> {
    let total_attempts = policy.max_retries + 1;

    let estimated = pricing.estimate_cost(model, prompt, "");
    info!(
        model,
        estimated_cost = %format_cost(estimated),
        "Starting generation request"
    );

    let mut attempt = 0;
    loop {
        info!(model, attempt = attempt + 1, total_attempts, "Generation attempt");

        match backend.generate(model, prompt).await {
            Ok(text) => {
                let estimated_cost = pricing.estimate_cost(model, prompt, &text);
                info!(
                    model,
                    attempt = attempt + 1,
                    cost = %format_cost(estimated_cost),
                    "Generation succeeded"
                );
                return Ok(GenerationResult {
                    text,
                    estimated_cost,
                    model: model.to_string(),
                });
            }
            Err(e) if e.is_rate_limited() => {
                if attempt >= policy.max_retries {
                    error!(
                        model,
                        total_attempts, "Exhausted all attempts due to rate limiting"
                    );
                    return Err(e);
                }
                let delay = policy.delay_for(attempt);
                warn!(
                    model,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Rate limited, backing off before retry"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_quota_exhausted() {
                    error!(model, "Quota exhausted; not retrying on this model");
                } else {
                    error!(model, attempt = attempt + 1, error = %e, "Non-retryable generation failure");
                }
                return Err(e);
            }
        }
    }
}
