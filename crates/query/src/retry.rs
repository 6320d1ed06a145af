//! Retry tiers and the sequential backoff loop shared by queries and mutations.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;
use weedle_http::{HttpRequest, Transport, TransportError};

use crate::QueryError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RetryTier {
    /// Data the dashboard cannot render without.
    Critical,
    #[default]
    Normal,
    /// Cheap or user-triggered calls.
    Light,
}

impl RetryTier {
    pub fn policy(self) -> RetryPolicy {
        match self {
            RetryTier::Critical => RetryPolicy::new(5, Duration::from_millis(2_000)),
            RetryTier::Normal => RetryPolicy::new(3, Duration::from_millis(1_000)),
            RetryTier::Light => RetryPolicy::new(2, Duration::from_millis(500)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Extra random fraction of each delay, in `[0, 1]`. Zero disables jitter.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self { RetryTier::Normal.policy() }
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self { max_retries, base_delay, jitter: 0.0 }
    }

    pub fn with_jitter(mut self, jitter: f64) -> Self {
        self.jitter = if jitter.is_finite() { jitter.clamp(0.0, 1.0) } else { 0.0 };
        self
    }

    /// Backoff before the `retry`-th retry (1-based): `base * 2^(retry-1)`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exp)
    }

    fn sleep_for(&self, retry: u32) -> Duration {
        let base = self.delay_for(retry);
        if self.jitter <= 0.0 {
            return base;
        }
        let extra = rand::rng().random_range(0.0..=self.jitter);
        base.mul_f64(1.0 + extra)
    }

    /// Total attempts a key that always fails will see.
    pub fn max_attempts(&self) -> u32 { self.max_retries.saturating_add(1) }
}

/// Send `req` until it succeeds, fails with a non-retryable error, or the
/// policy runs out. `on_retry` sees the attempt count so far and the error
/// that triggered the retry.
pub(crate) async fn send_with_retry<F>(
    transport: &dyn Transport,
    req: &HttpRequest,
    policy: RetryPolicy,
    timeout: Duration,
    endpoint: &'static str,
    network_calls: &AtomicU64,
    mut on_retry: F,
) -> Result<serde_json::Value, QueryError>
where
    F: FnMut(u32, &TransportError),
{
    let mut attempts: u32 = 0;
    loop {
        attempts += 1;
        network_calls.fetch_add(1, Ordering::Relaxed);
        let outcome = match tokio::time::timeout(timeout, transport.send(req.clone())).await {
            Ok(r) => r,
            Err(_) => Err(TransportError::Timeout),
        };
        let err = match outcome {
            Ok(v) => return Ok(v),
            Err(e) => e,
        };
        if !err.is_retryable() {
            return Err(QueryError::Rejected(err));
        }
        if attempts > policy.max_retries {
            return Err(QueryError::Exhausted { attempts, last: err });
        }
        let delay = policy.sleep_for(attempts);
        warn!(endpoint, attempt = attempts, delay_ms = %delay.as_millis(), error = %err, "query: retrying");
        metrics::counter!("query_retry_total", 1u64, "endpoint" => endpoint);
        on_retry(attempts, &err);
        tokio::time::sleep(delay).await;
    }
}
