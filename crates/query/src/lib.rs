//! Weedle query: a typed cache over the HTTP transport.
//!
//! Every endpoint is declared once as a `Query` or `Mutation`. The client
//! keeps one entry per `CacheKey`, shares one in-flight request among all
//! subscribers of a key, retries transient failures by tier, and marks
//! entries stale when a mutation invalidates one of their tags.

#![forbid(unsafe_code)]

use std::time::Duration;

use rustc_hash::FxHashMap;
use serde::Serialize;

mod client;
mod endpoint;
mod entry;
mod error;
mod handle;
mod key;
mod retry;

pub use client::QueryClient;
pub use endpoint::{Mutation, Query};
pub use entry::Status;
pub use error::{QueryError, NETWORK_MESSAGE, SERVER_MESSAGE, TIMEOUT_MESSAGE};
pub use handle::{QueryHandle, QueryResult};
pub use key::{CacheKey, Params, Tag};
pub use retry::{RetryPolicy, RetryTier};

pub use weedle_http::{HttpRequest, Method, Transport, TransportError};

#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// How long an unsubscribed entry survives before eviction.
    pub retention: Duration,
    /// Upper bound on a single attempt.
    pub request_timeout: Duration,
    pub refetch_active_on_invalidate: bool,
    /// Random extra fraction added to every backoff delay.
    pub jitter: f64,
    /// Endpoint name → tier, replacing the endpoint's own tier.
    pub tier_overrides: FxHashMap<String, RetryTier>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(60),
            request_timeout: Duration::from_secs(30),
            refetch_active_on_invalidate: true,
            jitter: 0.0,
            tier_overrides: FxHashMap::default(),
        }
    }
}

impl QueryConfig {
    /// Defaults overridden by `WEEDLE_RETENTION_SECS`, `WEEDLE_TIMEOUT_SECS`
    /// and `WEEDLE_RETRY_JITTER`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(secs) = env_parse::<u64>("WEEDLE_RETENTION_SECS") {
            cfg.retention = Duration::from_secs(secs);
        }
        if let Some(secs) = env_parse::<u64>("WEEDLE_TIMEOUT_SECS") {
            cfg.request_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(j) = env_parse::<f64>("WEEDLE_RETRY_JITTER") {
            cfg.jitter = j;
        }
        cfg
    }

    pub fn with_tier(mut self, endpoint: impl Into<String>, tier: RetryTier) -> Self {
        self.tier_overrides.insert(endpoint.into(), tier);
        self
    }

    pub fn policy_for(&self, endpoint: &str, tier: RetryTier) -> RetryPolicy {
        let tier = self.tier_overrides.get(endpoint).copied().unwrap_or(tier);
        tier.policy().with_jitter(self.jitter)
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub in_flight: usize,
    /// Transport calls made since the client was created, retries included.
    pub network_calls: u64,
}
