use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use rustc_hash::FxHashMap;
use tracing::{debug, error, info};
use weedle_http::Transport;

use crate::entry::{decode_as, Entry, Payload, Status};
use crate::retry::send_with_retry;
use crate::{CacheKey, CacheStats, Mutation, Query, QueryConfig, QueryError, QueryHandle, Tag};

type EntryMap = FxHashMap<CacheKey, Entry>;

/// Shared, cheaply cloneable cache client.
///
/// Subscribing and refetching spawn tokio tasks, so they must run inside a
/// tokio runtime.
#[derive(Clone)]
pub struct QueryClient {
    pub(crate) inner: Arc<Inner>,
}

pub(crate) struct Inner {
    transport: Arc<dyn Transport>,
    config: QueryConfig,
    entries: Mutex<EntryMap>,
    next_generation: AtomicU64,
    network_calls: AtomicU64,
}

impl QueryClient {
    pub fn new(transport: Arc<dyn Transport>, config: QueryConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport,
                config,
                entries: Mutex::new(FxHashMap::default()),
                next_generation: AtomicU64::new(1),
                network_calls: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &QueryConfig { &self.inner.config }

    /// Attach to the entry for `args`, starting a fetch if the entry has no
    /// usable data and nothing is in flight.
    pub fn subscribe<Q: Query>(&self, args: &Q::Args) -> QueryHandle<Q::Output> {
        let key = CacheKey::new(Q::NAME, Q::params(args));
        let mut entries = self.inner.lock();
        let entry = entries.entry(key.clone()).or_insert_with(|| {
            let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
            let policy = self.inner.config.policy_for(Q::NAME, Q::TIER);
            debug!(key = %key, generation, "query: new entry");
            Entry::new(generation, Q::request(args), Q::provides(args), policy, decode_as::<Q::Output>)
        });
        entry.subscribers += 1;
        entry.release = entry.release.wrapping_add(1);

        let needs_fetch = matches!(entry.state.status, Status::Idle | Status::Error) || entry.state.stale;
        if entry.in_flight.is_some() {
            debug!(key = %key, "query: joined in-flight request");
            metrics::counter!("query_dedup_total", 1u64, "endpoint" => Q::NAME);
        } else if needs_fetch {
            self.inner.start_fetch(&key, entry);
        } else {
            debug!(key = %key, "query: cache hit");
        }
        QueryHandle::new(self.clone(), key, entry.generation, Arc::clone(&entry.snap), entry.watch())
    }

    /// Subscribe, wait for the entry to settle, unsubscribe.
    pub async fn fetch<Q: Query>(&self, args: &Q::Args) -> Result<Arc<Q::Output>, QueryError> {
        let mut handle = self.subscribe::<Q>(args);
        let result = handle.settled().await;
        handle.unsubscribe();
        let result = result?;
        if result.is_error {
            return Err(result.error.unwrap_or(QueryError::Cancelled));
        }
        result.data.ok_or(QueryError::Cancelled)
    }

    /// Run a mutation under its tier policy, then invalidate its tags.
    pub async fn mutate<M: Mutation>(&self, args: &M::Args) -> Result<M::Output, QueryError> {
        let t0 = Instant::now();
        let req = M::request(args);
        let policy = self.inner.config.policy_for(M::NAME, M::TIER);
        let sent = send_with_retry(
            self.inner.transport.as_ref(),
            &req,
            policy,
            self.inner.config.request_timeout,
            M::NAME,
            &self.inner.network_calls,
            |_, _| {},
        )
        .await;
        let value = match sent {
            Ok(v) => v,
            Err(e) => {
                error!(mutation = M::NAME, error = %e, "query: mutation failed");
                return Err(e);
            }
        };
        // The server state changed even if the body turns out to be unreadable
        let hit = self.invalidate(&M::invalidates(args));
        info!(mutation = M::NAME, invalidated = hit, took_ms = %t0.elapsed().as_millis(), "query: mutation ok");
        serde_json::from_value(value).map_err(|e| QueryError::Decode(e.to_string()))
    }

    /// Mark every entry providing one of `tags` stale. Entries that are being
    /// watched refetch right away; the rest refetch on their next subscribe.
    pub fn invalidate(&self, tags: &[Tag]) -> usize {
        if tags.is_empty() {
            return 0;
        }
        let refetch = self.inner.config.refetch_active_on_invalidate;
        let mut entries = self.inner.lock();
        let mut hit = 0usize;
        for (key, entry) in entries.iter_mut() {
            if !entry.provides_any(tags) {
                continue;
            }
            hit += 1;
            entry.state.stale = true;
            if refetch && entry.subscribers > 0 {
                if entry.in_flight.is_some() {
                    entry.refetch_pending = true;
                } else {
                    self.inner.start_fetch(key, entry);
                    continue;
                }
            }
            entry.publish();
        }
        debug!(tags = ?tags, hit, "query: invalidated");
        hit
    }

    /// Abort in-flight fetches and drop every entry. Existing handles see
    /// `QueryError::Cancelled` on their next wait.
    pub fn reset(&self) {
        let mut entries = self.inner.lock();
        let dropped = entries.len();
        for (_, entry) in entries.drain() {
            if let Some(task) = entry.in_flight {
                task.abort();
            }
        }
        info!(dropped, "query: cache reset");
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.inner.lock();
        CacheStats {
            entries: entries.len(),
            in_flight: entries.values().filter(|e| e.in_flight.is_some()).count(),
            network_calls: self.inner.network_calls.load(Ordering::Relaxed),
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, EntryMap> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_fetch(self: &Arc<Self>, key: &CacheKey, entry: &mut Entry) {
        entry.refetch_pending = false;
        entry.state.is_fetching = true;
        entry.state.attempts = 0;
        if entry.state.data.is_none() {
            entry.state.status = Status::Loading;
        }
        entry.publish();
        metrics::counter!("query_fetch_total", 1u64, "endpoint" => key.endpoint);

        let inner = Arc::clone(self);
        let key = key.clone();
        let generation = entry.generation;
        let req = entry.request.clone();
        let policy = entry.policy;
        let decode = entry.decode;
        let task = tokio::spawn(async move {
            let t0 = Instant::now();
            let result = send_with_retry(
                inner.transport.as_ref(),
                &req,
                policy,
                inner.config.request_timeout,
                key.endpoint,
                &inner.network_calls,
                |attempts, _| inner.note_attempts(&key, generation, attempts),
            )
            .await
            .and_then(decode);
            metrics::histogram!("query_fetch_ms", t0.elapsed().as_secs_f64() * 1_000.0, "endpoint" => key.endpoint);
            inner.finish_fetch(&key, generation, result, t0);
        });
        entry.in_flight = Some(task.abort_handle());
    }

    fn note_attempts(&self, key: &CacheKey, generation: u64, attempts: u32) {
        let mut entries = self.lock();
        if let Some(entry) = entries.get_mut(key).filter(|e| e.generation == generation) {
            entry.state.attempts = attempts;
            entry.publish();
        }
    }

    fn finish_fetch(self: &Arc<Self>, key: &CacheKey, generation: u64, result: Result<Payload, QueryError>, t0: Instant) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key).filter(|e| e.generation == generation) else {
            debug!(key = %key, generation, "query: dropping response for a replaced entry");
            return;
        };
        entry.in_flight = None;
        entry.state.is_fetching = false;
        entry.state.attempts += 1;
        match result {
            Ok(data) => {
                entry.state.data = Some(data);
                entry.state.error = None;
                entry.state.status = Status::Success;
                entry.state.stale = entry.refetch_pending;
                entry.state.updated_at = Some(chrono::Utc::now());
                info!(key = %key, attempts = entry.state.attempts, took_ms = %t0.elapsed().as_millis(), "query: fetch ok");
            }
            Err(e) => {
                error!(key = %key, attempts = entry.state.attempts, error = %e, "query: fetch failed");
                entry.state.error = Some(e);
                entry.state.status = Status::Error;
            }
        }
        entry.publish();

        if entry.subscribers == 0 {
            self.schedule_release(&mut entries, key);
        } else if entry.refetch_pending {
            self.start_fetch(key, entry);
        }
    }

    pub(crate) fn refetch(self: &Arc<Self>, key: &CacheKey, generation: u64) -> bool {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key).filter(|e| e.generation == generation) else {
            return false;
        };
        if entry.in_flight.is_some() {
            metrics::counter!("query_dedup_total", 1u64, "endpoint" => key.endpoint);
            return false;
        }
        self.start_fetch(key, entry);
        true
    }

    pub(crate) fn unsubscribe(self: &Arc<Self>, key: &CacheKey, generation: u64) {
        let mut entries = self.lock();
        let Some(entry) = entries.get_mut(key).filter(|e| e.generation == generation) else {
            return;
        };
        entry.subscribers = entry.subscribers.saturating_sub(1);
        if entry.subscribers == 0 {
            self.schedule_release(&mut entries, key);
        }
    }

    /// Evict an unwatched entry once `retention` passes, unless it is
    /// resubscribed or a fetch is still running.
    fn schedule_release(self: &Arc<Self>, entries: &mut EntryMap, key: &CacheKey) {
        let Some(entry) = entries.get_mut(key) else { return };
        if entry.subscribers > 0 || entry.in_flight.is_some() {
            return;
        }
        entry.release = entry.release.wrapping_add(1);
        let token = entry.release;
        let generation = entry.generation;
        let retention = self.config.retention;
        let runtime = tokio::runtime::Handle::try_current();
        if retention.is_zero() || runtime.is_err() {
            entries.remove(key);
            debug!(key = %key, "query: evicted");
            return;
        }
        let Ok(runtime) = runtime else { return };
        let weak = Arc::downgrade(self);
        let key = key.clone();
        runtime.spawn(async move {
            tokio::time::sleep(retention).await;
            let Some(inner) = weak.upgrade() else { return };
            let mut entries = inner.lock();
            let expired = entries.get(&key).is_some_and(|e| {
                e.generation == generation && e.release == token && e.subscribers == 0 && e.in_flight.is_none()
            });
            if expired {
                entries.remove(&key);
                debug!(key = %key, "query: evicted");
            }
        });
    }
}
