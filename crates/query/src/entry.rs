use std::any::Any;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::AbortHandle;
use weedle_http::HttpRequest;

use crate::{QueryError, RetryPolicy, Tag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Status {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

pub(crate) type Payload = Arc<dyn Any + Send + Sync>;
pub(crate) type DecodeFn = fn(serde_json::Value) -> Result<Payload, QueryError>;

pub(crate) fn decode_as<T>(v: serde_json::Value) -> Result<Payload, QueryError>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    serde_json::from_value::<T>(v)
        .map(|t| Arc::new(t) as Payload)
        .map_err(|e| QueryError::Decode(e.to_string()))
}

/// Immutable view of an entry handed to subscribers.
#[derive(Clone, Default)]
pub(crate) struct EntrySnapshot {
    pub status: Status,
    /// Last successful payload; survives refetches and errors.
    pub data: Option<Payload>,
    pub error: Option<QueryError>,
    pub is_fetching: bool,
    pub stale: bool,
    pub attempts: u32,
    pub updated_at: Option<DateTime<Utc>>,
}

pub(crate) struct Entry {
    pub generation: u64,
    pub request: HttpRequest,
    pub tags: Vec<Tag>,
    pub policy: RetryPolicy,
    pub decode: DecodeFn,
    pub subscribers: usize,
    // Bumped on every (un)subscribe; a pending eviction only fires if it still matches
    pub release: u64,
    pub in_flight: Option<AbortHandle>,
    // Invalidated while a fetch was running
    pub refetch_pending: bool,
    pub state: EntrySnapshot,
    pub snap: Arc<ArcSwap<EntrySnapshot>>,
    epoch: u64,
    epoch_tx: watch::Sender<u64>,
}

impl Entry {
    pub fn new(generation: u64, request: HttpRequest, tags: Vec<Tag>, policy: RetryPolicy, decode: DecodeFn) -> Self {
        let (epoch_tx, _) = watch::channel(0u64);
        Self {
            generation,
            request,
            tags,
            policy,
            decode,
            subscribers: 0,
            release: 0,
            in_flight: None,
            refetch_pending: false,
            state: EntrySnapshot::default(),
            snap: Arc::new(ArcSwap::from_pointee(EntrySnapshot::default())),
            epoch: 0,
            epoch_tx,
        }
    }

    pub fn watch(&self) -> watch::Receiver<u64> { self.epoch_tx.subscribe() }

    pub fn provides_any(&self, targets: &[Tag]) -> bool {
        self.tags.iter().any(|p| targets.iter().any(|t| p.matches(t)))
    }

    /// Swap in the working state and wake subscribers.
    pub fn publish(&mut self) {
        self.snap.store(Arc::new(self.state.clone()));
        self.epoch = self.epoch.wrapping_add(1);
        self.epoch_tx.send_replace(self.epoch);
    }
}
