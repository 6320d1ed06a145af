use std::marker::PhantomData;
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::entry::{EntrySnapshot, Status};
use crate::{CacheKey, QueryClient, QueryError};

/// What a subscriber sees of an entry at one instant.
#[derive(Debug)]
pub struct QueryResult<T> {
    pub data: Option<Arc<T>>,
    pub status: Status,
    /// Fetching with nothing to show yet.
    pub is_loading: bool,
    /// Any fetch in flight, retries and background refetches included.
    pub is_fetching: bool,
    pub is_error: bool,
    pub is_stale: bool,
    pub error: Option<QueryError>,
    pub attempts: u32,
    pub updated_at: Option<DateTime<Utc>>,
}

impl<T> Clone for QueryResult<T> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            status: self.status,
            is_loading: self.is_loading,
            is_fetching: self.is_fetching,
            is_error: self.is_error,
            is_stale: self.is_stale,
            error: self.error.clone(),
            attempts: self.attempts,
            updated_at: self.updated_at,
        }
    }
}

impl<T: Send + Sync + 'static> QueryResult<T> {
    fn from_snapshot(s: &EntrySnapshot) -> Self {
        let data = s.data.clone().and_then(|d| d.downcast::<T>().ok());
        Self {
            is_loading: s.is_fetching && data.is_none(),
            data,
            status: s.status,
            is_fetching: s.is_fetching,
            is_error: s.status == Status::Error,
            is_stale: s.stale,
            error: s.error.clone(),
            attempts: s.attempts,
            updated_at: s.updated_at,
        }
    }
}

/// A live subscription to one cache entry. Dropping it unsubscribes.
pub struct QueryHandle<T> {
    client: QueryClient,
    key: CacheKey,
    generation: u64,
    snap: Arc<ArcSwap<EntrySnapshot>>,
    epoch_rx: watch::Receiver<u64>,
    active: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> QueryHandle<T> {
    pub(crate) fn new(
        client: QueryClient,
        key: CacheKey,
        generation: u64,
        snap: Arc<ArcSwap<EntrySnapshot>>,
        epoch_rx: watch::Receiver<u64>,
    ) -> Self {
        Self { client, key, generation, snap, epoch_rx, active: true, _marker: PhantomData }
    }

    pub fn key(&self) -> &CacheKey { &self.key }

    pub fn current(&self) -> QueryResult<T> { QueryResult::from_snapshot(&self.snap.load()) }

    /// Wait for the next published change of the entry.
    pub async fn changed(&mut self) -> Result<QueryResult<T>, QueryError> {
        self.epoch_rx.changed().await.map_err(|_| QueryError::Cancelled)?;
        Ok(self.current())
    }

    /// Wait until no fetch is in flight and return that state.
    pub async fn settled(&mut self) -> Result<QueryResult<T>, QueryError> {
        loop {
            let _ = self.epoch_rx.borrow_and_update();
            let fetching = self.snap.load().is_fetching;
            if !fetching {
                return Ok(self.current());
            }
            self.epoch_rx.changed().await.map_err(|_| QueryError::Cancelled)?;
        }
    }

    /// Ask for fresh data. Joins the running fetch if there is one; returns
    /// whether a new request was started.
    pub fn refetch(&self) -> bool { self.client.inner.refetch(&self.key, self.generation) }

    pub fn unsubscribe(&mut self) {
        if std::mem::replace(&mut self.active, false) {
            self.client.inner.unsubscribe(&self.key, self.generation);
        }
    }
}

impl<T> Drop for QueryHandle<T> {
    fn drop(&mut self) {
        if std::mem::replace(&mut self.active, false) {
            self.client.inner.unsubscribe(&self.key, self.generation);
        }
    }
}
