use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rustc_hash::FxHashSet;
use tracing::debug;

/// Page keys that already finished their first load in this session.
///
/// Cloning shares the set; a new session starts with `SessionStore::new()`.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    loaded: Arc<Mutex<FxHashSet<String>>>,
}

impl SessionStore {
    pub fn new() -> Self { Self::default() }

    fn with<R>(&self, f: impl FnOnce(&mut FxHashSet<String>) -> R) -> R {
        let mut guard = self.loaded.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn is_loaded(&self, key: &str) -> bool { self.with(|s| s.contains(key)) }

    /// Returns true when the key was not marked before.
    pub fn mark_loaded(&self, key: &str) -> bool { self.with(|s| s.insert(key.to_string())) }

    pub fn clear(&self) { self.with(|s| s.clear()) }

    pub fn len(&self) -> usize { self.with(|s| s.len()) }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    /// Placeholder delay to show before a page's first render; `None` once loaded.
    pub fn first_visit_delay(&self, key: &str, delay: Duration) -> Option<Duration> {
        (!self.is_loaded(key)).then_some(delay)
    }

    /// Wait out the first-visit delay (if any) and mark the page loaded.
    /// Returns whether a delay was applied.
    pub async fn first_visit(&self, key: &str, delay: Duration) -> bool {
        let Some(d) = self.first_visit_delay(key, delay) else {
            return false;
        };
        debug!(page = key, delay_ms = %d.as_millis(), "session: first visit");
        tokio::time::sleep(d).await;
        self.mark_loaded(key);
        true
    }
}
