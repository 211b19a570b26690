// Result Cache
//
// *Le Cache* (The Cache) - Time-bounded memoization of search results

use crate::error::Result;
use crate::ranking::SortBy;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Cache key for one search
///
/// Only `limit` and `sort_by` of the search options take part in the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Session the result belongs to
    pub session_id: String,

    /// Query text
    pub query: String,

    /// Hash of the key-relevant options
    pub options_hash: String,
}

#[derive(Serialize)]
struct KeyOptions {
    limit: usize,
    sort_by: SortBy,
}

impl CacheKey {
    /// Build a key from a session, query and the key-relevant options
    pub fn new(session_id: &str, query: &str, limit: usize, sort_by: SortBy) -> Result<Self> {
        let bytes = serde_json::to_vec(&KeyOptions { limit, sort_by })?;
        let hash = blake3::hash(&bytes).to_hex();

        Ok(Self {
            session_id: session_id.to_string(),
            query: query.to_string(),
            options_hash: hash.as_str()[..16].to_string(),
        })
    }
}

/// Cached payload with its creation time
#[derive(Debug, Clone)]
pub struct CachedResult<T> {
    /// Stored payload
    pub data: T,

    /// When the payload was stored
    pub created_at: Instant,
}

/// TTL cache of search results
#[derive(Debug)]
pub struct ResultCache<T> {
    entries: HashMap<CacheKey, CachedResult<T>>,
    timeout: Duration,
}

impl<T: Clone> ResultCache<T> {
    /// Create a cache whose entries live for `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            timeout,
        }
    }

    /// Fetch a live entry, evicting it if expired
    pub fn get(&mut self, key: &CacheKey) -> Option<T> {
        let expired = {
            let entry = self.entries.get(key)?;
            entry.created_at.elapsed() >= self.timeout
        };

        if expired {
            self.entries.remove(key);
            return None;
        }

        self.entries.get(key).map(|e| e.data.clone())
    }

    /// Store an entry, replacing any previous one
    pub fn set(&mut self, key: CacheKey, data: T) {
        self.entries.insert(
            key,
            CachedResult {
                data,
                created_at: Instant::now(),
            },
        );
    }

    /// Evict every entry of a session, returning how many were removed
    pub fn invalidate_session(&mut self, session_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| key.session_id != session_id);
        before - self.entries.len()
    }

    /// Evict every expired entry, returning how many were removed
    pub fn sweep(&mut self) -> usize {
        let timeout = self.timeout;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.created_at.elapsed() < timeout);
        before - self.entries.len()
    }

    /// Entries belonging to a session
    pub fn session_entries(&self, session_id: &str) -> usize {
        self.entries
            .keys()
            .filter(|key| key.session_id == session_id)
            .count()
    }

    /// Number of stored entries, live or not yet swept
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Lock a shared cache, recovering the data from a poisoned lock
pub(crate) fn lock<T>(cache: &Mutex<T>) -> MutexGuard<'_, T> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Background task evicting expired cache entries on a fixed period
///
/// Owned by the engine: created at construction, aborted on `stop` or drop.
#[derive(Debug)]
pub struct CacheSweeper {
    handle: JoinHandle<()>,
}

impl CacheSweeper {
    /// Start sweeping `cache` every `period`
    ///
    /// Returns `None` when called outside a Tokio runtime.
    pub fn spawn<T>(cache: Arc<Mutex<ResultCache<T>>>, period: Duration) -> Option<Self>
    where
        T: Clone + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().ok()?;

        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let removed = lock(&cache).sweep();
                if removed > 0 {
                    tracing::debug!("Cache sweep evicted {} expired entries", removed);
                }
            }
        });

        Some(Self { handle })
    }

    /// Stop sweeping
    pub fn stop(&self) {
        self.handle.abort();
    }

    /// Whether the sweep task is still alive
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for CacheSweeper {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
