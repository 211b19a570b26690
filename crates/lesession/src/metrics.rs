// Search metrics and stats records

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Counters for executed searches and cache efficiency
#[derive(Debug, Clone, Default)]
pub struct SearchMetrics {
    total_searches: u64,
    total_search_time: Duration,
    cache_hits: u64,
    cache_misses: u64,
}

impl SearchMetrics {
    /// Create empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an executed (uncached) search
    pub fn record_search(&mut self, elapsed: Duration) {
        self.total_searches += 1;
        self.total_search_time += elapsed;
    }

    /// Record a search served from cache
    pub fn record_cache_hit(&mut self) {
        self.cache_hits += 1;
    }

    /// Record a search that had to be executed
    pub fn record_cache_miss(&mut self) {
        self.cache_misses += 1;
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        let total_ms = duration_ms(self.total_search_time);
        let average_ms = if self.total_searches == 0 {
            0.0
        } else {
            total_ms / self.total_searches as f64
        };

        let lookups = self.cache_hits + self.cache_misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        };

        MetricsSnapshot {
            total_searches: self.total_searches,
            total_search_time_ms: total_ms,
            average_search_time_ms: average_ms,
            cache_hits: self.cache_hits,
            cache_misses: self.cache_misses,
            cache_hit_rate: hit_rate,
        }
    }
}

/// Serializable copy of the metrics counters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Searches executed against an index
    pub total_searches: u64,

    /// Cumulative execution time
    pub total_search_time_ms: f64,

    /// Mean execution time
    pub average_search_time_ms: f64,

    /// Searches served from cache
    pub cache_hits: u64,

    /// Searches not served from cache
    pub cache_misses: u64,

    /// `hits / (hits + misses)`, 0 before any lookup
    pub cache_hit_rate: f64,
}

/// Stats for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    /// Session described
    pub session_id: String,

    /// Messages in the session index
    pub indexed_messages: usize,

    /// Whether the session has an index
    pub has_index: bool,

    /// Cached results belonging to the session
    pub cache_entries: usize,
}

/// Stats across every session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalStats {
    /// Indexed sessions
    pub total_sessions: usize,

    /// Messages indexed across all sessions
    pub total_indexed_messages: usize,

    /// Cached results across all sessions
    pub cache_entries: usize,

    /// Search counters
    pub metrics: MetricsSnapshot,
}

/// Result of `get_stats`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EngineStats {
    /// Stats for a single session
    Session(SessionStats),

    /// Totals across all sessions
    Global(GlobalStats),
}

/// Milliseconds as a float, the unit used for search timings
pub(crate) fn duration_ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
