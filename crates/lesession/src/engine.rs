// Session Search Engine
//
// *Le Moteur* (The Engine) - Owns every session index, the result cache,
// the cache sweeper and the metrics behind one handle

use crate::cache::{lock, CacheKey, CacheSweeper, ResultCache};
use crate::config::EngineConfig;
use crate::error::{ensure_session_id, Error, Result};
use crate::message::RawMessage;
use crate::metrics::{duration_ms, EngineStats, GlobalStats, SearchMetrics, SessionStats};
use crate::query::QueryNormalizer;
use crate::search::{is_searchable, SearchExecutor, SearchOptions, SearchResponse};
use crate::store::{AppendReport, IndexReport, SessionStore};
use crate::suggest::SuggestionEngine;
use std::sync::{Arc, Mutex};
use std::time::Instant;

/// Per-session fuzzy message search engine
///
/// Mutating operations take `&mut self`; callers sharing an engine across
/// tasks must serialize access themselves.
///
/// When constructed inside a Tokio runtime a background task sweeps expired
/// cache entries every `cleanup_interval_secs`. The task stops on
/// [`destroy`](Self::destroy) or when the engine is dropped.
pub struct SessionSearchEngine {
    config: EngineConfig,
    store: SessionStore,
    cache: Arc<Mutex<ResultCache<SearchResponse>>>,
    metrics: SearchMetrics,
    normalizer: QueryNormalizer,
    executor: SearchExecutor,
    suggestions: SuggestionEngine,
    sweeper: Option<CacheSweeper>,
}

impl SessionSearchEngine {
    /// Create an engine
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let cache = Arc::new(Mutex::new(ResultCache::new(config.cache_timeout())));
        let sweeper = CacheSweeper::spawn(Arc::clone(&cache), config.cleanup_interval());
        if sweeper.is_none() {
            tracing::warn!("No Tokio runtime available, cache entries expire only on lookup");
        }

        Ok(Self {
            store: SessionStore::new(config.max_index_size),
            cache,
            metrics: SearchMetrics::new(),
            normalizer: QueryNormalizer::new()?,
            executor: SearchExecutor::new(config.search_threshold, config.snippet_context_chars),
            suggestions: SuggestionEngine::new(config.suggestion_threshold),
            sweeper,
            config,
        })
    }

    /// Create an engine with the default configuration
    pub fn with_defaults() -> Result<Self> {
        Self::new(EngineConfig::default())
    }

    /// Active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Build (or rebuild) the index of a session
    ///
    /// Cached results of the session are dropped since they describe the
    /// replaced index.
    pub fn index_messages(&mut self, session_id: &str, messages: &[RawMessage]) -> Result<IndexReport> {
        let report = self.store.index_messages(session_id, messages)?;
        lock(&self.cache).invalidate_session(session_id);
        Ok(report)
    }

    /// Append messages to a session and rebuild its index
    ///
    /// Returns `None` for an empty batch. Cached results of the session are
    /// invalidated.
    pub fn add_messages(
        &mut self,
        session_id: &str,
        new_messages: &[RawMessage],
    ) -> Result<Option<AppendReport>> {
        let report = self.store.add_messages(session_id, new_messages)?;

        if report.is_some() {
            let evicted = lock(&self.cache).invalidate_session(session_id);
            tracing::debug!("Invalidated {} cached results for session {}", evicted, session_id);
        }

        Ok(report)
    }

    /// Ranked fuzzy search over a session
    ///
    /// Queries shorter than two characters yield an empty response rather
    /// than an error.
    pub async fn search(
        &mut self,
        session_id: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchResponse> {
        ensure_session_id(session_id)?;

        if !is_searchable(query) {
            let index_size = self.store.get(session_id).map_or(0, |s| s.len());
            return Ok(SearchResponse::empty(session_id, query, index_size));
        }

        let session = self
            .store
            .get(session_id)
            .ok_or_else(|| Error::index_not_found(session_id))?;

        let normalized = self.normalizer.normalize(query);

        let cache_key = if self.config.enable_cache {
            let key = CacheKey::new(session_id, &normalized, options.limit, options.sort_by)?;
            if let Some(cached) = lock(&self.cache).get(&key) {
                self.metrics.record_cache_hit();
                tracing::debug!("Cache hit for session {} query {:?}", session_id, normalized);
                return Ok(cached);
            }
            Some(key)
        } else {
            None
        };

        let started = Instant::now();
        let highlight = options
            .enable_highlighting
            .unwrap_or(self.config.enable_highlighting);
        let page = self.executor.execute(session, &normalized, options, highlight);
        let elapsed = started.elapsed();

        let response = SearchResponse {
            has_more: page.total > options.offset.saturating_add(options.limit),
            results: page.results,
            total: page.total,
            query: query.to_string(),
            session_id: session_id.to_string(),
            took_ms: duration_ms(elapsed),
            index_size: session.len(),
        };

        self.metrics.record_search(elapsed);
        self.metrics.record_cache_miss();

        if let Some(key) = cache_key {
            lock(&self.cache).set(key, response.clone());
        }

        tracing::debug!(
            "Search {:?} in session {}: {} matches in {:.2}ms",
            normalized,
            session_id,
            response.total,
            response.took_ms
        );

        Ok(response)
    }

    /// Autocomplete candidates for a partial query
    ///
    /// Returns an empty list for short partials and for sessions without an
    /// index.
    pub async fn get_suggestions(
        &self,
        session_id: &str,
        partial_query: &str,
        limit: usize,
    ) -> Result<Vec<String>> {
        ensure_session_id(session_id)?;

        Ok(self
            .store
            .get(session_id)
            .map(|session| self.suggestions.suggest(session, partial_query, limit))
            .unwrap_or_default())
    }

    /// Stats for one session, or totals when `session_id` is `None`
    pub fn get_stats(&self, session_id: Option<&str>) -> EngineStats {
        let cache = lock(&self.cache);

        match session_id {
            Some(id) => {
                let session = self.store.get(id);
                EngineStats::Session(SessionStats {
                    session_id: id.to_string(),
                    indexed_messages: session.map_or(0, |s| s.len()),
                    has_index: session.is_some(),
                    cache_entries: cache.session_entries(id),
                })
            }
            None => EngineStats::Global(GlobalStats {
                total_sessions: self.store.session_count(),
                total_indexed_messages: self.store.total_messages(),
                cache_entries: cache.len(),
                metrics: self.metrics.snapshot(),
            }),
        }
    }

    /// Drop the index and cached results of a session
    pub fn clear_session(&mut self, session_id: &str) {
        let existed = self.store.clear_session(session_id);
        lock(&self.cache).invalidate_session(session_id);
        if existed {
            tracing::info!("Cleared session {}", session_id);
        }
    }

    /// Stop the cache sweeper and release every session
    pub fn destroy(&mut self) {
        if let Some(sweeper) = self.sweeper.take() {
            sweeper.stop();
        }
        self.store.clear();
        lock(&self.cache).clear();
        tracing::info!("Session search engine destroyed");
    }

    /// Whether the background cache sweep is active
    pub fn is_sweeping(&self) -> bool {
        self.sweeper.as_ref().is_some_and(CacheSweeper::is_running)
    }
}
