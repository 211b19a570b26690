// lesession - Session Message Search
//
// *La Session* (The Session) - Per-session fuzzy message indexing, ranked search and suggestions

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod fuzzy;
pub mod highlight;
pub mod message;
pub mod metrics;
pub mod query;
pub mod ranking;
pub mod search;
pub mod store;
pub mod suggest;

pub use cache::{CacheKey, CacheSweeper, CachedResult, ResultCache};
pub use config::EngineConfig;
pub use engine::SessionSearchEngine;
pub use error::{Error, Result};
pub use fuzzy::{FuzzyHit, FuzzyIndex, KeyMatch, MatchKey};
pub use highlight::{Highlight, HighlightBuilder};
pub use message::{normalize_message, normalize_messages, FileAttachment, IndexedMessage, MessageMetadata, RawMessage};
pub use metrics::{EngineStats, GlobalStats, MetricsSnapshot, SearchMetrics, SessionStats};
pub use query::QueryNormalizer;
pub use ranking::{RelevanceScorer, Score, SortBy, SortOrder};
pub use search::{SearchExecutor, SearchFilters, SearchHit, SearchOptions, SearchResponse};
pub use store::{AppendReport, IndexReport, SessionIndex, SessionStore};
pub use suggest::{SuggestionEngine, DEFAULT_SUGGESTION_LIMIT};

/// Session search library initialization
pub fn init() {
    let _ = tracing::subscriber::set_default(tracing::subscriber::NoSubscriber::default());
}
