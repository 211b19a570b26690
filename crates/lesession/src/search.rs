// Search execution: match, filter, score, sort, paginate

use crate::fuzzy::{FuzzyHit, MatchKey};
use crate::highlight::{Highlight, HighlightBuilder};
use crate::message::{IndexedMessage, MessageMetadata};
use crate::ranking::{cmp_f64, RelevanceScorer, Score, SortBy, SortOrder};
use crate::store::SessionIndex;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default page size
pub const DEFAULT_LIMIT: usize = 50;

/// Shortest query (after trimming) that is matched at all
pub const MIN_QUERY_CHARS: usize = 2;

/// Post-match filters; every set filter must pass
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    /// Case-insensitive substring of the sender
    pub sender: Option<String>,

    /// Exact message type
    #[serde(rename = "type")]
    pub message_type: Option<String>,

    /// Inclusive lower bound on the message time
    pub date_from: Option<DateTime<Utc>>,

    /// Inclusive upper bound on the message time
    pub date_to: Option<DateTime<Utc>>,

    /// Require an attached file
    pub has_attachment: bool,
}

impl SearchFilters {
    /// Whether a message passes every filter
    ///
    /// Messages without a timestamp fail any date bound.
    pub fn matches(&self, message: &IndexedMessage) -> bool {
        if let Some(sender) = &self.sender {
            if !message.sender.to_lowercase().contains(&sender.to_lowercase()) {
                return false;
            }
        }

        if let Some(message_type) = &self.message_type {
            if &message.message_type != message_type {
                return false;
            }
        }

        if self.date_from.is_some() || self.date_to.is_some() {
            let Some(timestamp) = message.timestamp else {
                return false;
            };
            if self.date_from.is_some_and(|from| timestamp < from) {
                return false;
            }
            if self.date_to.is_some_and(|to| timestamp > to) {
                return false;
            }
        }

        if self.has_attachment && !message.metadata.has_attachment() {
            return false;
        }

        true
    }
}

/// Search options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Page size
    pub limit: usize,

    /// Results skipped before the page
    pub offset: usize,

    /// Include message bodies in results
    pub include_content: bool,

    /// Include message metadata in results
    pub include_metadata: bool,

    /// Build highlight snippets; `None` uses the engine default
    pub enable_highlighting: Option<bool>,

    /// Ordering key
    pub sort_by: SortBy,

    /// Ordering direction
    pub sort_order: SortOrder,

    /// Post-match filters
    pub filters: SearchFilters,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
            include_content: true,
            include_metadata: true,
            enable_highlighting: None,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            filters: SearchFilters::default(),
        }
    }
}

/// Projection of a matched message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    /// Source message identifier
    pub id: String,

    /// Message body, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    /// Author
    pub sender: String,

    /// Message time
    pub timestamp: Option<DateTime<Utc>>,

    /// Message kind
    #[serde(rename = "type")]
    pub message_type: String,

    /// Metadata, when requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MessageMetadata>,
}

/// One ranked search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Matched message
    pub message: MessageView,

    /// Native match score (0 = perfect)
    pub score: f64,

    /// Derived relevance (1 = best)
    pub relevance: f64,

    /// Fields that matched
    pub matched_fields: Vec<MatchKey>,

    /// Content snippets, when highlighting is enabled
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub highlights: Vec<Highlight>,
}

/// Search response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Current page of results
    pub results: Vec<SearchHit>,

    /// Matches surviving the filters, before pagination
    pub total: usize,

    /// Query as supplied by the caller
    pub query: String,

    /// Session searched
    pub session_id: String,

    /// Wall-clock search time in milliseconds
    pub took_ms: f64,

    /// Whether more results exist past this page
    pub has_more: bool,

    /// Messages in the session index
    pub index_size: usize,
}

impl SearchResponse {
    /// Response with no results
    pub fn empty(session_id: &str, query: &str, index_size: usize) -> Self {
        Self {
            results: Vec::new(),
            total: 0,
            query: query.to_string(),
            session_id: session_id.to_string(),
            took_ms: 0.0,
            has_more: false,
            index_size,
        }
    }
}

/// Page of ranked results plus the unpaginated count
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPage {
    /// Results on the requested page
    pub results: Vec<SearchHit>,

    /// Matches surviving the filters
    pub total: usize,
}

struct Candidate<'a> {
    hit: FuzzyHit,
    message: &'a IndexedMessage,
    score: Score,
}

/// Runs a normalized query against a session index
#[derive(Debug, Clone, Copy)]
pub struct SearchExecutor {
    threshold: f64,
    scorer: RelevanceScorer,
    highlighter: HighlightBuilder,
}

impl SearchExecutor {
    /// Create an executor with the given fuzzy tolerance and snippet context
    pub fn new(threshold: f64, snippet_context_chars: usize) -> Self {
        Self {
            threshold,
            scorer: RelevanceScorer::new(),
            highlighter: HighlightBuilder::new(snippet_context_chars),
        }
    }

    /// Match, filter, score, sort and paginate
    pub fn execute(
        &self,
        session: &SessionIndex,
        query: &str,
        options: &SearchOptions,
        highlight: bool,
    ) -> RankedPage {
        let messages = session.messages();

        let mut candidates: Vec<Candidate<'_>> = session
            .index()
            .search(query, self.threshold)
            .into_iter()
            .filter_map(|hit| {
                let message = messages.get(hit.position)?;
                if !options.filters.matches(message) {
                    return None;
                }
                let score = self.scorer.score(hit.score, hit.matched_content());
                Some(Candidate {
                    hit,
                    message,
                    score,
                })
            })
            .collect();

        sort_candidates(&mut candidates, options.sort_by, options.sort_order);

        let total = candidates.len();
        let results = candidates
            .into_iter()
            .skip(options.offset)
            .take(options.limit)
            .map(|c| self.project(c, options, highlight))
            .collect();

        RankedPage { results, total }
    }

    fn project(&self, candidate: Candidate<'_>, options: &SearchOptions, highlight: bool) -> SearchHit {
        let Candidate {
            hit,
            message,
            score,
        } = candidate;

        let highlights = if highlight {
            self.highlighter.build(&message.content, &hit)
        } else {
            Vec::new()
        };

        SearchHit {
            message: MessageView {
                id: message.id.clone(),
                content: options.include_content.then(|| message.content.clone()),
                sender: message.sender.clone(),
                timestamp: message.timestamp,
                message_type: message.message_type.clone(),
                metadata: options.include_metadata.then(|| message.metadata.clone()),
            },
            score: score.native,
            relevance: score.relevance,
            matched_fields: hit.matches.iter().map(|m| m.key).collect(),
            highlights,
        }
    }
}

fn sort_candidates(candidates: &mut [Candidate<'_>], sort_by: SortBy, order: SortOrder) {
    candidates.sort_by(|a, b| {
        let ascending = match sort_by {
            SortBy::Date => a.message.timestamp.cmp(&b.message.timestamp),
            SortBy::Score => cmp_f64(a.score.native, b.score.native),
            SortBy::Relevance => cmp_f64(a.score.relevance, b.score.relevance),
        };
        order.apply(ascending)
    });
}

/// Whether a query is long enough to be matched
pub fn is_searchable(query: &str) -> bool {
    query.trim().chars().count() >= MIN_QUERY_CHARS
}
