// Autocomplete suggestions from a session index

use crate::search::is_searchable;
use crate::store::SessionIndex;
use std::collections::HashSet;

/// Default number of suggestions
pub const DEFAULT_SUGGESTION_LIMIT: usize = 5;

/// Words must be longer than this to be suggested
const MIN_WORD_CHARS: usize = 2;

/// Suggestion engine
///
/// Uses a looser tolerance than search. Candidates are matched field values
/// followed by content words containing the partial query, in match order
/// and without ranking.
#[derive(Debug, Clone, Copy)]
pub struct SuggestionEngine {
    threshold: f64,
}

impl SuggestionEngine {
    /// Create an engine with the given fuzzy tolerance
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Up to `limit` distinct suggestions for a partial query
    pub fn suggest(&self, session: &SessionIndex, partial: &str, limit: usize) -> Vec<String> {
        let partial = partial.trim();
        if !is_searchable(partial) || limit == 0 {
            return Vec::new();
        }

        let needle = partial.to_lowercase();
        let messages = session.messages();
        let mut seen = HashSet::new();
        let mut suggestions = Vec::new();

        for hit in session.index().search(partial, self.threshold) {
            let values = hit.matches.iter().map(|m| m.value.clone());

            let words = messages
                .get(hit.position)
                .map(|msg| content_words(&msg.content, &needle))
                .unwrap_or_default();

            for candidate in values.chain(words) {
                if seen.insert(candidate.clone()) {
                    suggestions.push(candidate);
                    if suggestions.len() >= limit {
                        return suggestions;
                    }
                }
            }
        }

        suggestions
    }
}

fn content_words(content: &str, needle: &str) -> Vec<String> {
    content
        .split_whitespace()
        .filter(|word| word.chars().count() > MIN_WORD_CHARS)
        .filter(|word| word.to_lowercase().contains(needle))
        .map(str::to_string)
        .collect()
}
