// Highlight reconstruction from match offsets

use crate::fuzzy::{FuzzyHit, MatchKey};
use serde::{Deserialize, Serialize};

/// Snippet of message content around one match
///
/// All offsets are character offsets into the message content.
/// `start_index..end_index` is the snippet window (end exclusive) and
/// `original_start..=original_end` is the matched span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Highlight {
    /// Content window around the match
    pub snippet: String,

    /// Window start
    pub start_index: usize,

    /// Window end (exclusive)
    pub end_index: usize,

    /// First matched character
    pub original_start: usize,

    /// Last matched character
    pub original_end: usize,
}

/// Builds highlight snippets from content match ranges
#[derive(Debug, Clone, Copy)]
pub struct HighlightBuilder {
    context_chars: usize,
}

impl HighlightBuilder {
    /// Create a builder keeping `context_chars` characters on each side
    pub fn new(context_chars: usize) -> Self {
        Self { context_chars }
    }

    /// One highlight per content range of a hit, in range order
    ///
    /// Overlapping ranges are not merged.
    pub fn build(&self, content: &str, hit: &FuzzyHit) -> Vec<Highlight> {
        let Some(content_match) = hit.key_match(MatchKey::Content) else {
            return Vec::new();
        };

        let chars: Vec<char> = content.chars().collect();
        content_match
            .indices
            .iter()
            .filter(|(start, end)| start <= end && *end < chars.len())
            .map(|&(start, end)| self.window(&chars, start, end))
            .collect()
    }

    fn window(&self, chars: &[char], start: usize, end: usize) -> Highlight {
        let start_index = start.saturating_sub(self.context_chars);
        let end_index = (end + 1 + self.context_chars).min(chars.len());

        Highlight {
            snippet: chars[start_index..end_index].iter().collect(),
            start_index,
            end_index,
            original_start: start,
            original_end: end,
        }
    }
}
