// Relevance scoring and result ordering

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Native scores below this count as near-exact matches
pub const NEAR_EXACT_THRESHOLD: f64 = 0.1;

/// Boost for near-exact matches
pub const NEAR_EXACT_BOOST: f64 = 1.5;

/// Boost when the message body contributed to the match
pub const CONTENT_BOOST: f64 = 1.2;

/// Native match score paired with the derived relevance
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct Score {
    /// Match engine score (0 = perfect, 1 = no match)
    pub native: f64,

    /// Derived ranking score (0-1, higher is better)
    pub relevance: f64,
}

/// Relevance scorer
#[derive(Debug, Clone, Copy)]
pub struct RelevanceScorer {
    /// Multiplier for near-exact matches
    near_exact_boost: f64,

    /// Multiplier for content matches
    content_boost: f64,
}

impl RelevanceScorer {
    /// Create a scorer with the default boosts
    pub fn new() -> Self {
        Self {
            near_exact_boost: NEAR_EXACT_BOOST,
            content_boost: CONTENT_BOOST,
        }
    }

    /// Set custom boosts
    pub fn with_boosts(mut self, near_exact: f64, content: f64) -> Self {
        self.near_exact_boost = near_exact;
        self.content_boost = content;
        self
    }

    /// Score a match
    ///
    /// Both boosts apply when both conditions hold. The result is capped at 1.
    pub fn score(&self, native: f64, matched_content: bool) -> Score {
        let mut relevance = 1.0 - native;

        if native < NEAR_EXACT_THRESHOLD {
            relevance *= self.near_exact_boost;
        }

        if matched_content {
            relevance *= self.content_boost;
        }

        Score {
            native,
            relevance: relevance.min(1.0),
        }
    }
}

impl Default for RelevanceScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Result ordering key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Derived relevance
    #[default]
    Relevance,

    /// Message timestamp
    Date,

    /// Native match score
    Score,
}

/// Result ordering direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Smallest first
    Asc,

    /// Largest first
    #[default]
    Desc,
}

impl SortOrder {
    /// Apply the direction to an ascending comparison
    pub fn apply(self, ascending: Ordering) -> Ordering {
        match self {
            SortOrder::Asc => ascending,
            SortOrder::Desc => ascending.reverse(),
        }
    }
}

impl std::str::FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relevance" => Ok(SortBy::Relevance),
            "date" => Ok(SortBy::Date),
            "score" => Ok(SortBy::Score),
            other => Err(format!("unknown sort key: {}", other)),
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// Compare two floats, treating NaN as equal
pub(crate) fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0.0, true, 1.0)]
    #[case(0.0, false, 1.0)]
    #[case(0.05, false, 1.0)]
    #[case(0.2, false, 0.8)]
    #[case(0.2, true, 0.96)]
    #[case(0.5, true, 0.6)]
    #[case(0.09, false, 1.0)]
    fn test_relevance_formula(#[case] native: f64, #[case] content: bool, #[case] expected: f64) {
        let score = RelevanceScorer::new().score(native, content);
        assert!((score.relevance - expected).abs() < 1e-9, "got {}", score.relevance);
        assert_eq!(score.native, native);
    }

    #[test]
    fn test_boosts_stack() {
        // small boosts keep the product below the cap
        let scorer = RelevanceScorer::new().with_boosts(1.01, 1.01);
        let score = scorer.score(0.05, true);
        assert!((score.relevance - 0.95 * 1.01 * 1.01).abs() < 1e-9);
    }

    #[test]
    fn test_sort_order_apply() {
        assert_eq!(SortOrder::Asc.apply(Ordering::Less), Ordering::Less);
        assert_eq!(SortOrder::Desc.apply(Ordering::Less), Ordering::Greater);
    }

    #[test]
    fn test_parse_sort_options() {
        assert_eq!("Date".parse::<SortBy>().unwrap(), SortBy::Date);
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert!("random".parse::<SortBy>().is_err());
    }
}
