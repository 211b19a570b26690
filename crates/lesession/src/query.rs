// Query Normalization
//
// *La Question* (The Question) - Clean raw query text before matching

use crate::error::{Error, Result};
use regex::Regex;

/// Operator prefixes removed from query text
pub const OPERATOR_PREFIXES: [&str; 2] = ["file:", "sender:"];

/// Query normalizer
///
/// Trims the query, removes `file:` / `sender:` operator markers and rewrites
/// `"quoted phrases"` into the match engine's phrase syntax (`'"..."`).
///
/// The operator markers are only removed; their values stay in the query
/// text as ordinary search terms and do not become filters.
#[derive(Debug, Clone)]
pub struct QueryNormalizer {
    /// Pattern for `file:` / `sender:` at the start of a word
    operator_pattern: Regex,

    /// Pattern for double-quoted phrases
    phrase_pattern: Regex,

    /// Pattern for runs of whitespace
    whitespace_pattern: Regex,
}

impl QueryNormalizer {
    /// Create a new query normalizer
    pub fn new() -> Result<Self> {
        Ok(Self {
            operator_pattern: Regex::new(r"(^|\s)(?:file|sender):")
                .map_err(|e| Error::processing(format!("Invalid operator pattern: {}", e)))?,

            phrase_pattern: Regex::new(r#""([^"]+)""#)
                .map_err(|e| Error::processing(format!("Invalid phrase pattern: {}", e)))?,

            whitespace_pattern: Regex::new(r"\s+")
                .map_err(|e| Error::processing(format!("Invalid whitespace pattern: {}", e)))?,
        })
    }

    /// Normalize a raw query
    pub fn normalize(&self, query: &str) -> String {
        let query = query.trim();

        let stripped = self.operator_pattern.replace_all(query, "$1");
        let collapsed = self.whitespace_pattern.replace_all(stripped.trim(), " ");
        let phrased = self.phrase_pattern.replace_all(&collapsed, "'\"$1\"");

        phrased.into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("  hello  ", "hello")]
    #[case("file:report.pdf", "report.pdf")]
    #[case("sender:alice hello", "alice hello")]
    #[case("hello sender:bob", "hello bob")]
    #[case("profile:x", "profile:x")]
    #[case("\"exact phrase\" rest", "'\"exact phrase\" rest")]
    #[case("a   \"b  c\"", "a '\"b c\"")]
    #[case("unbalanced \"quote", "unbalanced \"quote")]
    fn test_normalize(#[case] input: &str, #[case] expected: &str) {
        let normalizer = QueryNormalizer::new().unwrap();
        assert_eq!(normalizer.normalize(input), expected);
    }

    #[test]
    fn test_operator_only_query_becomes_empty() {
        let normalizer = QueryNormalizer::new().unwrap();
        assert_eq!(normalizer.normalize("file:"), "");
    }
}
