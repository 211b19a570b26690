// Approximate Text Matching
//
// *Le Flou* (The Blur) - Edit-distance matching over indexed message fields
//
// Query syntax understood by `FuzzyIndex::search`:
// - `word`            approximate match, tolerance set by the threshold
// - `'word`           exact (case-insensitive) substring match
// - `'"some phrase"`  exact substring match of the whole phrase
//
// Every token must match at least one key for a document to match.

use crate::message::IndexedMessage;
use serde::{Deserialize, Serialize};

/// Indexed field of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKey {
    /// Message body
    Content,

    /// Author
    Sender,

    /// Lowercased content plus metadata
    SearchableContent,
}

impl MatchKey {
    /// All keys, in tie-break priority order
    pub const ALL: [MatchKey; 3] = [
        MatchKey::Content,
        MatchKey::Sender,
        MatchKey::SearchableContent,
    ];
}

/// Matched ranges for one key of one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyMatch {
    /// Field that matched
    pub key: MatchKey,

    /// Full value of the field
    pub value: String,

    /// Inclusive character ranges `(start, end)` that matched
    pub indices: Vec<(usize, usize)>,
}

/// One matching document
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyHit {
    /// Position of the document in the indexed list
    pub position: usize,

    /// Document identifier
    pub id: String,

    /// Native score: 0 is a perfect match, 1 is no match
    pub score: f64,

    /// Per-key match details
    pub matches: Vec<KeyMatch>,
}

impl FuzzyHit {
    /// Whether any token matched the message body
    pub fn matched_content(&self) -> bool {
        self.matches.iter().any(|m| m.key == MatchKey::Content)
    }

    /// Match details for a key
    pub fn key_match(&self, key: MatchKey) -> Option<&KeyMatch> {
        self.matches.iter().find(|m| m.key == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum QueryToken {
    Fuzzy(Vec<char>),
    Include(Vec<char>),
}

#[derive(Debug, Clone)]
struct FieldText {
    original: String,
    folded: Vec<char>,
}

impl FieldText {
    fn new(original: &str) -> Self {
        Self {
            original: original.to_string(),
            folded: original.chars().map(fold_char).collect(),
        }
    }
}

#[derive(Debug, Clone)]
struct IndexedDoc {
    id: String,
    fields: [FieldText; 3],
}

/// Approximate-match structure over a list of messages
///
/// Built once from a message list and never mutated; appending messages
/// means building a new index.
#[derive(Debug, Clone, Default)]
pub struct FuzzyIndex {
    docs: Vec<IndexedDoc>,
}

impl FuzzyIndex {
    /// Build an index over the given messages
    pub fn build(messages: &[IndexedMessage]) -> Self {
        let docs = messages
            .iter()
            .map(|msg| IndexedDoc {
                id: msg.id.clone(),
                fields: [
                    FieldText::new(&msg.content),
                    FieldText::new(&msg.sender),
                    FieldText::new(&msg.searchable_content),
                ],
            })
            .collect();

        Self { docs }
    }

    /// Number of indexed documents
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Returns true if nothing is indexed
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Match a query against every document
    ///
    /// Returns hits whose score is within `threshold`, best first. Ties keep
    /// index order.
    pub fn search(&self, query: &str, threshold: f64) -> Vec<FuzzyHit> {
        let tokens = parse_query(query);
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<FuzzyHit> = self
            .docs
            .iter()
            .enumerate()
            .filter_map(|(position, doc)| match_document(position, doc, &tokens, threshold))
            .collect();

        hits.sort_by(|a, b| {
            a.score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        hits
    }
}

fn match_document(
    position: usize,
    doc: &IndexedDoc,
    tokens: &[QueryToken],
    threshold: f64,
) -> Option<FuzzyHit> {
    let mut ranges: [Vec<(usize, usize)>; 3] = Default::default();
    let mut total = 0.0;

    for token in tokens {
        let mut best: Option<f64> = None;

        for (slot, field) in doc.fields.iter().enumerate() {
            if let Some((score, found)) = match_token(token, &field.folded) {
                if score <= threshold {
                    ranges[slot].extend(found);
                    best = Some(best.map_or(score, |b: f64| b.min(score)));
                }
            }
        }

        total += best?;
    }

    let matches = MatchKey::ALL
        .iter()
        .zip(ranges)
        .zip(doc.fields.iter())
        .filter(|((_, found), _)| !found.is_empty())
        .map(|((key, mut found), field)| {
            found.sort_unstable();
            found.dedup();
            KeyMatch {
                key: *key,
                value: field.original.clone(),
                indices: found,
            }
        })
        .collect();

    Some(FuzzyHit {
        position,
        id: doc.id.clone(),
        score: total / tokens.len() as f64,
        matches,
    })
}

fn match_token(token: &QueryToken, text: &[char]) -> Option<(f64, Vec<(usize, usize)>)> {
    match token {
        QueryToken::Include(pattern) => {
            let found = exact_occurrences(pattern, text);
            (!found.is_empty()).then_some((0.0, found))
        }
        QueryToken::Fuzzy(pattern) => {
            let found = exact_occurrences(pattern, text);
            if !found.is_empty() {
                return Some((0.0, found));
            }
            let (errors, start, end) = approximate_find(pattern, text)?;
            Some((errors as f64 / pattern.len() as f64, vec![(start, end)]))
        }
    }
}

/// Non-overlapping exact occurrences as inclusive ranges
fn exact_occurrences(pattern: &[char], text: &[char]) -> Vec<(usize, usize)> {
    let m = pattern.len();
    let mut found = Vec::new();
    if m == 0 || m > text.len() {
        return found;
    }

    let mut i = 0;
    while i + m <= text.len() {
        if &text[i..i + m] == pattern {
            found.push((i, i + m - 1));
            i += m;
        } else {
            i += 1;
        }
    }
    found
}

/// Best approximate alignment of `pattern` against any substring of `text`
///
/// Returns `(errors, start, end)` with an inclusive character range.
fn approximate_find(pattern: &[char], text: &[char]) -> Option<(usize, usize, usize)> {
    let m = pattern.len();
    let n = text.len();
    if m == 0 || n == 0 {
        return None;
    }

    // (cost, start) per text column; row 0 lets a match begin anywhere
    let mut prev: Vec<(usize, usize)> = (0..=n).map(|j| (0, j)).collect();
    let mut cur: Vec<(usize, usize)> = vec![(0, 0); n + 1];

    for i in 1..=m {
        cur[0] = (i, 0);
        for j in 1..=n {
            let substitution = if pattern[i - 1] == text[j - 1] { 0 } else { 1 };
            let diag = (prev[j - 1].0 + substitution, prev[j - 1].1);
            let up = (prev[j].0 + 1, prev[j].1);
            let left = (cur[j - 1].0 + 1, cur[j - 1].1);

            let mut best = diag;
            if up.0 < best.0 {
                best = up;
            }
            if left.0 < best.0 {
                best = left;
            }
            cur[j] = best;
        }
        std::mem::swap(&mut prev, &mut cur);
    }

    let (end_col, &(errors, start)) = prev
        .iter()
        .enumerate()
        .skip(1)
        .min_by_key(|(_, (cost, _))| *cost)?;

    let end = end_col - 1;
    (start <= end).then_some((errors, start, end))
}

fn parse_query(query: &str) -> Vec<QueryToken> {
    let chars: Vec<char> = query.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i].is_whitespace() {
            i += 1;
            continue;
        }

        if chars[i] == '\'' && chars.get(i + 1) == Some(&'"') {
            let begin = i + 2;
            let close = chars[begin..]
                .iter()
                .position(|&c| c == '"')
                .map_or(chars.len(), |p| begin + p);
            push_token(&mut tokens, &chars[begin..close], true);
            i = close + 1;
            continue;
        }

        let begin = i;
        while i < chars.len() && !chars[i].is_whitespace() {
            i += 1;
        }
        let word = &chars[begin..i];
        match word.split_first() {
            Some(('\'', rest)) => push_token(&mut tokens, rest, true),
            _ => push_token(&mut tokens, word, false),
        }
    }

    tokens
}

fn push_token(tokens: &mut Vec<QueryToken>, raw: &[char], include: bool) {
    let folded: Vec<char> = raw.iter().copied().map(fold_char).collect();
    if folded.iter().all(|c| c.is_whitespace()) {
        return;
    }
    tokens.push(if include {
        QueryToken::Include(folded)
    } else {
        QueryToken::Fuzzy(folded)
    });
}

/// Single-character lowercase so character offsets survive case folding
pub(crate) fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{normalize_message, RawMessage};

    fn index(messages: &[(&str, &str, &str)]) -> FuzzyIndex {
        let indexed: Vec<IndexedMessage> = messages
            .iter()
            .map(|(id, content, sender)| {
                normalize_message(&RawMessage::new(*id, *content, *sender)).unwrap()
            })
            .collect();
        FuzzyIndex::build(&indexed)
    }

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_parse_query_tokens() {
        let tokens = parse_query("Hello  'World '\"big deal\" x");
        assert_eq!(
            tokens,
            vec![
                QueryToken::Fuzzy(chars("hello")),
                QueryToken::Include(chars("world")),
                QueryToken::Include(chars("big deal")),
                QueryToken::Fuzzy(chars("x")),
            ]
        );
    }

    #[test]
    fn test_parse_query_unterminated_phrase() {
        let tokens = parse_query("'\"open ended");
        assert_eq!(tokens, vec![QueryToken::Include(chars("open ended"))]);
    }

    #[test]
    fn test_approximate_find_single_typo() {
        let found = approximate_find(&chars("helo"), &chars("say hello there"));
        let (errors, start, end) = found.unwrap();
        assert_eq!(errors, 1);
        assert!(start >= 4 && end <= 8);
    }

    #[test]
    fn test_exact_match_scores_zero_with_offsets() {
        let idx = index(&[("m1", "hello world", "alice")]);
        let hits = idx.search("world", 0.4);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].score, 0.0);
        let content = hits[0].key_match(MatchKey::Content).unwrap();
        assert_eq!(content.indices, vec![(6, 10)]);
        assert!(hits[0].matched_content());
    }

    #[test]
    fn test_unrelated_text_does_not_match() {
        let idx = index(&[("m1", "hello world", "alice"), ("m2", "goodbye", "bob")]);
        let hits = idx.search("hello", 0.4);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "m1");
    }

    #[test]
    fn test_typo_tolerated_within_threshold() {
        let idx = index(&[("m1", "deployment finished", "ci")]);
        let hits = idx.search("deploymnet", 0.4);

        assert_eq!(hits.len(), 1);
        assert!(hits[0].score > 0.0 && hits[0].score <= 0.4);
    }

    #[test]
    fn test_all_tokens_must_match() {
        let idx = index(&[("m1", "hello world", "alice"), ("m2", "hello moon", "bob")]);
        let hits = idx.search("hello moon", 0.2);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "m2");
    }

    #[test]
    fn test_phrase_requires_exact_substring() {
        let idx = index(&[("m1", "big deal here", "a"), ("m2", "deal was big", "b")]);
        let hits = idx.search("'\"big deal\"", 0.4);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "m1");
    }

    #[test]
    fn test_sender_match_is_not_content() {
        let idx = index(&[("m1", "nothing relevant", "alice")]);
        let hits = idx.search("alice", 0.4);

        assert_eq!(hits.len(), 1);
        assert!(!hits[0].matched_content());
        assert!(hits[0].key_match(MatchKey::Sender).is_some());
    }

    #[test]
    fn test_results_sorted_best_first() {
        let idx = index(&[("fuzzy", "helps", "x"), ("exact", "help", "y")]);
        let hits = idx.search("helpz", 0.4);

        assert_eq!(hits.len(), 2);
        assert!(hits[0].score <= hits[1].score);
    }

    #[test]
    fn test_case_folding_keeps_offsets() {
        let idx = index(&[("m1", "ÀB HELLO", "x")]);
        let hits = idx.search("hello", 0.0);

        let content = hits[0].key_match(MatchKey::Content).unwrap();
        assert_eq!(content.indices, vec![(3, 7)]);
    }
}
