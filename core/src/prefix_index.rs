//! Prefix completion over the trained vocabulary.
//!
//! Word frequencies are counted per lower-cased key and frozen into an FST
//! map (key -> frequency). A completion query walks only the part of the FST
//! under the typed prefix, then ranks the matches with
//! [`candidate::rank`](crate::candidate::rank).
use std::collections::BTreeMap;

use fst::automaton::Str;
use fst::{Automaton, IntoStreamer, Map, Streamer};
use unicode_normalization::UnicodeNormalization;

use crate::candidate::{self, Candidate};
use crate::error::TrainError;
use crate::tokenizer::Token;

/// Immutable vocabulary index answering "complete this partial word".
///
/// # Example
/// ```
/// use wordpredict_core::prefix_index::PrefixIndex;
/// use wordpredict_core::tokenizer::tokenize;
///
/// let index = PrefixIndex::build(&tokenize("the cat sat, the cat ran")).unwrap();
/// assert_eq!(index.complete("ca", 5), vec!["cat"]);
/// assert_eq!(index.frequency("the"), 2);
/// ```
#[derive(Debug, Clone)]
pub struct PrefixIndex {
    map: Map<Vec<u8>>,
    word_tokens: u64,
}

impl PrefixIndex {
    /// Count every word token and build the index. Punctuation tokens are
    /// not part of the vocabulary.
    pub fn build(tokens: &[Token]) -> Result<Self, TrainError> {
        let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
        for token in tokens.iter().filter(|t| t.is_word()) {
            *counts.entry(token.key.as_str()).or_insert(0) += 1;
        }
        let word_tokens = counts.values().sum();

        // BTreeMap iteration is sorted and unique, which is what the FST
        // builder requires.
        let map = Map::from_iter(counts).map_err(|e| TrainError::Index(e.to_string()))?;

        Ok(Self { map, word_tokens })
    }

    /// Ranked completions for `prefix`, texts only.
    pub fn complete(&self, prefix: &str, limit: usize) -> Vec<String> {
        candidate::texts(self.completions(prefix, limit))
    }

    /// Ranked completions for `prefix` with their frequencies.
    ///
    /// Matching is case-insensitive exact prefix containment. An empty prefix
    /// yields nothing: completing "everything" is never useful mid-word.
    pub fn completions(&self, prefix: &str, limit: usize) -> Vec<Candidate> {
        let key = normalize_key(prefix);
        if key.is_empty() || limit == 0 {
            return Vec::new();
        }

        let matcher = Str::new(&key).starts_with();
        let mut stream = self.map.search(matcher).into_stream();
        let mut found = Vec::new();
        while let Some((word, freq)) = stream.next() {
            found.push(Candidate::new(String::from_utf8_lossy(word), freq));
        }

        candidate::rank(found, limit)
    }

    /// Frequency of `word`, or 0 when it was never seen.
    pub fn frequency(&self, word: &str) -> u64 {
        self.map.get(normalize_key(word)).unwrap_or(0)
    }

    /// Number of distinct vocabulary entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Total word occurrences counted while building.
    pub fn word_tokens(&self) -> u64 {
        self.word_tokens
    }

    /// All entries in key order.
    pub fn entries(&self) -> Vec<Candidate> {
        let mut out = Vec::with_capacity(self.map.len());
        let mut stream = self.map.stream();
        while let Some((word, freq)) = stream.next() {
            out.push(Candidate::new(String::from_utf8_lossy(word), freq));
        }
        out
    }
}

impl PartialEq for PrefixIndex {
    fn eq(&self, other: &Self) -> bool {
        self.word_tokens == other.word_tokens
            && self.map.as_fst().as_bytes() == other.map.as_fst().as_bytes()
    }
}

impl Eq for PrefixIndex {}

fn normalize_key(s: &str) -> String {
    s.trim().nfc().collect::<String>().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn index(text: &str) -> PrefixIndex {
        PrefixIndex::build(&tokenize(text)).unwrap()
    }

    #[test]
    fn completes_by_prefix() {
        let idx = index("the cat sat the cat ran");
        assert_eq!(idx.complete("ca", 10), vec!["cat"]);
        assert_eq!(idx.complete("r", 10), vec!["ran"]);
        assert!(idx.complete("x", 10).is_empty());
    }

    #[test]
    fn empty_prefix_returns_nothing() {
        let idx = index("alpha beta");
        assert!(idx.complete("", 10).is_empty());
        assert!(idx.complete("   ", 10).is_empty());
    }

    #[test]
    fn case_insensitive() {
        let idx = index("Hello hello HELLO help");
        assert_eq!(idx.complete("HE", 10), vec!["hello", "help"]);
        assert_eq!(idx.frequency("Hello"), 3);
    }

    #[test]
    fn ranking_frequency_then_lexicographic() {
        let idx = index("then than then the this this this");
        assert_eq!(idx.complete("th", 10), vec!["this", "then", "than", "the"]);
    }

    #[test]
    fn exact_word_is_its_own_completion() {
        let idx = index("go going gone go");
        assert_eq!(idx.complete("go", 10), vec!["go", "going", "gone"]);
    }

    #[test]
    fn limit_truncates() {
        let idx = index("apple apricot avocado anchor");
        assert_eq!(idx.complete("a", 2), vec!["anchor", "apple"]);
        assert_eq!(idx.complete("a", 100).len(), 4);
        assert!(idx.complete("a", 0).is_empty());
    }

    #[test]
    fn punctuation_is_not_vocabulary() {
        let idx = index("hi! hi? ...");
        assert_eq!(idx.len(), 1);
        assert_eq!(idx.frequency("!"), 0);
        assert_eq!(idx.word_tokens(), 2);
    }

    #[test]
    fn unicode_prefix() {
        let idx = index("café cafeteria Café");
        assert_eq!(idx.complete("caf", 10), vec!["café", "cafeteria"]);
        assert_eq!(idx.complete("café", 10), vec!["café"]);
    }

    #[test]
    fn entries_in_key_order() {
        let idx = index("b a c a");
        let entries = idx.entries();
        assert_eq!(
            entries,
            vec![
                Candidate::new("a", 2),
                Candidate::new("b", 1),
                Candidate::new("c", 1)
            ]
        );
    }

    #[test]
    fn identical_input_builds_identical_index() {
        assert_eq!(index("one two two"), index("one two two"));
        assert_ne!(index("one two two"), index("one two"));
    }

    #[test]
    fn empty_corpus() {
        let idx = index("");
        assert!(idx.is_empty());
        assert!(idx.complete("a", 5).is_empty());
    }
}
