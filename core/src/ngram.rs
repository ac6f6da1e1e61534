//! N-gram next-word model with strict backoff.
//!
//! For every context length `k` in `1..=order` the model keeps a transition
//! table: the last `k` token keys map to the tokens observed right after
//! them, with counts. Follower lists are ranked once when the model is built,
//! so a prediction is a hash lookup plus a slice copy.
//!
//! Prediction tries the longest context first and backs off one token at a
//! time. Levels are never mixed: the first level with at least one follower
//! answers alone.
use ahash::AHashMap;

use crate::candidate::{self, Candidate};
use crate::error::TrainError;
use crate::tokenizer::{is_word_key, Token};

/// Highest supported context length.
pub const MAX_ORDER: usize = 3;

/// Joins context keys. The tokenizer drops control characters, so no key
/// contains the separator.
const KEY_SEPARATOR: &str = "\u{1f}";

type FollowerTable = AHashMap<String, Vec<Candidate>>;

/// Immutable transition tables for context lengths `1..=order`.
///
/// # Example
/// ```
/// use wordpredict_core::ngram::NGramModel;
/// use wordpredict_core::tokenizer::tokenize;
///
/// let model = NGramModel::build(&tokenize("I am happy I am sad I am happy"), 3).unwrap();
/// assert_eq!(model.predict_next(&["i", "am"], 5), vec!["happy", "sad"]);
/// assert!(model.predict_next::<&str>(&[], 5).is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NGramModel {
    order: usize,
    /// `levels[k - 1]` holds contexts of exactly `k` tokens.
    levels: Vec<FollowerTable>,
}

impl NGramModel {
    /// Record every window of up to `order` tokens and the token that
    /// followed it.
    ///
    /// # Errors
    /// `TrainError::InvalidOrder` unless `1 <= order <= 3`.
    pub fn build(tokens: &[Token], order: usize) -> Result<Self, TrainError> {
        if !(1..=MAX_ORDER).contains(&order) {
            return Err(TrainError::InvalidOrder(order));
        }

        let keys: Vec<&str> = tokens.iter().map(|t| t.key.as_str()).collect();
        let mut counts: Vec<AHashMap<String, AHashMap<&str, u64>>> =
            (0..order).map(|_| AHashMap::new()).collect();

        for i in 1..keys.len() {
            let next = keys[i];
            for k in 1..=order.min(i) {
                let context = keys[i - k..i].join(KEY_SEPARATOR);
                *counts[k - 1]
                    .entry(context)
                    .or_default()
                    .entry(next)
                    .or_insert(0) += 1;
            }
        }

        let levels = counts
            .into_iter()
            .map(|table| {
                table
                    .into_iter()
                    .map(|(context, followers)| {
                        let ranked: Vec<Candidate> = followers
                            .into_iter()
                            .map(|(word, count)| Candidate::new(word, count))
                            .collect();
                        let len = ranked.len();
                        (context, candidate::rank(ranked, len))
                    })
                    .collect()
            })
            .collect();

        Ok(Self { order, levels })
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of distinct contexts across all levels.
    pub fn context_count(&self) -> usize {
        self.levels.iter().map(|l| l.len()).sum()
    }

    /// Ranked next tokens for `context` (oldest token first).
    pub fn predict_next<S: AsRef<str>>(&self, context: &[S], limit: usize) -> Vec<String> {
        candidate::texts(self.next_candidates(context, limit))
    }

    /// Ranked next tokens with their follow counts.
    ///
    /// An empty context yields nothing: there is no global most-frequent
    /// fallback.
    pub fn next_candidates<S: AsRef<str>>(&self, context: &[S], limit: usize) -> Vec<Candidate> {
        if limit == 0 {
            return Vec::new();
        }
        let keys = lower_keys(context);
        match self.matching_level(&keys) {
            Some((_, followers)) => followers.iter().take(limit).cloned().collect(),
            None => Vec::new(),
        }
    }

    /// The context length that would answer `context`, if any.
    pub fn matched_order<S: AsRef<str>>(&self, context: &[S]) -> Option<usize> {
        let keys = lower_keys(context);
        self.matching_level(&keys).map(|(k, _)| k)
    }

    /// How often `next` followed exactly `context`. The context length must
    /// not exceed the model order.
    pub fn follow_count<S: AsRef<str>>(&self, context: &[S], next: &str) -> u64 {
        let keys = lower_keys(context);
        if keys.is_empty() || keys.len() > self.order {
            return 0;
        }
        let next = next.to_lowercase();
        self.levels[keys.len() - 1]
            .get(&keys.join(KEY_SEPARATOR))
            .and_then(|followers| followers.iter().find(|c| c.text == next))
            .map(|c| c.count)
            .unwrap_or(0)
    }

    /// Short phrase predictions.
    ///
    /// Each of the top `limit` next words is extended greedily with the best
    /// prediction for the growing context until the phrase has `max_words`
    /// tokens, the next best token is punctuation, or nothing follows.
    /// Punctuation never starts a phrase.
    pub fn predict_phrases<S: AsRef<str>>(
        &self,
        context: &[S],
        limit: usize,
        max_words: usize,
    ) -> Vec<String> {
        if max_words == 0 {
            return Vec::new();
        }
        let base = lower_keys(context);
        let firsts: Vec<Candidate> = match self.matching_level(&base) {
            Some((_, followers)) => followers
                .iter()
                .filter(|c| is_word_key(&c.text))
                .take(limit)
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        firsts
            .into_iter()
            .map(|first| {
                let mut phrase = vec![first.text];
                let mut window = base.clone();
                window.push(phrase[0].clone());

                while phrase.len() < max_words {
                    let skip = window.len().saturating_sub(self.order);
                    let best = self.next_candidates(&window[skip..], 1).into_iter().next();
                    match best {
                        Some(next) if is_word_key(&next.text) => {
                            window.push(next.text.clone());
                            phrase.push(next.text);
                        }
                        _ => break,
                    }
                }

                phrase.join(" ")
            })
            .collect()
    }

    fn matching_level(&self, keys: &[String]) -> Option<(usize, &[Candidate])> {
        let longest = keys.len().min(self.order);
        (1..=longest).rev().find_map(|k| {
            let context = keys[keys.len() - k..].join(KEY_SEPARATOR);
            self.levels[k - 1]
                .get(&context)
                .filter(|followers| !followers.is_empty())
                .map(|followers| (k, followers.as_slice()))
        })
    }
}

fn lower_keys<S: AsRef<str>>(context: &[S]) -> Vec<String> {
    context.iter().map(|s| s.as_ref().to_lowercase()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;

    fn model(text: &str, order: usize) -> NGramModel {
        NGramModel::build(&tokenize(text), order).unwrap()
    }

    #[test]
    fn rejects_invalid_order() {
        assert_eq!(
            NGramModel::build(&tokenize("a b"), 0),
            Err(TrainError::InvalidOrder(0))
        );
        assert_eq!(
            NGramModel::build(&tokenize("a b"), 4),
            Err(TrainError::InvalidOrder(4))
        );
    }

    #[test]
    fn ranks_by_follow_count() {
        let m = model("I am happy I am sad I am happy", 3);
        assert_eq!(m.predict_next(&["i", "am"], 5), vec!["happy", "sad"]);
        assert_eq!(m.follow_count(&["i", "am"], "happy"), 2);
        assert_eq!(m.follow_count(&["am"], "sad"), 1);
    }

    #[test]
    fn context_is_case_insensitive() {
        let m = model("good morning everyone", 3);
        assert_eq!(m.predict_next(&["Good"], 5), vec!["morning"]);
    }

    #[test]
    fn unseen_context_is_empty() {
        let m = model("good morning everyone", 3);
        assert!(m.predict_next(&["evening"], 5).is_empty());
        assert_eq!(m.matched_order(&["evening"]), None);
    }

    #[test]
    fn empty_context_is_empty() {
        let m = model("good morning everyone", 3);
        assert!(m.predict_next::<&str>(&[], 5).is_empty());
    }

    #[test]
    fn backs_off_one_level_at_a_time() {
        // "x b" never seen, "b" was: answer comes from level 1 only
        let m = model("a b c a b d b e", 3);
        assert_eq!(m.matched_order(&["x", "b"]), Some(1));
        assert_eq!(m.predict_next(&["x", "b"], 5), m.predict_next(&["b"], 5));
        assert_eq!(m.predict_next(&["b"], 5), vec!["c", "d", "e"]);
    }

    #[test]
    fn longer_context_is_used_exclusively() {
        let m = model("a b c a b d b e", 3);
        // "a b" has followers {c, d}; "e" only appears after bare "b"
        assert_eq!(m.matched_order(&["a", "b"]), Some(2));
        assert_eq!(m.predict_next(&["a", "b"], 5), vec!["c", "d"]);
    }

    #[test]
    fn trigram_context() {
        let m = model("we go home now we go out now they go home later", 3);
        assert_eq!(m.predict_next(&["we", "go", "home"], 5), vec!["now"]);
        assert_eq!(m.predict_next(&["they", "go", "home"], 5), vec!["later"]);
        assert_eq!(m.predict_next(&["we", "go"], 5), vec!["home", "out"]);
    }

    #[test]
    fn order_limits_context() {
        let m = model("a b c a x d", 1);
        // only the last token is consulted
        assert_eq!(m.predict_next(&["a", "b"], 5), vec!["c"]);
        assert_eq!(m.predict_next(&["a"], 5), vec!["b", "x"]);
        assert_eq!(m.follow_count(&["a", "b"], "c"), 0);
    }

    #[test]
    fn punctuation_participates() {
        let m = model("Thanks. See you. Thanks!", 2);
        assert_eq!(m.predict_next(&["thanks"], 5), vec!["!", "."]);
        assert_eq!(m.predict_next(&["thanks", "."], 5), vec!["see"]);
    }

    #[test]
    fn limit_truncates() {
        let m = model("a b a c a d", 1);
        assert_eq!(m.predict_next(&["a"], 2), vec!["b", "c"]);
        assert!(m.predict_next(&["a"], 0).is_empty());
    }

    #[test]
    fn phrase_extension_stops_at_punctuation() {
        let m = model("see you soon. see you later. see them soon.", 3);
        assert_eq!(
            m.predict_phrases(&["see"], 2, 3),
            vec!["you later", "them soon"]
        );
        assert_eq!(m.predict_phrases(&["see"], 1, 1), vec!["you"]);
        assert!(m.predict_phrases(&["see"], 2, 0).is_empty());
    }

    #[test]
    fn phrases_skip_leading_punctuation() {
        let m = model("Thanks. Thanks! Thanks a lot", 2);
        assert_eq!(m.predict_next(&["thanks"], 5), vec!["!", ".", "a"]);
        assert_eq!(m.predict_phrases(&["thanks"], 5, 3), vec!["a lot"]);
        assert_eq!(m.predict_phrases(&["thanks"], 1, 3), vec!["a lot"]);
        // only punctuation follows
        let m = model("Done. Done!", 2);
        assert!(m.predict_phrases(&["done"], 5, 3).is_empty());
    }

    #[test]
    fn identical_input_builds_identical_model() {
        let text = "one two three one two four";
        assert_eq!(model(text, 3), model(text, 3));
        assert_eq!(model(text, 3).context_count(), model(text, 3).context_count());
    }
}
