//! Suggestion candidates and the ranking policy shared by completion and
//! prediction.
//!
//! Every ranked list in the engine is ordered by:
//! 1. descending count (how often the word, or the transition, was observed)
//! 2. ascending lexicographic order of the text
//! 3. shorter text first

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// A single suggestion with the observation count it was ranked by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    pub count: u64,
}

impl Candidate {
    pub fn new<T: Into<String>>(text: T, count: u64) -> Self {
        Candidate {
            text: text.into(),
            count,
        }
    }

    /// Total ranking order: `Less` means `self` is shown before `other`.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .count
            .cmp(&self.count)
            .then_with(|| self.text.cmp(&other.text))
            .then_with(|| self.text.chars().count().cmp(&other.text.chars().count()))
    }
}

/// Order `candidates` by the ranking policy and keep the best `limit`.
///
/// Large candidate sets are partitioned first so only the kept prefix is
/// fully sorted.
pub fn rank(mut candidates: Vec<Candidate>, limit: usize) -> Vec<Candidate> {
    if limit == 0 {
        return Vec::new();
    }
    if candidates.len() > limit {
        candidates.select_nth_unstable_by(limit - 1, Candidate::rank_cmp);
        candidates.truncate(limit);
    }
    candidates.sort_by(Candidate::rank_cmp);
    candidates
}

/// Strip counts, keeping the ranked texts.
pub fn texts(candidates: Vec<Candidate>) -> Vec<String> {
    candidates.into_iter().map(|c| c.text).collect()
}
