//! Training errors.
//!
//! Queries never fail: an engine that cannot answer returns an empty list.
//! Only building a new engine instance can be rejected, and a rejected build
//! never replaces the instance already serving queries.

/// Why a training pass produced no engine instance.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TrainError {
    #[error("n-gram order must be between 1 and 3, got {0}")]
    InvalidOrder(usize),

    #[error("corpus has {tokens} tokens, above the configured limit of {limit}")]
    CorpusTooLarge { tokens: usize, limit: usize },

    #[error("failed to build prefix index: {0}")]
    Index(String),

    #[error("base corpus unavailable: {0}")]
    BaseCorpus(String),
}
