//! wordpredict-core
//!
//! Trainable predictive text for assistive message composition: completes
//! the word being typed and predicts the next word or short phrase, from a
//! static base corpus merged with the user's own persona text and message
//! history.
//!
//! Everything is in memory and rebuilt from text on every training pass.
//!
//! Public API:
//! - `tokenize` / `Token` - word and punctuation tokens
//! - `PrefixIndex` - FST-backed prefix completion ranked by frequency
//! - `NGramModel` - next-token transitions with 3 → 2 → 1 backoff
//! - `train` / `TextSource` / `BaseCorpusCache` - the training pipeline
//! - `EngineInstance` - one immutable trained engine
//! - `Predictor` - query surface that owns and swaps the current engine
//! - `Config` - limits and model order, loadable from TOML
use serde::{Deserialize, Serialize};

pub mod tokenizer;
pub use tokenizer::{tokenize, SuggestionMode, Token, TokenKind};

pub mod candidate;
pub use candidate::Candidate;

pub mod prefix_index;
pub use prefix_index::PrefixIndex;

pub mod ngram;
pub use ngram::NGramModel;

pub mod trainer;
pub use trainer::{train, BaseCorpusCache, SourceSummary, TextSource, TrainingReport};

pub mod engine;
pub use engine::{EngineInstance, Predictor, Suggestions};

pub mod error;
pub use error::TrainError;

/// Engine configuration.
///
/// Missing fields in a TOML file take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Longest n-gram context consulted before backing off (1-3).
    pub max_order: usize,

    /// Maximum spelling completions returned per query.
    pub completion_limit: usize,

    /// Maximum next-word (and phrase) predictions returned per query.
    pub prediction_limit: usize,

    /// Maximum words in a predicted phrase.
    pub max_phrase_words: usize,

    /// Reject corpora that tokenize to more tokens than this. `None` means
    /// unbounded.
    pub max_training_tokens: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_order: 3,
            // Suggestion chips shown above the keyboard
            completion_limit: 5,
            prediction_limit: 5,
            max_phrase_words: 3,
            max_training_tokens: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(
        path: P,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(
        &self,
        path: P,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
