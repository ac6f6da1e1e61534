//! Corpus training pipeline.
//!
//! Sources are concatenated in the order given (conventionally base corpus,
//! base dictionary, persona text, then message history), tokenized once, and
//! turned into a fresh prefix index and n-gram model. Later sources add to
//! the counts of earlier ones; nothing is overwritten and nothing from a
//! previous training pass survives.
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::engine::EngineInstance;
use crate::error::TrainError;
use crate::ngram::{NGramModel, MAX_ORDER};
use crate::prefix_index::PrefixIndex;
use crate::tokenizer::tokenize;
use crate::Config;

/// A labeled piece of training text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextSource {
    pub label: String,
    pub text: String,
}

impl TextSource {
    pub const BASE: &'static str = "base";
    pub const DICTIONARY: &'static str = "dictionary";
    pub const PERSONA: &'static str = "persona";
    pub const HISTORY: &'static str = "history";

    pub fn new<L: Into<String>, T: Into<String>>(label: L, text: T) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
        }
    }

    /// Static generic-language text.
    pub fn base<T: Into<String>>(text: T) -> Self {
        Self::new(Self::BASE, text)
    }

    /// Common word list, one or more words per line.
    pub fn dictionary<T: Into<String>>(text: T) -> Self {
        Self::new(Self::DICTIONARY, text)
    }

    /// The account's personalization text.
    pub fn persona<T: Into<String>>(text: T) -> Self {
        Self::new(Self::PERSONA, text)
    }

    /// Recent messages, already flattened to text.
    pub fn history<T: Into<String>>(text: T) -> Self {
        Self::new(Self::HISTORY, text)
    }
}

/// Size of one source as it entered training.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSummary {
    pub label: String,
    pub bytes: usize,
}

/// What a training pass built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub sources: Vec<SourceSummary>,
    /// All tokens, words and punctuation.
    pub tokens: usize,
    pub word_tokens: u64,
    /// Distinct vocabulary entries in the prefix index.
    pub vocabulary: usize,
    /// Distinct n-gram contexts across all orders.
    pub contexts: usize,
    pub order: usize,
}

/// Build a new engine instance from `sources`.
///
/// Same sources in the same order always produce an equal instance.
///
/// # Errors
/// - `TrainError::InvalidOrder` when `config.max_order` is outside `1..=3`
/// - `TrainError::CorpusTooLarge` when `config.max_training_tokens` is set
///   and the corpus tokenizes to more tokens than that
pub fn train(sources: &[TextSource], config: &Config) -> Result<EngineInstance, TrainError> {
    if !(1..=MAX_ORDER).contains(&config.max_order) {
        return Err(TrainError::InvalidOrder(config.max_order));
    }

    let started = Instant::now();
    for source in sources {
        debug!(label = %source.label, bytes = source.text.len(), "training source");
    }

    let corpus = sources
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");
    let tokens = tokenize(&corpus);

    if let Some(limit) = config.max_training_tokens {
        if tokens.len() > limit {
            warn!(tokens = tokens.len(), limit, "corpus rejected, keeping previous engine");
            return Err(TrainError::CorpusTooLarge {
                tokens: tokens.len(),
                limit,
            });
        }
    }

    let index = PrefixIndex::build(&tokens)?;
    let ngram = NGramModel::build(&tokens, config.max_order)?;

    let report = TrainingReport {
        sources: sources
            .iter()
            .map(|s| SourceSummary {
                label: s.label.clone(),
                bytes: s.text.len(),
            })
            .collect(),
        tokens: tokens.len(),
        word_tokens: index.word_tokens(),
        vocabulary: index.len(),
        contexts: ngram.context_count(),
        order: ngram.order(),
    };

    info!(
        sources = sources.len(),
        tokens = report.tokens,
        vocabulary = report.vocabulary,
        contexts = report.contexts,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "trained engine"
    );

    Ok(EngineInstance::new(index, ngram, report))
}

/// Base sources followed by the personal ones, in training order.
pub fn compose_sources(base: &[TextSource], personal: &[TextSource]) -> Vec<TextSource> {
    base.iter().chain(personal).cloned().collect()
}

/// Caller-owned cache for the static base corpus and dictionary.
///
/// The base text rarely changes while the personal corpus changes with every
/// sent message, so the calling layer keeps one of these and hands it to
/// [`Predictor::train_with_cache`](crate::Predictor::train_with_cache). The
/// loader runs at most once per successful load.
#[derive(Debug, Default)]
pub struct BaseCorpusCache {
    sources: OnceCell<Arc<[TextSource]>>,
}

impl BaseCorpusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache already holding `sources`.
    pub fn with_sources(sources: Vec<TextSource>) -> Self {
        Self {
            sources: OnceCell::with_value(Arc::from(sources)),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.sources.get().is_some()
    }

    /// Cached base sources, loading them with `load` on first use.
    ///
    /// A failed load leaves the cache empty so the next call tries again.
    pub fn get_or_load<F, E>(&self, load: F) -> Result<Arc<[TextSource]>, TrainError>
    where
        F: FnOnce() -> Result<Vec<TextSource>, E>,
        E: Display,
    {
        self.sources
            .get_or_try_init(|| match load() {
                Ok(sources) => {
                    debug!(sources = sources.len(), "loaded base corpus");
                    Ok(Arc::from(sources))
                }
                Err(e) => Err(TrainError::BaseCorpus(e.to_string())),
            })
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accumulate_across_sources() {
        let sources = vec![
            TextSource::base("hello there hello"),
            TextSource::history("hello again"),
        ];
        let engine = train(&sources, &Config::default()).unwrap();
        assert_eq!(engine.prefix_index().frequency("hello"), 3);
    }

    #[test]
    fn report_describes_build() {
        let sources = vec![TextSource::base("a b."), TextSource::persona("c")];
        let engine = train(&sources, &Config::default()).unwrap();
        let report = engine.report();
        assert_eq!(report.tokens, 4);
        assert_eq!(report.word_tokens, 3);
        assert_eq!(report.vocabulary, 3);
        assert_eq!(report.order, 3);
        assert_eq!(
            report.sources,
            vec![
                SourceSummary { label: "base".into(), bytes: 4 },
                SourceSummary { label: "persona".into(), bytes: 1 },
            ]
        );
    }

    #[test]
    fn rejects_invalid_order() {
        let config = Config {
            max_order: 0,
            ..Config::default()
        };
        assert_eq!(
            train(&[TextSource::base("a b")], &config).unwrap_err(),
            TrainError::InvalidOrder(0)
        );
    }

    #[test]
    fn rejects_oversized_corpus() {
        let config = Config {
            max_training_tokens: Some(3),
            ..Config::default()
        };
        let err = train(&[TextSource::base("one two three four")], &config).unwrap_err();
        assert_eq!(err, TrainError::CorpusTooLarge { tokens: 4, limit: 3 });
        assert!(train(&[TextSource::base("one two three")], &config).is_ok());
    }

    #[test]
    fn empty_sources_train_an_empty_engine() {
        let engine = train(&[], &Config::default()).unwrap();
        assert!(engine.prefix_index().is_empty());
        assert_eq!(engine.report().tokens, 0);
    }

    #[test]
    fn compose_keeps_order() {
        let base = vec![TextSource::base("b"), TextSource::dictionary("d")];
        let personal = vec![TextSource::persona("p"), TextSource::history("h")];
        let labels: Vec<String> = compose_sources(&base, &personal)
            .into_iter()
            .map(|s| s.label)
            .collect();
        assert_eq!(labels, vec!["base", "dictionary", "persona", "history"]);
    }

    #[test]
    fn cache_loads_once() {
        let cache = BaseCorpusCache::new();
        assert!(!cache.is_loaded());
        let first = cache
            .get_or_load(|| Ok::<_, String>(vec![TextSource::base("x")]))
            .unwrap();
        let second = cache
            .get_or_load(|| -> Result<Vec<TextSource>, String> { panic!("loader ran twice") })
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(cache.is_loaded());
    }

    #[test]
    fn cache_retries_after_failure() {
        let cache = BaseCorpusCache::new();
        let err = cache
            .get_or_load(|| Err::<Vec<TextSource>, _>("dictionary service down"))
            .unwrap_err();
        assert_eq!(err, TrainError::BaseCorpus("dictionary service down".into()));
        assert!(!cache.is_loaded());

        let loaded = cache
            .get_or_load(|| Ok::<_, String>(vec![TextSource::base("y")]))
            .unwrap();
        assert_eq!(loaded.len(), 1);
    }
}
