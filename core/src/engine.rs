// core/src/engine.rs
//
// Query API: the immutable trained engine and the predictor that owns the
// current one.

use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::error::TrainError;
use crate::ngram::NGramModel;
use crate::prefix_index::PrefixIndex;
use crate::tokenizer::{context_keys, partial_word, SuggestionMode};
use crate::trainer::{self, BaseCorpusCache, TextSource, TrainingReport};
use crate::Config;

/// A completed training pass: one prefix index and one n-gram model.
///
/// Never mutated after construction. Retraining builds a new instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineInstance {
    index: PrefixIndex,
    ngram: NGramModel,
    report: TrainingReport,
}

impl EngineInstance {
    pub(crate) fn new(index: PrefixIndex, ngram: NGramModel, report: TrainingReport) -> Self {
        Self {
            index,
            ngram,
            report,
        }
    }

    pub fn prefix_index(&self) -> &PrefixIndex {
        &self.index
    }

    pub fn ngram(&self) -> &NGramModel {
        &self.ngram
    }

    pub fn report(&self) -> &TrainingReport {
        &self.report
    }

    /// Completions for the word fragment at the end of `query`.
    pub fn spelling_completions(&self, query: &str, limit: usize) -> Vec<String> {
        match partial_word(query) {
            Some(fragment) => self.index.complete(&fragment, limit),
            None => Vec::new(),
        }
    }

    /// Next tokens given the last (up to model order) tokens of `query`.
    pub fn next_word_predictions(&self, query: &str, limit: usize) -> Vec<String> {
        let context = context_keys(query, self.ngram.order());
        self.ngram.predict_next(&context, limit)
    }

    /// Short phrases continuing `query`.
    pub fn phrase_predictions(&self, query: &str, limit: usize, max_words: usize) -> Vec<String> {
        let context = context_keys(query, self.ngram.order());
        self.ngram.predict_phrases(&context, limit, max_words)
    }
}

/// Suggestions for whichever mode the query text calls for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestions {
    pub mode: SuggestionMode,
    pub items: Vec<String>,
}

/// Owner of the current engine instance and the query surface used by the UI.
///
/// Readers take a cheap `Arc` clone of the ready instance and query it without
/// holding any lock. Training builds a complete new instance first and swaps
/// it in under a short write lock, so a query sees either the old engine or
/// the new one, never a partial build. A failed training pass leaves the old
/// engine in place.
///
/// Queries before the first successful training return empty lists.
///
/// # Example
/// ```
/// use wordpredict_core::{Predictor, TextSource};
///
/// let predictor = Predictor::default();
/// assert!(!predictor.is_ready());
///
/// predictor
///     .train(&[TextSource::history("I am happy"), TextSource::history("I am sad"),
///              TextSource::history("I am happy")])
///     .unwrap();
/// assert_eq!(predictor.next_word_predictions("I am"), vec!["happy", "sad"]);
/// assert_eq!(predictor.spelling_completions("I am ha"), vec!["happy"]);
/// ```
#[derive(Debug, Default)]
pub struct Predictor {
    config: Config,
    current: RwLock<Option<Arc<EngineInstance>>>,
}

impl Predictor {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            current: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// True once a training pass has completed.
    pub fn is_ready(&self) -> bool {
        self.snapshot().is_some()
    }

    /// The engine instance currently answering queries.
    pub fn snapshot(&self) -> Option<Arc<EngineInstance>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Train on `sources` and make the result current.
    ///
    /// On error the previously ready engine keeps serving.
    pub fn train(&self, sources: &[TextSource]) -> Result<TrainingReport, TrainError> {
        let instance = trainer::train(sources, &self.config)?;
        let report = instance.report().clone();
        self.install(instance);
        Ok(report)
    }

    /// Train on the cached base corpus followed by `personal` sources.
    ///
    /// `load_base` runs only if `cache` is empty.
    pub fn train_with_cache<F, E>(
        &self,
        cache: &BaseCorpusCache,
        load_base: F,
        personal: &[TextSource],
    ) -> Result<TrainingReport, TrainError>
    where
        F: FnOnce() -> Result<Vec<TextSource>, E>,
        E: std::fmt::Display,
    {
        let base = cache.get_or_load(load_base).map_err(|e| {
            warn!(error = %e, "base corpus load failed, keeping previous engine");
            e
        })?;
        self.train(&trainer::compose_sources(&base, personal))
    }

    /// Train on a worker thread while the current engine keeps answering.
    pub fn train_in_background(
        self: &Arc<Self>,
        sources: Vec<TextSource>,
    ) -> JoinHandle<Result<TrainingReport, TrainError>> {
        let predictor = Arc::clone(self);
        thread::spawn(move || predictor.train(&sources))
    }

    /// Drop the current engine; queries return nothing until the next
    /// training pass.
    pub fn reset(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Completions for the partial word at the end of `query_text`.
    pub fn spelling_completions(&self, query_text: &str) -> Vec<String> {
        match self.snapshot() {
            Some(engine) => engine.spelling_completions(query_text, self.config.completion_limit),
            None => self.not_ready(),
        }
    }

    /// Next-word predictions from the last tokens of `query_text`.
    pub fn next_word_predictions(&self, query_text: &str) -> Vec<String> {
        match self.snapshot() {
            Some(engine) => engine.next_word_predictions(query_text, self.config.prediction_limit),
            None => self.not_ready(),
        }
    }

    /// Short phrase predictions from the last tokens of `query_text`.
    pub fn phrase_predictions(&self, query_text: &str) -> Vec<String> {
        match self.snapshot() {
            Some(engine) => engine.phrase_predictions(
                query_text,
                self.config.prediction_limit,
                self.config.max_phrase_words,
            ),
            None => self.not_ready(),
        }
    }

    /// Spelling completions while mid-word, next-word predictions otherwise.
    pub fn suggestions(&self, query_text: &str) -> Suggestions {
        let mode = SuggestionMode::for_query(query_text);
        let items = match mode {
            SuggestionMode::Spelling => self.spelling_completions(query_text),
            SuggestionMode::NextWord => self.next_word_predictions(query_text),
        };
        Suggestions { mode, items }
    }

    fn install(&self, instance: EngineInstance) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(Arc::new(instance));
        debug!("engine instance swapped in");
    }

    fn not_ready(&self) -> Vec<String> {
        trace!("query before training, no suggestions");
        Vec::new()
    }
}
