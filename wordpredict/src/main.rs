use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use wordpredict_core::{Config, Predictor, SuggestionMode, Suggestions, TextSource};

#[derive(Parser)]
#[command(name = "wordpredict")]
#[command(about = "Word completion and next-word prediction trained on your own text")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    training: TrainingArgs,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Args)]
struct TrainingArgs {
    /// Base corpus text file (repeatable)
    #[arg(long, global = true)]
    corpus: Vec<PathBuf>,

    /// Word list merged after the base corpus (repeatable)
    #[arg(long, global = true)]
    dictionary: Vec<PathBuf>,

    /// Persona text file
    #[arg(long, global = true)]
    persona: Option<PathBuf>,

    /// Message history file
    #[arg(long, global = true)]
    history: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Complete the word at the end of QUERY
    Complete { query: String },
    /// Predict the word after QUERY
    Predict { query: String },
    /// Predict a short phrase after QUERY
    Phrase { query: String },
    /// Complete or predict, depending on how QUERY ends
    Suggest { query: String },
    /// Interactive mode: one query per line
    Repl,
}

fn read_source(path: &Path, label: &str) -> Result<TextSource> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {} file {}", label, path.display()))?;
    debug!(label, path = %path.display(), bytes = text.len(), "read training file");
    Ok(TextSource::new(label, text))
}

impl TrainingArgs {
    fn load_config(&self) -> Result<Config> {
        match &self.config {
            Some(path) => Config::load_toml(path)
                .map_err(|e| anyhow::anyhow!("{}", e))
                .with_context(|| format!("failed to load config {}", path.display())),
            None => Ok(Config::default()),
        }
    }

    /// Sources in training order: corpus, dictionary, persona, history.
    fn sources(&self) -> Result<Vec<TextSource>> {
        let mut sources = Vec::new();
        for path in &self.corpus {
            sources.push(read_source(path, TextSource::BASE)?);
        }
        for path in &self.dictionary {
            sources.push(read_source(path, TextSource::DICTIONARY)?);
        }
        if let Some(path) = &self.persona {
            sources.push(read_source(path, TextSource::PERSONA)?);
        }
        if let Some(path) = &self.history {
            sources.push(read_source(path, TextSource::HISTORY)?);
        }
        Ok(sources)
    }

    fn predictor(&self) -> Result<Predictor> {
        let predictor = Predictor::new(self.load_config()?);
        let sources = self.sources()?;
        if sources.is_empty() {
            info!("no training text given, engine stays untrained");
            return Ok(predictor);
        }
        predictor.train(&sources).context("training failed")?;
        Ok(predictor)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

fn print_items(items: &[String], json: bool) -> Result<()> {
    if json {
        return print_json(&items);
    }
    if items.is_empty() {
        println!("  (no suggestions)");
    }
    for (i, item) in items.iter().enumerate() {
        println!("{}. {}", i + 1, item);
    }
    Ok(())
}

fn print_suggestions(suggestions: &Suggestions, json: bool) -> Result<()> {
    if json {
        return print_json(suggestions);
    }
    let label = match suggestions.mode {
        SuggestionMode::Spelling => "completions",
        SuggestionMode::NextWord => "next word",
    };
    println!("[{}]", label);
    print_items(&suggestions.items, false)
}

fn run_repl(predictor: &Predictor, json: bool) -> Result<()> {
    println!("wordpredict: type a message and press Enter");
    println!("End a line mid-word to complete it, with a space to predict the next word.");
    println!(":ready, :stats, :quit. Ctrl-D to exit.");

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("error reading stdin")?;
        match line.trim() {
            ":quit" | ":q" => break,
            ":ready" => println!("{}", predictor.is_ready()),
            ":stats" => match predictor.snapshot() {
                Some(engine) if json => print_json(engine.report())?,
                Some(engine) => {
                    let report = engine.report();
                    println!(
                        "tokens={} words={} vocabulary={} contexts={} order={}",
                        report.tokens,
                        report.word_tokens,
                        report.vocabulary,
                        report.contexts,
                        report.order
                    );
                    for source in &report.sources {
                        println!("  {}: {} bytes", source.label, source.bytes);
                    }
                }
                None => println!("  (not trained)"),
            },
            _ => {
                // trailing whitespace selects next-word mode, so keep it
                print_suggestions(&predictor.suggestions(&line), json)?;
            }
        }
        io::stdout().flush()?;
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let predictor = cli.training.predictor()?;

    match &cli.command {
        Commands::Complete { query } => {
            print_items(&predictor.spelling_completions(query), cli.json)
        }
        Commands::Predict { query } => {
            print_items(&predictor.next_word_predictions(query), cli.json)
        }
        Commands::Phrase { query } => print_items(&predictor.phrase_predictions(query), cli.json),
        Commands::Suggest { query } => print_suggestions(&predictor.suggestions(query), cli.json),
        Commands::Repl => run_repl(&predictor, cli.json),
    }
}
