//! Command-line interface for textreview.
//!
//! Provides commands for scanning a corpus, creating a review workspace,
//! inspecting rows, reviewing interactively and exporting annotations.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::compositor::{compose, to_ansi, Layers, Reveal};
use crate::config::{resolve_config_path, ReviewConfig};
use crate::core::{AnnotationStore, CorpusIndex, JsonlCorpus, ReviewSession};
use crate::scan::{scan_file, WindowConfig};
use crate::scan::window::{DEFAULT_CONTEXT_LENGTH, DEFAULT_MAX_WINDOW};

pub mod review;

/// textreview - regex corpus scanner and match review tool
#[derive(Parser, Debug)]
#[command(name = "textreview")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a JSONL corpus and write <stem>.pattern.jsonl beside it
    Scan {
        /// Pattern file (one CATEGORY==REGEX per line)
        patterns: PathBuf,

        /// Corpus file (JSONL, each object with a "text" field)
        corpus: PathBuf,

        /// Characters of near context on each side
        #[arg(long, default_value_t = DEFAULT_CONTEXT_LENGTH)]
        context_length: usize,

        /// Characters of far context on each side
        #[arg(long, default_value_t = DEFAULT_MAX_WINDOW)]
        max_window: usize,
    },

    /// Write a default review config
    Init {
        /// Config file to create
        config: PathBuf,
    },

    /// Print one row with highlights and marks
    Show {
        /// Row id in the match corpus
        row: usize,

        /// Config file (discovered if not given)
        #[arg(short, long, env = "TEXTREVIEW_CONFIG")]
        config: Option<PathBuf>,

        /// Reveal the far text before the match
        #[arg(long)]
        before: bool,

        /// Reveal the far text after the match
        #[arg(long)]
        after: bool,

        /// Wrap width (0 disables wrapping)
        #[arg(short, long, default_value = "100")]
        width: usize,
    },

    /// List recently reviewed rows
    Recent {
        #[arg(short, long, env = "TEXTREVIEW_CONFIG")]
        config: Option<PathBuf>,

        /// Maximum number of rows to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Export all annotations to a new JSONL snapshot
    Export {
        #[arg(short, long, env = "TEXTREVIEW_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Review matches interactively (commands are read from stdin)
    Review {
        #[arg(short, long, env = "TEXTREVIEW_CONFIG")]
        config: Option<PathBuf>,

        /// Wrap width (0 disables wrapping)
        #[arg(short, long, default_value = "100")]
        width: usize,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Scan {
                patterns,
                corpus,
                context_length,
                max_window,
            } => run_scan(
                &patterns,
                &corpus,
                WindowConfig {
                    context_length,
                    max_window,
                },
            ),
            Commands::Init { config } => init_config(&config),
            Commands::Show {
                row,
                config,
                before,
                after,
                width,
            } => show_row(row, config, Reveal { before, after }, width),
            Commands::Recent { config, limit } => list_recent(config, limit),
            Commands::Export { config } => export(config),
            Commands::Review { config, width } => run_review(config, width).await,
        }
    }
}

fn load_config(explicit: Option<PathBuf>) -> Result<ReviewConfig> {
    let path = resolve_config_path(explicit)?;
    ReviewConfig::load(&path).with_context(|| format!("Failed to load config: {}", path.display()))
}

fn open_store(config: &ReviewConfig) -> Result<AnnotationStore> {
    let db = config.annotations_db_path();
    AnnotationStore::open(&db).with_context(|| format!("Failed to open annotation store: {}", db.display()))
}

fn open_corpus(config: &ReviewConfig) -> Result<JsonlCorpus> {
    let path = config.corpus_path();
    JsonlCorpus::open(&path).with_context(|| format!("Failed to open match corpus: {}", path.display()))
}

fn run_scan(patterns: &Path, corpus: &Path, window: WindowConfig) -> Result<()> {
    let summary = scan_file(patterns, corpus, window)
        .with_context(|| format!("Failed to scan {}", corpus.display()))?;

    println!("{:<24} {:>8}", "CATEGORY", "MATCHES");
    println!("{}", "-".repeat(33));
    for (category, count) in &summary.per_category {
        println!("{:<24} {:>8}", category, count);
    }
    println!(
        "\n{} matches in {} documents -> {}",
        summary.matches,
        summary.documents,
        summary.output.display()
    );
    Ok(())
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("Config already exists: {}", path.display());
    }
    let config = ReviewConfig::init(path)
        .with_context(|| format!("Failed to write config: {}", path.display()))?;
    println!("Created {}", config.path().display());
    println!("Corpus: {}", config.corpus_path().display());
    Ok(())
}

fn show_row(row: usize, config: Option<PathBuf>, reveal: Reveal, width: usize) -> Result<()> {
    let config = load_config(config)?;
    let corpus = open_corpus(&config)?;
    let store = open_store(&config)?;

    let record = corpus.get(row)?;
    let annotation = store.get(row)?;
    let composition = compose(
        &record,
        annotation.marks(),
        reveal,
        Layers {
            highlights: config.highlights(),
            mark_colors: config.mark_colors(),
            search: None,
        },
    );

    println!("Row {} of {}: {}", row, corpus.len(), record.display_metadata(40).join(" | "));
    println!("{}", to_ansi(&composition.wrap(width)));
    review::print_annotation(&mut std::io::stdout(), &annotation, store.last_saved(row)?)?;
    Ok(())
}

fn list_recent(config: Option<PathBuf>, limit: usize) -> Result<()> {
    let config = load_config(config)?;
    let store = open_store(&config)?;
    let rows = store.recent_reviewed_ids(Some(limit))?;

    if rows.is_empty() {
        println!("No reviewed rows");
        return Ok(());
    }

    println!("{:<8} {:<8} {:<30} {}", "ROW", "FLAGGED", "LABELS", "LAST SAVED");
    println!("{}", "-".repeat(75));
    for row in rows {
        let annotation = store.get(row)?;
        let saved = store
            .last_saved(row)?
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        println!(
            "{:<8} {:<8} {:<30} {}",
            row,
            if annotation.flagged { "yes" } else { "" },
            annotation.selected().join(", "),
            saved
        );
    }
    Ok(())
}

fn export(config: Option<PathBuf>) -> Result<()> {
    let config = load_config(config)?;
    let store = open_store(&config)?;
    let path = store.export(&config.reviewer()).context("Export failed")?;
    println!("Exported {} annotations to {}", store.count()?, path.display());
    Ok(())
}

async fn run_review(config: Option<PathBuf>, width: usize) -> Result<()> {
    let config = load_config(config)?;
    let corpus = open_corpus(&config)?;
    let store = open_store(&config)?;
    let mut session = ReviewSession::new(config, corpus, store).context("Failed to start review")?;

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let path = review::run(&mut session, stdin, &mut std::io::stdout(), width).await?;
    eprintln!("\n[Annotations exported to {}]", path.display());
    Ok(())
}
