//! textreview - regex corpus scanner and match review tool
//!
//! Scans a JSONL text corpus with a set of named regular expressions,
//! writes one record per match with near and far context, and lets a
//! reviewer step through the matches, label them and mark sub-spans.
//!
//! # Architecture
//!
//! - Scanning is a single pass that produces an immutable match corpus
//! - Annotations are stored per row in SQLite, keyed by match position
//! - Marks are stored relative to the match and placed on screen by the
//!   compositor on every render, so revealing more context never moves them
//!
//! # Modules
//!
//! - `scan`: Pattern loading, context windows and the corpus scanner
//! - `domain`: Data structures (MatchRecord, AnnotationRecord, Mark, HighlightRule)
//! - `core`: Annotation store, corpus index and review session
//! - `compositor`: Offset translation, highlight layering and rendering
//! - `config`: Review workspace configuration
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Scan a corpus (writes corpus.pattern.jsonl)
//! textreview scan patterns.txt corpus.jsonl
//!
//! # Create a workspace and review
//! textreview init .textreview/config.yaml
//! textreview review
//!
//! # Export annotations
//! textreview export
//! ```

pub mod cli;
pub mod compositor;
pub mod config;
pub mod core;
pub mod domain;
pub mod scan;

// Re-export main types at crate root for convenience
pub use compositor::{Composition, SpanCompositor};
pub use core::{AnnotationStore, ReviewSession};
pub use domain::{AnnotationRecord, HighlightRule, Mark, MarkKind, MatchRecord};
pub use scan::{PatternScanner, PatternSet};
