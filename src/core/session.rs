//! Review session: navigation over the match corpus with a working copy
//! of the current row's annotation.
//!
//! Navigation is an explicit transition. `load_record` clamps the requested
//! index into the corpus, reports whether it hit an edge, loads the match
//! record and its stored annotation, and remembers the position in the
//! config file. Edits go to the working copy until `save_current`.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use super::annotation_store::{AnnotationStore, StoreError};
use super::corpus::{CorpusError, CorpusIndex, JsonlCorpus};
use crate::compositor::{compose, Composition, DisplayLine, Layers, LineCol, LineMap, OffsetError, Reveal};
use crate::config::{ConfigError, ReviewConfig};
use crate::domain::{AnnotationRecord, MarkKind, MatchRecord, RowId};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Corpus has no rows")]
    EmptyCorpus,

    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Selection out of bounds: {0}")]
    Selection(#[from] OffsetError),
}

/// Where a requested index fell relative to the corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Within,
    /// Requested index was below 0; clamped to the first row
    BeforeFirst,
    /// Requested index was past the end; clamped to the last row
    PastLast,
}

/// Result of a navigation step
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded {
    pub row: RowId,
    pub record: MatchRecord,
    pub annotation: AnnotationRecord,
    pub boundary: Boundary,
}

/// Position summary for a status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub row: RowId,
    pub total: usize,
    pub reviewed: usize,
}

pub struct ReviewSession<C: CorpusIndex> {
    config: ReviewConfig,
    corpus: C,
    store: AnnotationStore,
    row: RowId,
    record: MatchRecord,
    /// Annotation as last loaded or saved
    persisted: AnnotationRecord,
    /// Working copy edited by the reviewer
    working: AnnotationRecord,
    reveal: Reveal,
    search: Option<String>,
}

impl ReviewSession<JsonlCorpus> {
    /// Open the corpus and store named by a config file
    pub fn from_config(config: ReviewConfig) -> Result<Self, SessionError> {
        let corpus = JsonlCorpus::open(&config.corpus_path())?;
        let store = AnnotationStore::open(&config.annotations_db_path())?;
        Self::new(config, corpus, store)
    }
}

impl<C: CorpusIndex> ReviewSession<C> {
    /// Start a session at the config's remembered offset
    pub fn new(config: ReviewConfig, corpus: C, store: AnnotationStore) -> Result<Self, SessionError> {
        if corpus.is_empty() {
            return Err(SessionError::EmptyCorpus);
        }
        let row = config.offset().min(corpus.len() - 1);
        let record = corpus.get(row)?;
        let persisted = store.get(row)?;

        let mut session = Self {
            config,
            corpus,
            store,
            row,
            record,
            working: persisted.clone(),
            persisted,
            reveal: Reveal::default(),
            search: None,
        };
        session.config.set_offset(row)?;
        Ok(session)
    }

    /// Move to `idx` (clamped) without saving the working copy
    pub fn load_record(&mut self, idx: i64) -> Result<Loaded, SessionError> {
        let last = self.corpus.len() - 1;
        let (row, boundary) = if idx < 0 {
            (0, Boundary::BeforeFirst)
        } else if idx as u64 > last as u64 {
            (last, Boundary::PastLast)
        } else {
            (idx as usize, Boundary::Within)
        };

        match boundary {
            Boundary::BeforeFirst => info!("Already at the first row"),
            Boundary::PastLast => info!(rows = self.corpus.len(), "Reached the last row"),
            Boundary::Within => debug!(row, "Loading row"),
        }

        self.record = self.corpus.get(row)?;
        self.persisted = self.store.get(row)?;
        self.working = self.persisted.clone();
        self.row = row;
        self.reveal = Reveal::default();
        self.config.set_offset(row)?;

        Ok(self.loaded(boundary))
    }

    fn loaded(&self, boundary: Boundary) -> Loaded {
        Loaded {
            row: self.row,
            record: self.record.clone(),
            annotation: self.working.clone(),
            boundary,
        }
    }

    /// Commit the working copy
    pub fn save_current(&mut self) -> Result<DateTime<Utc>, SessionError> {
        let at = self.store.save(self.row, &self.working)?;
        self.persisted = self.working.clone();
        Ok(at)
    }

    /// Save, then move forward one row
    pub fn next(&mut self) -> Result<Loaded, SessionError> {
        self.save_current()?;
        self.load_record(self.row as i64 + 1)
    }

    /// Save, then move back one row
    pub fn previous(&mut self) -> Result<Loaded, SessionError> {
        self.save_current()?;
        self.load_record(self.row as i64 - 1)
    }

    /// Jump to a row; unsaved edits are discarded
    pub fn goto(&mut self, idx: i64) -> Result<Loaded, SessionError> {
        if self.is_dirty() {
            debug!(row = self.row, "Discarding unsaved edits");
        }
        self.load_record(idx)
    }

    pub fn row(&self) -> RowId {
        self.row
    }

    pub fn record(&self) -> &MatchRecord {
        &self.record
    }

    pub fn annotation(&self) -> &AnnotationRecord {
        &self.working
    }

    pub fn annotation_mut(&mut self) -> &mut AnnotationRecord {
        &mut self.working
    }

    /// Whether the working copy differs from what is stored
    pub fn is_dirty(&self) -> bool {
        self.working != self.persisted
    }

    pub fn config(&self) -> &ReviewConfig {
        &self.config
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn reveal(&self) -> Reveal {
        self.reveal
    }

    /// Show or hide the far text before the match
    pub fn toggle_reveal_before(&mut self) -> bool {
        self.reveal.before = !self.reveal.before;
        self.reveal.before
    }

    /// Show or hide the far text after the match
    pub fn toggle_reveal_after(&mut self) -> bool {
        self.reveal.after = !self.reveal.after;
        self.reveal.after
    }

    /// Set or clear the transient search pattern
    pub fn search(&mut self, pattern: Option<&str>) {
        self.search = pattern.filter(|p| !p.is_empty()).map(str::to_string);
    }

    pub fn search_pattern(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Toggle a response label; returns whether it is now selected
    pub fn toggle_label(&mut self, label: &str) -> bool {
        self.working.toggle_label(label)
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.working.set_comment(comment);
    }

    pub fn toggle_flag(&mut self) -> bool {
        self.working.toggle_flag()
    }

    pub fn canned_responses(&self) -> &[String] {
        self.config.canned_responses()
    }

    /// Replace the comment with canned response `index` (0-based)
    pub fn use_canned_response(&mut self, index: usize) -> Option<String> {
        let text = self.config.canned_responses().get(index)?.clone();
        self.working.set_comment(text.clone());
        Some(text)
    }

    /// Remember a new canned response and use it as the comment
    pub fn add_canned_response(&mut self, text: &str) -> Result<String, SessionError> {
        let text = self.config.add_canned_response(text)?;
        self.working.set_comment(text.clone());
        debug!(response = %text, "Added canned response");
        Ok(text)
    }

    /// Change the reviewer identity stored in the config file
    pub fn set_user(&mut self, name: &str) -> Result<(), SessionError> {
        self.config.set_user(name)?;
        info!(user = %self.config.reviewer(), "Reviewer changed");
        Ok(())
    }

    /// Add a mark from window offsets in the current reveal state
    pub fn add_mark(&mut self, start: usize, end: usize, kind: MarkKind) {
        let (start, end) = if end < start { (end, start) } else { (start, end) };
        let composition = self.composition();
        let window = composition.window();
        let selection = window.slice(start..end);
        self.working.add_mark(
            window.to_match_relative(start),
            window.to_match_relative(end),
            selection,
            kind,
        );
    }

    /// Add a mark from a `(line, column)` selection in the unwrapped window
    pub fn add_mark_from_selection(
        &mut self,
        start: LineCol,
        end: LineCol,
        kind: MarkKind,
    ) -> Result<(), SessionError> {
        let lines = LineMap::new(self.composition().text());
        let start = lines.to_absolute_offset(start.line, start.col)?;
        let end = lines.to_absolute_offset(end.line, end.col)?;
        self.add_mark(start, end, kind);
        Ok(())
    }

    /// Layered composition of the current row with the working copy's marks
    pub fn composition(&self) -> Composition {
        compose(
            &self.record,
            self.working.marks(),
            self.reveal,
            Layers {
                highlights: self.config.highlights(),
                mark_colors: self.config.mark_colors(),
                search: self.search.as_deref(),
            },
        )
    }

    /// Current composition wrapped to `width` columns
    pub fn compose(&self, width: usize) -> Vec<DisplayLine> {
        self.composition().wrap(width)
    }

    /// Validate, append and persist a highlight rule
    pub fn add_highlight(&mut self, regex: &str, color: &str) -> Result<(), SessionError> {
        self.config.add_highlight(regex, color)?;
        info!(regex, color, "Added highlight rule");
        Ok(())
    }

    pub fn recent_reviewed(&self, limit: Option<usize>) -> Result<Vec<RowId>, SessionError> {
        Ok(self.store.recent_reviewed_ids(limit)?)
    }

    pub fn last_saved(&self) -> Result<Option<DateTime<Utc>>, SessionError> {
        Ok(self.store.last_saved(self.row)?)
    }

    pub fn progress(&self) -> Result<Progress, SessionError> {
        Ok(Progress {
            row: self.row,
            total: self.corpus.len(),
            reviewed: self.store.count()?,
        })
    }

    /// Save pending edits and export a snapshot as the configured reviewer
    pub fn finish(&mut self) -> Result<PathBuf, SessionError> {
        let user = self.config.reviewer();
        self.finish_as(&user)
    }

    /// Save pending edits and export a snapshot attributed to `user`
    pub fn finish_as(&mut self, user: &str) -> Result<PathBuf, SessionError> {
        if self.is_dirty() {
            self.save_current()?;
        }
        let path = self.store.export(user)?;
        info!(user = %user, export = %path.display(), "Finished review");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(pre: &str, matched: &str, post: &str, pretext: &str) -> MatchRecord {
        MatchRecord {
            category: "C".to_string(),
            matched: matched.to_string(),
            precontext: pre.to_string(),
            postcontext: post.to_string(),
            pretext: pretext.to_string(),
            posttext: post.to_string(),
            start_index: pretext.chars().count(),
            end_index: pretext.chars().count() + matched.chars().count(),
            fields: Default::default(),
        }
    }

    fn session(temp: &TempDir) -> ReviewSession<Vec<MatchRecord>> {
        let config = ReviewConfig::init(&temp.path().join("config.yaml")).unwrap();
        let store = AnnotationStore::open(&temp.path().join("annotations.db")).unwrap();
        let corpus = vec![
            record("ab ", "first", " cd", "xyz ab "),
            record("", "second", "", ""),
            record("q ", "third", "", "q "),
        ];
        ReviewSession::new(config, corpus, store).unwrap()
    }

    #[test]
    fn test_load_record_clamps_and_signals() {
        let temp = TempDir::new().unwrap();
        let mut session = session(&temp);

        let loaded = session.load_record(-1).unwrap();
        assert_eq!((loaded.row, loaded.boundary), (0, Boundary::BeforeFirst));

        let loaded = session.load_record(10).unwrap();
        assert_eq!((loaded.row, loaded.boundary), (2, Boundary::PastLast));
        assert_eq!(loaded.record.matched, "third");

        let loaded = session.load_record(1).unwrap();
        assert_eq!(loaded.boundary, Boundary::Within);
        assert_eq!(session.config().offset(), 1);
    }

    #[test]
    fn test_next_saves_and_goto_discards() {
        let temp = TempDir::new().unwrap();
        let mut session = session(&temp);

        session.toggle_flag();
        let loaded = session.next().unwrap();
        assert_eq!(loaded.row, 1);
        assert!(session.store().get(0).unwrap().flagged);

        session.set_comment("unsaved");
        session.goto(0).unwrap();
        assert!(!session.store().exists(1).unwrap());
        assert!(session.annotation().flagged);
    }

    #[test]
    fn test_reveal_resets_on_navigation() {
        let temp = TempDir::new().unwrap();
        let mut session = session(&temp);

        assert!(session.toggle_reveal_before());
        assert!(session.composition().text().starts_with("xyz "));
        session.goto(0).unwrap();
        assert_eq!(session.reveal(), Reveal::default());
    }

    #[test]
    fn test_marks_are_stored_match_relative() {
        let temp = TempDir::new().unwrap();
        let mut session = session(&temp);

        // "ab first cd": "ab" is window 0..2
        session.add_mark(0, 2, MarkKind::mark());
        let mark = &session.annotation().marks()[0];
        assert_eq!((mark.start, mark.end), (-3, -1));
        assert_eq!(mark.selection, "ab");

        session.toggle_reveal_before();
        session
            .add_mark_from_selection(LineCol { line: 0, col: 9 }, LineCol { line: 0, col: 7 }, MarkKind::negated())
            .unwrap();
        let mark = &session.annotation().marks()[1];
        assert_eq!((mark.start, mark.end), (0, 2));
        assert_eq!(mark.selection, "fi");

        assert!(session
            .add_mark_from_selection(LineCol { line: 1, col: 0 }, LineCol { line: 0, col: 0 }, MarkKind::mark())
            .is_err());
    }

    #[test]
    fn test_finish_exports_pending_edits() {
        let temp = TempDir::new().unwrap();
        let mut session = session(&temp);
        session.toggle_label("Relevant");

        let path = session.finish_as("tester").unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        let line: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(line["row"], 0);
        assert_eq!(line["selected"][0], "Relevant");
        assert_eq!(line["user"], "tester");
        assert_eq!(session.progress().unwrap().reviewed, 1);
    }

    #[test]
    fn test_canned_responses_set_comment() {
        let temp = TempDir::new().unwrap();
        let mut session = session(&temp);
        session.add_canned_response("Great").unwrap();
        session.add_canned_response("Fix it").unwrap();
        assert_eq!(session.annotation().comment, "Fix it");

        assert_eq!(session.use_canned_response(0).as_deref(), Some("Great"));
        assert_eq!(session.annotation().comment, "Great");
        assert_eq!(session.use_canned_response(5), None);
        assert_eq!(session.annotation().comment, "Great");

        let reloaded = ReviewConfig::load(session.config().path()).unwrap();
        assert_eq!(reloaded.canned_responses(), ["Great", "Fix it"]);
    }

    #[test]
    fn test_set_user_is_saved_to_config() {
        let temp = TempDir::new().unwrap();
        let mut session = session(&temp);
        session.set_user("tester_user").unwrap();

        let reloaded = ReviewConfig::load(session.config().path()).unwrap();
        assert_eq!(reloaded.data.user.as_deref(), Some("tester_user"));
    }
}
