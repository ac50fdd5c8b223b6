//! Reviewer annotations for a single corpus row.
//!
//! An `AnnotationRecord` is a working copy: edits stay in memory until the
//! record is passed to `AnnotationStore::save`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Corpus row index (0-based), the primary key of an annotation
pub type RowId = usize;

/// Semantic tag of a mark. Open set; `mark` and `negated` are built in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkKind(String);

impl MarkKind {
    pub const MARK: &'static str = "mark";
    pub const NEGATED: &'static str = "negated";

    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    /// Affirming mark
    pub fn mark() -> Self {
        Self::new(Self::MARK)
    }

    /// Negating mark
    pub fn negated() -> Self {
        Self::new(Self::NEGATED)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MarkKind {
    fn default() -> Self {
        Self::mark()
    }
}

impl std::fmt::Display for MarkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A reviewer-drawn sub-span over the match text.
///
/// Offsets are relative to the first character of the match and may fall
/// outside it when the selection extended into the surrounding context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    pub start: i64,
    pub end: i64,
    pub kind: MarkKind,
    /// Text captured when the mark was drawn (display only)
    pub selection: String,
}

/// All reviewer judgments for one corpus row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    #[serde(skip)]
    row_id: RowId,

    /// Response labels in the order they were chosen
    #[serde(default)]
    selected: Vec<String>,

    /// Free-text comment
    #[serde(default)]
    pub comment: String,

    /// Marks in insertion order (append-only)
    #[serde(default)]
    marks: Vec<Mark>,

    #[serde(default)]
    pub flagged: bool,
}

impl AnnotationRecord {
    /// Fresh default record for a row (not persisted)
    pub fn new(row_id: RowId) -> Self {
        Self {
            row_id,
            ..Self::default()
        }
    }

    /// Rebuild a record from its stored JSON payload
    pub fn from_payload(row_id: RowId, payload: &str) -> serde_json::Result<Self> {
        let mut record: Self = serde_json::from_str(payload)?;
        record.row_id = row_id;
        Ok(record)
    }

    /// Serialize the stored payload (`selected`, `comment`, `marks`, `flagged`)
    pub fn to_payload(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Flatten into one export object: payload fields plus `row` and `user`
    pub fn to_export_object(&self, user: &str) -> serde_json::Result<Map<String, Value>> {
        let mut object = match serde_json::to_value(self)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        object.insert("row".to_string(), Value::from(self.row_id));
        object.insert("user".to_string(), Value::from(user));
        Ok(object)
    }

    pub fn row_id(&self) -> RowId {
        self.row_id
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn marks(&self) -> &[Mark] {
        &self.marks
    }

    pub fn is_selected(&self, label: &str) -> bool {
        self.selected.iter().any(|s| s == label)
    }

    /// Add a label if absent (no duplicates)
    pub fn select_label(&mut self, label: impl Into<String>) {
        let label = label.into();
        if !self.is_selected(&label) {
            self.selected.push(label);
        }
    }

    /// Toggle a label; returns whether it is now selected
    pub fn toggle_label(&mut self, label: &str) -> bool {
        if let Some(pos) = self.selected.iter().position(|s| s == label) {
            self.selected.remove(pos);
            false
        } else {
            self.selected.push(label.to_string());
            true
        }
    }

    pub fn set_comment(&mut self, comment: impl Into<String>) {
        self.comment = comment.into();
    }

    /// Flip the flagged state; returns the new value
    pub fn toggle_flag(&mut self) -> bool {
        self.flagged = !self.flagged;
        self.flagged
    }

    /// Append a mark. Marks are never edited or removed.
    pub fn add_mark(&mut self, start: i64, end: i64, selection: impl Into<String>, kind: MarkKind) {
        self.marks.push(Mark {
            start,
            end,
            kind,
            selection: selection.into(),
        });
    }
}
