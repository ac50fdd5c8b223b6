//! Highlight rules from reviewer configuration.

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// A regex painted with a named colour wherever it matches the visible text.
///
/// Rules are stateless: they are compiled and re-run on every render and are
/// never stored with an annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightRule {
    pub regex: String,
    pub color: String,
}

impl HighlightRule {
    pub fn new(regex: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            regex: regex.into(),
            color: color.into(),
        }
    }

    /// Compile the rule's regex (case-insensitive)
    pub fn compile(&self) -> Result<Regex, regex::Error> {
        RegexBuilder::new(&self.regex).case_insensitive(true).build()
    }
}
