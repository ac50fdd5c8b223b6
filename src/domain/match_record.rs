//! Match records produced by the corpus scanner.
//!
//! A match record is written once per (pattern, match) pair and never
//! modified afterwards. The match corpus (one record per line) is what
//! reviewers step through.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field names that carry the match and its context windows
pub const WINDOW_FIELDS: [&str; 5] = ["match", "precontext", "postcontext", "pretext", "posttext"];

/// One scanner hit with its tiered context windows.
///
/// All offsets count characters (Unicode scalar values), not bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Name of the pattern that produced the match
    pub category: String,

    /// Exact matched substring
    #[serde(rename = "match")]
    pub matched: String,

    /// Near context before the match (at most `context_length` chars)
    pub precontext: String,

    /// Near context after the match (at most `context_length` chars)
    pub postcontext: String,

    /// Far context before the match (at most `max_window` chars)
    pub pretext: String,

    /// Far context after the match (at most `max_window` chars)
    pub posttext: String,

    /// Character offset of the match start in the source document
    pub start_index: usize,

    /// Character offset of the match end in the source document
    pub end_index: usize,

    /// Every other field of the source document, passed through unchanged
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl MatchRecord {
    /// Length of the match in characters
    pub fn match_len(&self) -> usize {
        self.matched.chars().count()
    }

    /// Context shown before the match: far window when revealed, near otherwise
    pub fn before(&self, revealed: bool) -> &str {
        if revealed {
            &self.pretext
        } else {
            &self.precontext
        }
    }

    /// Context shown after the match: far window when revealed, near otherwise
    pub fn after(&self, revealed: bool) -> &str {
        if revealed {
            &self.posttext
        } else {
            &self.postcontext
        }
    }

    /// Short metadata values for a header line (category first, then passthrough fields)
    pub fn display_metadata(&self, max_chars: usize) -> Vec<String> {
        std::iter::once(self.category.clone())
            .chain(self.fields.values().map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }))
            .map(|s| s.chars().take(max_chars).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MatchRecord {
        serde_json::from_str(
            r#"{"id": 7, "source": "forum", "category": "JEALOUS", "match": "envious",
                "precontext": "and ", "postcontext": ".", "pretext": "She felt jealous and ",
                "posttext": ".", "start_index": 21, "end_index": 28}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_passthrough_fields_are_flattened() {
        let record = sample();
        assert_eq!(record.matched, "envious");
        assert_eq!(record.fields.get("id"), Some(&Value::from(7)));
        assert_eq!(record.fields.get("source"), Some(&Value::from("forum")));
        assert!(!record.fields.contains_key("match"));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["match"], "envious");
        assert_eq!(json["source"], "forum");
    }

    #[test]
    fn test_before_and_after_follow_reveal() {
        let record = sample();
        assert_eq!(record.before(false), "and ");
        assert_eq!(record.before(true), "She felt jealous and ");
        assert_eq!(record.after(false), ".");
        assert_eq!(record.match_len(), 7);
    }

    #[test]
    fn test_display_metadata_truncates() {
        let record = sample();
        let meta = record.display_metadata(4);
        assert_eq!(meta[0], "JEAL");
        assert!(meta.contains(&"foru".to_string()));
        assert!(meta.contains(&"7".to_string()));
    }
}
