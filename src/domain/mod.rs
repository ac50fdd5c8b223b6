//! Domain types for textreview.
//!
//! This module contains the core data structures:
//! - MatchRecord: One scanner hit with its tiered context windows
//! - AnnotationRecord: A reviewer's judgment for one corpus row
//! - Mark: A sub-span annotation drawn over a match
//! - HighlightRule: A configured regex/colour pair

pub mod annotation;
pub mod highlight;
pub mod match_record;

// Re-export commonly used types
pub use annotation::{AnnotationRecord, Mark, MarkKind, RowId};
pub use highlight::HighlightRule;
pub use match_record::MatchRecord;
