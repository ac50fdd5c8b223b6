//! Corpus scanning: regex patterns to positioned match records.
//!
//! - `patterns`: Pattern file loading (`CATEGORY==REGEX`)
//! - `window`: Character-indexed context windows around a match
//! - `scanner`: Applies patterns to documents and writes the match corpus
//!
//! Every offset produced here counts characters, so records line up with
//! what a reviewer sees regardless of multi-byte text.

pub mod error;
pub mod patterns;
pub mod scanner;
pub mod window;

pub use error::ScanError;
pub use patterns::{compile_pattern, Pattern, PatternSet, PATTERN_SEPARATOR};
pub use scanner::{read_documents, scan_file, PatternScanner, ScanSummary};
pub use window::{CharText, ContextWindow, WindowConfig};
