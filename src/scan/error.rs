//! Scan errors. All of them abort the scan run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Malformed pattern on line {line}: expected CATEGORY==REGEX, got {content:?}")]
    MalformedPattern { line: usize, content: String },

    #[error("Invalid regex for category {category}: {source}")]
    InvalidRegex {
        category: String,
        #[source]
        source: regex::Error,
    },

    #[error("Document {document} has no string `text` field")]
    MissingText { document: usize },

    #[error("Document {document} is not a JSON object")]
    NotAnObject { document: usize },

    #[error("Failed to parse document {document}: {source}")]
    InvalidJson {
        document: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
