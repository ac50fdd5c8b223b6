//! Core review logic.
//!
//! This module contains:
//! - AnnotationStore: Durable per-row annotations and export snapshots
//! - CorpusIndex: Random access over the match corpus
//! - ReviewSession: Navigation and editing of the current row

pub mod annotation_store;
pub mod corpus;
pub mod session;

// Re-export commonly used types
pub use annotation_store::{AnnotationStore, StoreError};
pub use corpus::{CorpusError, CorpusIndex, JsonlCorpus};
pub use session::{Boundary, Loaded, Progress, ReviewSession, SessionError};
