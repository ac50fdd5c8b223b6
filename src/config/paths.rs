//! Canonical file locations for a review workspace.
//!
//! Single source of truth - import this instead of hardcoding names.
//!
//! | File | Location |
//! |------|----------|
//! | `config.yaml` | `.textreview/` in the project, or any explicit path |
//! | match corpus | `<corpus stem>.pattern.jsonl` beside the scanned corpus |
//! | `annotations.db` | beside the match corpus |
//! | exports | beside `annotations.db`, one timestamped file per export |

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

/// Directory searched for a config file
pub const CONFIG_DIR: &str = ".textreview";

/// Config file name inside `CONFIG_DIR`
pub const CONFIG_FILE: &str = "config.yaml";

/// Annotation database file name
pub const ANNOTATIONS_DB: &str = "annotations.db";

/// Extension replacing the corpus extension for scan output
pub const PATTERN_OUTPUT_EXTENSION: &str = "pattern.jsonl";

/// Match corpus written by a scan: `corpus.jsonl` -> `corpus.pattern.jsonl`
pub fn pattern_output_path(corpus: &Path) -> PathBuf {
    corpus.with_extension(PATTERN_OUTPUT_EXTENSION)
}

/// Annotation database for a match corpus
pub fn annotations_db_path(corpus: &Path) -> PathBuf {
    corpus
        .parent()
        .unwrap_or(Path::new("."))
        .join(ANNOTATIONS_DB)
}

/// Export file name for a timestamp; `attempt > 0` adds a uniqueness suffix
pub fn export_file_name(at: DateTime<Local>, attempt: usize) -> String {
    let stamp = at.format("%Y%m%d_%H%M%S");
    if attempt == 0 {
        format!("export_{}.db.jsonl", stamp)
    } else {
        format!("export_{}_{}.db.jsonl", stamp, attempt)
    }
}
