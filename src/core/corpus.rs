//! Random access over the match corpus.
//!
//! The corpus file is scanned once to record where each line starts; rows
//! are then read on demand by seeking, so large corpora are never held in
//! memory.

use std::fs::File;
use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::domain::{MatchRecord, RowId};

/// Errors that can occur reading the corpus
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Row {row} out of range (corpus has {len} rows)")]
    RowOutOfRange { row: RowId, len: usize },

    #[error("Failed to parse corpus row {row}: {source}")]
    InvalidRow {
        row: RowId,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Opaque random-access sequence of match records
pub trait CorpusIndex {
    fn len(&self) -> usize;

    fn get(&self, row: RowId) -> Result<MatchRecord, CorpusError>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// JSONL corpus indexed by line offsets
#[derive(Debug)]
pub struct JsonlCorpus {
    path: PathBuf,
    /// Byte offset of each non-blank line
    offsets: Vec<u64>,
}

impl JsonlCorpus {
    /// Index a JSONL file
    pub fn open(path: &Path) -> Result<Self, CorpusError> {
        let mut reader = BufReader::new(File::open(path)?);
        let mut offsets = Vec::new();
        let mut position = 0u64;
        let mut line = String::new();

        loop {
            line.clear();
            let read = reader.read_line(&mut line)?;
            if read == 0 {
                break;
            }
            if !line.trim().is_empty() {
                offsets.push(position);
            }
            position += read as u64;
        }

        info!(rows = offsets.len(), corpus = %path.display(), "Indexed corpus");
        Ok(Self {
            path: path.to_path_buf(),
            offsets,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CorpusIndex for JsonlCorpus {
    fn len(&self) -> usize {
        self.offsets.len()
    }

    fn get(&self, row: RowId) -> Result<MatchRecord, CorpusError> {
        let offset = *self.offsets.get(row).ok_or(CorpusError::RowOutOfRange {
            row,
            len: self.offsets.len(),
        })?;

        let mut file = File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;
        let mut line = String::new();
        BufReader::new(file).read_line(&mut line)?;

        serde_json::from_str(&line).map_err(|source| CorpusError::InvalidRow { row, source })
    }
}

/// In-memory corpus, handy for tests and small fixtures
impl CorpusIndex for Vec<MatchRecord> {
    fn len(&self) -> usize {
        <[MatchRecord]>::len(self)
    }

    fn get(&self, row: RowId) -> Result<MatchRecord, CorpusError> {
        <[MatchRecord]>::get(self, row)
            .cloned()
            .ok_or(CorpusError::RowOutOfRange {
                row,
                len: <[MatchRecord]>::len(self),
            })
    }
}
