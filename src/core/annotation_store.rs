//! Durable annotation storage keyed by corpus row.
//!
//! Annotations live in a single SQLite table:
//!
//! ```sql
//! annotations(rowid INTEGER PRIMARY KEY, annotation TEXT NOT NULL, last_update_utc TIMESTAMP NOT NULL)
//! ```
//!
//! Every `save` is one upsert statement committed before it returns, so a
//! crash loses at most the unsaved working copy, never half a record.
//! Exports are flat JSONL snapshots, one new file per call.

use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::paths;
use crate::domain::{AnnotationRecord, RowId};

/// Export attempts before giving up on finding a free file name
const MAX_EXPORT_ATTEMPTS: usize = 1000;

/// Errors that can occur with the annotation store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Row {0} does not fit in a database id")]
    RowIdOutOfRange(RowId),

    #[error("Invalid row id stored in database: {0}")]
    InvalidStoredRowId(i64),

    #[error("Invalid timestamp stored for row {row}: {value}")]
    InvalidTimestamp { row: RowId, value: String },

    #[error("No free export file name in {0}")]
    ExportNameExhausted(PathBuf),
}

/// SQLite-backed annotation store
pub struct AnnotationStore {
    conn: Connection,

    /// Path to the database file
    db_path: PathBuf,

    /// Directory receiving export snapshots
    export_dir: PathBuf,
}

impl AnnotationStore {
    /// Open (or create) a store at the given database path
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        Self::create_table(&conn)?;
        info!(db = %db_path.display(), "Opened annotation store");

        Ok(Self {
            conn,
            db_path: db_path.to_path_buf(),
            export_dir: db_path.parent().unwrap_or(Path::new(".")).to_path_buf(),
        })
    }

    fn create_table(conn: &Connection) -> Result<(), StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS annotations (
                rowid INTEGER PRIMARY KEY,
                annotation TEXT NOT NULL,
                last_update_utc TIMESTAMP NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    /// Get the path to the database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Get the directory exports are written to
    pub fn export_dir(&self) -> &Path {
        &self.export_dir
    }

    /// Persisted record for a row, or a fresh default one (not persisted)
    pub fn get(&self, row: RowId) -> Result<AnnotationRecord, StoreError> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT annotation FROM annotations WHERE rowid = ?1",
                params![to_sql_id(row)?],
                |r| r.get(0),
            )
            .optional()?;

        match payload {
            Some(payload) => Ok(AnnotationRecord::from_payload(row, &payload)?),
            None => Ok(AnnotationRecord::new(row)),
        }
    }

    /// Whether a record has been saved for this row
    pub fn exists(&self, row: RowId) -> Result<bool, StoreError> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM annotations WHERE rowid = ?1",
                params![to_sql_id(row)?],
                |r| r.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Insert or fully replace the record for a row, stamped now
    pub fn save(&self, row: RowId, record: &AnnotationRecord) -> Result<DateTime<Utc>, StoreError> {
        let now = Utc::now();
        self.save_at(row, record, now)?;
        Ok(now)
    }

    /// Insert or fully replace the record for a row with an explicit timestamp
    pub fn save_at(
        &self,
        row: RowId,
        record: &AnnotationRecord,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let payload = record.to_payload()?;
        self.conn.execute(
            "INSERT INTO annotations (rowid, annotation, last_update_utc)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(rowid) DO UPDATE SET
                 annotation = excluded.annotation,
                 last_update_utc = excluded.last_update_utc",
            params![to_sql_id(row)?, payload, format_timestamp(at)],
        )?;
        debug!(row, "Saved annotation");
        Ok(())
    }

    /// When a row was last saved
    pub fn last_saved(&self, row: RowId) -> Result<Option<DateTime<Utc>>, StoreError> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT last_update_utc FROM annotations WHERE rowid = ?1",
                params![to_sql_id(row)?],
                |r| r.get(0),
            )
            .optional()?;

        value
            .map(|value| {
                DateTime::parse_from_rfc3339(&value)
                    .map(|t| t.with_timezone(&Utc))
                    .map_err(|_| StoreError::InvalidTimestamp { row, value })
            })
            .transpose()
    }

    /// Number of persisted rows
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM annotations", [], |r| r.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Most recently saved rows, returned in ascending row order.
    ///
    /// Recency picks which rows make the cut; the result is then sorted by
    /// row id, so the most recent row is not necessarily last.
    pub fn recent_reviewed_ids(&self, limit: Option<usize>) -> Result<Vec<RowId>, StoreError> {
        // SQLite treats a negative LIMIT as "no limit"
        let limit = limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));

        let mut stmt = self.conn.prepare(
            "SELECT rowid FROM annotations
             ORDER BY last_update_utc DESC, rowid DESC
             LIMIT ?1",
        )?;
        let mut ids = stmt
            .query_map(params![limit], |r| r.get::<_, i64>(0))?
            .map(|id| Ok(from_sql_id(id?)?))
            .collect::<Result<Vec<_>, StoreError>>()?;

        ids.sort_unstable();
        Ok(ids)
    }

    /// All persisted records in row order
    pub fn all(&self) -> Result<Vec<AnnotationRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT rowid, annotation FROM annotations ORDER BY rowid")?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?;

        let mut records = Vec::new();
        for row in rows {
            let (id, payload) = row?;
            records.push(AnnotationRecord::from_payload(from_sql_id(id)?, &payload)?);
        }
        Ok(records)
    }

    /// Write a flat JSONL snapshot of every persisted row.
    ///
    /// Each line is the record's fields plus `row` and `user`. The file name
    /// embeds the export time and an existing file is never overwritten.
    pub fn export(&self, user: &str) -> Result<PathBuf, StoreError> {
        let records = self.all()?;

        let mut tmp = NamedTempFile::new_in(&self.export_dir)?;
        {
            let mut out = BufWriter::new(tmp.as_file_mut());
            for record in &records {
                serde_json::to_writer(&mut out, &record.to_export_object(user)?)?;
                out.write_all(b"\n")?;
            }
            out.flush()?;
        }
        tmp.as_file().sync_all()?;

        let now = Local::now();
        for attempt in 0..MAX_EXPORT_ATTEMPTS {
            let path = self.export_dir.join(paths::export_file_name(now, attempt));
            match tmp.persist_noclobber(&path) {
                Ok(_) => {
                    info!(rows = records.len(), path = %path.display(), "Exported annotations");
                    return Ok(path);
                }
                Err(e) if e.error.kind() == ErrorKind::AlreadyExists => tmp = e.file,
                Err(e) => return Err(e.error.into()),
            }
        }

        Err(StoreError::ExportNameExhausted(self.export_dir.clone()))
    }
}

/// Fixed-width RFC 3339 (microseconds, `Z`) so text order is time order
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn to_sql_id(row: RowId) -> Result<i64, StoreError> {
    i64::try_from(row).map_err(|_| StoreError::RowIdOutOfRange(row))
}

fn from_sql_id(id: i64) -> Result<RowId, StoreError> {
    RowId::try_from(id).map_err(|_| StoreError::InvalidStoredRowId(id))
}
