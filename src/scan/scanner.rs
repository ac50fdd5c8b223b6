//! Pattern scanner.
//!
//! Applies every pattern to every document and emits one `MatchRecord` per
//! match, in pattern-declaration order and then match order within each
//! document. The raw `text` field is dropped from the emitted records; every
//! other document field is passed through.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::error::ScanError;
use super::patterns::PatternSet;
use super::window::{CharText, ContextWindow, WindowConfig};
use crate::domain::match_record::WINDOW_FIELDS;
use crate::domain::MatchRecord;

/// Source document field holding the text to scan
pub const TEXT_FIELD: &str = "text";

/// Fields written by the scanner; they replace same-named document fields
const SCANNER_FIELDS: [&str; 3] = ["category", "start_index", "end_index"];

/// Applies a pattern set to documents
#[derive(Debug, Clone)]
pub struct PatternScanner {
    patterns: PatternSet,
    window: WindowConfig,
}

impl PatternScanner {
    pub fn new(patterns: PatternSet, window: WindowConfig) -> Self {
        Self { patterns, window }
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    pub fn window(&self) -> WindowConfig {
        self.window
    }

    /// Scan one document (identified by its position for error reporting)
    pub fn scan_document(
        &self,
        document: usize,
        mut fields: Map<String, Value>,
    ) -> Result<Vec<MatchRecord>, ScanError> {
        let text = match fields.remove(TEXT_FIELD) {
            Some(Value::String(text)) => text,
            _ => return Err(ScanError::MissingText { document }),
        };

        for name in WINDOW_FIELDS.iter().chain(SCANNER_FIELDS.iter()) {
            fields.remove(*name);
        }

        let chars = CharText::new(&text);
        let mut records = Vec::new();

        for pattern in self.patterns.iter() {
            for m in pattern.regex.find_iter(&text) {
                let start = chars.char_offset(m.start());
                let end = chars.char_offset(m.end());
                let window = ContextWindow::compute(&chars, start, end, self.window);

                records.push(MatchRecord {
                    category: pattern.category.clone(),
                    matched: m.as_str().to_string(),
                    precontext: window.precontext,
                    postcontext: window.postcontext,
                    pretext: window.pretext,
                    posttext: window.posttext,
                    start_index: window.start_index,
                    end_index: window.end_index,
                    fields: fields.clone(),
                });
            }
        }

        debug!(document, matches = records.len(), "Scanned document");
        Ok(records)
    }

    /// Lazily scan a sequence of documents.
    ///
    /// Documents are consumed one at a time. The first error is the last
    /// item; no document after it is read.
    pub fn scan<'a, I>(&'a self, documents: I) -> impl Iterator<Item = Result<MatchRecord, ScanError>> + 'a
    where
        I: IntoIterator<Item = Result<Map<String, Value>, ScanError>>,
        I::IntoIter: 'a,
    {
        let mut documents = documents.into_iter().enumerate();
        let mut failed = false;
        std::iter::from_fn(move || {
            if failed {
                return None;
            }
            let (i, document) = documents.next()?;
            let results: Vec<Result<MatchRecord, ScanError>> =
                match document.and_then(|fields| self.scan_document(i, fields)) {
                    Ok(records) => records.into_iter().map(Ok).collect(),
                    Err(e) => {
                        failed = true;
                        vec![Err(e)]
                    }
                };
            Some(results)
        })
        .flatten()
    }
}

/// Read JSONL documents, skipping blank lines
pub fn read_documents<R: BufRead>(
    reader: R,
) -> impl Iterator<Item = Result<Map<String, Value>, ScanError>> {
    reader
        .lines()
        .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
        .enumerate()
        .map(|(document, line)| {
            let line = line?;
            match serde_json::from_str::<Value>(&line) {
                Ok(Value::Object(fields)) => Ok(fields),
                Ok(_) => Err(ScanError::NotAnObject { document }),
                Err(source) => Err(ScanError::InvalidJson { document, source }),
            }
        })
}

/// Result of scanning a corpus file
#[derive(Debug, Clone)]
pub struct ScanSummary {
    /// Documents read from the corpus
    pub documents: usize,
    /// Match records written
    pub matches: usize,
    /// Matches per category
    pub per_category: BTreeMap<String, usize>,
    /// Path of the match corpus
    pub output: PathBuf,
}

/// Scan a JSONL corpus and write the match corpus next to it.
///
/// The output is `<corpus stem>.pattern.jsonl`. Records go to a temporary
/// file in the same directory that replaces the output only once every
/// document has been scanned; any error aborts the run and leaves an
/// existing output untouched.
pub fn scan_file(
    pattern_file: &Path,
    corpus_file: &Path,
    window: WindowConfig,
) -> Result<ScanSummary, ScanError> {
    let patterns = PatternSet::load(pattern_file)?;
    info!(
        patterns = patterns.len(),
        file = %pattern_file.display(),
        "Loaded patterns"
    );

    let scanner = PatternScanner::new(patterns, window);
    let output = crate::config::paths::pattern_output_path(corpus_file);

    let reader = BufReader::new(File::open(corpus_file)?);
    let mut documents = 0;
    let counted = read_documents(reader).inspect(|_| documents += 1);

    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    let mut per_category: BTreeMap<String, usize> = BTreeMap::new();
    let mut matches = 0;

    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        for record in scanner.scan(counted) {
            let record = record?;
            serde_json::to_writer(&mut out, &record)?;
            out.write_all(b"\n")?;
            *per_category.entry(record.category).or_default() += 1;
            matches += 1;
        }
        out.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(&output).map_err(|e| e.error)?;

    for (category, count) in &per_category {
        info!(category = %category, count, "Category matches");
    }
    info!(documents, matches, output = %output.display(), "Scan complete");

    Ok(ScanSummary {
        documents,
        matches,
        per_category,
        output,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(json: &str) -> Map<String, Value> {
        match serde_json::from_str(json).unwrap() {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn scanner(patterns: &str, context_length: usize) -> PatternScanner {
        PatternScanner::new(
            PatternSet::parse(patterns).unwrap(),
            WindowConfig {
                context_length,
                max_window: 500,
            },
        )
    }

    #[test]
    fn test_pattern_order_then_match_order() {
        let scanner = scanner("B==b\nA==a", 5);
        let records = scanner.scan_document(0, doc(r#"{"text": "a b a b"}"#)).unwrap();
        let got: Vec<_> = records
            .iter()
            .map(|r| (r.category.as_str(), r.start_index))
            .collect();
        assert_eq!(got, [("B", 2), ("B", 6), ("A", 0), ("A", 4)]);
    }

    #[test]
    fn test_text_dropped_and_metadata_passed_through() {
        let scanner = scanner("X==x", 5);
        let records = scanner
            .scan_document(0, doc(r#"{"text": "x", "id": 3, "match": "stale"}"#))
            .unwrap();
        assert_eq!(records.len(), 1);
        assert!(!records[0].fields.contains_key("text"));
        assert!(!records[0].fields.contains_key("match"));
        assert_eq!(records[0].fields["id"], 3);
        assert_eq!(records[0].matched, "x");
    }

    #[test]
    fn test_missing_text_is_an_error() {
        let scanner = scanner("X==x", 5);
        let err = scanner.scan_document(4, doc(r#"{"body": "x"}"#)).unwrap_err();
        assert!(matches!(err, ScanError::MissingText { document: 4 }));

        let err = scanner.scan_document(1, doc(r#"{"text": 12}"#)).unwrap_err();
        assert!(matches!(err, ScanError::MissingText { document: 1 }));
    }

    #[test]
    fn test_offsets_are_characters() {
        let scanner = scanner("W==wünsch", 3);
        let records = scanner
            .scan_document(0, doc(r#"{"text": "ÜÜÜ Wünsche"}"#))
            .unwrap();
        assert_eq!(records[0].start_index, 4);
        assert_eq!(records[0].end_index, 10);
        assert_eq!(records[0].matched, "Wünsch");
        assert_eq!(records[0].precontext, "ÜÜ ");
        assert_eq!(records[0].postcontext, "e");
    }

    #[test]
    fn test_scan_stops_with_first_error() {
        let scanner = scanner("X==x", 5);
        let input = "{\"text\": \"x x\"}\n\n{\"other\": 1}\n{\"text\": \"x\"}\nnot json\n";
        let results: Vec<_> = scanner.scan(read_documents(input.as_bytes())).collect();
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert!(matches!(results[2], Err(ScanError::MissingText { document: 1 })));
    }

    #[test]
    fn test_scan_does_not_read_past_error() {
        let scanner = scanner("X==x", 5);
        let mut pulled = 0;
        let documents = vec![
            Err(ScanError::NotAnObject { document: 0 }),
            Ok(doc(r#"{"text": "x"}"#)),
        ]
        .into_iter()
        .inspect(|_| pulled += 1);
        let results: Vec<_> = scanner.scan(documents).collect();
        assert_eq!(results.len(), 1);
        assert!(results[0].is_err());
        assert_eq!(pulled, 1);
    }

    #[test]
    fn test_read_documents_rejects_non_objects() {
        let results: Vec<_> = read_documents("[1, 2]\nnot json\n".as_bytes()).collect();
        assert!(matches!(results[0], Err(ScanError::NotAnObject { document: 0 })));
        assert!(matches!(results[1], Err(ScanError::InvalidJson { document: 1, .. })));
    }
}
