//! Offset translation between absolute character offsets and line/column.
//!
//! Lines are split on `\n` with the terminator kept, so the absolute offset
//! of `(row, column)` is the summed length of every preceding line plus the
//! column. Text that is empty or ends in a newline has a final empty line,
//! matching where an editor cursor can sit.
//!
//! All positions are 0-based character counts.

use thiserror::Error;

/// Bounds errors. These indicate a caller defect, not missing data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OffsetError {
    #[error("Row {row} out of bounds (text has {rows} lines)")]
    RowOutOfBounds { row: usize, rows: usize },

    #[error("Column {column} out of bounds (line {row} has {len} characters)")]
    ColumnOutOfBounds { row: usize, column: usize, len: usize },

    #[error("Offset {offset} out of bounds (text has {len} characters)")]
    OffsetOutOfBounds { offset: usize, len: usize },
}

/// Line and column position (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineCol {
    pub line: usize,
    pub col: usize,
}

/// Precomputed line starts for a block of text
#[derive(Debug, Clone)]
pub struct LineMap {
    /// Absolute char offset where each line starts
    starts: Vec<usize>,
    /// Char length of each line without its terminator
    widths: Vec<usize>,
    /// Total chars in the text
    len: usize,
}

impl LineMap {
    pub fn new(text: &str) -> Self {
        let mut starts = Vec::new();
        let mut widths = Vec::new();
        let mut offset = 0;

        for line in text.split_inclusive('\n') {
            let total = line.chars().count();
            let terminated = line.ends_with('\n');
            starts.push(offset);
            widths.push(if terminated { total - 1 } else { total });
            offset += total;
        }

        if text.is_empty() || text.ends_with('\n') {
            starts.push(offset);
            widths.push(0);
        }

        Self {
            starts,
            widths,
            len: offset,
        }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Total characters in the text
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Absolute offset of `(row, column)`
    pub fn to_absolute_offset(&self, row: usize, column: usize) -> Result<usize, OffsetError> {
        let start = *self.starts.get(row).ok_or(OffsetError::RowOutOfBounds {
            row,
            rows: self.starts.len(),
        })?;

        let width = self.widths[row];
        if column > width {
            return Err(OffsetError::ColumnOutOfBounds {
                row,
                column,
                len: width,
            });
        }

        Ok(start + column)
    }

    /// Line/column of an absolute offset
    pub fn to_line_col(&self, offset: usize) -> Result<LineCol, OffsetError> {
        if offset > self.len {
            return Err(OffsetError::OffsetOutOfBounds {
                offset,
                len: self.len,
            });
        }

        let line = self.starts.partition_point(|&s| s <= offset).saturating_sub(1);
        Ok(LineCol {
            line,
            col: offset - self.starts[line],
        })
    }
}

/// Absolute offset of `(row, column)` in `text`
pub fn to_absolute_offset(text: &str, row: usize, column: usize) -> Result<usize, OffsetError> {
    LineMap::new(text).to_absolute_offset(row, column)
}

/// Line/column of an absolute offset in `text`
pub fn to_line_col(text: &str, offset: usize) -> Result<LineCol, OffsetError> {
    LineMap::new(text).to_line_col(offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_offset_sums_preceding_lines() {
        let text = "line1\nline2\nline3";
        assert_eq!(to_absolute_offset(text, 0, 0).unwrap(), 0);
        assert_eq!(to_absolute_offset(text, 1, 0).unwrap(), 6);
        assert_eq!(to_absolute_offset(text, 1, 2).unwrap(), 8);
        assert_eq!(to_absolute_offset(text, 2, 5).unwrap(), 17);
    }

    #[test]
    fn test_row_out_of_bounds() {
        let err = to_absolute_offset("a\nb", 2, 0).unwrap_err();
        assert_eq!(err, OffsetError::RowOutOfBounds { row: 2, rows: 2 });
    }

    #[test]
    fn test_column_out_of_bounds() {
        let err = to_absolute_offset("ab\ncd", 0, 3).unwrap_err();
        assert_eq!(
            err,
            OffsetError::ColumnOutOfBounds {
                row: 0,
                column: 3,
                len: 2
            }
        );
    }

    #[test]
    fn test_trailing_newline_has_empty_last_line() {
        let map = LineMap::new("ab\n");
        assert_eq!(map.line_count(), 2);
        assert_eq!(map.to_absolute_offset(1, 0).unwrap(), 3);
        assert_eq!(map.to_line_col(3).unwrap(), LineCol { line: 1, col: 0 });

        let empty = LineMap::new("");
        assert_eq!(empty.line_count(), 1);
        assert_eq!(empty.to_absolute_offset(0, 0).unwrap(), 0);
    }

    #[test]
    fn test_multibyte_columns_count_chars() {
        let text = "naïve\nrésumé";
        assert_eq!(to_absolute_offset(text, 1, 6).unwrap(), 12);
        assert_eq!(to_line_col(text, 8).unwrap(), LineCol { line: 1, col: 2 });
    }

    #[test]
    fn test_line_col_inverts_absolute_offset() {
        let text = "one\ntwo words\n\nfour";
        let map = LineMap::new(text);
        for offset in 0..=map.len() {
            let pos = map.to_line_col(offset).unwrap();
            assert_eq!(map.to_absolute_offset(pos.line, pos.col).unwrap(), offset);
        }
        assert!(map.to_line_col(map.len() + 1).is_err());
    }
}
