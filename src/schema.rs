//! Header normalization and null-row filtering for raw input tables.

use crate::error::{PipelineError, Result};
use crate::util::is_null;
use std::collections::HashSet;
use tracing::debug;

/// One data row of a raw table. `line` is the 1-based line in the source
/// file, kept for error messages. `extra` holds non-empty fields past the
/// last header.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub line: usize,
    pub cells: Vec<Option<String>>,
    pub extra: Vec<String>,
}

impl RawRow {
    pub fn is_all_null(&self) -> bool {
        self.cells.iter().all(|c| is_null(c.as_deref()))
            && self.extra.iter().all(|c| is_null(Some(c.as_str())))
    }
}

/// A table of untyped cells as read from the source file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

/// Rewrite a raw header into the canonical column naming convention.
///
/// Spaces become underscores; slashes, periods and commas are removed, so
/// `"Number of Issued/Numerical."` becomes `"Number_of_IssuedNumerical"`.
pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            '/' | '.' | ',' => None,
            other => Some(other),
        })
        .collect()
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Canonicalize every header and drop rows in which every cell is null.
    ///
    /// Fails when no column name survives normalization or when two headers
    /// collapse to the same name.
    pub fn normalize(self) -> Result<RawTable> {
        let headers: Vec<String> = self.headers.iter().map(|h| normalize_header(h)).collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(PipelineError::Schema(
                "no column names survive header normalization".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for h in headers.iter().filter(|h| !h.is_empty()) {
            if !seen.insert(h.as_str()) {
                return Err(PipelineError::Schema(format!(
                    "duplicate column '{}' after header normalization",
                    h
                )));
            }
        }

        let before = self.rows.len();
        let rows: Vec<RawRow> = self.rows.into_iter().filter(|r| !r.is_all_null()).collect();
        debug!(
            dropped = before - rows.len(),
            kept = rows.len(),
            "dropped fully-null rows"
        );

        Ok(RawTable { headers, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(line: usize, cells: &[Option<&str>]) -> RawRow {
        RawRow {
            line,
            cells: cells.iter().map(|c| c.map(str::to_string)).collect(),
            extra: Vec::new(),
        }
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(
            normalize_header("number of issued numerical"),
            "number_of_issued_numerical"
        );
        assert_eq!(normalize_header(" Visa/Type. A,B "), "VisaType_AB");
        assert_eq!(normalize_header("year"), "year");
        assert_eq!(normalize_header("./,"), "");
    }

    #[test]
    fn test_drops_only_fully_null_rows() {
        let table = RawTable {
            headers: vec!["year".into(), "country".into(), "number of issued".into()],
            rows: vec![
                row(2, &[Some("2017"), Some("China"), Some("10")]),
                row(3, &[None, Some("  "), None]),
                row(4, &[Some("2017"), None, None]),
            ],
        };
        let normalized = table.normalize().unwrap();
        assert_eq!(normalized.headers[2], "number_of_issued");
        let lines: Vec<usize> = normalized.rows.iter().map(|r| r.line).collect();
        assert_eq!(lines, vec![2, 4]);
    }

    #[test]
    fn test_no_surviving_columns_is_an_error() {
        let table = RawTable {
            headers: vec![".".into(), " / ".into()],
            rows: vec![],
        };
        assert!(matches!(table.normalize(), Err(PipelineError::Schema(_))));
    }

    #[test]
    fn test_duplicate_columns_is_an_error() {
        let table = RawTable {
            headers: vec!["a.b".into(), "ab".into()],
            rows: vec![],
        };
        assert!(matches!(table.normalize(), Err(PipelineError::Schema(_))));
    }
}
