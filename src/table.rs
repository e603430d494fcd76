//! Table loader: read a comma-separated capability table into rows.
//!
//! The first non-blank line is the header and is not returned as data. Blank
//! lines are skipped. Every data row must have exactly as many fields as the
//! header. A quoted field may run over several lines; the record then keeps
//! the line it started on and the line breaks inside the quotes become `\n`.
//! Field values are not interpreted here.

use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Errors produced by the table loader.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("cannot read {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("line {line}: expected {expected} fields, found {found}")]
    Schema {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: unterminated quoted field")]
    UnterminatedQuote { line: usize },
}

/// One data row: its fields and the 1-based line it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub line: usize,
    pub fields: Vec<String>,
}

impl Row {
    pub fn new(line: usize, fields: Vec<String>) -> Self {
        Self { line, fields }
    }

    /// Field at `column`, if the row is that wide.
    #[must_use]
    pub fn get(&self, column: usize) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.fields.len()
    }
}

/// Parsed table: header fields, data rows in file order, source digest.
#[derive(Debug, Clone)]
pub struct Table {
    header: Vec<String>,
    rows: Vec<Row>,
    digest: [u8; 32],
}

impl Table {
    /// Read and parse the table at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, TableError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| TableError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::parse(&text)?;
        tracing::debug!(
            "loaded {} rows x {} columns from {}",
            table.len(),
            table.columns(),
            path.display()
        );
        Ok(table)
    }

    /// Parse table text. A text with no header, or a header only, gives an empty table.
    pub fn parse(text: &str) -> Result<Self, TableError> {
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&Sha256::digest(text.as_bytes()));

        let mut header: Option<Vec<String>> = None;
        let mut rows = Vec::new();
        let mut lines = text.lines().enumerate();
        while let Some((idx, raw)) = lines.next() {
            let line = idx + 1;
            if raw.trim().is_empty() {
                continue;
            }
            let mut record = Cow::Borrowed(raw);
            let fields = loop {
                match split_fields(&record, line) {
                    Err(TableError::UnterminatedQuote { .. }) => {
                        let Some((_, more)) = lines.next() else {
                            return Err(TableError::UnterminatedQuote { line });
                        };
                        let joined = record.to_mut();
                        joined.push('\n');
                        joined.push_str(more);
                    }
                    other => break other?,
                }
            };
            match &header {
                None => header = Some(fields),
                Some(h) => {
                    if fields.len() != h.len() {
                        return Err(TableError::Schema {
                            line,
                            expected: h.len(),
                            found: fields.len(),
                        });
                    }
                    rows.push(Row::new(line, fields));
                }
            }
        }

        Ok(Table {
            header: header.unwrap_or_default(),
            rows,
            digest,
        })
    }

    #[must_use]
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// Data rows in file order.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Column count (header width; 0 for an empty input).
    #[must_use]
    pub fn columns(&self) -> usize {
        self.header.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// SHA-256 of the source text.
    #[must_use]
    pub fn digest(&self) -> &[u8; 32] {
        &self.digest
    }
}

/// Split one record on commas. Whitespace right after a delimiter is skipped;
/// double-quoted fields may contain commas and `""` escapes.
fn split_fields(raw: &str, line: usize) -> Result<Vec<String>, TableError> {
    let mut fields = Vec::new();
    let mut chars = raw.chars().peekable();
    loop {
        while chars.next_if(|c| *c == ' ' || *c == '\t').is_some() {}

        let mut field = String::new();
        if chars.next_if_eq(&'"').is_some() {
            loop {
                match chars.next() {
                    Some('"') if chars.next_if_eq(&'"').is_some() => field.push('"'),
                    Some('"') => break,
                    Some(c) => field.push(c),
                    None => return Err(TableError::UnterminatedQuote { line }),
                }
            }
            // Text after the closing quote belongs to the same field.
            while let Some(c) = chars.next_if(|c| *c != ',') {
                field.push(c);
            }
        } else {
            while let Some(c) = chars.next_if(|c| *c != ',') {
                field.push(c);
            }
        }
        fields.push(field);

        if chars.next().is_none() {
            return Ok(fields);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_skips_initial_space() {
        let f = split_fields("MFX_CODEC_AVC,  MFX_LEVEL_AVC_52 ,64", 1).unwrap();
        assert_eq!(f, vec!["MFX_CODEC_AVC", "MFX_LEVEL_AVC_52 ", "64"]);
    }

    #[test]
    fn split_quoted_field_keeps_commas() {
        let f = split_fields(r#"a, "b, ""c""", d"#, 1).unwrap();
        assert_eq!(f, vec!["a", r#"b, "c""#, "d"]);
    }

    #[test]
    fn split_trailing_comma_gives_empty_field() {
        let f = split_fields("a,b,", 1).unwrap();
        assert_eq!(f, vec!["a", "b", ""]);
    }

    #[test]
    fn split_unterminated_quote() {
        match split_fields("a,\"b", 7) {
            Err(TableError::UnterminatedQuote { line }) => assert_eq!(line, 7),
            other => panic!("expected unterminated quote, got {:?}", other),
        }
    }
}
