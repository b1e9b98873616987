//! Delimited table parsing and per-record field consumption

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use thiserror::Error;

use crate::{Result, SagomaError};

/// Placeholder name synthesized for column `n` when the table has no header
fn default_field_name(n: usize) -> String {
    format!("txt{n}")
}

/// Outcome of asking a record source for one field value
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PopError {
    /// The current record no longer holds this field (already consumed,
    /// or never present). `remaining` lists every field of the current
    /// record that is still unconsumed, in declared order.
    #[error("field '{field}' not available; remaining: {}", .remaining.join(", "))]
    MissingField {
        field: String,
        remaining: Vec<String>,
    },

    /// No records are left at all. Callers check `is_empty()` first in
    /// normal operation; hitting this mid-fill means the table ran out.
    #[error("no records left")]
    Exhausted,
}

/// An ordered sequence of records parsed from a delimited text table.
///
/// The whole table is read and validated eagerly at construction; a row
/// with the wrong number of fields is rejected before any rendering
/// begins. Fields of the current record are consumed destructively via
/// [`pop`](RecordSource::pop); the source advances to the next row once
/// the current record is fully drained.
#[derive(Debug)]
pub struct RecordSource {
    field_names: Vec<String>,
    /// Rows not yet loaded into `current`, front first
    records: VecDeque<Vec<String>>,
    /// Working copy of the row being consumed, slots parallel to
    /// `field_names`; `None` marks a consumed field
    current: Option<Vec<Option<String>>>,
}

impl RecordSource {
    /// Load a table from a file path.
    pub fn open(
        path: impl AsRef<Path>,
        separator: &str,
        first_line_headers: bool,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Self::from_reader(
            file,
            &path.display().to_string(),
            separator,
            first_line_headers,
        )
    }

    /// Load a table from any reader. `source_name` is used in error
    /// messages only.
    pub fn from_reader(
        reader: impl Read,
        source_name: &str,
        separator: &str,
        first_line_headers: bool,
    ) -> Result<Self> {
        let mut lines = BufReader::new(reader).lines();

        let mut field_names = Vec::new();
        let mut records = VecDeque::new();
        let mut line_no = 0;

        if first_line_headers {
            if let Some(line) = lines.next() {
                line_no += 1;
                field_names = split_row(&line?, separator);
            }
        }

        let mut expected = if first_line_headers {
            Some(field_names.len())
        } else {
            None
        };

        for line in lines {
            line_no += 1;
            let fields = split_row(&line?, separator);

            match expected {
                None => {
                    // first data row of a headerless table fixes the
                    // column count and the synthesized field names
                    field_names = (1..=fields.len()).map(default_field_name).collect();
                    expected = Some(fields.len());
                }
                Some(n) if fields.len() != n => {
                    return Err(SagomaError::InvalidRecordLength {
                        source_name: source_name.to_string(),
                        line: line_no,
                        expected: n,
                        found: fields.len(),
                    });
                }
                Some(_) => {}
            }

            records.push_back(fields);
        }

        Ok(Self {
            field_names,
            records,
            current: None,
        })
    }

    /// Ordered field names, from the header row or synthesized
    /// `txt1..txtN`.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Number of rows not yet loaded as the current record.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True iff no buffered rows remain and no current record is loaded.
    /// This is the driver loop's sole stopping condition; a current
    /// record with leftover fields keeps the source non-empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.current.is_none()
    }

    /// Return and remove the value for `field_name` from the current
    /// record, loading the next stored row first if none is loaded.
    pub fn pop(&mut self, field_name: &str) -> std::result::Result<String, PopError> {
        if self.current.is_none() {
            let row = self.records.pop_front().ok_or(PopError::Exhausted)?;
            self.current = Some(row.into_iter().map(Some).collect());
        }

        let idx = self.field_names.iter().position(|name| name == field_name);
        let value = idx.and_then(|idx| self.current.as_mut()?.get_mut(idx)?.take());

        match value {
            Some(value) => {
                let drained = self
                    .current
                    .as_ref()
                    .is_some_and(|slots| slots.iter().all(Option::is_none));
                if drained {
                    self.current = None;
                }
                Ok(value)
            }
            None => Err(PopError::MissingField {
                field: field_name.to_string(),
                remaining: self.remaining(),
            }),
        }
    }

    /// Names of the current record's unconsumed fields, in declared order.
    fn remaining(&self) -> Vec<String> {
        match &self.current {
            None => Vec::new(),
            Some(slots) => self
                .field_names
                .iter()
                .zip(slots)
                .filter(|(_, slot)| slot.is_some())
                .map(|(name, _)| name.clone())
                .collect(),
        }
    }
}

/// Split one table row on the separator, stripping the line ending
/// (but nothing else) first.
fn split_row(line: &str, separator: &str) -> Vec<String> {
    line.trim_end_matches(['\r', '\n'])
        .split(separator)
        .map(str::to_string)
        .collect()
}
