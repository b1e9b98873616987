//! Sagoma Core - placeholder resolution for mail-merge templating
//!
//! This crate provides:
//! - `RecordSource` - parsing a delimited table into an ordered sequence
//!   of records, consumed one field at a time
//! - `TemplateEngine` - locating every `{field}` placeholder in a template
//!   text and rendering it, record by record, as a lazy stream of fragments
//!
//! The template is treated as an opaque character stream; there is no
//! SVG/XML parsing and no templating language beyond flat `{name}` tokens.
//!
//! # Example
//!
//! ```
//! use sagoma_core::{RecordSource, TemplateEngine};
//!
//! let table = "name;city\nAda;London\nEnzo;Torino\n";
//! let mut records = RecordSource::from_reader(table.as_bytes(), "table", ";", true)?;
//! let engine = TemplateEngine::new("Dear {name} of {city},".to_string(), records.field_names())?;
//!
//! while !records.is_empty() {
//!     let mut page = String::new();
//!     for fragment in engine.fill(|field| records.pop(field)) {
//!         page.push_str(&fragment?);
//!     }
//!     println!("{page}");
//! }
//! # Ok::<(), sagoma_core::SagomaError>(())
//! ```

pub mod records;
pub mod scan;
pub mod template;

pub use records::{PopError, RecordSource};
pub use template::{Occurrence, TemplateEngine};

use thiserror::Error;

/// Errors that can occur while loading a table, loading a template, or
/// filling a template with a record
#[derive(Debug, Error)]
pub enum SagomaError {
    /// A data row's column count disagrees with the table's first row.
    /// Raised eagerly at table load, before any rendering begins.
    #[error(
        "{source_name}:{line}: record has {found} fields, expected {expected}"
    )]
    InvalidRecordLength {
        source_name: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    /// The template contains no occurrence of any expected placeholder.
    /// Usually means the wrong template file was given.
    #[error("template contains no placeholder for any of: {}", .expected.join(", "))]
    NoPlaceholdersFound { expected: Vec<String> },

    /// A fill pass asked for a field the current record no longer has,
    /// i.e. the template does not reference every field of the record.
    #[error(
        "no value left for placeholder {{{field}}}; unconsumed fields: {}",
        .remaining.join(", ")
    )]
    MissingPlaceholder {
        field: String,
        remaining: Vec<String>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sagoma operations
pub type Result<T> = std::result::Result<T, SagomaError>;
