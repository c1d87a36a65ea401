//! Error types for the pipeline.
//!
//! A single `TidyError` enum covers the whole run: parse failures are fatal,
//! schema violations identify the offending record, and everything else is
//! plumbing (io, csv, sqlite) converted via `#[from]`.

use thiserror::Error;

/// Main error type for the osm-tidy library.
#[derive(Debug, Error)]
pub enum TidyError {
    /// Malformed or truncated source XML. Fatal; no partial-record recovery.
    #[error("XML parsing failed: {0}")]
    Xml(#[from] quick_xml::Error),

    /// A record lacks an attribute required by the destination schema.
    #[error("{kind} {id} is missing required attribute '{attribute}'")]
    MissingAttribute {
        kind: &'static str,
        id: String,
        attribute: &'static str,
    },

    /// A required attribute is present but cannot be parsed as its schema type.
    #[error("{kind} attribute '{attribute}' has unparseable value '{value}'")]
    InvalidAttribute {
        kind: &'static str,
        attribute: &'static str,
        value: String,
    },

    /// Sampling interval of zero makes no sense.
    #[error("sample interval must be at least 1, got {0}")]
    InvalidSampleInterval(usize),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error.
    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    /// SQLite error.
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, TidyError>;
