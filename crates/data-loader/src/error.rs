//! Errors raised while reading and checking rating data.
//!
//! Parse failures carry the file name and the 1-based line number so a bad
//! row in a multi-million line export can be found directly.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataLoadError {
    /// The rating or item file does not exist or cannot be opened
    #[error("Cannot open data file {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A field on a data row could not be converted
    #[error("{file}:{line}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A value that parsed but is outside its domain (e.g. a CLI date)
    #[error("Invalid {field}: {value:?}")]
    InvalidValue { field: String, value: String },

    /// A data row has fewer columns than its layout requires
    #[error("{file}:{line}: expected {expected} fields, found {found}")]
    FieldCountMismatch {
        file: String,
        line: usize,
        expected: usize,
        found: usize,
    },

    /// A loaded rating table failed its integrity checks
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DataLoadError>;
