//! Error types for the bank-scrape library.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while extracting and parsing statements.
///
/// Every parse error is fatal for the file it occurred in: a file either
/// yields all of its transactions or none of them.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error occurred while reading input or writing output.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error writing CSV output.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The PDF text could not be extracted (bad file, wrong password, ...).
    #[error("failed to extract text from {}: {message}", path.display())]
    Extraction { path: PathBuf, message: String },

    /// A transaction line appeared before the statement header was known.
    #[error("{missing} not found before transaction, current line: {line}")]
    HeaderMissing { missing: &'static str, line: String },

    /// The number of parsed transactions disagrees with the number of lines
    /// that look like a transaction start.
    #[error("validation failed: parsed {emitted} transactions, expected {expected}")]
    ValidationCountMismatch { emitted: usize, expected: usize },

    /// No amount token could be located in an assembled description.
    #[error("amount not detected in description: {description}")]
    AmountNotFound { description: String },

    /// A finished transaction lacks a required output column.
    #[error("missing required field `{field}` at line {line}")]
    MissingField { field: &'static str, line: usize },

    /// A batch was started without any file.
    #[error("no files to process")]
    EmptyInput,

    /// Invalid amount format.
    #[error("Invalid amount format: {0}")]
    InvalidAmount(String),

    /// Invalid date format.
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// Invalid format specified.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// A file of a batch was rejected.
    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Attach the offending file to an error.
    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        Error::File {
            path: path.into(),
            source: Box::new(self),
        }
    }
}
