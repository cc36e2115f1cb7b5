//! Format error types.

use thiserror::Error;

/// Errors that can occur while reading or writing candle files.
#[derive(Error, Debug)]
pub enum FormatError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV encoding or decoding error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv_async::Error),

    /// A data row could not be parsed.
    #[error("Invalid row at line {line}: {reason}")]
    Row {
        /// 1-based line number in the file.
        line: u64,
        /// What was wrong with the row.
        reason: String,
    },

    /// The file has no header row.
    #[error("Candle file is empty")]
    Empty,
}
