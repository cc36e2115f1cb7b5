//! Job error types.

use candlefetch_format::FormatError;
use candlefetch_provider::ProviderError;
use std::path::PathBuf;
use thiserror::Error;

use crate::JobStatus;

/// Errors returned synchronously by job operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    /// A required request field was blank.
    #[error("{field} is required")]
    MissingField {
        /// Name of the missing field.
        field: &'static str,
    },

    /// The candle limit was zero.
    #[error("limit must be a positive integer")]
    InvalidLimit,

    /// A lifecycle move the state machine does not allow.
    #[error("cannot move job from {from} to {to}")]
    InvalidTransition {
        /// Status before the attempted move.
        from: JobStatus,
        /// Requested status.
        to: JobStatus,
    },
}

/// Errors that can occur while persisting the job store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Failed to create a directory.
    #[error("Failed to create directory '{path}': {source}")]
    CreateDir {
        /// The path that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to read a file.
    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to write a file.
    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        /// The path that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse JSON.
    #[error("Failed to parse job file '{path}': {source}")]
    ParseJson {
        /// The path that could not be parsed.
        path: PathBuf,
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// Failed to serialize JSON.
    #[error("Failed to serialize jobs: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Reasons a running job fails. Only ever rendered into the job's `error`.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// The provider call or normalization failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Writing the CSV output failed.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// The data folder could not be prepared.
    #[error("Failed to prepare data folder '{path}': {source}")]
    DataDir {
        /// The data folder.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The job left the state the runner expected.
    #[error(transparent)]
    State(#[from] JobError),
}
