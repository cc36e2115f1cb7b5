//! Server error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use candlefetch_format::FormatError;
use candlefetch_jobs::{JobError, StoreError};
use candlefetch_provider::ProviderError;
use serde_json::json;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Invalid or incomplete configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No provider key is configured.
    #[error("API key not configured. Set COINAPI_KEY in the environment or .env")]
    MissingApiKey,

    /// A variable is set but does not parse.
    #[error("Invalid value '{value}' for {var}: {reason}")]
    Invalid {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
        /// Parse failure.
        reason: String,
    },
}

/// Failures while starting or running the server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration problem.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The job store could not be opened.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The provider could not be constructed.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The data folder could not be created.
    #[error("Failed to create data folder {path}: {source}")]
    DataDir {
        /// Folder path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The listen address could not be bound.
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        /// Requested address.
        addr: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The server loop stopped with an error.
    #[error("Server error: {0}")]
    Serve(std::io::Error),

    /// The log filter did not parse.
    #[error("Invalid log filter '{filter}': {reason}")]
    LogFilter {
        /// Filter directives.
        filter: String,
        /// Parse failure.
        reason: String,
    },

    /// A global subscriber is already installed.
    #[error("Failed to install log subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),
}

/// Error returned by a route handler.
///
/// Rendered as `{"success": false, "error": "<message>"}`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The request is malformed.
    #[error("{0}")]
    BadRequest(String),

    /// No job has the requested id.
    #[error("Job not found")]
    JobNotFound,

    /// The job has not completed yet.
    #[error("{0}")]
    NotReady(&'static str),

    /// The job completed but its file is gone.
    #[error("{0}")]
    FileNotFound(&'static str),

    /// The provider call failed.
    #[error("{0}")]
    Upstream(String),

    /// A local read failed.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::NotReady(_) => StatusCode::BAD_REQUEST,
            Self::JobNotFound | Self::FileNotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(error = %self, "request failed");
        }
        (
            status,
            Json(json!({ "success": false, "error": self.to_string() })),
        )
            .into_response()
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::MissingField { .. } => {
                Self::BadRequest("Symbol and period_id are required".to_string())
            }
            other => Self::BadRequest(other.to_string()),
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(err: ProviderError) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl From<FormatError> for ApiError {
    fn from(err: FormatError) -> Self {
        Self::Internal(err.to_string())
    }
}
