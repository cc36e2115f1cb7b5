//! `tracing-subscriber` setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::ServerError;

/// Dependencies whose own logs are capped regardless of the base level.
const NOISY_TARGETS: &[(&str, &str)] = &[
    ("hyper", "warn"),
    ("hyper_util", "warn"),
    ("reqwest", "warn"),
    ("rustls", "warn"),
    ("tower_http", "warn"),
];

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single-line human-readable events.
    #[default]
    Compact,
    /// JSON lines.
    Json,
}

impl LogFormat {
    /// Parses a format name. Anything but `json`/`jsonl` is compact.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" | "jsonl" => Self::Json,
            _ => Self::Compact,
        }
    }
}

fn build_env_filter(level: &str) -> Result<EnvFilter, ServerError> {
    let mut directives = vec![level.trim().to_string()];
    for (target, lvl) in NOISY_TARGETS {
        directives.push(format!("{target}={lvl}"));
    }

    let filter = directives.join(",");
    EnvFilter::try_new(&filter).map_err(|e| ServerError::LogFilter {
        reason: e.to_string(),
        filter,
    })
}

/// Installs the global subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence when set. Otherwise events at `level` and
/// above are kept, with HTTP plumbing crates capped at `warn`.
///
/// # Errors
///
/// Returns an error if `level` is not a valid filter or a subscriber is
/// already installed.
pub fn init_logging(level: &str, format: LogFormat) -> Result<(), ServerError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => build_env_filter(level)?,
    };

    let layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(filter)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_filter(filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).try_init()?;
    tracing::trace!(level, ?format, "logging initialized");
    Ok(())
}
