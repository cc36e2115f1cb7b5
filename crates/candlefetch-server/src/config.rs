//! Environment-driven server settings.

use candlefetch_jobs::{JobStore, STORE_FILE_NAME};
use candlefetch_provider::ProviderConfig;
use dotenv::dotenv;
use std::path::PathBuf;
use std::time::Duration;

use crate::{ConfigError, LogFormat};

/// Value shipped in the sample `.env`; treated as no key at all.
pub const API_KEY_PLACEHOLDER: &str = "your_coinapi_key_here";

const DEFAULT_PLATFORM: &str = "coinapi";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3010;
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Settings for the server and the CLI commands that share its state.
#[derive(Clone)]
pub struct ServerConfig {
    /// Folder CSV output is written to.
    pub data_dir: PathBuf,
    /// Folder holding the job snapshot file.
    pub storage_dir: PathBuf,
    /// Provider registry name.
    pub platform: String,
    /// Provider API key, if configured.
    pub api_key: Option<String>,
    /// Provider base URL override.
    pub base_url: Option<String>,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Provider request timeout.
    pub provider_timeout: Duration,
    /// Default log level when `RUST_LOG` is unset.
    pub log_level: String,
    /// Log output format.
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Reads `.env` (if present) and then the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// Blank values count as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric variable does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let root = JobStore::default_root();

        Ok(Self {
            data_dir: get("DATA_FOLDER").map_or_else(|| root.join("data"), PathBuf::from),
            storage_dir: get("STORAGE_FOLDER")
                .map_or_else(|| root.join("local_storage"), PathBuf::from),
            platform: get("DOWNLOADER_PLATFORM")
                .unwrap_or_else(|| DEFAULT_PLATFORM.to_string())
                .to_lowercase(),
            api_key: get("COINAPI_KEY").filter(|key| key != API_KEY_PLACEHOLDER),
            base_url: get("COINAPI_BASE_URL"),
            host: get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_var("PORT", get("PORT"), DEFAULT_PORT)?,
            provider_timeout: Duration::from_secs(parse_var(
                "PROVIDER_TIMEOUT_SECS",
                get("PROVIDER_TIMEOUT_SECS"),
                DEFAULT_TIMEOUT_SECS,
            )?),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            log_format: get("LOG_FORMAT").map_or(LogFormat::Compact, |v| LogFormat::parse(&v)),
        })
    }

    /// Returns the `host:port` bind address.
    #[must_use]
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Returns the job snapshot file path.
    #[must_use]
    pub fn store_path(&self) -> PathBuf {
        self.storage_dir.join(STORE_FILE_NAME)
    }

    /// Returns the provider client settings.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiKey`] when no usable key is set.
    pub fn provider_config(&self) -> Result<ProviderConfig, ConfigError> {
        let key = self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)?;
        Ok(ProviderConfig::new(key)
            .with_base_url(self.base_url.clone())
            .with_timeout(self.provider_timeout))
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("data_dir", &self.data_dir)
            .field("storage_dir", &self.storage_dir)
            .field("platform", &self.platform)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("provider_timeout", &self.provider_timeout)
            .field("log_level", &self.log_level)
            .field("log_format", &self.log_format)
            .finish()
    }
}

fn parse_var<T>(var: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            value: raw,
            reason: e.to_string(),
        }),
    }
}
