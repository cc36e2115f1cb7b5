//! Shared HTTP plumbing for provider clients.

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use crate::ProviderError;

/// Configuration for a provider client.
#[derive(Clone)]
pub struct ProviderConfig {
    /// API key sent with every request.
    pub api_key: String,
    /// Override for the provider's base URL.
    pub base_url: Option<String>,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl ProviderConfig {
    /// Creates a configuration with the given API key and default settings.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Sets the base URL override. Blank values are ignored.
    #[must_use]
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url.filter(|url| !url.trim().is_empty());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: None,
            timeout: Duration::from_secs(60),
            user_agent: format!("candlefetch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

/// Authenticated JSON-over-HTTP client bound to one provider base URL.
#[derive(Debug, Clone)]
pub(crate) struct HttpClient {
    client: Client,
    base_url: String,
    auth_header: &'static str,
    api_key: String,
}

impl HttpClient {
    /// Builds a client, falling back to `default_base` when the config has no
    /// override.
    pub(crate) fn new(
        config: &ProviderConfig,
        default_base: &str,
        auth_header: &'static str,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base.to_string());

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header,
            api_key: config.api_key.clone(),
        })
    }

    /// Returns the base URL requests are issued against.
    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issues a GET and decodes a JSON body.
    ///
    /// Non-success statuses become [`ProviderError::Api`] carrying the body
    /// text so the caller can surface the provider's own message.
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        debug!(%url, ?query, "provider request");

        let response = self
            .client
            .get(&url)
            .header(self.auth_header, &self.api_key)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
