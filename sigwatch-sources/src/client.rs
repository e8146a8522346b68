//! HTTP client construction for feed sources

use reqwest::Client;
use std::time::Duration;

use crate::SourceError;

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// User agent; `DEFAULT_USER_AGENT` when unset
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: None,
        }
    }
}

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = concat!("sigwatch/", env!("CARGO_PKG_VERSION"));

/// Create an HTTP client with the configured timeout
pub fn create_http_client(config: &HttpConfig) -> Result<Client, SourceError> {
    let user_agent = config.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT);

    Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(user_agent)
        .build()
        .map_err(|e| SourceError::ClientBuild(e.to_string()))
}

/// Append url-encoded query parameters to an endpoint
pub fn build_url(endpoint: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        return endpoint.to_string();
    }

    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    let separator = if endpoint.contains('?') { '&' } else { '?' };
    format!("{}{}{}", endpoint, separator, query)
}
