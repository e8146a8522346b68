//! The data source capability

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use sigwatch_core::{DataPoint, FetchConfig};

/// Errors from data sources
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Source returned status {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    Parse(String),

    #[error("Missing configuration: {0}")]
    Config(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Anything that can produce data points for a time window
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Human-readable source name for logs
    fn name(&self) -> &str;

    /// Fetch points matching the config; may ignore parts of it
    async fn fetch(&self, config: &FetchConfig) -> Result<Vec<DataPoint>, SourceError>;

    /// Whether the source can currently serve requests
    async fn is_available(&self) -> Result<bool, SourceError>;
}

/// Thread-safe reference to a data source
pub type SharedSource = Arc<dyn DataSource>;
