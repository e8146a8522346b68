//! HTTP/JSON feed source
//!
//! Fetches data points from an endpoint returning either a JSON array of
//! items or an object with a `data` array. The window, keywords and entities
//! of the fetch are forwarded as query parameters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use sigwatch_core::{DataPoint, FetchConfig};

use crate::{build_url, create_http_client, DataSource, HttpConfig, SourceError};

/// An item as served by a feed
#[derive(Debug, Deserialize)]
struct FeedItem {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    source_id: Option<String>,
    content: String,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    entities: Vec<String>,
    #[serde(default)]
    sentiment: Option<f64>,
    #[serde(default)]
    relevance_score: Option<f64>,
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedResponse {
    Items(Vec<FeedItem>),
    Wrapped { data: Vec<FeedItem> },
}

impl FeedResponse {
    fn into_items(self) -> Vec<FeedItem> {
        match self {
            FeedResponse::Items(items) => items,
            FeedResponse::Wrapped { data } => data,
        }
    }
}

/// Parse a feed body into data points of the fetched source type
fn parse_feed(body: &str, config: &FetchConfig) -> Result<Vec<DataPoint>, SourceError> {
    let response: FeedResponse =
        serde_json::from_str(body).map_err(|e| SourceError::Parse(e.to_string()))?;

    let points = response
        .into_items()
        .into_iter()
        .map(|item| {
            let mut point = DataPoint::new(config.source_type, &item.content, item.timestamp)
                .with_entities(item.entities);
            if let Some(id) = item.id {
                point = point.with_id(&id);
            }
            if let Some(source_id) = item.source_id {
                point = point.with_source_id(&source_id);
            }
            if let Some(sentiment) = item.sentiment {
                point = point.with_sentiment(sentiment);
            }
            if let Some(relevance) = item.relevance_score {
                point = point.with_relevance(relevance);
            }
            point.metadata = item.metadata;
            point
        })
        .collect();

    Ok(points)
}

/// A source reading JSON data points over HTTP
///
/// An endpoint set in the fetch settings replaces the one given at
/// construction, and availability checks target whichever was used last.
pub struct HttpFeedSource {
    name: String,
    endpoint: RwLock<String>,
    client: Client,
}

impl HttpFeedSource {
    pub fn new(name: &str, endpoint: &str, http: &HttpConfig) -> Result<Self, SourceError> {
        if endpoint.trim().is_empty() {
            return Err(SourceError::Config(format!("feed {} has no endpoint", name)));
        }

        Ok(Self {
            name: name.to_string(),
            endpoint: RwLock::new(endpoint.to_string()),
            client: create_http_client(http)?,
        })
    }

    /// Endpoint currently fetched and health-checked
    pub fn endpoint(&self) -> String {
        self.endpoint.read().clone()
    }

    fn resolve_endpoint(&self, config: &FetchConfig) -> String {
        match config.settings.endpoint.as_deref() {
            Some(configured) if !configured.trim().is_empty() => {
                let mut endpoint = self.endpoint.write();
                if *endpoint != configured {
                    debug!("Feed {} now uses {}", self.name, configured);
                    *endpoint = configured.to_string();
                }
                endpoint.clone()
            }
            _ => self.endpoint(),
        }
    }

    /// Query parameters forwarded for a fetch
    fn query_params(config: &FetchConfig) -> Vec<(String, String)> {
        let mut params = Vec::new();

        if !config.keywords.is_empty() {
            params.push(("q".to_string(), config.keywords.join(",")));
        }
        if !config.entities.is_empty() {
            params.push(("entities".to_string(), config.entities.join(",")));
        }
        params.push(("since".to_string(), config.time_window.start.to_rfc3339()));
        params.push(("until".to_string(), config.time_window.end.to_rfc3339()));
        if let Some(limit) = config.settings.max_results {
            params.push(("limit".to_string(), limit.to_string()));
        }
        for (key, value) in &config.settings.params {
            params.push((key.clone(), value.clone()));
        }

        params
    }
}

#[async_trait]
impl DataSource for HttpFeedSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, config: &FetchConfig) -> Result<Vec<DataPoint>, SourceError> {
        let endpoint = self.resolve_endpoint(config);
        let url = build_url(&endpoint, &Self::query_params(config));

        debug!("Fetching {} from {}", self.name, url);

        let mut request = self.client.get(&url);
        if let Some(key) = &config.settings.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            warn!("Feed {} returned status: {}", self.name, response.status());
            return Err(SourceError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let points = parse_feed(&body, config)?;

        debug!("Feed {} returned {} points", self.name, points.len());
        Ok(points)
    }

    async fn is_available(&self) -> Result<bool, SourceError> {
        let endpoint = self.endpoint();
        let result = self.client.head(&endpoint).send().await;

        match result {
            Ok(resp) => Ok(resp.status().is_success() || resp.status().is_redirection()),
            Err(e) => {
                debug!("Feed {} unreachable: {}", self.name, e);
                Ok(false)
            }
        }
    }
}
