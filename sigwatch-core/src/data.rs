//! Data points and source configuration
//!
//! Data points are the raw material of detection: short timestamped text
//! items fetched from heterogeneous sources within a time window.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Kinds of sources data points can come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Social network posts
    Social,
    /// Forum and community threads
    Forum,
    /// News articles and wires
    News,
    /// Regulatory filings
    Filing,
    /// Patent publications
    Patent,
    /// Market data feeds
    Market,
}

impl SourceType {
    /// Every known source type
    pub const ALL: [SourceType; 6] = [
        SourceType::Social,
        SourceType::Forum,
        SourceType::News,
        SourceType::Filing,
        SourceType::Patent,
        SourceType::Market,
    ];

    /// Number of known source types, the denominator of diversity measures
    pub const COUNT: usize = Self::ALL.len();

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Social => "social",
            SourceType::Forum => "forum",
            SourceType::News => "news",
            SourceType::Filing => "filing",
            SourceType::Patent => "patent",
            SourceType::Market => "market",
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown source type: {}", s))
    }
}

/// A single timestamped unit of source content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Unique point identifier
    pub id: String,
    /// Kind of source that produced the point
    pub source_type: SourceType,
    /// Source-specific identifier (account, filing number, ticker...)
    #[serde(default)]
    pub source_id: String,
    /// Free-text content
    pub content: String,
    /// Source-defined metadata
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    /// When the point was produced
    pub timestamp: DateTime<Utc>,
    /// Entities mentioned by the point, in source order
    #[serde(default)]
    pub entities: Vec<String>,
    /// Sentiment in [-1, 1]
    #[serde(default)]
    pub sentiment: Option<f64>,
    /// Relevance in [0, 1]
    #[serde(default)]
    pub relevance_score: Option<f64>,
}

impl DataPoint {
    pub fn new(source_type: SourceType, content: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source_type,
            source_id: String::new(),
            content: content.to_string(),
            metadata: HashMap::new(),
            timestamp,
            entities: Vec::new(),
            sentiment: None,
            relevance_score: None,
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    pub fn with_source_id(mut self, source_id: &str) -> Self {
        self.source_id = source_id.to_string();
        self
    }

    pub fn with_entities<I, S>(mut self, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entities = entities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_sentiment(mut self, sentiment: f64) -> Self {
        self.sentiment = Some(sentiment.clamp(-1.0, 1.0));
        self
    }

    pub fn with_relevance(mut self, relevance: f64) -> Self {
        self.relevance_score = Some(relevance.clamp(0.0, 1.0));
        self
    }

    pub fn with_metadata(mut self, key: &str, value: serde_json::Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }

    /// Number of entities this point shares with another point
    pub fn shared_entities(&self, other: &DataPoint) -> usize {
        self.entities
            .iter()
            .filter(|e| other.entities.contains(e))
            .count()
    }
}

/// An inclusive time range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Window ending now and reaching back `hours`
    pub fn last_hours(hours: i64) -> Self {
        let end = Utc::now();
        Self {
            start: end - Duration::hours(hours),
            end,
        }
    }

    /// Like `last_hours`, but `None` when `hours` is not positive or the
    /// start would fall outside the representable range
    pub fn try_last_hours(hours: i64) -> Option<Self> {
        if hours <= 0 {
            return None;
        }
        let end = Utc::now();
        let start = end.checked_sub_signed(Duration::try_hours(hours)?)?;
        Some(Self { start, end })
    }

    /// Smallest window containing every point, if any
    pub fn covering(points: &[DataPoint]) -> Option<Self> {
        let start = points.iter().map(|p| p.timestamp).min()?;
        let end = points.iter().map(|p| p.timestamp).max()?;
        Some(Self { start, end })
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }

    /// Length of the window in fractional hours
    pub fn hours(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 3_600_000.0
    }
}

/// Fixed throttle declared by a source configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    pub max_requests: u32,
    pub window_ms: u64,
}

impl RateLimit {
    pub fn new(max_requests: u32, window_ms: u64) -> Self {
        Self {
            max_requests,
            window_ms,
        }
    }

    /// Delay applied before every fetch: `window_ms / max_requests`
    pub fn per_request_delay(&self) -> Option<std::time::Duration> {
        if self.max_requests == 0 {
            return None;
        }
        Some(std::time::Duration::from_millis(
            self.window_ms / u64::from(self.max_requests),
        ))
    }
}

/// Source-specific settings handed to the fetcher
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Endpoint the source reads from
    pub endpoint: Option<String>,
    /// Credential forwarded to the source
    pub api_key: Option<String>,
    /// Upper bound on points requested per fetch
    pub max_results: Option<usize>,
    /// Extra string parameters
    pub params: BTreeMap<String, String>,
}

impl SourceSettings {
    /// Overlay `other` onto these settings; present values win
    pub fn merge(&mut self, other: SourceSettings) {
        if other.endpoint.is_some() {
            self.endpoint = other.endpoint;
        }
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.max_results.is_some() {
            self.max_results = other.max_results;
        }
        self.params.extend(other.params);
    }
}

/// Registry entry describing how a source is used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfiguration {
    pub source_type: SourceType,
    pub enabled: bool,
    #[serde(default)]
    pub settings: SourceSettings,
    #[serde(default)]
    pub rate_limit: Option<RateLimit>,
}

impl SourceConfiguration {
    pub fn new(source_type: SourceType) -> Self {
        Self {
            source_type,
            enabled: true,
            settings: SourceSettings::default(),
            rate_limit: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.settings.endpoint = Some(endpoint.to_string());
        self
    }

    pub fn with_settings(mut self, settings: SourceSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_rate_limit(mut self, max_requests: u32, window_ms: u64) -> Self {
        self.rate_limit = Some(RateLimit::new(max_requests, window_ms));
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Merge a partial update into this configuration
    pub fn apply(&mut self, update: SourceConfigUpdate) {
        if let Some(enabled) = update.enabled {
            self.enabled = enabled;
        }
        if let Some(settings) = update.settings {
            self.settings.merge(settings);
        }
        if let Some(rate_limit) = update.rate_limit {
            self.rate_limit = rate_limit;
        }
    }
}

/// Partial update for a source configuration
#[derive(Debug, Clone, Default)]
pub struct SourceConfigUpdate {
    pub enabled: Option<bool>,
    pub settings: Option<SourceSettings>,
    /// `Some(None)` removes the rate limit
    pub rate_limit: Option<Option<RateLimit>>,
}

/// Everything a source needs for a single fetch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchConfig {
    pub source_type: SourceType,
    pub settings: SourceSettings,
    pub time_window: TimeWindow,
    pub keywords: Vec<String>,
    pub entities: Vec<String>,
}

/// An aggregation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregationConfig {
    pub sources: Vec<SourceType>,
    pub time_window: TimeWindow,
    #[serde(default)]
    pub min_data_points: usize,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub entities: Option<Vec<String>>,
}

impl AggregationConfig {
    pub fn new(sources: Vec<SourceType>, time_window: TimeWindow) -> Self {
        Self {
            sources,
            time_window,
            min_data_points: 0,
            keywords: None,
            entities: None,
        }
    }

    pub fn with_min_data_points(mut self, min: usize) -> Self {
        self.min_data_points = min;
        self
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = Some(keywords);
        self
    }

    pub fn with_entities(mut self, entities: Vec<String>) -> Self {
        self.entities = Some(entities);
        self
    }

    /// Canonical cache key: order of sources, keywords and entities is irrelevant
    pub fn cache_key(&self) -> String {
        let mut sources: Vec<&str> = self.sources.iter().map(|s| s.as_str()).collect();
        sources.sort_unstable();

        let mut keywords = self.keywords.clone().unwrap_or_default();
        keywords.sort();

        let mut entities = self.entities.clone().unwrap_or_default();
        entities.sort();

        let canonical = serde_json::json!({
            "sources": sources,
            "start": self.time_window.start.to_rfc3339(),
            "end": self.time_window.end.to_rfc3339(),
            "keywords": keywords,
            "entities": entities,
        });

        let mut hasher = Sha256::new();
        hasher.update(canonical.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Build the fetch config for one source from its stored settings
    pub fn fetch_config(&self, configuration: &SourceConfiguration) -> FetchConfig {
        FetchConfig {
            source_type: configuration.source_type,
            settings: configuration.settings.clone(),
            time_window: self.time_window,
            keywords: self.keywords.clone().unwrap_or_default(),
            entities: self.entities.clone().unwrap_or_default(),
        }
    }
}
