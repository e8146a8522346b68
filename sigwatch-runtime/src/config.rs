//! Engine configuration
//!
//! Loaded from TOML; every table and field is optional:
//!
//! ```toml
//! [detection]
//! confidence_threshold = 0.6
//! signal_types = ["EMERGING_TREND", "CORRELATION"]
//!
//! [scoring]
//! novelty = 0.3
//!
//! [[sources]]
//! type = "news"
//! name = "wire"
//! endpoint = "https://feeds.example/news"
//! rate_limit = { max_requests = 10, window_ms = 1000 }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use sigwatch_core::{
    RateLimit, ScoringWeights, SignalType, SourceConfiguration, SourceSettings, SourceType,
    DEFAULT_CACHE_TTL_SECS,
};
use sigwatch_sources::{DataAggregator, HttpConfig, HttpFeedSource};

/// Errors from loading or applying configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to render TOML: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Detection thresholds and limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum candidate confidence
    pub confidence_threshold: f64,
    /// Minimum candidate relevance
    pub relevance_threshold: f64,
    /// Minimum points per run and per cluster
    pub min_evidence_points: usize,
    /// Build full reasoning traces
    pub enable_reasoning: bool,
    /// Signal types to run, in order
    pub signal_types: Vec<SignalType>,
    /// Maximum signals accepted per run
    pub max_signals_per_run: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.6,
            relevance_threshold: 0.6,
            min_evidence_points: 5,
            enable_reasoning: true,
            signal_types: SignalType::ALL.to_vec(),
            max_signals_per_run: 50,
        }
    }
}

impl DetectionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("confidence_threshold", self.confidence_threshold),
            ("relevance_threshold", self.relevance_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Merge a partial update
    pub fn apply(&mut self, update: DetectionConfigUpdate) {
        if let Some(v) = update.confidence_threshold {
            self.confidence_threshold = v;
        }
        if let Some(v) = update.relevance_threshold {
            self.relevance_threshold = v;
        }
        if let Some(v) = update.min_evidence_points {
            self.min_evidence_points = v;
        }
        if let Some(v) = update.enable_reasoning {
            self.enable_reasoning = v;
        }
        if let Some(v) = update.signal_types {
            self.signal_types = v;
        }
        if let Some(v) = update.max_signals_per_run {
            self.max_signals_per_run = v;
        }
    }
}

/// Partial update of the detection config
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfigUpdate {
    pub confidence_threshold: Option<f64>,
    pub relevance_threshold: Option<f64>,
    pub min_evidence_points: Option<usize>,
    pub enable_reasoning: Option<bool>,
    pub signal_types: Option<Vec<SignalType>>,
    pub max_signals_per_run: Option<usize>,
}

/// Aggregator and HTTP settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorSettings {
    pub cache_ttl_secs: u64,
    pub http_timeout_secs: u64,
}

impl Default for AggregatorSettings {
    fn default() -> Self {
        Self {
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            http_timeout_secs: HttpConfig::default().timeout_secs,
        }
    }
}

/// A configured source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    #[serde(rename = "type")]
    pub source_type: SourceType,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub max_results: Option<usize>,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default)]
    pub rate_limit: Option<RateLimit>,
}

fn default_enabled() -> bool {
    true
}

impl SourceEntry {
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.source_type.as_str().to_string())
    }

    /// Registry configuration for this entry
    pub fn configuration(&self) -> SourceConfiguration {
        SourceConfiguration {
            source_type: self.source_type,
            enabled: self.enabled,
            settings: SourceSettings {
                endpoint: self.endpoint.clone(),
                api_key: self.api_key.clone(),
                max_results: self.max_results,
                params: self.params.clone(),
            },
            rate_limit: self.rate_limit,
        }
    }
}

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigwatchConfig {
    pub detection: DetectionConfig,
    pub scoring: ScoringWeights,
    pub aggregator: AggregatorSettings,
    pub sources: Vec<SourceEntry>,
}

impl SigwatchConfig {
    /// Load and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(text)?;
        config.scoring = config.scoring.normalized();
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detection.validate()?;

        let mut seen = Vec::new();
        for entry in &self.sources {
            if seen.contains(&entry.source_type) {
                return Err(ConfigError::Invalid(format!(
                    "source type {} configured more than once",
                    entry.source_type
                )));
            }
            seen.push(entry.source_type);
        }
        Ok(())
    }

    /// A fresh aggregator using the configured cache lifetime
    pub fn aggregator(&self) -> DataAggregator {
        DataAggregator::new().with_cache_ttl(Duration::from_secs(self.aggregator.cache_ttl_secs))
    }

    /// Register an HTTP feed for every source entry with an endpoint
    pub fn register_feeds(&self, aggregator: &DataAggregator) -> Result<usize, ConfigError> {
        let http = HttpConfig {
            timeout_secs: self.aggregator.http_timeout_secs,
            ..Default::default()
        };

        let mut registered = 0;
        for entry in &self.sources {
            let Some(endpoint) = entry.endpoint.as_deref() else {
                warn!("Source {} has no endpoint, skipping", entry.display_name());
                continue;
            };
            let feed = HttpFeedSource::new(&entry.display_name(), endpoint, &http)
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
            aggregator.register_source(Arc::new(feed), entry.configuration());
            registered += 1;
        }

        Ok(registered)
    }
}
