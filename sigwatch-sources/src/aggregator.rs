//! Data aggregator
//!
//! Fans out one fetch per requested source, tolerates per-source failures,
//! re-filters to the requested window and caches results by request.

use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use sigwatch_core::{
    AggregationConfig, DataPoint, FetchConfig, SourceConfigUpdate, SourceConfiguration,
    SourceType, DEFAULT_CACHE_TTL_SECS,
};

use crate::SharedSource;

/// Cached aggregation result
#[derive(Debug, Clone)]
struct CacheEntry {
    points: Vec<DataPoint>,
    stored_at: Instant,
}

/// Aggregator statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregatorStats {
    pub registered_sources: usize,
    pub configured_sources: usize,
    pub enabled_sources: usize,
    pub cache_entries: usize,
    pub fresh_cache_entries: usize,
    pub cache_ttl_secs: u64,
}

/// Registry of sources plus the aggregation cache
pub struct DataAggregator {
    sources: DashMap<SourceType, SharedSource>,
    configurations: DashMap<SourceType, SourceConfiguration>,
    cache: DashMap<String, CacheEntry>,
    cache_ttl: Duration,
}

impl DataAggregator {
    pub fn new() -> Self {
        Self {
            sources: DashMap::new(),
            configurations: DashMap::new(),
            cache: DashMap::new(),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Register a source under its configured type; re-registering overwrites
    pub fn register_source(&self, source: SharedSource, config: SourceConfiguration) {
        let source_type = config.source_type;
        info!("Registering source {} as {}", source.name(), source_type);
        self.sources.insert(source_type, source);
        self.configurations.insert(source_type, config);
    }

    pub fn unregister_source(&self, source_type: SourceType) -> bool {
        let removed = self.sources.remove(&source_type).is_some();
        self.configurations.remove(&source_type);
        removed
    }

    /// Gather points from every requested source for the window
    pub async fn aggregate(&self, request: &AggregationConfig) -> Vec<DataPoint> {
        let key = request.cache_key();

        if let Some(entry) = self.cache.get(&key) {
            if entry.stored_at.elapsed() < self.cache_ttl {
                debug!("Aggregation cache hit ({} points)", entry.points.len());
                return entry.points.clone();
            }
        }

        let mut jobs: Vec<(SharedSource, SourceConfiguration, FetchConfig)> = Vec::new();
        for source_type in &request.sources {
            let Some(source) = self.sources.get(source_type).map(|s| s.value().clone()) else {
                debug!("Source {} not registered, skipping", source_type);
                continue;
            };
            let Some(config) = self.configurations.get(source_type).map(|c| c.value().clone())
            else {
                debug!("Source {} not configured, skipping", source_type);
                continue;
            };
            if !config.enabled {
                debug!("Source {} disabled, skipping", source_type);
                continue;
            }
            let fetch_config = request.fetch_config(&config);
            jobs.push((source, config, fetch_config));
        }

        // Ordered buffering keeps the union in request order
        let concurrency = jobs.len().max(1);
        let fetches: Vec<_> = jobs
            .into_iter()
            .map(|(source, config, fetch_config)| fetch_from_source(source, config, fetch_config))
            .collect();
        let results: Vec<Vec<DataPoint>> = stream::iter(fetches)
            .buffered(concurrency)
            .collect()
            .await;

        let points: Vec<DataPoint> = results
            .into_iter()
            .flatten()
            .filter(|p| request.time_window.contains(p.timestamp))
            .collect();

        if points.len() < request.min_data_points {
            warn!(
                "Aggregated {} data points, fewer than the requested minimum of {}",
                points.len(),
                request.min_data_points
            );
        }

        info!(
            "Aggregated {} data points from {} sources",
            points.len(),
            request.sources.len()
        );

        self.cache.insert(
            key,
            CacheEntry {
                points: points.clone(),
                stored_at: Instant::now(),
            },
        );

        points
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Drop expired cache entries, returning how many were removed
    pub fn prune_cache(&self) -> usize {
        let mut removed = 0;
        self.cache.retain(|_, entry| {
            let fresh = entry.stored_at.elapsed() < self.cache_ttl;
            if !fresh {
                removed += 1;
            }
            fresh
        });
        removed
    }

    pub fn get_source_configuration(&self, source_type: SourceType) -> Option<SourceConfiguration> {
        self.configurations.get(&source_type).map(|c| c.value().clone())
    }

    /// Merge an update into a stored configuration
    pub fn update_source_configuration(
        &self,
        source_type: SourceType,
        update: SourceConfigUpdate,
    ) -> Option<SourceConfiguration> {
        let mut config = self.configurations.get_mut(&source_type)?;
        config.apply(update);
        Some(config.clone())
    }

    pub fn get_all_source_configurations(&self) -> Vec<SourceConfiguration> {
        let mut configs: Vec<_> = self
            .configurations
            .iter()
            .map(|c| c.value().clone())
            .collect();
        configs.sort_by_key(|c| c.source_type);
        configs
    }

    /// Enable or disable a source; false when it is not configured
    pub fn toggle_source(&self, source_type: SourceType, enabled: bool) -> bool {
        match self.configurations.get_mut(&source_type) {
            Some(mut config) => {
                config.enabled = enabled;
                info!(
                    "Source {} {}",
                    source_type,
                    if enabled { "enabled" } else { "disabled" }
                );
                true
            }
            None => false,
        }
    }

    /// Availability of every registered source; errors count as unavailable
    pub async fn check_sources_health(&self) -> BTreeMap<SourceType, bool> {
        let sources: Vec<(SourceType, SharedSource)> = self
            .sources
            .iter()
            .map(|s| (*s.key(), s.value().clone()))
            .collect();

        let checks = sources.into_iter().map(|(source_type, source)| async move {
            let healthy = match source.is_available().await {
                Ok(available) => available,
                Err(e) => {
                    warn!("Health check for {} failed: {}", source.name(), e);
                    false
                }
            };
            (source_type, healthy)
        });

        futures::future::join_all(checks).await.into_iter().collect()
    }

    pub fn get_statistics(&self) -> AggregatorStats {
        AggregatorStats {
            registered_sources: self.sources.len(),
            configured_sources: self.configurations.len(),
            enabled_sources: self.configurations.iter().filter(|c| c.enabled).count(),
            cache_entries: self.cache.len(),
            fresh_cache_entries: self
                .cache
                .iter()
                .filter(|e| e.stored_at.elapsed() < self.cache_ttl)
                .count(),
            cache_ttl_secs: self.cache_ttl.as_secs(),
        }
    }
}

impl Default for DataAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Availability check, throttle and fetch for one source; failures yield no points
async fn fetch_from_source(
    source: SharedSource,
    config: SourceConfiguration,
    fetch_config: FetchConfig,
) -> Vec<DataPoint> {
    match source.is_available().await {
        Ok(true) => {}
        Ok(false) => {
            warn!("Source {} is not available, skipping", source.name());
            return Vec::new();
        }
        Err(e) => {
            warn!("Availability check for {} failed: {}", source.name(), e);
            return Vec::new();
        }
    }

    if let Some(delay) = config.rate_limit.and_then(|limit| limit.per_request_delay()) {
        debug!("Throttling {} for {:?}", source.name(), delay);
        tokio::time::sleep(delay).await;
    }

    match source.fetch(&fetch_config).await {
        Ok(points) => {
            debug!("Source {} returned {} points", source.name(), points.len());
            points
        }
        Err(e) => {
            warn!("Source {} failed: {}", source.name(), e);
            Vec::new()
        }
    }
}
