//! In-memory data source
//!
//! Serves a fixed set of points. Used for replaying exported data and for
//! wiring the engine without network access.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use sigwatch_core::{DataPoint, FetchConfig};

use crate::{DataSource, SourceError};

/// A source backed by a vector of points
pub struct MemorySource {
    name: String,
    points: RwLock<Vec<DataPoint>>,
    available: AtomicBool,
}

impl MemorySource {
    pub fn new(name: &str, points: Vec<DataPoint>) -> Self {
        Self {
            name: name.to_string(),
            points: RwLock::new(points),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn push(&self, point: DataPoint) {
        self.points.write().push(point);
    }

    pub fn len(&self) -> usize {
        self.points.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.read().is_empty()
    }
}

/// Whether a point satisfies the keyword and entity filters of a fetch
fn matches_filters(point: &DataPoint, config: &FetchConfig) -> bool {
    let keyword_match = config.keywords.is_empty() || {
        let content = point.content.to_lowercase();
        config
            .keywords
            .iter()
            .any(|k| content.contains(&k.to_lowercase()))
    };

    let entity_match = config.entities.is_empty()
        || config.entities.iter().any(|e| point.entities.contains(e));

    keyword_match && entity_match
}

#[async_trait]
impl DataSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, config: &FetchConfig) -> Result<Vec<DataPoint>, SourceError> {
        if !self.available.load(Ordering::SeqCst) {
            return Err(SourceError::Unavailable(self.name.clone()));
        }

        let limit = config.settings.max_results.unwrap_or(usize::MAX);
        let points = self
            .points
            .read()
            .iter()
            .filter(|p| config.time_window.contains(p.timestamp))
            .filter(|p| matches_filters(p, config))
            .take(limit)
            .cloned()
            .collect();

        Ok(points)
    }

    async fn is_available(&self) -> Result<bool, SourceError> {
        Ok(self.available.load(Ordering::SeqCst))
    }
}
