//! Score components and weights
//!
//! Weights always sum to 1: every update is merged and renormalized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The six quality dimensions of a signal, each in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub confidence: f64,
    pub relevance: f64,
    pub novelty: f64,
    pub diversity: f64,
    pub velocity: f64,
    pub consistency: f64,
}

impl ScoreComponents {
    /// Weighted sum of the components
    pub fn weighted(&self, weights: &ScoringWeights) -> f64 {
        self.confidence * weights.confidence
            + self.relevance * weights.relevance
            + self.novelty * weights.novelty
            + self.diversity * weights.diversity
            + self.velocity * weights.velocity
            + self.consistency * weights.consistency
    }
}

/// Relative importance of each component
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub confidence: f64,
    pub relevance: f64,
    pub novelty: f64,
    pub diversity: f64,
    pub velocity: f64,
    pub consistency: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            confidence: 0.25,
            relevance: 0.20,
            novelty: 0.15,
            diversity: 0.15,
            velocity: 0.15,
            consistency: 0.10,
        }
    }
}

impl ScoringWeights {
    pub fn sum(&self) -> f64 {
        self.confidence
            + self.relevance
            + self.novelty
            + self.diversity
            + self.velocity
            + self.consistency
    }

    /// Scale all weights so they sum to 1; a non-positive total resets to defaults
    pub fn normalized(self) -> Self {
        let clean = Self {
            confidence: self.confidence.max(0.0),
            relevance: self.relevance.max(0.0),
            novelty: self.novelty.max(0.0),
            diversity: self.diversity.max(0.0),
            velocity: self.velocity.max(0.0),
            consistency: self.consistency.max(0.0),
        };
        let total = clean.sum();
        if !total.is_finite() || total <= 0.0 {
            return Self::default();
        }
        Self {
            confidence: clean.confidence / total,
            relevance: clean.relevance / total,
            novelty: clean.novelty / total,
            diversity: clean.diversity / total,
            velocity: clean.velocity / total,
            consistency: clean.consistency / total,
        }
    }

    /// Merge a partial update, then renormalize
    pub fn merged(self, update: &ScoringWeightsUpdate) -> Self {
        Self {
            confidence: update.confidence.unwrap_or(self.confidence),
            relevance: update.relevance.unwrap_or(self.relevance),
            novelty: update.novelty.unwrap_or(self.novelty),
            diversity: update.diversity.unwrap_or(self.diversity),
            velocity: update.velocity.unwrap_or(self.velocity),
            consistency: update.consistency.unwrap_or(self.consistency),
        }
        .normalized()
    }
}

/// Partial weight update; absent fields keep their current value
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeightsUpdate {
    pub confidence: Option<f64>,
    pub relevance: Option<f64>,
    pub novelty: Option<f64>,
    pub diversity: Option<f64>,
    pub velocity: Option<f64>,
    pub consistency: Option<f64>,
}

/// Result of scoring one signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalScore {
    pub signal_id: Uuid,
    pub overall_score: f64,
    pub components: ScoreComponents,
    pub weights: ScoringWeights,
    pub timestamp: DateTime<Utc>,
}
