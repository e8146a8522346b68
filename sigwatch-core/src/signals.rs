//! Typed signals derived from clusters of data points
//!
//! A signal is a scored claim about a cluster:
//! - A type (trend, sentiment shift, spike, pattern, anomaly, correlation)
//! - Confidence and relevance in [0, 1]
//! - A strength bucket derived from confidence and a per-type factor
//! - Evidence excerpts, a reasoning trace and cluster metadata

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::{
    excerpt, momentum, source_distribution, velocity, DataPoint, SourceType, TimeWindow,
    EVIDENCE_EXCERPT_CHARS, MAX_EVIDENCE,
};

/// The six kinds of signal the engine detects
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalType {
    EmergingTrend,
    SentimentShift,
    VolumeSpike,
    PatternDetected,
    Anomaly,
    Correlation,
}

impl SignalType {
    /// Every signal type, in default detection order
    pub const ALL: [SignalType; 6] = [
        SignalType::EmergingTrend,
        SignalType::SentimentShift,
        SignalType::VolumeSpike,
        SignalType::PatternDetected,
        SignalType::Anomaly,
        SignalType::Correlation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SignalType::EmergingTrend => "EMERGING_TREND",
            SignalType::SentimentShift => "SENTIMENT_SHIFT",
            SignalType::VolumeSpike => "VOLUME_SPIKE",
            SignalType::PatternDetected => "PATTERN_DETECTED",
            SignalType::Anomaly => "ANOMALY",
            SignalType::Correlation => "CORRELATION",
        }
    }
}

impl std::fmt::Display for SignalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Strength bucket of a signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalStrength {
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

impl SignalStrength {
    /// Bucket `(confidence + min(1, factor)) / 2`
    pub fn determine(confidence: f64, factor: f64) -> Self {
        let combined = (confidence + factor.min(1.0)) / 2.0;
        if combined >= 0.8 {
            SignalStrength::VeryStrong
        } else if combined >= 0.65 {
            SignalStrength::Strong
        } else if combined >= 0.5 {
            SignalStrength::Moderate
        } else {
            SignalStrength::Weak
        }
    }
}

/// Excerpt of a data point backing a signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub source_type: SourceType,
    pub content: String,
    pub relevance_score: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

impl Evidence {
    pub fn from_point(point: &DataPoint) -> Self {
        Self {
            source_type: point.source_type,
            content: excerpt(&point.content, EVIDENCE_EXCERPT_CHARS),
            relevance_score: point.relevance_score,
            timestamp: point.timestamp,
        }
    }
}

/// Factors behind the reasoning confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceFactors {
    /// Mean of the individual factors (0.5 when reasoning is disabled)
    pub overall: f64,
    /// Distinct source types over known source types
    pub source_diversity: Option<f64>,
    /// Points per hour, capped at 1
    pub temporal_density: Option<f64>,
    /// Share of points mentioning the dominant entity
    pub entity_coherence: Option<f64>,
}

/// Lightweight explanation attached to every signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningTrace {
    pub rules: Vec<String>,
    pub inferences: Vec<String>,
    pub confidence_factors: ConfidenceFactors,
    pub knowledge_graph_entities: Vec<String>,
    pub logical_chain: Vec<String>,
}

impl ReasoningTrace {
    /// Constant trace used when reasoning is disabled
    pub fn neutral() -> Self {
        Self {
            rules: Vec::new(),
            inferences: Vec::new(),
            confidence_factors: ConfidenceFactors {
                overall: 0.5,
                source_diversity: None,
                temporal_density: None,
                entity_coherence: None,
            },
            knowledge_graph_entities: Vec::new(),
            logical_chain: Vec::new(),
        }
    }

    pub fn overall(&self) -> f64 {
        self.confidence_factors.overall
    }
}

impl Default for ReasoningTrace {
    fn default() -> Self {
        Self::neutral()
    }
}

/// Cluster statistics recorded on a signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMetadata {
    pub data_point_count: usize,
    pub source_distribution: BTreeMap<SourceType, usize>,
    pub time_span: TimeWindow,
    /// Points per hour
    pub velocity: f64,
    /// Second-half velocity minus first-half velocity
    pub momentum: f64,
}

impl SignalMetadata {
    pub fn from_points(points: &[DataPoint]) -> Self {
        let now = Utc::now();
        Self {
            data_point_count: points.len(),
            source_distribution: source_distribution(points),
            time_span: TimeWindow::covering(points).unwrap_or(TimeWindow::new(now, now)),
            velocity: velocity(points),
            momentum: momentum(points),
        }
    }
}

/// A detected signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub entities: Vec<String>,
    /// Confidence (0.0 - 1.0)
    pub confidence: f64,
    /// Relevance (0.0 - 1.0)
    pub relevance: f64,
    pub strength: SignalStrength,
    pub evidence: Vec<Evidence>,
    pub reasoning: ReasoningTrace,
    pub metadata: SignalMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Recorded only; nothing removes signals past this instant
    pub expires_at: Option<DateTime<Utc>>,
}

impl Signal {
    /// Create a new signal builder
    pub fn builder(signal_type: SignalType) -> SignalBuilder {
        SignalBuilder::new(signal_type)
    }

    /// Age of the signal in fractional hours
    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        (now - self.created_at).num_milliseconds() as f64 / 3_600_000.0
    }
}

/// Builder for signals; strength is derived at build time
pub struct SignalBuilder {
    signal_type: SignalType,
    title: String,
    description: String,
    keywords: Vec<String>,
    entities: Vec<String>,
    confidence: f64,
    relevance: f64,
    strength_factor: f64,
    evidence: Vec<Evidence>,
    reasoning: ReasoningTrace,
    metadata: Option<SignalMetadata>,
    expires_at: Option<DateTime<Utc>>,
}

impl SignalBuilder {
    pub fn new(signal_type: SignalType) -> Self {
        Self {
            signal_type,
            title: String::new(),
            description: String::new(),
            keywords: Vec::new(),
            entities: Vec::new(),
            confidence: 0.0,
            relevance: 0.0,
            strength_factor: 0.0,
            evidence: Vec::new(),
            reasoning: ReasoningTrace::neutral(),
            metadata: None,
            expires_at: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn entities(mut self, entities: Vec<String>) -> Self {
        self.entities = entities;
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn relevance(mut self, relevance: f64) -> Self {
        self.relevance = relevance.clamp(0.0, 1.0);
        self
    }

    /// Per-type factor combined with confidence into the strength bucket
    pub fn strength_factor(mut self, factor: f64) -> Self {
        self.strength_factor = if factor.is_finite() { factor.max(0.0) } else { 1.0 };
        self
    }

    /// Evidence from the first points of the cluster
    pub fn evidence_from(mut self, points: &[DataPoint]) -> Self {
        self.evidence = points
            .iter()
            .take(MAX_EVIDENCE)
            .map(Evidence::from_point)
            .collect();
        self
    }

    pub fn reasoning(mut self, reasoning: ReasoningTrace) -> Self {
        self.reasoning = reasoning;
        self
    }

    pub fn metadata(mut self, metadata: SignalMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn build(self) -> Signal {
        let now = Utc::now();
        let metadata = self
            .metadata
            .unwrap_or_else(|| SignalMetadata::from_points(&[]));

        Signal {
            id: Uuid::new_v4(),
            signal_type: self.signal_type,
            title: self.title,
            description: self.description,
            keywords: self.keywords,
            entities: self.entities,
            confidence: self.confidence,
            relevance: self.relevance,
            strength: SignalStrength::determine(self.confidence, self.strength_factor),
            evidence: self.evidence,
            reasoning: self.reasoning,
            metadata,
            created_at: now,
            updated_at: now,
            expires_at: self.expires_at,
        }
    }
}
