//! Common interface for signal detection algorithms

use tracing::debug;

use sigwatch_core::{
    average_relevance, extract_keywords, ranked_entities, DataPoint, ReasoningTrace, Signal,
    SignalBuilder, SignalMetadata, SignalType, DEFAULT_KEYWORD_LIMIT,
};

use crate::{
    AnomalyDetector, CorrelationDetector, EmergingTrendDetector, PatternDetector,
    SentimentShiftDetector, VolumeSpikeDetector,
};

/// Maximum entities listed on a signal
pub const MAX_SIGNAL_ENTITIES: usize = 10;

/// Run-wide settings an algorithm may consult
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionContext {
    /// Smallest cluster worth analysing
    pub min_evidence_points: usize,
    /// Build full reasoning traces instead of the neutral block
    pub reasoning_enabled: bool,
}

impl Default for DetectionContext {
    fn default() -> Self {
        Self {
            min_evidence_points: 5,
            reasoning_enabled: true,
        }
    }
}

/// A per-type detection algorithm over one cluster
pub trait SignalAlgorithm: Send + Sync {
    /// Signal type this algorithm produces
    fn signal_type(&self) -> SignalType;

    /// Candidate signal for the cluster, `None` when the cluster does not qualify
    fn detect(&self, points: &[DataPoint], ctx: &DetectionContext) -> Option<Signal>;
}

static EMERGING_TREND: EmergingTrendDetector = EmergingTrendDetector;
static SENTIMENT_SHIFT: SentimentShiftDetector = SentimentShiftDetector;
static VOLUME_SPIKE: VolumeSpikeDetector = VolumeSpikeDetector;
static PATTERN: PatternDetector = PatternDetector;
static ANOMALY: AnomalyDetector = AnomalyDetector;
static CORRELATION: CorrelationDetector = CorrelationDetector;

/// The algorithm registered for a signal type
pub fn algorithm_for(signal_type: SignalType) -> &'static dyn SignalAlgorithm {
    match signal_type {
        SignalType::EmergingTrend => &EMERGING_TREND,
        SignalType::SentimentShift => &SENTIMENT_SHIFT,
        SignalType::VolumeSpike => &VOLUME_SPIKE,
        SignalType::PatternDetected => &PATTERN,
        SignalType::Anomaly => &ANOMALY,
        SignalType::Correlation => &CORRELATION,
    }
}

/// Run one signal type over a cluster; undersized clusters never qualify
pub fn detect_cluster(
    signal_type: SignalType,
    points: &[DataPoint],
    ctx: &DetectionContext,
) -> Option<Signal> {
    if points.is_empty() || points.len() < ctx.min_evidence_points {
        return None;
    }

    let candidate = algorithm_for(signal_type).detect(points, ctx);
    debug!(
        "{} over {} points: {}",
        signal_type,
        points.len(),
        candidate
            .as_ref()
            .map(|s| format!("confidence {:.2}", s.confidence))
            .unwrap_or_else(|| "no match".to_string())
    );
    candidate
}

/// Builder pre-filled with the cluster-derived fields every type shares
pub(crate) fn cluster_signal(
    signal_type: SignalType,
    points: &[DataPoint],
    reasoning: ReasoningTrace,
) -> SignalBuilder {
    Signal::builder(signal_type)
        .keywords(extract_keywords(points, DEFAULT_KEYWORD_LIMIT))
        .entities(ranked_entities(points, MAX_SIGNAL_ENTITIES))
        .relevance(average_relevance(points))
        .evidence_from(points)
        .reasoning(reasoning)
        .metadata(SignalMetadata::from_points(points))
}

/// Up to `n` leading items joined for titles
pub(crate) fn headline(items: &[String], n: usize) -> String {
    items
        .iter()
        .take(n)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}


#[cfg(test)]
mod tests {
    use super::fixtures::spread;
    use super::*;
    use sigwatch_core::SourceType;

    #[test]
    fn test_registry_covers_every_type() {
        for signal_type in SignalType::ALL {
            assert_eq!(algorithm_for(signal_type).signal_type(), signal_type);
        }
    }

    #[test]
    fn test_undersized_cluster_yields_nothing() {
        let points = spread(
            4,
            60,
            &[SourceType::Social, SourceType::News],
            &["AI", "tech"],
            "Generative models reshape enterprise software",
        )
        .into_iter()
        .map(|p| p.with_sentiment(0.7).with_relevance(0.9))
        .collect::<Vec<_>>();

        let ctx = DetectionContext::default();
        for signal_type in SignalType::ALL {
            assert!(detect_cluster(signal_type, &points, &ctx).is_none());
        }
        assert!(detect_cluster(SignalType::PatternDetected, &[], &ctx).is_none());
    }

    #[test]
    fn test_headline() {
        let items = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(headline(&items, 2), "a, b");
        assert_eq!(headline(&[], 3), "");
    }
}
