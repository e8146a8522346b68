//! Relevance anomaly detection
//!
//! Flags clusters containing points whose relevance lies more than two
//! (population) standard deviations from the cluster mean.

use sigwatch_core::{mean, ranked_entities, std_dev, DataPoint, Signal, SignalType};

use crate::traits::{cluster_signal, headline};
use crate::{build_reasoning, DetectionContext, SignalAlgorithm};

/// Distance from the mean, in standard deviations, that marks an outlier
const OUTLIER_DEVIATIONS: f64 = 2.0;

const OUTLIER_WEIGHT: f64 = 3.0;

pub struct AnomalyDetector;

impl SignalAlgorithm for AnomalyDetector {
    fn signal_type(&self) -> SignalType {
        SignalType::Anomaly
    }

    fn detect(&self, points: &[DataPoint], ctx: &DetectionContext) -> Option<Signal> {
        let scores: Vec<f64> = points.iter().filter_map(|p| p.relevance_score).collect();
        if scores.is_empty() {
            return None;
        }

        let mean = mean(&scores);
        let deviation = std_dev(&scores);
        let outliers = scores
            .iter()
            .filter(|s| (*s - mean).abs() > OUTLIER_DEVIATIONS * deviation)
            .count();
        if outliers == 0 {
            return None;
        }

        let confidence = (outliers as f64 / points.len() as f64 * OUTLIER_WEIGHT).min(1.0);
        let reasoning = build_reasoning(points, ctx.reasoning_enabled);
        let subject = headline(&ranked_entities(points, 2), 2);

        let signal = cluster_signal(SignalType::Anomaly, points, reasoning)
            .title(format!("Anomaly: {}", subject))
            .description("Some data points deviate sharply from the relevance of their cluster")
            .confidence(confidence)
            .strength_factor(deviation)
            .build();

        Some(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::fixtures::spread;
    use sigwatch_core::SourceType;

    fn cluster(relevances: &[f64]) -> Vec<DataPoint> {
        spread(relevances.len(), 60, &[SourceType::Filing], &["Initech", "audit"], "audit")
            .into_iter()
            .zip(relevances)
            .map(|(p, r)| p.with_relevance(*r))
            .collect()
    }

    #[test]
    fn test_single_outlier() {
        // mean 0.82, std 0.24, outlier distance 0.72
        let mut relevances = vec![0.9; 9];
        relevances.push(0.1);

        let signal = AnomalyDetector
            .detect(&cluster(&relevances), &DetectionContext::default())
            .unwrap();
        assert!((signal.confidence - 0.3).abs() < 1e-9);
        assert!((signal.relevance - 0.82).abs() < 1e-9);
    }

    #[test]
    fn test_uniform_relevance_ignored() {
        assert!(AnomalyDetector
            .detect(&cluster(&[0.7; 6]), &DetectionContext::default())
            .is_none());
    }

    #[test]
    fn test_no_relevance_ignored() {
        let points = spread(6, 60, &[SourceType::News], &["A", "B"], "x");
        assert!(AnomalyDetector
            .detect(&points, &DetectionContext::default())
            .is_none());
    }
}
