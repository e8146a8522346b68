//! Emerging trend detection
//!
//! A cluster trends when it carries recurring vocabulary; confidence blends
//! the reasoning confidence with the cluster's velocity and momentum.

use sigwatch_core::{
    extract_keywords, mean, momentum, velocity, DataPoint, Signal, SignalType,
    DEFAULT_KEYWORD_LIMIT,
};

use crate::traits::{cluster_signal, headline};
use crate::{build_reasoning, DetectionContext, SignalAlgorithm};

/// Keywords a cluster needs before it can trend
const MIN_TREND_KEYWORDS: usize = 2;

/// Velocity (points per hour) treated as saturating
const VELOCITY_SCALE: f64 = 10.0;

/// Absolute momentum treated as saturating
const MOMENTUM_SCALE: f64 = 5.0;

pub struct EmergingTrendDetector;

impl SignalAlgorithm for EmergingTrendDetector {
    fn signal_type(&self) -> SignalType {
        SignalType::EmergingTrend
    }

    fn detect(&self, points: &[DataPoint], ctx: &DetectionContext) -> Option<Signal> {
        let keywords = extract_keywords(points, DEFAULT_KEYWORD_LIMIT);
        if keywords.len() < MIN_TREND_KEYWORDS {
            return None;
        }

        let reasoning = build_reasoning(points, ctx.reasoning_enabled);
        let velocity = velocity(points);
        let momentum = momentum(points);

        let confidence = mean(&[
            reasoning.overall(),
            (velocity / VELOCITY_SCALE).min(1.0),
            (momentum.abs() / MOMENTUM_SCALE).min(1.0),
        ]);

        let signal = cluster_signal(SignalType::EmergingTrend, points, reasoning)
            .title(format!("Emerging trend: {}", headline(&keywords, 3)))
            .description("Rising activity around a recurring set of topics across sources")
            .confidence(confidence)
            .strength_factor(velocity)
            .build();

        Some(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::fixtures::spread;
    use sigwatch_core::{SignalStrength, SourceType};

    fn busy_cluster() -> Vec<DataPoint> {
        spread(
            20,
            60,
            &[
                SourceType::Social,
                SourceType::News,
                SourceType::Forum,
                SourceType::Market,
            ],
            &["AI", "tech"],
            "Generative models reshape enterprise software; generative tooling spreads",
        )
        .into_iter()
        .map(|p| p.with_sentiment(0.7).with_relevance(0.8))
        .collect()
    }

    #[test]
    fn test_busy_cluster_trends() {
        let signal = EmergingTrendDetector
            .detect(&busy_cluster(), &DetectionContext::default())
            .unwrap();

        // reasoning (4/6 + 1 + 1) / 3, velocity saturated, flat momentum
        assert!(signal.confidence >= 0.6);
        assert!((signal.relevance - 0.8).abs() < 1e-9);
        assert_eq!(signal.keywords[0], "generative");
        assert_eq!(signal.entities, vec!["AI", "tech"]);
        assert_eq!(signal.strength, SignalStrength::VeryStrong);
        assert_eq!(signal.evidence.len(), 10);
        assert_eq!(signal.metadata.data_point_count, 20);
        assert!(signal.title.starts_with("Emerging trend: generative"));
    }

    #[test]
    fn test_too_few_keywords() {
        let points = spread(6, 60, &[SourceType::News], &["AI", "tech"], "ai is big");
        assert!(EmergingTrendDetector
            .detect(&points, &DetectionContext::default())
            .is_none());
    }
}
