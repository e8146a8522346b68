//! Recurring pattern detection
//!
//! A cluster forms a pattern when a single entity appears in at least half of
//! its points.

use sigwatch_core::{mean, most_frequent_entity, DataPoint, Signal, SignalType};

use crate::traits::cluster_signal;
use crate::{build_reasoning, DetectionContext, SignalAlgorithm};

/// Share of points the dominant entity must reach
pub const MIN_PATTERN_STRENGTH: f64 = 0.5;

pub struct PatternDetector;

impl SignalAlgorithm for PatternDetector {
    fn signal_type(&self) -> SignalType {
        SignalType::PatternDetected
    }

    fn detect(&self, points: &[DataPoint], ctx: &DetectionContext) -> Option<Signal> {
        let (entity, count) = most_frequent_entity(points)?;
        let pattern_strength = (count as f64 / points.len() as f64).min(1.0);
        if pattern_strength < MIN_PATTERN_STRENGTH {
            return None;
        }

        let reasoning = build_reasoning(points, ctx.reasoning_enabled);
        let confidence = mean(&[pattern_strength, reasoning.overall()]);

        let signal = cluster_signal(SignalType::PatternDetected, points, reasoning)
            .title(format!("Recurring pattern: {}", entity))
            .description("A single entity recurs across most of the related data points")
            .confidence(confidence)
            .strength_factor(pattern_strength)
            .build();

        Some(signal)
    }
}
