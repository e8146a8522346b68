//! Sentiment shift detection
//!
//! Sentiment-bearing points are ordered by time and split into an early and
//! a late half; a large enough difference of half means is a shift.

use sigwatch_core::{mean, ranked_entities, sorted_by_time, DataPoint, Signal, SignalType};

use crate::traits::{cluster_signal, headline};
use crate::{build_reasoning, DetectionContext, SignalAlgorithm};

/// Smallest absolute difference of half means that counts as a shift
pub const MIN_SENTIMENT_SHIFT: f64 = 0.3;

const SHIFT_WEIGHT: f64 = 1.5;

pub struct SentimentShiftDetector;

impl SignalAlgorithm for SentimentShiftDetector {
    fn signal_type(&self) -> SignalType {
        SignalType::SentimentShift
    }

    fn detect(&self, points: &[DataPoint], ctx: &DetectionContext) -> Option<Signal> {
        let sentiments: Vec<f64> = sorted_by_time(points)
            .into_iter()
            .filter_map(|p| p.sentiment)
            .collect();
        if sentiments.len() < 2 {
            return None;
        }

        let (early, late) = sentiments.split_at(sentiments.len() / 2);
        let delta = mean(late) - mean(early);
        let shift = delta.abs();
        if shift < MIN_SENTIMENT_SHIFT {
            return None;
        }

        let reasoning = build_reasoning(points, ctx.reasoning_enabled);
        let confidence = (shift * SHIFT_WEIGHT + reasoning.overall()).min(1.0);
        let direction = if delta > 0.0 { "positive" } else { "negative" };

        let subject = headline(&ranked_entities(points, 2), 2);

        let signal = cluster_signal(SignalType::SentimentShift, points, reasoning)
            .title(format!("Sentiment turning {}: {}", direction, subject))
            .description("Sentiment changed markedly between the earlier and later data points")
            .confidence(confidence)
            .strength_factor(shift)
            .build();

        Some(signal)
    }
}
