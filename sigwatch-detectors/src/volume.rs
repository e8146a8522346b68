//! Volume spike detection
//!
//! Points are grouped into variable-width time buckets: a bucket opens at a
//! point and collects later points until one falls more than an hour after
//! the bucket's first point.

use chrono::{DateTime, Duration, Utc};

use sigwatch_core::{ranked_entities, DataPoint, Signal, SignalType};

use crate::traits::{cluster_signal, headline};
use crate::{build_reasoning, DetectionContext, SignalAlgorithm};

/// Buckets needed for a meaningful baseline
const MIN_BUCKETS: usize = 3;

/// Peak bucket size, relative to the mean, that counts as a spike
const SPIKE_RATIO: f64 = 3.0;

/// Ratio treated as saturating confidence
const RATIO_SCALE: f64 = 5.0;

/// Sizes of the hourly buckets over time-ordered timestamps
pub fn bucket_counts(points: &[DataPoint]) -> Vec<usize> {
    let mut timestamps: Vec<DateTime<Utc>> = points.iter().map(|p| p.timestamp).collect();
    timestamps.sort();

    let width = Duration::hours(1);
    let mut counts = Vec::new();
    let mut bucket_start: Option<DateTime<Utc>> = None;

    for ts in timestamps {
        match bucket_start {
            Some(start) if ts - start <= width => {
                if let Some(last) = counts.last_mut() {
                    *last += 1;
                }
            }
            _ => {
                bucket_start = Some(ts);
                counts.push(1);
            }
        }
    }

    counts
}

pub struct VolumeSpikeDetector;

impl SignalAlgorithm for VolumeSpikeDetector {
    fn signal_type(&self) -> SignalType {
        SignalType::VolumeSpike
    }

    fn detect(&self, points: &[DataPoint], ctx: &DetectionContext) -> Option<Signal> {
        let counts = bucket_counts(points);
        if counts.len() < MIN_BUCKETS {
            return None;
        }

        let mean = points.len() as f64 / counts.len() as f64;
        let max = counts.iter().copied().max().unwrap_or(0) as f64;
        if max < SPIKE_RATIO * mean {
            return None;
        }

        let ratio = max / mean;
        let reasoning = build_reasoning(points, ctx.reasoning_enabled);
        let subject = headline(&ranked_entities(points, 2), 2);

        let signal = cluster_signal(SignalType::VolumeSpike, points, reasoning)
            .title(format!("Volume spike: {}", subject))
            .description("Data point volume in one period far exceeds the typical period")
            .confidence((ratio / RATIO_SCALE).min(1.0))
            .strength_factor(ratio)
            .build();

        Some(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::fixtures::base_time;
    use sigwatch_core::SourceType;

    fn at(base: DateTime<Utc>, minutes: i64) -> DataPoint {
        let ts = base + Duration::minutes(minutes);
        DataPoint::new(SourceType::Market, "Unusual trading volume", ts)
            .with_entities(["ACME", "NYSE"])
            .with_relevance(0.7)
    }

    #[test]
    fn test_bucket_counts() {
        // bucket width measured from the bucket's first point
        let base = base_time();
        let points: Vec<_> = [0, 30, 60, 61, 100, 200].iter().map(|m| at(base, *m)).collect();
        assert_eq!(bucket_counts(&points), vec![3, 2, 1]);
    }

    #[test]
    fn test_spike_detected() {
        // four quiet hours then twenty points in ten minutes
        let base = base_time();
        let mut points: Vec<_> = [0, 90, 180, 270].iter().map(|m| at(base, *m)).collect();
        points.extend((0..20).map(|i| at(base, 400 + i / 2)));

        let signal = VolumeSpikeDetector
            .detect(&points, &DetectionContext::default())
            .unwrap();

        // 5 buckets, mean 24 / 5 = 4.8, max 20
        assert!((signal.confidence - (20.0 / 4.8) / 5.0).abs() < 1e-9);
        assert_eq!(signal.signal_type, SignalType::VolumeSpike);
        assert!(signal.title.contains("ACME"));
    }

    #[test]
    fn test_even_volume_ignored() {
        let base = base_time();
        let points: Vec<_> = (0..10).map(|i| at(base, i * 90)).collect();
        assert!(VolumeSpikeDetector
            .detect(&points, &DetectionContext::default())
            .is_none());
    }

    #[test]
    fn test_needs_three_buckets() {
        let base = base_time();
        let points: Vec<_> = (0..10).map(|i| at(base, i * 5)).collect();
        assert_eq!(bucket_counts(&points).len(), 1);
        assert!(VolumeSpikeDetector
            .detect(&points, &DetectionContext::default())
            .is_none());
    }
}
