//! Entity correlation detection
//!
//! Counts unordered entity pairs co-occurring within a point (each pair at
//! most once per point). The most frequent pair, first seen on ties, must
//! co-occur in at least `min_evidence_points` points.

use std::collections::HashMap;

use sigwatch_core::{DataPoint, Signal, SignalType};

use crate::traits::cluster_signal;
use crate::{build_reasoning, DetectionContext, SignalAlgorithm};

/// Co-occurrence counts of entity pairs in first-seen order
pub fn pair_counts(points: &[DataPoint]) -> Vec<((String, String), usize)> {
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    let mut counts: Vec<((String, String), usize)> = Vec::new();

    for point in points {
        let mut entities: Vec<&String> = Vec::new();
        for entity in &point.entities {
            if !entities.contains(&entity) {
                entities.push(entity);
            }
        }

        for (i, a) in entities.iter().enumerate() {
            for b in &entities[i + 1..] {
                let pair = if a <= b {
                    ((*a).clone(), (*b).clone())
                } else {
                    ((*b).clone(), (*a).clone())
                };
                match index.get(&pair) {
                    Some(&slot) => counts[slot].1 += 1,
                    None => {
                        index.insert(pair.clone(), counts.len());
                        counts.push((pair, 1));
                    }
                }
            }
        }
    }

    counts
}

pub struct CorrelationDetector;

impl SignalAlgorithm for CorrelationDetector {
    fn signal_type(&self) -> SignalType {
        SignalType::Correlation
    }

    fn detect(&self, points: &[DataPoint], ctx: &DetectionContext) -> Option<Signal> {
        let ((a, b), count) = pair_counts(points)
            .into_iter()
            .fold(None, |best, (pair, count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((pair, count)),
            })?;
        if count < ctx.min_evidence_points {
            return None;
        }

        let ratio = (count as f64 / points.len() as f64).min(1.0);
        let reasoning = build_reasoning(points, ctx.reasoning_enabled);

        let signal = cluster_signal(SignalType::Correlation, points, reasoning)
            .title(format!("Correlation: {} and {}", a, b))
            .description("Two entities repeatedly appear together across data points")
            .confidence(ratio)
            .strength_factor(ratio)
            .build();

        Some(signal)
    }
}
