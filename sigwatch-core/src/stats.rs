//! Descriptive statistics over data points
//!
//! Shared by the per-type detectors, the reasoning trace and the scorer.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};

use crate::{DataPoint, SourceType};

/// Spans shorter than one minute are treated as one minute when dividing
pub const MIN_ELAPSED_HOURS: f64 = 1.0 / 60.0;

/// Relevance assumed when no point carries a relevance score
pub const DEFAULT_RELEVANCE: f64 = 0.5;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population variance
pub fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> f64 {
    variance(values).sqrt()
}

/// Hours between the earliest and latest timestamp, floored at one minute
pub fn elapsed_hours(timestamps: &[DateTime<Utc>]) -> f64 {
    let (Some(start), Some(end)) = (timestamps.iter().min(), timestamps.iter().max()) else {
        return MIN_ELAPSED_HOURS;
    };
    let hours = (*end - *start).num_milliseconds() as f64 / 3_600_000.0;
    hours.max(MIN_ELAPSED_HOURS)
}

/// Points per hour over the span the timestamps cover
pub fn rate_per_hour(timestamps: &[DateTime<Utc>]) -> f64 {
    if timestamps.is_empty() {
        return 0.0;
    }
    timestamps.len() as f64 / elapsed_hours(timestamps)
}

/// Points per hour across the cluster's time span
pub fn velocity(points: &[DataPoint]) -> f64 {
    let timestamps: Vec<_> = points.iter().map(|p| p.timestamp).collect();
    rate_per_hour(&timestamps)
}

/// Second-half velocity minus first-half velocity, 0 below four points
pub fn momentum(points: &[DataPoint]) -> f64 {
    if points.len() < 4 {
        return 0.0;
    }
    let mut timestamps: Vec<_> = points.iter().map(|p| p.timestamp).collect();
    timestamps.sort();

    let (early, late) = timestamps.split_at(timestamps.len() / 2);
    rate_per_hour(late) - rate_per_hour(early)
}

/// Points ordered by timestamp; ties keep input order
pub fn sorted_by_time(points: &[DataPoint]) -> Vec<&DataPoint> {
    let mut sorted: Vec<&DataPoint> = points.iter().collect();
    sorted.sort_by_key(|p| p.timestamp);
    sorted
}

/// Point count per source type
pub fn source_distribution(points: &[DataPoint]) -> BTreeMap<SourceType, usize> {
    let mut distribution = BTreeMap::new();
    for point in points {
        *distribution.entry(point.source_type).or_insert(0) += 1;
    }
    distribution
}

/// Entity occurrence counts in first-occurrence order
pub fn entity_frequencies(points: &[DataPoint]) -> Vec<(String, usize)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();

    for entity in points.iter().flat_map(|p| p.entities.iter()) {
        match index.get(entity.as_str()) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(entity.as_str(), counts.len());
                counts.push((entity.clone(), 1));
            }
        }
    }

    counts
}

/// The most frequent entity; the first one seen wins ties
pub fn most_frequent_entity(points: &[DataPoint]) -> Option<(String, usize)> {
    entity_frequencies(points)
        .into_iter()
        .fold(None, |best, (entity, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((entity, count)),
        })
}

/// Share of points mentioning the dominant entity, capped at 1
pub fn entity_coherence(points: &[DataPoint]) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let top = most_frequent_entity(points).map(|(_, c)| c).unwrap_or(0);
    (top as f64 / points.len() as f64).min(1.0)
}

/// Mean relevance of the points that carry a relevance score
pub fn average_relevance(points: &[DataPoint]) -> f64 {
    let scores: Vec<f64> = points.iter().filter_map(|p| p.relevance_score).collect();
    if scores.is_empty() {
        DEFAULT_RELEVANCE
    } else {
        mean(&scores).clamp(0.0, 1.0)
    }
}

/// Sentiment values present on the points
pub fn sentiments(points: &[DataPoint]) -> Vec<f64> {
    points.iter().filter_map(|p| p.sentiment).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn points_every(minutes: i64, count: usize) -> Vec<DataPoint> {
        let start = Utc::now() - Duration::hours(12);
        (0..count)
            .map(|i| {
                DataPoint::new(
                    SourceType::News,
                    "item",
                    start + Duration::minutes(minutes * i as i64),
                )
            })
            .collect()
    }

    #[test]
    fn test_mean_and_std_dev() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values) - 5.0).abs() < 1e-12);
        assert!((std_dev(&values) - 2.0).abs() < 1e-12);
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_velocity() {
        // 7 points over 6 hours
        let points = points_every(60, 7);
        assert!((velocity(&points) - 7.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_velocity_zero_span_uses_floor() {
        let now = Utc::now();
        let points = vec![
            DataPoint::new(SourceType::News, "a", now),
            DataPoint::new(SourceType::News, "b", now),
        ];
        assert!((velocity(&points) - 2.0 / MIN_ELAPSED_HOURS).abs() < 1e-9);
    }

    #[test]
    fn test_momentum() {
        assert_eq!(momentum(&points_every(10, 3)), 0.0);

        // Early half sparse, late half dense
        let start = Utc::now() - Duration::hours(10);
        let offsets = [0, 120, 240, 360, 370, 380, 390, 400];
        let points: Vec<_> = offsets
            .iter()
            .map(|m| DataPoint::new(SourceType::Social, "x", start + Duration::minutes(*m)))
            .collect();
        assert!(momentum(&points) > 0.0);
    }

    #[test]
    fn test_most_frequent_entity_first_wins_ties() {
        let now = Utc::now();
        let points = vec![
            DataPoint::new(SourceType::News, "a", now).with_entities(["Acme", "Globex"]),
            DataPoint::new(SourceType::News, "b", now).with_entities(["Globex", "Acme"]),
        ];
        assert_eq!(most_frequent_entity(&points), Some(("Acme".to_string(), 2)));
        assert!((entity_coherence(&points) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_average_relevance_default() {
        let now = Utc::now();
        let points = vec![DataPoint::new(SourceType::News, "a", now)];
        assert_eq!(average_relevance(&points), DEFAULT_RELEVANCE);

        let points = vec![
            DataPoint::new(SourceType::News, "a", now).with_relevance(0.6),
            DataPoint::new(SourceType::News, "b", now).with_relevance(0.8),
        ];
        assert!((average_relevance(&points) - 0.7).abs() < 1e-12);
    }
}
