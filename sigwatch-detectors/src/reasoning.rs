//! Reasoning trace builder
//!
//! Explains a cluster with three confidence factors:
//! - source diversity: distinct source types over all known types
//! - temporal density: points per hour, capped at 1
//! - entity coherence: share of points mentioning the dominant entity
//!
//! The rules are declarative statements attached for readers; they are not
//! evaluated against the data.

use std::collections::BTreeSet;

use sigwatch_core::{
    distinct_entities, entity_coherence, mean, most_frequent_entity, velocity, ConfidenceFactors,
    DataPoint, ReasoningTrace, SourceType,
};

/// Rules attached to every enabled trace
pub const REASONING_RULES: [&str; 3] = [
    "IF independent sources report related content THEN credibility increases",
    "IF related content accelerates within a short window THEN a development is emerging",
    "IF the same entities recur across data points THEN they are likely connected",
];

/// Build the trace for a cluster; disabled reasoning yields the neutral block
pub fn build_reasoning(points: &[DataPoint], enabled: bool) -> ReasoningTrace {
    if !enabled || points.is_empty() {
        return ReasoningTrace::neutral();
    }

    let source_types: BTreeSet<SourceType> = points.iter().map(|p| p.source_type).collect();
    let diversity = source_types.len() as f64 / SourceType::COUNT as f64;
    let temporal = velocity(points).min(1.0);
    let coherence = entity_coherence(points);
    let overall = mean(&[diversity, temporal, coherence]);

    let mut inferences = Vec::new();
    if source_types.len() > 1 {
        inferences.push(format!(
            "Corroborated across {} source types",
            source_types.len()
        ));
    } else {
        inferences.push("Reported by a single source type".to_string());
    }
    if temporal >= 0.5 {
        inferences.push("Data points are densely packed in time".to_string());
    } else {
        inferences.push("Data points are sparse in time".to_string());
    }
    if let Some((entity, count)) = most_frequent_entity(points) {
        inferences.push(format!(
            "'{}' appears in {} of {} data points",
            entity,
            count,
            points.len()
        ));
    }

    let knowledge_graph_entities = distinct_entities(points);

    let logical_chain = vec![
        format!(
            "Observed {} data points from {} source types",
            points.len(),
            source_types.len()
        ),
        format!(
            "Grouped on shared entities: {}",
            knowledge_graph_entities
                .iter()
                .take(3)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        format!(
            "Source diversity {:.2}, temporal density {:.2}, entity coherence {:.2}",
            diversity, temporal, coherence
        ),
        format!("Applied {} domain rules", REASONING_RULES.len()),
        format!("Combined reasoning confidence {:.2}", overall),
    ];

    ReasoningTrace {
        rules: REASONING_RULES.iter().map(|r| r.to_string()).collect(),
        inferences,
        confidence_factors: ConfidenceFactors {
            overall,
            source_diversity: Some(diversity),
            temporal_density: Some(temporal),
            entity_coherence: Some(coherence),
        },
        knowledge_graph_entities,
        logical_chain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::fixtures::spread;

    #[test]
    fn test_disabled_is_neutral() {
        let points = spread(6, 60, &[SourceType::News], &["A", "B"], "text");
        let trace = build_reasoning(&points, false);
        assert_eq!(trace.overall(), 0.5);
        assert!(trace.rules.is_empty());
        assert!(trace.logical_chain.is_empty());
    }

    #[test]
    fn test_factors() {
        // 3 of 6 source types, 12 points over 4h, every point mentions A
        let points = spread(
            12,
            240,
            &[SourceType::News, SourceType::Social, SourceType::Filing],
            &["A", "B"],
            "text",
        );
        let trace = build_reasoning(&points, true);
        let factors = &trace.confidence_factors;

        assert!((factors.source_diversity.unwrap() - 0.5).abs() < 1e-9);
        assert!((factors.temporal_density.unwrap() - 1.0).abs() < 1e-9);
        assert!((factors.entity_coherence.unwrap() - 1.0).abs() < 1e-9);
        assert!((trace.overall() - 2.5 / 3.0).abs() < 1e-9);

        assert_eq!(trace.rules.len(), 3);
        assert_eq!(trace.logical_chain.len(), 5);
        assert_eq!(trace.knowledge_graph_entities, vec!["A", "B"]);
    }

    #[test]
    fn test_sparse_cluster_density() {
        // 5 points over 20h
        let points = spread(5, 20 * 60, &[SourceType::Patent], &["A", "B"], "text");
        let trace = build_reasoning(&points, true);
        assert!((trace.confidence_factors.temporal_density.unwrap() - 0.25).abs() < 1e-9);
        assert!(trace.inferences.iter().any(|i| i.contains("sparse")));
    }
}
