//! Signal scorer
//!
//! Combines six quality components, each clamped to [0, 1], with weights that
//! always sum to 1. Keeps a bounded per-type history of accepted signals for
//! novelty scoring.

use chrono::Utc;
use std::collections::{HashMap, HashSet, VecDeque};

use sigwatch_core::{
    entity_coherence, jaccard, mean, sentiments, std_dev, DataPoint, ScoreComponents,
    ScoringWeights, ScoringWeightsUpdate, Signal, SignalScore, SignalStrength, SignalType,
    SourceType, MAX_SCORER_HISTORY, MIN_ELAPSED_HOURS,
};

/// Keywords a past signal must share to count as similar
const MIN_SHARED_KEYWORDS: usize = 2;

/// Neutral value for components without enough data
const NEUTRAL: f64 = 0.5;

/// Points per hour treated as saturating
const VELOCITY_SCALE: f64 = 10.0;

pub struct SignalScorer {
    weights: ScoringWeights,
    history: HashMap<SignalType, VecDeque<Signal>>,
}

impl SignalScorer {
    pub fn new() -> Self {
        Self::with_weights(ScoringWeights::default())
    }

    pub fn with_weights(weights: ScoringWeights) -> Self {
        Self {
            weights: weights.normalized(),
            history: HashMap::new(),
        }
    }

    /// Score a signal against the cluster it was detected in
    pub fn calculate_score(&self, signal: &Signal, points: &[DataPoint]) -> SignalScore {
        let components = ScoreComponents {
            confidence: confidence_component(signal),
            relevance: relevance_component(signal),
            novelty: self.novelty_component(signal),
            diversity: diversity_component(signal),
            velocity: velocity_component(signal, points),
            consistency: consistency_component(points),
        };

        SignalScore {
            signal_id: signal.id,
            overall_score: components.weighted(&self.weights).clamp(0.0, 1.0),
            components,
            weights: self.weights,
            timestamp: Utc::now(),
        }
    }

    /// Remember an accepted signal for novelty; oldest dropped past the cap
    pub fn add_to_history(&mut self, signal: &Signal) {
        let history = self.history.entry(signal.signal_type).or_default();
        history.push_back(signal.clone());
        while history.len() > MAX_SCORER_HISTORY {
            history.pop_front();
        }
    }

    /// Merge and renormalize the weights, returning the result
    pub fn update_weights(&mut self, update: &ScoringWeightsUpdate) -> ScoringWeights {
        self.weights = self.weights.merged(update);
        self.weights
    }

    pub fn weights(&self) -> ScoringWeights {
        self.weights
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn history_len(&self, signal_type: SignalType) -> usize {
        self.history.get(&signal_type).map_or(0, VecDeque::len)
    }

    fn novelty_component(&self, signal: &Signal) -> f64 {
        let Some(history) = self.history.get(&signal.signal_type) else {
            return 1.0;
        };

        let keywords: HashSet<&str> = signal.keywords.iter().map(String::as_str).collect();
        let max_similarity = history
            .iter()
            .filter(|past| {
                past.keywords
                    .iter()
                    .filter(|k| keywords.contains(k.as_str()))
                    .count()
                    >= MIN_SHARED_KEYWORDS
            })
            .map(|past| similarity(signal, past))
            .fold(None, |max: Option<f64>, s| Some(max.map_or(s, |m| m.max(s))));

        match max_similarity {
            Some(s) => (1.0 - s).clamp(0.0, 1.0),
            None => 1.0,
        }
    }
}

impl Default for SignalScorer {
    fn default() -> Self {
        Self::new()
    }
}

fn similarity(a: &Signal, b: &Signal) -> f64 {
    let same_type = if a.signal_type == b.signal_type { 1.0 } else { 0.0 };
    0.4 * jaccard(&a.keywords, &b.keywords)
        + 0.4 * jaccard(&a.entities, &b.entities)
        + 0.2 * same_type
}

fn confidence_component(signal: &Signal) -> f64 {
    let mut score = signal.confidence;
    if signal.reasoning.logical_chain.len() > 3 {
        score *= 1.10;
    }
    if signal.reasoning.knowledge_graph_entities.len() > 5 {
        score *= 1.05;
    }
    score += 0.1 * (signal.evidence.len() as f64 / 20.0).min(1.0);
    score.clamp(0.0, 1.0)
}

fn relevance_component(signal: &Signal) -> f64 {
    let mut score = signal.relevance;

    let age = signal.age_hours(Utc::now());
    if age < 24.0 {
        score *= 1.10;
    } else if age > 72.0 {
        score *= 0.90;
    }

    match signal.strength {
        SignalStrength::VeryStrong => score *= 1.15,
        SignalStrength::Strong => score *= 1.08,
        _ => {}
    }
    score.clamp(0.0, 1.0)
}

fn diversity_component(signal: &Signal) -> f64 {
    let counts: Vec<f64> = signal
        .metadata
        .source_distribution
        .values()
        .map(|c| *c as f64)
        .collect();
    let avg = mean(&counts);
    if counts.is_empty() || avg <= 0.0 {
        return 0.0;
    }

    let coverage = counts.len() as f64 / SourceType::COUNT as f64;
    let balance = (0.3 - 0.3 * std_dev(&counts) / avg).max(0.0);
    (coverage + balance).clamp(0.0, 1.0)
}

fn velocity_component(signal: &Signal, points: &[DataPoint]) -> f64 {
    if points.len() < 2 {
        return NEUTRAL;
    }

    let hours = signal.metadata.time_span.hours().max(MIN_ELAPSED_HOURS);
    let observed = (points.len() as f64 / hours / VELOCITY_SCALE).min(1.0);

    let recorded = signal.metadata.velocity;
    let score = if recorded > 0.0 {
        (observed + (recorded / VELOCITY_SCALE).min(1.0)) / 2.0
    } else {
        observed
    };
    score.clamp(0.0, 1.0)
}

fn consistency_component(points: &[DataPoint]) -> f64 {
    if points.len() < 3 {
        return NEUTRAL;
    }

    let values = sentiments(points);
    let score = if values.is_empty() {
        entity_coherence(points)
    } else {
        1.0 - std_dev(&values)
    };
    score.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sigwatch_core::SignalMetadata;

    fn cluster(count: usize, sources: &[SourceType]) -> Vec<DataPoint> {
        let start = Utc::now() - Duration::hours(2);
        (0..count)
            .map(|i| {
                DataPoint::new(
                    sources[i % sources.len()],
                    "Lithium supply tightens",
                    start + Duration::minutes(6 * i as i64),
                )
                .with_entities(["Lithium", "Chile"])
                .with_sentiment(0.4)
            })
            .collect()
    }

    fn signal(signal_type: SignalType, keywords: &[&str], points: &[DataPoint]) -> Signal {
        Signal::builder(signal_type)
            .keywords(keywords.iter().map(|k| k.to_string()).collect())
            .entities(vec!["Lithium".into(), "Chile".into()])
            .confidence(0.7)
            .relevance(0.7)
            .strength_factor(0.7)
            .evidence_from(points)
            .metadata(SignalMetadata::from_points(points))
            .build()
    }

    #[test]
    fn test_novelty_drops_for_similar_history() {
        let points = cluster(10, &[SourceType::News]);
        let mut scorer = SignalScorer::new();

        let past = signal(SignalType::EmergingTrend, &["lithium", "supply", "mines"], &points);
        scorer.add_to_history(&past);

        let similar = signal(SignalType::EmergingTrend, &["lithium", "supply", "prices"], &points);
        let score = scorer.calculate_score(&similar, &points);
        assert!(score.components.novelty < 1.0);

        let unrelated = signal(SignalType::EmergingTrend, &["semiconductor", "fabs"], &points);
        let score = scorer.calculate_score(&unrelated, &points);
        assert!((score.components.novelty - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_novelty_history_is_per_type() {
        let points = cluster(10, &[SourceType::News]);
        let mut scorer = SignalScorer::new();
        scorer.add_to_history(&signal(SignalType::Correlation, &["lithium", "supply"], &points));

        let candidate = signal(SignalType::EmergingTrend, &["lithium", "supply"], &points);
        assert_eq!(scorer.calculate_score(&candidate, &points).components.novelty, 1.0);
    }

    #[test]
    fn test_history_is_bounded() {
        let points = cluster(5, &[SourceType::News]);
        let mut scorer = SignalScorer::new();
        for _ in 0..(MAX_SCORER_HISTORY + 20) {
            scorer.add_to_history(&signal(SignalType::Anomaly, &["x"], &points));
        }
        assert_eq!(scorer.history_len(SignalType::Anomaly), MAX_SCORER_HISTORY);
        scorer.clear_history();
        assert_eq!(scorer.history_len(SignalType::Anomaly), 0);
    }

    #[test]
    fn test_components_stay_in_range() {
        let points = cluster(21, &[SourceType::News, SourceType::Social, SourceType::Market]);
        let scorer = SignalScorer::new();
        let score = scorer.calculate_score(&signal(SignalType::VolumeSpike, &["a"], &points), &points);

        let c = score.components;
        for value in [c.confidence, c.relevance, c.novelty, c.diversity, c.velocity, c.consistency] {
            assert!((0.0..=1.0).contains(&value));
        }
        assert!((0.0..=1.0).contains(&score.overall_score));
        assert!((score.weights.sum() - 1.0).abs() < 1e-9);

        // balanced across 3 of 6 types
        assert!((c.diversity - 0.8).abs() < 1e-9);
        // constant sentiment
        assert!((c.consistency - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_cluster_uses_neutral_components() {
        let points = cluster(6, &[SourceType::News]);
        let scorer = SignalScorer::new();
        let score = scorer.calculate_score(&signal(SignalType::PatternDetected, &[], &points), &[]);

        assert_eq!(score.components.velocity, NEUTRAL);
        assert_eq!(score.components.consistency, NEUTRAL);
    }

    #[test]
    fn test_confidence_boosts() {
        let points = cluster(20, &[SourceType::News]);
        let scorer = SignalScorer::new();
        // no chain, 10 evidence: 0.7 + 0.1 * 0.5
        let score = scorer.calculate_score(&signal(SignalType::Anomaly, &[], &points), &points);
        assert!((score.components.confidence - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_update_weights() {
        let mut scorer = SignalScorer::new();
        let before = scorer.weights();
        let unchanged = scorer.update_weights(&ScoringWeightsUpdate::default());
        assert!((unchanged.confidence - before.confidence).abs() < 1e-9);

        let updated = scorer.update_weights(&ScoringWeightsUpdate {
            novelty: Some(0.85),
            ..Default::default()
        });
        assert!((updated.sum() - 1.0).abs() < 1e-9);
        assert!(updated.novelty > before.novelty);
        assert!((updated.confidence / updated.relevance - 0.25 / 0.20).abs() < 1e-9);
    }
}
