//! Signal detector
//!
//! Owns the long-lived detection state:
//! - Active signals from every run, keyed by id
//! - One evolution history per accepted signal
//! - The scorer and its novelty history
//! - An ordered list of detection callbacks
//!
//! Whole runs are serialized by a run lock. Callbacks execute inside the run
//! with the state lock released, so they may query the detector but must not
//! start another run.

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use sigwatch_core::{
    AggregationConfig, DataPoint, EvolutionSnapshot, ScoringWeights, ScoringWeightsUpdate, Signal,
    SignalEvolution, SignalScore, SignalType, MIN_ACCEPTED_SCORE,
};
use sigwatch_detectors::{cluster_points, detect_cluster, DetectionContext};
use sigwatch_sources::DataAggregator;

use crate::{DetectionConfig, DetectionConfigUpdate, SignalScorer};

/// Handler invoked for every accepted signal
pub type SignalCallback = Arc<dyn Fn(&Signal) -> anyhow::Result<()> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    pub direction: TrendDirection,
    /// Recorded velocity of the signal, in points per hour
    pub change_rate: f64,
}

/// An active signal ranked by score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendingSignal {
    pub signal: Signal,
    pub score: SignalScore,
    pub trend: Trend,
}

/// Detector statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectorStats {
    pub active_signals: usize,
    pub signals_by_type: BTreeMap<SignalType, usize>,
    pub tracked_evolutions: usize,
    pub callbacks: usize,
}

#[derive(Default)]
struct DetectorState {
    active_signals: Vec<Signal>,
    index: HashMap<Uuid, usize>,
    evolutions: HashMap<Uuid, SignalEvolution>,
    scorer: SignalScorer,
}

impl DetectorState {
    fn insert(&mut self, signal: Signal) {
        match self.index.get(&signal.id) {
            Some(&slot) => self.active_signals[slot] = signal,
            None => {
                self.index.insert(signal.id, self.active_signals.len());
                self.active_signals.push(signal);
            }
        }
    }

    fn record_evolution(&mut self, signal: &Signal) {
        self.evolutions
            .entry(signal.id)
            .or_insert_with(|| SignalEvolution::new(signal.id))
            .record(EvolutionSnapshot::of(signal));
    }
}

/// The signal detection service
pub struct SignalDetector {
    aggregator: Arc<DataAggregator>,
    config: RwLock<DetectionConfig>,
    state: Mutex<DetectorState>,
    run_lock: Mutex<()>,
    callbacks: RwLock<Vec<SignalCallback>>,
}

impl SignalDetector {
    pub fn new(aggregator: Arc<DataAggregator>, config: DetectionConfig) -> Self {
        Self {
            aggregator,
            config: RwLock::new(config),
            state: Mutex::new(DetectorState::default()),
            run_lock: Mutex::new(()),
            callbacks: RwLock::new(Vec::new()),
        }
    }

    pub fn with_scoring_weights(self, weights: ScoringWeights) -> Self {
        self.state.lock().scorer = SignalScorer::with_weights(weights);
        self
    }

    pub fn aggregator(&self) -> &Arc<DataAggregator> {
        &self.aggregator
    }

    /// Detect signals in the given points, in cluster then signal-type order
    pub fn detect_signals(&self, points: &[DataPoint]) -> Vec<Signal> {
        let _run = self.run_lock.lock();
        let config = self.config.read().clone();

        if points.len() < config.min_evidence_points {
            debug!(
                "Only {} points, need {} to detect",
                points.len(),
                config.min_evidence_points
            );
            return Vec::new();
        }

        let ctx = DetectionContext {
            min_evidence_points: config.min_evidence_points,
            reasoning_enabled: config.enable_reasoning,
        };

        let clusters = cluster_points(points, config.min_evidence_points);
        info!(
            "Formed {} clusters from {} data points",
            clusters.len(),
            points.len()
        );

        let mut accepted: Vec<Signal> = Vec::new();

        'clusters: for cluster in &clusters {
            for &signal_type in &config.signal_types {
                if accepted.len() >= config.max_signals_per_run {
                    info!(
                        "Reached {} signals for this run, skipping the rest",
                        config.max_signals_per_run
                    );
                    break 'clusters;
                }

                let Some(candidate) = detect_cluster(signal_type, cluster, &ctx) else {
                    continue;
                };

                if candidate.confidence < config.confidence_threshold
                    || candidate.relevance < config.relevance_threshold
                {
                    debug!(
                        "{} rejected: confidence {:.2}, relevance {:.2}",
                        signal_type, candidate.confidence, candidate.relevance
                    );
                    continue;
                }

                {
                    let mut state = self.state.lock();
                    let score = state.scorer.calculate_score(&candidate, cluster);
                    if score.overall_score < MIN_ACCEPTED_SCORE {
                        debug!("{} rejected: score {:.2}", signal_type, score.overall_score);
                        continue;
                    }
                    state.scorer.add_to_history(&candidate);
                    state.record_evolution(&candidate);
                }

                info!(
                    "Detected {} '{}' (confidence {:.2})",
                    signal_type, candidate.title, candidate.confidence
                );
                self.notify(&candidate);
                accepted.push(candidate);
            }
        }

        let mut state = self.state.lock();
        for signal in &accepted {
            state.insert(signal.clone());
        }

        accepted
    }

    /// Aggregate through the owned aggregator, then detect
    pub async fn detect_from_sources(&self, request: &AggregationConfig) -> Vec<Signal> {
        let points = self.aggregator.aggregate(request).await;
        self.detect_signals(&points)
    }

    fn notify(&self, signal: &Signal) {
        let callbacks: Vec<SignalCallback> = self.callbacks.read().clone();
        for (i, callback) in callbacks.iter().enumerate() {
            if let Err(e) = callback(signal) {
                warn!("Signal callback {} failed for {}: {:#}", i, signal.id, e);
            }
        }
    }

    /// Register a handler for accepted signals; handlers run in registration order
    pub fn on_signal_detected<F>(&self, callback: F)
    where
        F: Fn(&Signal) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.callbacks.write().push(Arc::new(callback));
    }

    pub fn get_active_signals(&self) -> Vec<Signal> {
        self.state.lock().active_signals.clone()
    }

    pub fn get_signal(&self, id: Uuid) -> Option<Signal> {
        let state = self.state.lock();
        state
            .index
            .get(&id)
            .map(|&slot| state.active_signals[slot].clone())
    }

    pub fn get_signal_evolution(&self, id: Uuid) -> Option<SignalEvolution> {
        self.state.lock().evolutions.get(&id).cloned()
    }

    /// Active signals ranked by score, highest first
    ///
    /// Signals are scored without their cluster, so the velocity and
    /// consistency components take their neutral values.
    pub fn get_trending_signals(&self, limit: usize) -> Vec<TrendingSignal> {
        let state = self.state.lock();

        let mut ranked: Vec<TrendingSignal> = state
            .active_signals
            .iter()
            .map(|signal| TrendingSignal {
                score: state.scorer.calculate_score(signal, &[]),
                trend: Trend {
                    direction: TrendDirection::Rising,
                    change_rate: signal.metadata.velocity,
                },
                signal: signal.clone(),
            })
            .collect();

        ranked.sort_by(|a, b| b.score.overall_score.total_cmp(&a.score.overall_score));
        ranked.truncate(limit);
        ranked
    }

    pub fn update_config(&self, update: DetectionConfigUpdate) -> DetectionConfig {
        let mut config = self.config.write();
        config.apply(update);
        info!("Detection config updated");
        config.clone()
    }

    pub fn get_config(&self) -> DetectionConfig {
        self.config.read().clone()
    }

    pub fn update_scoring_weights(&self, update: &ScoringWeightsUpdate) -> ScoringWeights {
        self.state.lock().scorer.update_weights(update)
    }

    pub fn scoring_weights(&self) -> ScoringWeights {
        self.state.lock().scorer.weights()
    }

    /// Drop active signals and their evolution; novelty history is kept
    pub fn clear_signals(&self) {
        let mut state = self.state.lock();
        state.active_signals.clear();
        state.index.clear();
        state.evolutions.clear();
    }

    pub fn statistics(&self) -> DetectorStats {
        let state = self.state.lock();
        let mut signals_by_type = BTreeMap::new();
        for signal in &state.active_signals {
            *signals_by_type.entry(signal.signal_type).or_insert(0) += 1;
        }

        DetectorStats {
            active_signals: state.active_signals.len(),
            signals_by_type,
            tracked_evolutions: state.evolutions.len(),
            callbacks: self.callbacks.read().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use sigwatch_core::{SourceConfiguration, SourceType, TimeWindow};
    use sigwatch_sources::MemorySource;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SOURCES: [SourceType; 4] = [
        SourceType::Social,
        SourceType::News,
        SourceType::Forum,
        SourceType::Market,
    ];

    /// `count` points over `span_minutes` ending a little before now
    fn points(
        count: usize,
        span_minutes: i64,
        entities: &[&str],
        content: &str,
    ) -> Vec<DataPoint> {
        let start = Utc::now() - Duration::minutes(span_minutes + 10);
        let step = span_minutes * 60 / (count as i64 - 1).max(1);
        (0..count)
            .map(|i| {
                DataPoint::new(
                    SOURCES[i % SOURCES.len()],
                    content,
                    start + Duration::seconds(step * i as i64),
                )
                .with_entities(entities.iter().copied())
            })
            .collect()
    }

    /// Twenty points in one hour about AI, positive and relevant
    fn ai_cluster() -> Vec<DataPoint> {
        points(
            20,
            60,
            &["AI", "tech"],
            "Generative models reshape enterprise software; generative tooling spreads",
        )
        .into_iter()
        .map(|p| p.with_sentiment(0.7).with_relevance(0.8))
        .collect()
    }

    fn detector() -> SignalDetector {
        SignalDetector::new(Arc::new(DataAggregator::new()), DetectionConfig::default())
    }

    #[test]
    fn test_emerging_trend_detected() {
        let detector = detector();
        let signals = detector.detect_signals(&ai_cluster());

        let trend = signals
            .iter()
            .find(|s| s.signal_type == SignalType::EmergingTrend)
            .unwrap();
        assert!(trend.confidence >= 0.6);

        for signal in &signals {
            assert!((0.0..=1.0).contains(&signal.confidence));
            assert!((0.0..=1.0).contains(&signal.relevance));
        }
        assert_eq!(detector.get_active_signals().len(), signals.len());
        assert!(detector.get_signal(trend.id).is_some());
        assert_eq!(
            detector.get_signal_evolution(trend.id).unwrap().snapshots.len(),
            1
        );
    }

    #[test]
    fn test_sentiment_shift_detected() {
        let cluster: Vec<_> = points(10, 300, &["Acme", "recall"], "Acme recall announced")
            .into_iter()
            .enumerate()
            .map(|(i, p)| {
                let sentiment = if i < 5 { -0.5 } else { 0.6 };
                p.with_sentiment(sentiment).with_relevance(0.8)
            })
            .collect();

        let detector = detector();
        let signals = detector.detect_signals(&cluster);

        let shift = signals
            .iter()
            .find(|s| s.signal_type == SignalType::SentimentShift)
            .unwrap();
        assert_eq!(shift.confidence, 1.0);
    }

    #[test]
    fn test_too_few_points() {
        let detector = detector();
        assert!(detector.detect_signals(&ai_cluster()[..4]).is_empty());
    }

    #[test]
    fn test_undersized_cluster_yields_nothing() {
        // 20 points, but no point shares two entities with any other
        let mut cluster = ai_cluster();
        for (i, p) in cluster.iter_mut().enumerate() {
            p.entities = vec![format!("E{}", i), "shared".to_string()];
        }

        assert!(detector().detect_signals(&cluster).is_empty());
    }

    #[test]
    fn test_signal_cap() {
        let detector = detector();
        detector.update_config(DetectionConfigUpdate {
            max_signals_per_run: Some(1),
            ..Default::default()
        });

        let signals = detector.detect_signals(&ai_cluster());
        assert_eq!(signals.len(), 1);
        // first configured type wins under the cap
        assert_eq!(signals[0].signal_type, SignalType::EmergingTrend);

        detector.update_config(DetectionConfigUpdate {
            max_signals_per_run: Some(0),
            ..Default::default()
        });
        assert!(detector.detect_signals(&ai_cluster()).is_empty());
    }

    #[test]
    fn test_signal_type_order_and_filter() {
        let detector = detector();
        detector.update_config(DetectionConfigUpdate {
            signal_types: Some(vec![SignalType::Correlation, SignalType::PatternDetected]),
            ..Default::default()
        });

        let types: Vec<_> = detector
            .detect_signals(&ai_cluster())
            .iter()
            .map(|s| s.signal_type)
            .collect();
        assert_eq!(types, vec![SignalType::Correlation, SignalType::PatternDetected]);
    }

    #[test]
    fn test_deterministic_for_fixed_input() {
        let input = ai_cluster();
        let a: Vec<_> = detector()
            .detect_signals(&input)
            .into_iter()
            .map(|s| (s.signal_type, s.confidence, s.evidence))
            .collect();
        let b: Vec<_> = detector()
            .detect_signals(&input)
            .into_iter()
            .map(|s| (s.signal_type, s.confidence, s.evidence))
            .collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_thresholds_gate_candidates() {
        let detector = detector();
        detector.update_config(DetectionConfigUpdate {
            relevance_threshold: Some(0.9),
            ..Default::default()
        });
        assert!(detector.detect_signals(&ai_cluster()).is_empty());
    }

    #[test]
    fn test_low_score_rejects_candidates_that_pass_thresholds() {
        // one source type, scored on diversity alone: 1/6 + 0.3 < 0.5
        let cluster: Vec<_> = ai_cluster()
            .into_iter()
            .map(|mut p| {
                p.source_type = SourceType::News;
                p
            })
            .collect();
        let types = vec![SignalType::PatternDetected, SignalType::Correlation];

        let detector = detector().with_scoring_weights(ScoringWeights {
            confidence: 0.0,
            relevance: 0.0,
            novelty: 0.0,
            diversity: 1.0,
            velocity: 0.0,
            consistency: 0.0,
        });
        detector.update_config(DetectionConfigUpdate {
            signal_types: Some(types.clone()),
            ..Default::default()
        });

        let config = detector.get_config();
        let ctx = DetectionContext::default();
        for &signal_type in &types {
            let candidate = detect_cluster(signal_type, &cluster, &ctx).unwrap();
            assert!(candidate.confidence >= config.confidence_threshold);
            assert!(candidate.relevance >= config.relevance_threshold);
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        detector.on_signal_detected(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert!(detector.detect_signals(&cluster).is_empty());

        let stats = detector.statistics();
        assert_eq!(stats.active_signals, 0);
        assert_eq!(stats.tracked_evolutions, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        let state = detector.state.lock();
        for &signal_type in &types {
            assert_eq!(state.scorer.history_len(signal_type), 0);
        }
    }

    #[test]
    fn test_callbacks_run_in_order_and_failures_do_not_abort() {
        let detector = detector();
        let calls = Arc::new(AtomicUsize::new(0));

        detector.on_signal_detected(|_| Err(anyhow::anyhow!("downstream unavailable")));
        let counter = calls.clone();
        detector.on_signal_detected(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let signals = detector.detect_signals(&ai_cluster());
        assert!(!signals.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), signals.len());
        assert_eq!(detector.statistics().callbacks, 2);
    }

    #[test]
    fn test_callback_can_query_detector() {
        let detector = Arc::new(detector());
        let seen = Arc::new(AtomicUsize::new(0));

        let weak = Arc::downgrade(&detector);
        let counter = seen.clone();
        detector.on_signal_detected(move |_| {
            if let Some(d) = weak.upgrade() {
                counter.fetch_add(d.get_active_signals().len() + 1, Ordering::SeqCst);
            }
            Ok(())
        });

        let signals = detector.detect_signals(&ai_cluster());
        // signals from the current run are merged after it completes
        assert_eq!(seen.load(Ordering::SeqCst), signals.len());
    }

    #[test]
    fn test_trending_signals() {
        let detector = detector();
        let signals = detector.detect_signals(&ai_cluster());
        assert!(signals.len() >= 2);

        let trending = detector.get_trending_signals(2);
        assert_eq!(trending.len(), 2);
        assert!(trending[0].score.overall_score >= trending[1].score.overall_score);
        assert_eq!(trending[0].trend.direction, TrendDirection::Rising);
        assert_eq!(trending[0].trend.change_rate, trending[0].signal.metadata.velocity);
        assert_eq!(trending[0].score.components.velocity, 0.5);
    }

    #[test]
    fn test_runs_accumulate_without_dedup() {
        let detector = detector();
        let first = detector.detect_signals(&ai_cluster()).len();
        let second = detector.detect_signals(&ai_cluster()).len();

        assert_eq!(detector.get_active_signals().len(), first + second);
        let stats = detector.statistics();
        assert_eq!(stats.active_signals, first + second);
        assert_eq!(stats.tracked_evolutions, first + second);

        detector.clear_signals();
        assert!(detector.get_active_signals().is_empty());
        assert_eq!(detector.statistics().tracked_evolutions, 0);
    }

    #[test]
    fn test_scoring_weights_forwarded() {
        let detector = detector().with_scoring_weights(ScoringWeights {
            novelty: 0.0,
            ..Default::default()
        });
        assert!((detector.scoring_weights().sum() - 1.0).abs() < 1e-9);
        assert_eq!(detector.scoring_weights().novelty, 0.0);

        let weights = detector.update_scoring_weights(&ScoringWeightsUpdate {
            novelty: Some(0.15),
            ..Default::default()
        });
        assert!((weights.sum() - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_detect_from_sources() {
        let aggregator = Arc::new(DataAggregator::new());
        let cluster = ai_cluster();
        for source_type in SOURCES {
            let own: Vec<_> = cluster
                .iter()
                .filter(|p| p.source_type == source_type)
                .cloned()
                .collect();
            aggregator.register_source(
                Arc::new(MemorySource::new(source_type.as_str(), own)),
                SourceConfiguration::new(source_type),
            );
        }

        let detector = SignalDetector::new(aggregator, DetectionConfig::default());
        let request = AggregationConfig::new(SOURCES.to_vec(), TimeWindow::last_hours(3));
        let signals = detector.detect_from_sources(&request).await;

        assert!(signals
            .iter()
            .any(|s| s.signal_type == SignalType::EmergingTrend));
    }
}
