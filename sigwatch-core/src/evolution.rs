//! Signal evolution tracking
//!
//! Each acceptance of a signal appends a snapshot. The last three snapshots
//! drive the trajectory; the latest confidence and the trajectory drive health.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

use crate::{Signal, SignalStrength, MAX_EVOLUTION_SNAPSHOTS};

/// Snapshots needed before a trajectory is classified
const TRAJECTORY_WINDOW: usize = 3;

/// Confidence below which a signal is considered stale
const STALE_CONFIDENCE: f64 = 0.4;

/// Point-in-time view of a signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionSnapshot {
    pub timestamp: DateTime<Utc>,
    pub confidence: f64,
    pub relevance: f64,
    pub data_point_count: usize,
    pub strength: SignalStrength,
}

impl EvolutionSnapshot {
    pub fn of(signal: &Signal) -> Self {
        Self {
            timestamp: Utc::now(),
            confidence: signal.confidence,
            relevance: signal.relevance,
            data_point_count: signal.metadata.data_point_count,
            strength: signal.strength,
        }
    }
}

/// Direction of recent confidence changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trajectory {
    Growing,
    Declining,
    Stable,
    Volatile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degrading,
    Stale,
}

/// Bounded snapshot history of one signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvolution {
    pub signal_id: Uuid,
    pub snapshots: VecDeque<EvolutionSnapshot>,
    pub trajectory: Trajectory,
    pub health_status: HealthStatus,
}

impl SignalEvolution {
    pub fn new(signal_id: Uuid) -> Self {
        Self {
            signal_id,
            snapshots: VecDeque::new(),
            trajectory: Trajectory::Stable,
            health_status: HealthStatus::Healthy,
        }
    }

    /// Append a snapshot (oldest dropped past the cap) and reclassify
    pub fn record(&mut self, snapshot: EvolutionSnapshot) {
        self.snapshots.push_back(snapshot);
        while self.snapshots.len() > MAX_EVOLUTION_SNAPSHOTS {
            self.snapshots.pop_front();
        }
        self.trajectory = self.classify_trajectory();
        self.health_status = self.classify_health();
    }

    pub fn latest(&self) -> Option<&EvolutionSnapshot> {
        self.snapshots.back()
    }

    fn classify_trajectory(&self) -> Trajectory {
        if self.snapshots.len() < TRAJECTORY_WINDOW {
            return self.trajectory;
        }

        let recent: Vec<f64> = self
            .snapshots
            .iter()
            .skip(self.snapshots.len() - TRAJECTORY_WINDOW)
            .map(|s| s.confidence)
            .collect();
        let deltas: Vec<f64> = recent.windows(2).map(|w| w[1] - w[0]).collect();
        let avg_delta = crate::mean(&deltas);

        if avg_delta > 0.1 {
            Trajectory::Growing
        } else if avg_delta < -0.1 {
            Trajectory::Declining
        } else if avg_delta.abs() < 0.05 {
            Trajectory::Stable
        } else {
            Trajectory::Volatile
        }
    }

    fn classify_health(&self) -> HealthStatus {
        match self.latest() {
            Some(latest) if latest.confidence < STALE_CONFIDENCE => HealthStatus::Stale,
            _ if self.trajectory == Trajectory::Declining => HealthStatus::Degrading,
            _ => HealthStatus::Healthy,
        }
    }
}
