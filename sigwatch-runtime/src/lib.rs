//! sigwatch runtime
//!
//! The long-lived services of the engine:
//! - `SignalDetector`: clusters, detects, gates, tracks evolution, notifies
//! - `SignalScorer`: six-component weighted scoring with novelty history
//! - `SigwatchConfig`: TOML configuration for detection, scoring and sources

pub mod config;
pub mod scorer;
pub mod detector;

pub use config::*;
pub use scorer::*;
pub use detector::*;
