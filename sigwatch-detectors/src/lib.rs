//! sigwatch detectors
//!
//! Turns data points into candidate signals:
//! - Greedy seed clustering on shared entities
//! - The shared reasoning trace
//! - One algorithm per signal type (trend, sentiment shift, volume spike,
//!   recurring pattern, relevance anomaly, entity correlation)

pub mod traits;
pub mod cluster;
pub mod reasoning;
pub mod trend;
pub mod sentiment;
pub mod volume;
pub mod pattern;
pub mod anomaly;
pub mod correlation;

pub use traits::*;
pub use cluster::*;
pub use reasoning::*;
pub use trend::*;
pub use sentiment::*;
pub use volume::*;
pub use pattern::*;
pub use anomaly::*;
pub use correlation::*;
