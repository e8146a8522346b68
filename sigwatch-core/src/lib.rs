//! sigwatch core - data points, signals and scoring primitives
//!
//! This crate provides the foundational types shared by every other crate:
//! - Data points and source configuration
//! - Typed signals with evidence, reasoning traces and metadata
//! - Score components and renormalized scoring weights
//! - Evolution snapshots with trajectory/health classification
//! - Statistics and keyword helpers used by detectors and the scorer

pub mod data;
pub mod signals;
pub mod scoring;
pub mod evolution;
pub mod stats;
pub mod keywords;

pub use data::*;
pub use signals::*;
pub use scoring::*;
pub use evolution::*;
pub use stats::*;
pub use keywords::*;

/// Lifetime of an aggregation cache entry in seconds
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Maximum evidence snippets attached to a signal
pub const MAX_EVIDENCE: usize = 10;

/// Maximum characters kept in an evidence excerpt
pub const EVIDENCE_EXCERPT_CHARS: usize = 200;

/// Maximum snapshots retained per signal evolution
pub const MAX_EVOLUTION_SNAPSHOTS: usize = 100;

/// Maximum signals retained per type in the scorer's novelty history
pub const MAX_SCORER_HISTORY: usize = 100;

/// Minimum overall score a candidate needs to be accepted
pub const MIN_ACCEPTED_SCORE: f64 = 0.5;
