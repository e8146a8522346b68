//! sigwatch sources
//!
//! Gathers data points from pluggable sources:
//! - The `DataSource` capability and its error type
//! - An in-memory source and an HTTP/JSON feed source
//! - The caching, throttling, partial-failure tolerant aggregator

pub mod source;
pub mod client;
pub mod memory;
pub mod feed;
pub mod aggregator;

pub use source::*;
pub use client::*;
pub use memory::*;
pub use feed::*;
pub use aggregator::*;
