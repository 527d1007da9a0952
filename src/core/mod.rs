//! Core Module - Scoring Pipeline & Registry
//!
//! Aggregation, publication, the canonical risk registry and the versioned
//! scoring rules they all read from.

pub mod aggregator;
pub mod publish;
pub mod registry;
pub mod rules;

pub use aggregator::*;
pub use publish::*;
pub use registry::*;
