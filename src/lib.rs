//! Token Sentry Library
//!
//! Multi-detector token risk scoring with a canonical risk registry:
//! - Six independent heuristic detectors (bytecode selectors, source
//!   patterns, liquidity concentration, creator profile, flash-loan and MEV
//!   exposure) fanned out concurrently per scan
//! - Deterministic weighted aggregation into a five-band risk report
//! - Access-controlled, pausable registry storing one canonical record per
//!   token, backed by an append-only event log

pub mod api;
pub mod config;
pub mod core;
pub mod detectors;
pub mod identity;
pub mod models;
pub mod providers;
pub mod telemetry;

pub use crate::core::aggregator::RiskAggregator;
pub use crate::core::publish::{PublishOutcome, RiskPublisher};
pub use crate::core::registry::{
    AlertReason, RegistryConfig, RegistryEvent, RiskQuery, RiskRecord, RiskRegistry, ScoreUpdate,
};
pub use config::SentryConfig;
pub use detectors::Detector;
pub use identity::{IdentityRegistryClient, NullIdentityRegistry};
pub use models::errors::{AppError, AppResult, ErrorCode};
pub use models::types::{
    parse_token_address, AggregateReport, Category, CategoryScores, DetectionField, Finding,
    RiskLevel, Severity, SubReport,
};
pub use providers::{
    ChainDataProvider, CreatorStats, FileProvider, HolderBalance, StaticProvider, TokenContext,
    TransferRecord,
};
pub use telemetry::{ScanStats, StatsSnapshot};
