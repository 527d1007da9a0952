//! Type definitions for Token Sentry
//! All core data structures for the detector pipeline and aggregate reports

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::models::errors::{AppError, AppResult};

/// Risk level classification for a scored token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    /// Registered but never scored
    Pending,
    /// Token appears safe
    Safe,
    /// Low risk - minor concerns
    Low,
    /// Medium risk - proceed with caution
    Medium,
    /// High risk - likely to lose funds
    High,
    /// Critical - almost certain loss (honeypot, rug setup, etc.)
    Critical,
}

impl RiskLevel {
    /// Band function over a 0-100 risk score.
    /// <=20 SAFE, <=40 LOW, <=60 MEDIUM, <=80 HIGH, else CRITICAL.
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=20 => RiskLevel::Safe,
            21..=40 => RiskLevel::Low,
            41..=60 => RiskLevel::Medium,
            61..=80 => RiskLevel::High,
            _ => RiskLevel::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Pending => "PENDING",
            RiskLevel::Safe => "SAFE",
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }
}

/// Severity of an individual detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Safe,
    Info,
    Warning,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Safe => "safe",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Critical => "critical",
        }
    }
}

/// The seven fixed detection categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Honeypot,
    RugPull,
    FlashLoan,
    Mev,
    Ownership,
    Tax,
    Liquidity,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Honeypot => "honeypot",
            Category::RugPull => "rug_pull",
            Category::FlashLoan => "flash_loan",
            Category::Mev => "mev",
            Category::Ownership => "ownership",
            Category::Tax => "tax",
            Category::Liquidity => "liquidity",
        }
    }
}

/// One canonical boolean security indicator.
/// Negative weights reduce risk (e.g. renounced ownership).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionField {
    pub key: String,
    pub detected: bool,
    pub severity: Severity,
    pub category: Category,
    pub weight: i32,
}

/// Human-readable finding attached to a report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub name: String,
    pub severity: Severity,
    pub detail: String,
}

impl Finding {
    pub fn new(name: impl Into<String>, severity: Severity, detail: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            severity,
            detail: detail.into(),
        }
    }
}

/// Result of a single detector run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubReport {
    pub token_address: Address,
    pub detector: String,
    /// 0-100 risk contribution of this detector
    pub score: u8,
    pub findings: Vec<Finding>,
    /// Sparse: only fields this detector actually evaluated
    pub fields: HashMap<String, DetectionField>,
}

impl SubReport {
    pub fn new(token_address: Address, detector: &str) -> Self {
        Self {
            token_address,
            detector: detector.to_string(),
            score: 0,
            findings: Vec::new(),
            fields: HashMap::new(),
        }
    }

    /// Neutral degraded report used when a detector's data source failed.
    /// Detectors are total functions: they degrade, they never propagate.
    pub fn degraded(token_address: Address, detector: &str, reason: &str) -> Self {
        let mut report = Self::new(token_address, detector);
        report.score = 50;
        report.findings.push(Finding::new(
            format!("{}_degraded", detector),
            Severity::Warning,
            format!("Data unavailable, neutral default substituted: {}", reason),
        ));
        report
    }

    pub fn push_field(&mut self, field: DetectionField) {
        self.fields.insert(field.key.clone(), field);
    }
}

/// Per-category scores of an aggregate report, all 0-100
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub honeypot: u8,
    pub rug_pull: u8,
    pub flash_loan: u8,
    pub mev: u8,
    pub ownership: u8,
    pub tax: u8,
    pub liquidity_health: u8,
    pub creator_risk: u8,
}

/// Combined output of the full detector pipeline for one token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateReport {
    pub token_address: Address,
    pub overall_risk: u8,
    pub risk_level: RiskLevel,
    pub categories: CategoryScores,
    pub verified: bool,
    pub is_proxy: bool,
    pub fields: HashMap<String, DetectionField>,
    pub findings: Vec<Finding>,
    pub scan_duration_seconds: f64,
    pub timestamp: i64,
}

/// Clamp an arbitrary accumulated weight into the 0-100 score range
pub fn clamp_score(raw: i64) -> u8 {
    raw.clamp(0, 100) as u8
}

/// Parse and validate a token address: "0x" prefix + 40 hex chars,
/// case-insensitive. Rejected before any detector runs.
pub fn parse_token_address(input: &str) -> AppResult<Address> {
    let trimmed = input.trim();
    if !trimmed.starts_with("0x") && !trimmed.starts_with("0X") {
        return Err(AppError::invalid_address(format!(
            "Address must carry a 0x prefix: {}",
            trimmed
        )));
    }
    Address::from_str(trimmed)
        .map_err(|_| AppError::invalid_address(format!("Malformed token address: {}", trimmed)))
}
