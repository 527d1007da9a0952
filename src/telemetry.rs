//! Telemetry Module for Token Sentry
//!
//! Thread-safe counters over the scan/publish pipeline, feeding the /stats
//! endpoint. Counters only; token addresses are never recorded here.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::models::types::{AggregateReport, RiskLevel};

/// Aggregated pipeline statistics
#[derive(Debug, Default)]
pub struct ScanStats {
    scans_total: AtomicU64,
    scans_degraded: AtomicU64,
    publishes_ok: AtomicU64,
    publish_failures: AtomicU64,
    critical_reports: AtomicU64,
    high_reports: AtomicU64,
    total_scan_ms: AtomicU64,
}

/// Serializable snapshot for the stats endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub scans_total: u64,
    pub scans_degraded: u64,
    pub publishes_ok: u64,
    pub publish_failures: u64,
    pub critical_reports: u64,
    pub high_reports: u64,
    pub avg_scan_ms: u64,
}

impl ScanStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_scan(&self, report: &AggregateReport) {
        self.scans_total.fetch_add(1, Ordering::Relaxed);
        self.total_scan_ms.fetch_add(
            (report.scan_duration_seconds * 1000.0) as u64,
            Ordering::Relaxed,
        );
        if report
            .findings
            .iter()
            .any(|f| f.name.ends_with("_degraded"))
        {
            self.scans_degraded.fetch_add(1, Ordering::Relaxed);
        }
        match report.risk_level {
            RiskLevel::Critical => {
                self.critical_reports.fetch_add(1, Ordering::Relaxed);
            }
            RiskLevel::High => {
                self.high_reports.fetch_add(1, Ordering::Relaxed);
            }
            _ => {}
        }
    }

    pub fn record_publish(&self, published: bool) {
        if published {
            self.publishes_ok.fetch_add(1, Ordering::Relaxed);
        } else {
            self.publish_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let scans = self.scans_total.load(Ordering::Relaxed);
        let total_ms = self.total_scan_ms.load(Ordering::Relaxed);
        StatsSnapshot {
            scans_total: scans,
            scans_degraded: self.scans_degraded.load(Ordering::Relaxed),
            publishes_ok: self.publishes_ok.load(Ordering::Relaxed),
            publish_failures: self.publish_failures.load(Ordering::Relaxed),
            critical_reports: self.critical_reports.load(Ordering::Relaxed),
            high_reports: self.high_reports.load(Ordering::Relaxed),
            avg_scan_ms: if scans > 0 { total_ms / scans } else { 0 },
        }
    }
}
