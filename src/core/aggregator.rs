//! Risk aggregator
//!
//! Fans out to every detector concurrently, waits for all of them to settle
//! (success or panic), merges their detection fields and combines the
//! sub-scores into one aggregate report. The combination is a pure function
//! of the sub-reports: no hidden state, no time dependence, no ordering
//! sensitivity.

use alloy_primitives::Address;
use futures_util::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::core::rules::{fields, RULES};
use crate::detectors::{
    self, creator, flashloan, liquidity, mev, selectors, source, Detector,
};
use crate::models::errors::{AppError, AppResult};
use crate::models::types::{
    clamp_score, AggregateReport, Category, CategoryScores, DetectionField, Finding, RiskLevel,
    SubReport,
};
use crate::providers::{ChainDataProvider, TokenContext};

pub struct RiskAggregator {
    provider: Arc<dyn ChainDataProvider>,
    detectors: Vec<Arc<dyn Detector>>,
}

impl RiskAggregator {
    pub fn new(provider: Arc<dyn ChainDataProvider>) -> Self {
        Self {
            provider,
            detectors: detectors::default_detectors(),
        }
    }

    /// Replace the detector set (tests, partial pipelines)
    pub fn with_detectors(
        provider: Arc<dyn ChainDataProvider>,
        detectors: Vec<Arc<dyn Detector>>,
    ) -> Self {
        Self {
            provider,
            detectors,
        }
    }

    /// Run every detector concurrently and combine the results.
    /// Upstream data failures degrade individual detectors; only a malformed
    /// request (zero address) is fatal.
    pub async fn aggregate(&self, token: Address) -> AppResult<AggregateReport> {
        if token == Address::ZERO {
            return Err(AppError::zero_address("token"));
        }
        let start = Instant::now();

        let ctx = match self.provider.fetch_context(token).await {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!("Context fetch failed for {}: {}; detectors degrade", token, e);
                TokenContext::empty(token)
            }
        };
        let ctx = Arc::new(ctx);

        // One task per detector; siblings are never cancelled on a failure
        let mut handles = Vec::with_capacity(self.detectors.len());
        for detector in &self.detectors {
            let detector = detector.clone();
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move {
                detector.analyze(ctx.token_address, &ctx).await
            }));
        }

        let joined = join_all(handles).await;
        let mut subs = Vec::with_capacity(joined.len());
        for (detector, outcome) in self.detectors.iter().zip(joined) {
            let sub = outcome.unwrap_or_else(|_| {
                warn!("Detector {} task died, substituting neutral", detector.name());
                SubReport::degraded(token, detector.name(), "detector task died")
            });
            debug!("{} scored {} for {}", sub.detector, sub.score, token);
            subs.push(sub);
        }

        let mut report = combine(token, &subs);
        report.scan_duration_seconds = start.elapsed().as_secs_f64();
        report.timestamp = chrono::Utc::now().timestamp();
        Ok(report)
    }
}

fn detector_score(subs: &[SubReport], name: &str) -> u8 {
    subs.iter()
        .find(|s| s.detector == name)
        .map(|s| s.score)
        .unwrap_or(50)
}

/// Sum of matched detection-field weights within a category, clamped to
/// [0,100]. Negative weights reduce, never below zero.
fn category_weight_sum(fields: &HashMap<String, DetectionField>, category: Category) -> u8 {
    clamp_score(
        fields
            .values()
            .filter(|f| f.detected && f.category == category)
            .map(|f| f.weight as i64)
            .sum(),
    )
}

fn mix2(a: u8, wa: f64, b: u8, wb: f64) -> u8 {
    clamp_score((wa * a as f64 + wb * b as f64).round() as i64)
}

/// Deterministic combination of the sub-reports. Duration and timestamp are
/// metadata stamped by the caller afterwards.
pub fn combine(token: Address, subs: &[SubReport]) -> AggregateReport {
    let mut merged: HashMap<String, DetectionField> = HashMap::new();
    let mut findings: Vec<Finding> = Vec::new();
    for sub in subs {
        for (key, field) in &sub.fields {
            // A detected entry wins over a sibling's undetected one
            match merged.get(key) {
                Some(existing) if existing.detected || !field.detected => {}
                _ => {
                    merged.insert(key.clone(), field.clone());
                }
            }
        }
        findings.extend(sub.findings.iter().cloned());
    }

    let comp = RULES.composition;
    let blend = RULES.blend;

    let bytecode_score = detector_score(subs, selectors::NAME);
    let source_score = detector_score(subs, source::NAME);
    let liquidity_risk = detector_score(subs, liquidity::NAME);
    let creator_risk = detector_score(subs, creator::NAME);
    let flash_loan = detector_score(subs, flashloan::NAME);
    let mev = detector_score(subs, mev::NAME);

    let liquidity_health = liquidity::health_from_risk(liquidity_risk);
    let contract_overall = mix2(
        bytecode_score,
        comp.contract_bytecode,
        source_score,
        comp.contract_source,
    );

    let contract_honeypot = category_weight_sum(&merged, Category::Honeypot);
    let contract_rug = category_weight_sum(&merged, Category::RugPull);
    let ownership = category_weight_sum(&merged, Category::Ownership);
    let tax = category_weight_sum(&merged, Category::Tax);

    let honeypot = mix2(
        contract_honeypot,
        comp.honeypot_contract,
        creator_risk,
        comp.honeypot_creator,
    );
    let rug_pull = clamp_score(
        (comp.rug_contract * contract_rug as f64
            + comp.rug_creator * creator_risk as f64
            + comp.rug_illiquidity * (100 - liquidity_health) as f64)
            .round() as i64,
    );

    let overall_risk = clamp_score(
        (blend.contract_overall * contract_overall as f64
            + blend.honeypot * honeypot as f64
            + blend.rug_pull * rug_pull as f64
            + blend.flash_loan * flash_loan as f64
            + blend.mev * mev as f64
            + blend.illiquidity * (100 - liquidity_health) as f64)
            .round() as i64,
    );

    let verified = merged
        .get(fields::IS_OPEN_SOURCE)
        .map(|f| f.detected)
        .unwrap_or(false);
    let is_proxy = merged
        .get(fields::PROXY_CONTRACT)
        .map(|f| f.detected)
        .unwrap_or(false);

    AggregateReport {
        token_address: token,
        overall_risk,
        risk_level: RiskLevel::from_score(overall_risk),
        categories: CategoryScores {
            honeypot,
            rug_pull,
            flash_loan,
            mev,
            ownership,
            tax,
            liquidity_health,
            creator_risk,
        },
        verified,
        is_proxy,
        fields: merged,
        findings,
        scan_duration_seconds: 0.0,
        timestamp: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::types::Severity;

    fn token() -> Address {
        Address::repeat_byte(0x99)
    }

    fn sub(detector: &str, score: u8) -> SubReport {
        let mut s = SubReport::new(token(), detector);
        s.score = score;
        s
    }

    fn full_set() -> Vec<SubReport> {
        vec![
            sub(selectors::NAME, 30),
            sub(source::NAME, 50),
            sub(liquidity::NAME, 20),
            sub(creator::NAME, 40),
            sub(flashloan::NAME, 10),
            sub(mev::NAME, 25),
        ]
    }

    #[test]
    fn test_combine_is_deterministic() {
        let subs = full_set();
        let a = combine(token(), &subs);
        let b = combine(token(), &subs);
        assert_eq!(a.overall_risk, b.overall_risk);
        assert_eq!(a.categories, b.categories);
        assert_eq!(a.risk_level, b.risk_level);
    }

    #[test]
    fn test_combine_is_order_independent() {
        let subs = full_set();
        let mut reversed = full_set();
        reversed.reverse();
        let a = combine(token(), &subs);
        let b = combine(token(), &reversed);
        assert_eq!(a.overall_risk, b.overall_risk);
        assert_eq!(a.categories, b.categories);
    }

    #[test]
    fn test_combine_expected_scores() {
        let subs = full_set();
        let report = combine(token(), &subs);

        // liquidity risk 20 => health 80
        assert_eq!(report.categories.liquidity_health, 80);
        // honeypot: 0.7*0 (no fields) + 0.3*40 = 12
        assert_eq!(report.categories.honeypot, 12);
        // rug: 0.5*0 + 0.3*40 + 0.2*20 = 16
        assert_eq!(report.categories.rug_pull, 16);
        // contract overall: 0.5*30 + 0.5*50 = 40
        // overall: 0.20*40 + 0.25*12 + 0.25*16 + 0.10*10 + 0.10*25 + 0.10*20 = 20.5 -> 21
        assert_eq!(report.overall_risk, 21);
        assert_eq!(report.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_detected_field_wins_merge() {
        let mut a = sub(selectors::NAME, 0);
        a.push_field(DetectionField {
            key: fields::IS_OPEN_SOURCE.to_string(),
            detected: false,
            severity: Severity::Warning,
            category: Category::RugPull,
            weight: 25,
        });
        let mut b = sub(source::NAME, 0);
        b.push_field(DetectionField {
            key: fields::IS_OPEN_SOURCE.to_string(),
            detected: true,
            severity: Severity::Safe,
            category: Category::RugPull,
            weight: 0,
        });

        let report = combine(token(), &[a, b]);
        assert!(report.fields[fields::IS_OPEN_SOURCE].detected);
        assert!(report.verified);
    }

    #[test]
    fn test_missing_detector_defaults_neutral() {
        // Only two detectors reported; the rest fall back to 50
        let subs = vec![sub(selectors::NAME, 0), sub(source::NAME, 0)];
        let report = combine(token(), &subs);
        assert_eq!(report.categories.creator_risk, 50);
        assert_eq!(report.categories.flash_loan, 50);
        assert_eq!(report.categories.liquidity_health, 50);
    }

    #[test]
    fn test_category_sum_clamps_at_zero() {
        let mut a = sub(selectors::NAME, 0);
        a.push_field(DetectionField {
            key: fields::RENOUNCED_OWNERSHIP.to_string(),
            detected: true,
            severity: Severity::Safe,
            category: Category::Ownership,
            weight: -15,
        });
        let report = combine(token(), &[a]);
        assert_eq!(report.categories.ownership, 0);
    }
}
