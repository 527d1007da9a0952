//! Creator profiler
//!
//! Scores the deployer wallet: fresh wallets, serial deployers and
//! dust-balance wallets raise risk; long-lived wallets lower it.

use alloy_primitives::Address;
use async_trait::async_trait;

use super::Detector;
use crate::core::rules::RULES;
use crate::models::types::{clamp_score, Finding, Severity, SubReport};
use crate::providers::TokenContext;

pub struct CreatorProfiler;

pub const NAME: &str = "creator_profile";

#[async_trait]
impl Detector for CreatorProfiler {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn analyze(&self, token: Address, ctx: &TokenContext) -> SubReport {
        let stats = match ctx.creator {
            Some(stats) => stats,
            None => return SubReport::degraded(token, NAME, "creator wallet stats unavailable"),
        };

        let rules = &RULES.creator;
        let mut report = SubReport::new(token, NAME);
        let mut raw_score: i64 = 0;

        if stats.wallet_age_days < 7 {
            raw_score += rules.age_lt_7d as i64;
            report.findings.push(Finding::new(
                "creator_fresh_wallet",
                Severity::Warning,
                format!("Creator wallet is {} days old", stats.wallet_age_days),
            ));
        } else if stats.wallet_age_days < 30 {
            raw_score += rules.age_lt_30d as i64;
            report.findings.push(Finding::new(
                "creator_young_wallet",
                Severity::Info,
                format!("Creator wallet is {} days old", stats.wallet_age_days),
            ));
        } else if stats.wallet_age_days > 365 {
            raw_score += rules.age_gt_365d as i64;
            report.findings.push(Finding::new(
                "creator_established_wallet",
                Severity::Safe,
                format!("Creator wallet is {} days old", stats.wallet_age_days),
            ));
        }

        if stats.tokens_deployed > 20 {
            raw_score += rules.deployed_gt_20 as i64;
            report.findings.push(Finding::new(
                "creator_serial_deployer",
                Severity::Warning,
                format!("Creator deployed {} tokens", stats.tokens_deployed),
            ));
        } else if stats.tokens_deployed > 10 {
            raw_score += rules.deployed_gt_10 as i64;
            report.findings.push(Finding::new(
                "creator_frequent_deployer",
                Severity::Info,
                format!("Creator deployed {} tokens", stats.tokens_deployed),
            ));
        } else if stats.tokens_deployed > 5 {
            raw_score += rules.deployed_gt_5 as i64;
            report.findings.push(Finding::new(
                "creator_repeat_deployer",
                Severity::Info,
                format!("Creator deployed {} tokens", stats.tokens_deployed),
            ));
        }

        if stats.native_balance < rules.low_balance_native {
            raw_score += rules.low_balance as i64;
            report.findings.push(Finding::new(
                "creator_dust_balance",
                Severity::Info,
                format!("Creator wallet holds {:.4} native units", stats.native_balance),
            ));
        }

        report.score = clamp_score(raw_score);
        report
    }
}
