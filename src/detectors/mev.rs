//! MEV exposure detector
//!
//! Weighs the surfaces a searcher can lean on: mutable fees, missing
//! cooldowns, approve race windows, DEX integration depth, bot
//! infrastructure and LP pair presence. Anti-bot guards and max-tx limits
//! count against exposure.

use alloy_primitives::Address;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

use super::{has_selector, normalize_bytecode, Detector};
use crate::core::rules::{
    fields, BOT_INFRA_SELECTORS, DEX_SWAP_SELECTORS, FOT_SWAP_SELECTORS, LP_PAIR_SELECTORS,
    MUTABLE_FEE_SELECTORS, RULES, SEL_APPROVE, SEL_INCREASE_ALLOWANCE, SEL_SET_COOLDOWN,
};
use crate::models::types::{clamp_score, Category, DetectionField, Finding, Severity, SubReport};
use crate::providers::TokenContext;

pub struct MevExposureDetector;

pub const NAME: &str = "mev_exposure";

lazy_static! {
    static ref COOLDOWN_SOURCE: Regex = Regex::new(r"(?i)cooldown").expect("static pattern");
    static ref ANTI_BOT_SOURCE: Regex =
        Regex::new(r"(?i)antiBot|anti_bot|botBlacklist").expect("static pattern");
    static ref MAX_TX_SOURCE: Regex =
        Regex::new(r"(?i)maxTxAmount|maxTransactionAmount").expect("static pattern");
}

#[async_trait]
impl Detector for MevExposureDetector {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn analyze(&self, token: Address, ctx: &TokenContext) -> SubReport {
        let source = ctx.source_code.as_deref().filter(|s| !s.trim().is_empty());
        let bytecode = match ctx.bytecode.as_deref() {
            Some(raw) if !raw.trim().is_empty() => normalize_bytecode(raw),
            _ if source.is_none() => {
                return SubReport::degraded(token, NAME, "neither bytecode nor source available")
            }
            _ => String::new(),
        };

        let rules = &RULES.mev;
        let mut report = SubReport::new(token, NAME);
        let mut raw_score: i64 = 0;
        let push = |report: &mut SubReport,
                        raw: &mut i64,
                        key: &str,
                        severity: Severity,
                        weight: i32,
                        detail: String| {
            *raw += weight as i64;
            report.push_field(DetectionField {
                key: key.to_string(),
                detected: true,
                severity,
                category: Category::Mev,
                weight,
            });
            report.findings.push(Finding::new(key, severity, detail));
        };

        if MUTABLE_FEE_SELECTORS
            .iter()
            .any(|sel| has_selector(&bytecode, sel))
        {
            push(
                &mut report,
                &mut raw_score,
                fields::MUTABLE_FEES,
                Severity::Warning,
                rules.mutable_fees,
                "Fee schedule mutable after deployment".into(),
            );
        }

        let has_cooldown = has_selector(&bytecode, SEL_SET_COOLDOWN)
            || source.is_some_and(|s| COOLDOWN_SOURCE.is_match(s));
        if !has_cooldown {
            push(
                &mut report,
                &mut raw_score,
                fields::NO_TRADING_COOLDOWN,
                Severity::Info,
                rules.no_cooldown,
                "No trading cooldown, back-to-back swaps possible".into(),
            );
        }

        if has_selector(&bytecode, SEL_APPROVE) && !has_selector(&bytecode, SEL_INCREASE_ALLOWANCE)
        {
            push(
                &mut report,
                &mut raw_score,
                fields::APPROVE_RACE_WINDOW,
                Severity::Info,
                rules.approve_race,
                "approve() without increaseAllowance(), allowance race window".into(),
            );
        }

        if source.is_some_and(|s| ANTI_BOT_SOURCE.is_match(s)) {
            push(
                &mut report,
                &mut raw_score,
                fields::ANTI_BOT,
                Severity::Safe,
                rules.anti_bot,
                "Anti-bot guard present".into(),
            );
        }

        if has_selector(&bytecode, "ec28438a") || source.is_some_and(|s| MAX_TX_SOURCE.is_match(s))
        {
            push(
                &mut report,
                &mut raw_score,
                fields::MAX_TX_LIMIT,
                Severity::Safe,
                rules.max_tx,
                "Max transaction limit present".into(),
            );
        }

        let dex_matches = DEX_SWAP_SELECTORS
            .iter()
            .filter(|sel| has_selector(&bytecode, sel))
            .count();
        if dex_matches > 0 {
            let weight = rules.per_dex_swap * dex_matches as i32;
            push(
                &mut report,
                &mut raw_score,
                fields::DEX_INTEGRATED,
                Severity::Info,
                weight,
                format!("{} DEX swap signatures exported", dex_matches),
            );
        }

        if FOT_SWAP_SELECTORS
            .iter()
            .any(|sel| has_selector(&bytecode, sel))
        {
            push(
                &mut report,
                &mut raw_score,
                fields::FEE_ON_TRANSFER_SWAP,
                Severity::Warning,
                rules.fee_on_transfer_swap,
                "Fee-on-transfer swap variant exported".into(),
            );
        }

        if BOT_INFRA_SELECTORS
            .iter()
            .any(|sel| has_selector(&bytecode, sel))
        {
            push(
                &mut report,
                &mut raw_score,
                fields::BOT_INFRASTRUCTURE,
                Severity::Info,
                rules.bot_infrastructure,
                "Batching/multicall infrastructure exported".into(),
            );
        }

        if LP_PAIR_SELECTORS
            .iter()
            .any(|sel| has_selector(&bytecode, sel))
        {
            push(
                &mut report,
                &mut raw_score,
                fields::LP_PAIR_PRESENT,
                Severity::Info,
                rules.lp_pair,
                "LP pair introspection exported".into(),
            );
        }

        report.score = clamp_score(raw_score);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Address {
        Address::repeat_byte(0x66)
    }

    fn ctx_with_bytecode(code: &str) -> TokenContext {
        let mut ctx = TokenContext::empty(token());
        ctx.bytecode = Some(code.to_string());
        ctx
    }

    #[tokio::test]
    async fn test_plain_bytecode_only_no_cooldown() {
        let ctx = ctx_with_bytecode("6080604052");
        let report = MevExposureDetector.analyze(token(), &ctx).await;
        assert!(report.fields.contains_key(fields::NO_TRADING_COOLDOWN));
        assert_eq!(report.score, 15);
    }

    #[tokio::test]
    async fn test_dex_swaps_count_each() {
        // Two standard swap signatures, cooldown selector to isolate the count
        let ctx = ctx_with_bytecode("38ed17397ff36ab55932ead1");
        let report = MevExposureDetector.analyze(token(), &ctx).await;
        let dex = report.fields.get(fields::DEX_INTEGRATED).unwrap();
        assert_eq!(dex.weight, 20);
        assert_eq!(report.score, 20);
    }

    #[tokio::test]
    async fn test_guards_reduce_exposure() {
        let mut ctx = ctx_with_bytecode("ec28438a5932ead1");
        ctx.source_code = Some("bool antiBot = true; uint maxTxAmount;".into());
        let report = MevExposureDetector.analyze(token(), &ctx).await;
        // anti-bot -15, max-tx -10, everything else absent
        assert_eq!(report.score, 0);
        assert!(report.fields.contains_key(fields::ANTI_BOT));
        assert!(report.fields.contains_key(fields::MAX_TX_LIMIT));
    }

    #[tokio::test]
    async fn test_approve_race_window() {
        let ctx = ctx_with_bytecode("095ea7b35932ead1");
        let report = MevExposureDetector.analyze(token(), &ctx).await;
        assert!(report.fields.contains_key(fields::APPROVE_RACE_WINDOW));
        assert_eq!(report.score, 10);
    }

    #[tokio::test]
    async fn test_fot_swap_and_bot_infra() {
        let ctx = ctx_with_bytecode("5c11d795ac9650d85932ead1");
        let report = MevExposureDetector.analyze(token(), &ctx).await;
        // 20 + 15
        assert_eq!(report.score, 35);
    }
}
