//! Flash-loan vulnerability detector
//!
//! Classifies oracle usage (spot-price vs TWAP-protected), looks for flash
//! mint/loan callbacks without reentrancy-guard evidence, and flags naive
//! price-by-division over raw reserves or balances.

use alloy_primitives::Address;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

use super::{has_selector, normalize_bytecode, Detector};
use crate::core::rules::{
    fields, FLASH_CALLBACK_SELECTORS, RULES, SPOT_PRICE_SELECTORS, TWAP_SELECTORS,
};
use crate::models::types::{clamp_score, Category, DetectionField, Finding, Severity, SubReport};
use crate::providers::TokenContext;

pub struct FlashLoanVulnerabilityDetector;

pub const NAME: &str = "flash_loan";

lazy_static! {
    static ref SPOT_SOURCE: Regex =
        Regex::new(r"(?i)getReserves|getAmountsOut|reserve0|reserve1").expect("static pattern");
    static ref TWAP_SOURCE: Regex =
        Regex::new(r"(?i)TWAP|price0CumulativeLast|price1CumulativeLast|\bobserve\s*\(|\bconsult\s*\(")
            .expect("static pattern");
    static ref CALLBACK_SOURCE: Regex =
        Regex::new(r"(?i)executeOperation|uniswapV2Call|onFlashLoan").expect("static pattern");
    static ref GUARD_SOURCE: Regex =
        Regex::new(r"(?i)nonReentrant|ReentrancyGuard|_notEntered").expect("static pattern");
    static ref RESERVE_DIVISION: Regex =
        Regex::new(r"(?i)/\s*(reserve0|reserve1|_reserve0|_reserve1|balanceOf\()|(reserve0|reserve1)\s*/")
            .expect("static pattern");
}

#[derive(Debug, PartialEq, Eq)]
enum OracleUsage {
    None,
    Vulnerable,
    Protected,
}

fn classify_oracle(bytecode: &str, source: Option<&str>) -> OracleUsage {
    let spot = SPOT_PRICE_SELECTORS
        .iter()
        .any(|sel| has_selector(bytecode, sel))
        || source.is_some_and(|s| SPOT_SOURCE.is_match(s));
    let twap = TWAP_SELECTORS
        .iter()
        .any(|sel| has_selector(bytecode, sel))
        || source.is_some_and(|s| TWAP_SOURCE.is_match(s));

    // Any TWAP indicator overrides spot usage, even when both appear
    if twap {
        OracleUsage::Protected
    } else if spot {
        OracleUsage::Vulnerable
    } else {
        OracleUsage::None
    }
}

#[async_trait]
impl Detector for FlashLoanVulnerabilityDetector {
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

        let rules = &RULES.flash_loan;
        let mut report = SubReport::new(token, NAME);
        let mut raw_score: i64 = 0;

        match classify_oracle(&bytecode, source) {
            OracleUsage::Protected => {
                report.push_field(DetectionField {
                    key: fields::TWAP_ORACLE.to_string(),
                    detected: true,
                    severity: Severity::Safe,
                    category: Category::FlashLoan,
                    weight: -15,
                });
                raw_score += -15;
                report.findings.push(Finding::new(
                    fields::TWAP_ORACLE,
                    Severity::Info,
                    "TWAP accumulator referenced, pricing is manipulation-resistant",
                ));
            }
            OracleUsage::Vulnerable => {
                report.push_field(DetectionField {
                    key: fields::SPOT_PRICE_ORACLE.to_string(),
                    detected: true,
                    severity: Severity::Warning,
                    category: Category::FlashLoan,
                    weight: rules.vulnerable_oracle,
                });
                raw_score += rules.vulnerable_oracle as i64;
                report.findings.push(Finding::new(
                    fields::SPOT_PRICE_ORACLE,
                    Severity::Warning,
                    "Spot-price reads without any TWAP indicator",
                ));
            }
            OracleUsage::None => {}
        }

        let callback = FLASH_CALLBACK_SELECTORS
            .iter()
            .any(|sel| has_selector(&bytecode, sel))
            || source.is_some_and(|s| CALLBACK_SOURCE.is_match(s));
        if callback {
            let guarded = source.is_some_and(|s| GUARD_SOURCE.is_match(s));
            if guarded {
                report.push_field(DetectionField {
                    key: fields::REENTRANCY_GUARD.to_string(),
                    detected: true,
                    severity: Severity::Safe,
                    category: Category::FlashLoan,
                    weight: -10,
                });
                report.push_field(DetectionField {
                    key: fields::FLASH_LOAN_CALLBACK.to_string(),
                    detected: true,
                    severity: Severity::Info,
                    category: Category::FlashLoan,
                    weight: 10,
                });
                report.findings.push(Finding::new(
                    fields::FLASH_LOAN_CALLBACK,
                    Severity::Info,
                    "Flash-loan callback exported behind a reentrancy guard",
                ));
            } else {
                raw_score += rules.unprotected_callback as i64;
                report.push_field(DetectionField {
                    key: fields::UNPROTECTED_CALLBACK.to_string(),
                    detected: true,
                    severity: Severity::Warning,
                    category: Category::FlashLoan,
                    weight: rules.unprotected_callback,
                });
                report.findings.push(Finding::new(
                    fields::UNPROTECTED_CALLBACK,
                    Severity::Warning,
                    "Flash-loan callback exported with no reentrancy-guard evidence",
                ));
            }
        }

        if source.is_some_and(|s| RESERVE_DIVISION.is_match(s)) {
            raw_score += rules.reserve_division as i64;
            report.push_field(DetectionField {
                key: fields::RESERVE_DIVISION.to_string(),
                detected: true,
                severity: Severity::Warning,
                category: Category::FlashLoan,
                weight: rules.reserve_division,
            });
            report.findings.push(Finding::new(
                fields::RESERVE_DIVISION,
                Severity::Warning,
                "Price derived by division over raw reserves or balances",
            ));
        }

        report.score = clamp_score(raw_score);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> Address {
        Address::repeat_byte(0x33)
    }

    #[tokio::test]
    async fn test_spot_without_twap_is_vulnerable() {
        let mut ctx = TokenContext::empty(token());
        ctx.bytecode = Some("600902f1ac00".into()); // getReserves()
        let report = FlashLoanVulnerabilityDetector.analyze(token(), &ctx).await;
        assert!(report.fields.contains_key(fields::SPOT_PRICE_ORACLE));
        assert_eq!(report.score, 35);
    }

    #[tokio::test]
    async fn test_twap_overrides_spot() {
        let mut ctx = TokenContext::empty(token());
        // Both getReserves and price0CumulativeLast present
        ctx.bytecode = Some("0902f1ac5909c0d5".into());
        let report = FlashLoanVulnerabilityDetector.analyze(token(), &ctx).await;
        assert!(report.fields.contains_key(fields::TWAP_ORACLE));
        assert!(!report.fields.contains_key(fields::SPOT_PRICE_ORACLE));
        assert_eq!(report.score, 0);
    }

    #[tokio::test]
    async fn test_unguarded_callback_flagged() {
        let mut ctx = TokenContext::empty(token());
        ctx.bytecode = Some("10d1e85c".into()); // uniswapV2Call
        let report = FlashLoanVulnerabilityDetector.analyze(token(), &ctx).await;
        assert!(report.fields.contains_key(fields::UNPROTECTED_CALLBACK));
        assert_eq!(report.score, 30);
    }

    #[tokio::test]
    async fn test_guarded_callback_not_penalized() {
        let mut ctx = TokenContext::empty(token());
        ctx.bytecode = Some("10d1e85c".into());
        ctx.source_code =
            Some("function uniswapV2Call(...) external nonReentrant { }".into());
        let report = FlashLoanVulnerabilityDetector.analyze(token(), &ctx).await;
        assert!(report.fields.contains_key(fields::REENTRANCY_GUARD));
        assert!(!report.fields.contains_key(fields::UNPROTECTED_CALLBACK));
    }

    #[tokio::test]
    async fn test_reserve_division_from_source() {
        let mut ctx = TokenContext::empty(token());
        ctx.bytecode = Some("6080".into());
        ctx.source_code = Some("uint price = amountOut / reserve0;".into());
        let report = FlashLoanVulnerabilityDetector.analyze(token(), &ctx).await;
        assert!(report.fields.contains_key(fields::RESERVE_DIVISION));
    }

    #[tokio::test]
    async fn test_nothing_available_degrades() {
        let ctx = TokenContext::empty(token());
        let report = FlashLoanVulnerabilityDetector.analyze(token(), &ctx).await;
        assert_eq!(report.score, 50);
    }
}
