//! Liquidity concentration analyzer
//!
//! Judges holder concentration against tiered thresholds and screens the
//! transfer history for wash-trading, bot and burst patterns. Holder risk
//! and transfer risk are mixed 60/40 into the detector score; liquidity
//! health is the complement of that score.

use alloy_primitives::Address;
use async_trait::async_trait;
use std::collections::HashMap;

use super::Detector;
use crate::core::rules::{fields, RULES};
use crate::models::types::{clamp_score, Category, DetectionField, Finding, Severity, SubReport};
use crate::providers::{TokenContext, TransferRecord};

pub struct LiquidityConcentrationAnalyzer;

pub const NAME: &str = "liquidity_concentration";

fn concentration_pct(balances: &[u128], take: usize, total_supply: u128) -> f64 {
    let top: u128 = balances.iter().take(take).sum();
    (top as f64 / total_supply as f64) * 100.0
}

/// Transfer-pattern risk: wash pairs, duplicated amounts, burst frequency
fn transfer_risk(transfers: &[TransferRecord], report: &mut SubReport) -> i64 {
    let rules = &RULES.liquidity;
    let mut risk: i64 = 0;

    if transfers.is_empty() {
        return 0;
    }

    // Wash trading: several address pairs, each trading back and forth
    let mut pair_counts: HashMap<(Address, Address), usize> = HashMap::new();
    for t in transfers {
        *pair_counts.entry((t.from, t.to)).or_insert(0) += 1;
    }
    let repeated_pairs = pair_counts
        .values()
        .filter(|&&count| count > rules.wash_pair_repeats)
        .count();
    if repeated_pairs > rules.wash_pair_threshold {
        risk += rules.wash_trading as i64;
        report.push_field(DetectionField {
            key: fields::WASH_TRADING.to_string(),
            detected: true,
            severity: Severity::Warning,
            category: Category::Liquidity,
            weight: rules.wash_trading,
        });
        report.findings.push(Finding::new(
            fields::WASH_TRADING,
            Severity::Warning,
            format!("{} address pairs with repeated back-and-forth transfers", repeated_pairs),
        ));
    }

    // Bots tend to move identical amounts over and over
    let mut amount_counts: HashMap<u128, usize> = HashMap::new();
    for t in transfers {
        *amount_counts.entry(t.amount).or_insert(0) += 1;
    }
    if amount_counts
        .values()
        .any(|&count| count > rules.duplicate_amount_repeats)
    {
        risk += rules.duplicate_amounts as i64;
        report.push_field(DetectionField {
            key: fields::DUPLICATE_AMOUNT_PATTERN.to_string(),
            detected: true,
            severity: Severity::Info,
            category: Category::Liquidity,
            weight: rules.duplicate_amounts,
        });
        report.findings.push(Finding::new(
            fields::DUPLICATE_AMOUNT_PATTERN,
            Severity::Info,
            "Identical transfer amounts repeated, bot-like pattern",
        ));
    }

    // Burst frequency over the observed window, floored at one hour
    let min_ts = transfers.iter().map(|t| t.timestamp).min().unwrap_or(0);
    let max_ts = transfers.iter().map(|t| t.timestamp).max().unwrap_or(0);
    let hours = ((max_ts - min_ts) as f64 / 3600.0).max(1.0);
    let tx_per_hour = transfers.len() as f64 / hours;
    if tx_per_hour > rules.high_frequency_tx_per_hour {
        risk += rules.high_frequency as i64;
        report.push_field(DetectionField {
            key: fields::HIGH_FREQUENCY_TRADING.to_string(),
            detected: true,
            severity: Severity::Info,
            category: Category::Liquidity,
            weight: rules.high_frequency,
        });
        report.findings.push(Finding::new(
            fields::HIGH_FREQUENCY_TRADING,
            Severity::Info,
            format!("{:.0} transfers/hour observed", tx_per_hour),
        ));
    }

    risk
}

#[async_trait]
impl Detector for LiquidityConcentrationAnalyzer {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn analyze(&self, token: Address, ctx: &TokenContext) -> SubReport {
        if ctx.holders.is_empty() || ctx.total_supply == 0 {
            return SubReport::degraded(token, NAME, "holder data unavailable");
        }

        let rules = &RULES.liquidity;
        let mut report = SubReport::new(token, NAME);
        let mut holder_risk: i64 = 0;

        let mut balances: Vec<u128> = ctx.holders.iter().map(|h| h.balance).collect();
        balances.sort_unstable_by(|a, b| b.cmp(a));

        let top1 = concentration_pct(&balances, 1, ctx.total_supply);
        let top5 = concentration_pct(&balances, 5, ctx.total_supply);

        if top1 > rules.top1_critical_pct {
            holder_risk += rules.top1_critical as i64;
            report.push_field(DetectionField {
                key: fields::TOP_HOLDER_CONCENTRATION.to_string(),
                detected: true,
                severity: Severity::Critical,
                category: Category::Liquidity,
                weight: rules.top1_critical,
            });
            report.findings.push(Finding::new(
                fields::TOP_HOLDER_CONCENTRATION,
                Severity::Critical,
                format!("Top holder controls {:.1}% of supply", top1),
            ));
        } else if top1 > rules.top1_high_pct {
            holder_risk += rules.top1_high as i64;
            report.push_field(DetectionField {
                key: fields::TOP_HOLDER_CONCENTRATION.to_string(),
                detected: true,
                severity: Severity::Warning,
                category: Category::Liquidity,
                weight: rules.top1_high,
            });
            report.findings.push(Finding::new(
                fields::TOP_HOLDER_CONCENTRATION,
                Severity::Warning,
                format!("Top holder controls {:.1}% of supply", top1),
            ));
        } else if top1 > rules.top1_medium_pct {
            holder_risk += rules.top1_medium as i64;
            report.push_field(DetectionField {
                key: fields::TOP_HOLDER_CONCENTRATION.to_string(),
                detected: true,
                severity: Severity::Info,
                category: Category::Liquidity,
                weight: rules.top1_medium,
            });
            report.findings.push(Finding::new(
                fields::TOP_HOLDER_CONCENTRATION,
                Severity::Info,
                format!("Top holder controls {:.1}% of supply", top1),
            ));
        }

        if top5 > rules.top5_critical_pct {
            holder_risk += rules.top5_critical as i64;
            report.push_field(DetectionField {
                key: fields::TOP5_HOLDER_CONCENTRATION.to_string(),
                detected: true,
                severity: Severity::Critical,
                category: Category::Liquidity,
                weight: rules.top5_critical,
            });
            report.findings.push(Finding::new(
                fields::TOP5_HOLDER_CONCENTRATION,
                Severity::Critical,
                format!("Top 5 holders control {:.1}% of supply", top5),
            ));
        } else if top5 > rules.top5_high_pct {
            holder_risk += rules.top5_high as i64;
            report.push_field(DetectionField {
                key: fields::TOP5_HOLDER_CONCENTRATION.to_string(),
                detected: true,
                severity: Severity::Warning,
                category: Category::Liquidity,
                weight: rules.top5_high,
            });
            report.findings.push(Finding::new(
                fields::TOP5_HOLDER_CONCENTRATION,
                Severity::Warning,
                format!("Top 5 holders control {:.1}% of supply", top5),
            ));
        }

        if ctx.holders.len() < rules.min_holder_count {
            holder_risk += rules.low_holder_count as i64;
            report.push_field(DetectionField {
                key: fields::LOW_HOLDER_COUNT.to_string(),
                detected: true,
                severity: Severity::Warning,
                category: Category::Liquidity,
                weight: rules.low_holder_count,
            });
            report.findings.push(Finding::new(
                fields::LOW_HOLDER_COUNT,
                Severity::Warning,
                format!("Only {} holders", ctx.holders.len()),
            ));
        }

        let transfer = transfer_risk(&ctx.transfers, &mut report);

        let holder = clamp_score(holder_risk) as f64;
        let transfer = clamp_score(transfer) as f64;
        let mixed = (rules.holder_mix * holder + rules.transfer_mix * transfer).round();
        report.score = clamp_score(mixed as i64);
        report
    }
}

/// liquidityHealth = 100 - round(0.6 * holderRisk + 0.4 * transferRisk)
pub fn health_from_risk(score: u8) -> u8 {
    100 - score.min(100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::HolderBalance;

    fn token() -> Address {
        Address::repeat_byte(0x77)
    }

    fn holder(n: u8, balance: u128) -> HolderBalance {
        HolderBalance {
            address: Address::repeat_byte(n),
            balance,
        }
    }

    fn ctx_with_holders(balances: &[u128]) -> TokenContext {
        let mut ctx = TokenContext::empty(token());
        ctx.total_supply = 1_000;
        ctx.holders = balances
            .iter()
            .enumerate()
            .map(|(i, &b)| holder(i as u8 + 1, b))
            .collect();
        ctx
    }

    #[tokio::test]
    async fn test_top1_majority_holder_is_critical() {
        // 51% to one wallet, the rest spread over 11 holders
        let mut balances = vec![510u128];
        balances.extend(std::iter::repeat(44).take(11));
        let ctx = ctx_with_holders(&balances);

        let report = LiquidityConcentrationAnalyzer.analyze(token(), &ctx).await;
        let field = report.fields.get(fields::TOP_HOLDER_CONCENTRATION).unwrap();
        assert_eq!(field.severity, Severity::Critical);
        assert_eq!(field.weight, 40);
    }

    #[tokio::test]
    async fn test_low_holder_count_flagged() {
        let ctx = ctx_with_holders(&[100, 100, 100]);
        let report = LiquidityConcentrationAnalyzer.analyze(token(), &ctx).await;
        assert!(report.fields.contains_key(fields::LOW_HOLDER_COUNT));
    }

    #[tokio::test]
    async fn test_missing_holders_degrades() {
        let ctx = TokenContext::empty(token());
        let report = LiquidityConcentrationAnalyzer.analyze(token(), &ctx).await;
        assert_eq!(report.score, 50);
    }

    #[tokio::test]
    async fn test_wash_trading_detected() {
        // 13 well-spread holders, 4 pairs each trading 6 times
        let mut ctx = ctx_with_holders(&[80; 13]);
        ctx.total_supply = 80 * 13;
        for pair in 0u8..4 {
            for i in 0..6 {
                ctx.transfers.push(TransferRecord {
                    from: Address::repeat_byte(pair + 1),
                    to: Address::repeat_byte(pair + 100),
                    amount: 1_000 + (pair as u128) * 10 + i as u128,
                    timestamp: 1_700_000_000 + (pair as i64) * 86_400 + i as i64 * 7200,
                });
            }
        }
        let report = LiquidityConcentrationAnalyzer.analyze(token(), &ctx).await;
        assert!(report.fields.contains_key(fields::WASH_TRADING));
        // transfer risk 25, mixed at 0.4 => 10
        assert_eq!(report.score, 10);
    }

    #[tokio::test]
    async fn test_high_frequency_burst() {
        let mut ctx = ctx_with_holders(&[80; 13]);
        ctx.total_supply = 80 * 13;
        // 150 transfers within 10 minutes
        for i in 0..150u32 {
            ctx.transfers.push(TransferRecord {
                from: Address::repeat_byte((i % 13) as u8 + 1),
                to: Address::repeat_byte((i % 7) as u8 + 50),
                amount: 5 + i as u128,
                timestamp: 1_700_000_000 + (i as i64) * 4,
            });
        }
        let report = LiquidityConcentrationAnalyzer.analyze(token(), &ctx).await;
        assert!(report.fields.contains_key(fields::HIGH_FREQUENCY_TRADING));
    }

    #[test]
    fn test_health_is_complement() {
        assert_eq!(health_from_risk(0), 100);
        assert_eq!(health_from_risk(35), 65);
        assert_eq!(health_from_risk(100), 0);
    }
}
