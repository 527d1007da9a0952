//! Bytecode selector detector
//!
//! Scans raw runtime bytecode for known 4-byte function selectors from the
//! versioned rule table. This is capability inference: a matched selector
//! proves the function is exported, not that it is reachable or currently
//! enabled, so every hit is reported with that caveat attached.

use alloy_primitives::Address;
use async_trait::async_trait;

use super::{has_selector, normalize_bytecode, Detector};
use crate::core::rules::{fields, RULES};
use crate::models::types::{clamp_score, Category, DetectionField, Finding, Severity, SubReport};
use crate::providers::TokenContext;

pub struct BytecodeSelectorDetector;

pub const NAME: &str = "bytecode_selectors";

#[async_trait]
impl Detector for BytecodeSelectorDetector {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn analyze(&self, token: Address, ctx: &TokenContext) -> SubReport {
        let bytecode = match ctx.bytecode.as_deref() {
            Some(raw) if !raw.trim().is_empty() => normalize_bytecode(raw),
            _ => return SubReport::degraded(token, NAME, "bytecode unavailable"),
        };

        let mut report = SubReport::new(token, NAME);
        let mut raw_score: i64 = 0;

        for rule in &RULES.selector_rules {
            if !has_selector(&bytecode, rule.selector) {
                continue;
            }
            // One field key can be backed by several selectors; weigh it once
            if report.fields.contains_key(rule.field) {
                continue;
            }
            raw_score += rule.weight as i64;
            report.push_field(DetectionField {
                key: rule.field.to_string(),
                detected: true,
                severity: rule.severity,
                category: rule.category,
                weight: rule.weight,
            });
            report.findings.push(Finding::new(
                rule.field,
                rule.severity,
                format!(
                    "Selector 0x{} ({}) exported; exportation only, reachability not proven",
                    rule.selector, rule.name
                ),
            ));
        }

        // Renounced ownership is a state observation, not a selector hit
        if ctx.owner == Some(Address::ZERO) {
            raw_score += -15;
            report.push_field(DetectionField {
                key: fields::RENOUNCED_OWNERSHIP.to_string(),
                detected: true,
                severity: Severity::Safe,
                category: Category::Ownership,
                weight: -15,
            });
            report.findings.push(Finding::new(
                fields::RENOUNCED_OWNERSHIP,
                Severity::Info,
                "Contract ownership renounced (owner is the zero address)",
            ));
        }

        // Proxy status comes from the provider's deployment metadata
        if ctx.is_proxy && !report.fields.contains_key(fields::PROXY_CONTRACT) {
            raw_score += 15;
            report.push_field(DetectionField {
                key: fields::PROXY_CONTRACT.to_string(),
                detected: true,
                severity: Severity::Warning,
                category: Category::RugPull,
                weight: 15,
            });
            report.findings.push(Finding::new(
                fields::PROXY_CONTRACT,
                Severity::Warning,
                "Contract deployed behind a proxy, implementation can change",
            ));
        }

        report.score = clamp_score(raw_score);
        report
    }
}
