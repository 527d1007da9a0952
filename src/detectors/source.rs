//! Source pattern detector
//!
//! Runs the declarative regex rule table over verified source text. Absence
//! of verified source is itself a risk signal. Also screens token metadata
//! for impersonation of well-known assets (deceptive prefix + symbol).

use alloy_primitives::Address;
use async_trait::async_trait;

use super::Detector;
use crate::core::rules::{fields, ScoringRules, RULES};
use crate::models::types::{clamp_score, Category, DetectionField, Finding, Severity, SubReport};
use crate::providers::TokenContext;

pub struct SourcePatternDetector;

pub const NAME: &str = "source_patterns";

/// Returns the (prefix, canonical symbol) pair when an identifier combines a
/// deceptive prefix with a known asset symbol, e.g. "BabyBTC" or "SafeDoge".
fn deceptive_identifier<'a>(
    identifier: &str,
    rules: &'a ScoringRules,
) -> Option<(&'a str, &'a str)> {
    let lowered = identifier.to_lowercase();
    for &prefix in &rules.deceptive_prefixes {
        for &symbol in &rules.canonical_symbols {
            if lowered.contains(&format!("{}{}", prefix, symbol)) {
                return Some((prefix, symbol));
            }
        }
    }
    None
}

#[async_trait]
impl Detector for SourcePatternDetector {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn analyze(&self, token: Address, ctx: &TokenContext) -> SubReport {
        let mut report = SubReport::new(token, NAME);
        let mut raw_score: i64 = 0;

        let source = ctx
            .source_code
            .as_deref()
            .filter(|s| !s.trim().is_empty());
        let verified = source.is_some();

        report.push_field(DetectionField {
            key: fields::IS_OPEN_SOURCE.to_string(),
            detected: verified,
            severity: if verified {
                Severity::Safe
            } else {
                Severity::Warning
            },
            category: Category::RugPull,
            weight: if verified {
                0
            } else {
                RULES.unverified_source_penalty
            },
        });

        match source {
            Some(text) => {
                for rule in &RULES.source_rules {
                    if !rule.pattern.is_match(text) {
                        continue;
                    }
                    // Repeat matches and sibling rules on the same field do
                    // not compound: one weight per field key
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
                        format!("Source matches {} pattern", rule.name),
                    ));
                }
            }
            None => {
                raw_score += RULES.unverified_source_penalty as i64;
                report.findings.push(Finding::new(
                    fields::IS_OPEN_SOURCE,
                    Severity::Warning,
                    "No verified source available; contract cannot be audited",
                ));
            }
        }

        // Impersonation screen over metadata; any match is critical,
        // how many is irrelevant
        let identifiers = [ctx.token_symbol.as_deref(), ctx.token_name.as_deref()];
        for identifier in identifiers.into_iter().flatten() {
            if let Some((prefix, symbol)) = deceptive_identifier(identifier, &RULES) {
                raw_score += 40;
                report.push_field(DetectionField {
                    key: fields::FAKE_TOKEN.to_string(),
                    detected: true,
                    severity: Severity::Critical,
                    category: Category::Honeypot,
                    weight: 40,
                });
                report.findings.push(Finding::new(
                    fields::FAKE_TOKEN,
                    Severity::Critical,
                    format!(
                        "Identifier '{}' impersonates {} with deceptive prefix '{}'",
                        identifier, symbol, prefix
                    ),
                ));
                break;
            }
        }

        report.score = clamp_score(raw_score);
        report
    }
}
