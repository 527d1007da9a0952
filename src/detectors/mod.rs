//! Detectors Module - Independent Heuristic Analyses
//!
//! Each detector consumes a token address plus externally supplied context
//! and returns a SubReport. Detectors are total functions: missing or bad
//! upstream data degrades the detector to a neutral default with an
//! explanatory finding, it never aborts the caller.

pub mod creator;
pub mod flashloan;
pub mod liquidity;
pub mod mev;
pub mod selectors;
pub mod source;

use alloy_primitives::Address;
use async_trait::async_trait;
use std::sync::Arc;

use crate::models::types::SubReport;
use crate::providers::TokenContext;

pub use creator::CreatorProfiler;
pub use flashloan::FlashLoanVulnerabilityDetector;
pub use liquidity::LiquidityConcentrationAnalyzer;
pub use mev::MevExposureDetector;
pub use selectors::BytecodeSelectorDetector;
pub use source::SourcePatternDetector;

/// Contract every detector implements. `analyze` never fails.
#[async_trait]
pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;
    async fn analyze(&self, token: Address, ctx: &TokenContext) -> SubReport;
}

/// The full detector set, in the canonical order the aggregator launches them
pub fn default_detectors() -> Vec<Arc<dyn Detector>> {
    vec![
        Arc::new(BytecodeSelectorDetector),
        Arc::new(SourcePatternDetector),
        Arc::new(LiquidityConcentrationAnalyzer),
        Arc::new(CreatorProfiler),
        Arc::new(FlashLoanVulnerabilityDetector),
        Arc::new(MevExposureDetector),
    ]
}

/// Lowercase hex without the 0x prefix, ready for substring selector scans
pub(crate) fn normalize_bytecode(raw: &str) -> String {
    raw.trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X")
        .to_ascii_lowercase()
}

/// Selector presence proves the function is exported, not that it is
/// reachable or currently enabled.
pub(crate) fn has_selector(bytecode: &str, selector: &str) -> bool {
    bytecode.contains(selector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_bytecode() {
        assert_eq!(normalize_bytecode("0x60806040ABCD"), "60806040abcd");
        assert_eq!(normalize_bytecode("  60806040  "), "60806040");
    }

    #[test]
    fn test_default_detectors_are_six_and_unique() {
        let detectors = default_detectors();
        assert_eq!(detectors.len(), 6);
        let mut names: Vec<_> = detectors.iter().map(|d| d.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 6);
    }
}
