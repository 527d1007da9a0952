//! Publish adapter
//!
//! Orchestrates scan-then-publish: run the aggregator, register the token if
//! the registry does not know it yet, then push the aggregate scores.
//! Publication failures are reported but never invalidate the computed
//! report; a retry that finds the token already registered proceeds straight
//! to the update.

use alloy_primitives::Address;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::aggregator::RiskAggregator;
use crate::core::registry::{RiskRegistry, ScoreUpdate};
use crate::identity::{Feedback, IdentityRegistryClient};
use crate::models::errors::{AppResult, ErrorCode};
use crate::models::types::AggregateReport;

/// Result of one scan-and-publish round. `report` is always present;
/// `publish_error` carries the registry failure when publication broke.
#[derive(Debug, Clone, Serialize)]
pub struct PublishOutcome {
    pub report: AggregateReport,
    pub published: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publish_error: Option<String>,
}

pub struct RiskPublisher {
    aggregator: RiskAggregator,
    registry: Arc<RiskRegistry>,
    /// Principal this publisher writes to the registry as
    agent: Address,
    identity: Option<(Arc<dyn IdentityRegistryClient>, u64)>,
}

impl RiskPublisher {
    pub fn new(aggregator: RiskAggregator, registry: Arc<RiskRegistry>, agent: Address) -> Self {
        Self {
            aggregator,
            registry,
            agent,
            identity: None,
        }
    }

    /// Attach the external identity registry; `agent_id` comes from its
    /// registerAgent call at startup.
    pub fn with_identity(
        mut self,
        client: Arc<dyn IdentityRegistryClient>,
        agent_id: u64,
    ) -> Self {
        self.identity = Some((client, agent_id));
        self
    }

    pub fn registry(&self) -> &Arc<RiskRegistry> {
        &self.registry
    }

    /// Scan, then publish. Only invalid input fails; everything downstream
    /// of the computed report degrades into the outcome.
    pub async fn scan_and_publish(&self, token: Address) -> AppResult<PublishOutcome> {
        let report = self.aggregator.aggregate(token).await?;

        let outcome = match self.publish(&report) {
            Ok(()) => {
                info!(
                    "Published {} risk {} ({})",
                    token,
                    report.overall_risk,
                    report.risk_level.as_str()
                );
                PublishOutcome {
                    report,
                    published: true,
                    publish_error: None,
                }
            }
            Err(e) => {
                warn!("Publication failed for {}: {}; report stands", token, e);
                PublishOutcome {
                    report,
                    published: false,
                    publish_error: Some(e.to_string()),
                }
            }
        };

        if outcome.published {
            self.report_feedback(&outcome.report).await;
        }
        Ok(outcome)
    }

    /// Register-if-absent, then update. Retry-safe: a concurrent registration
    /// surfacing as "already registered" is not a failure.
    fn publish(&self, report: &AggregateReport) -> AppResult<()> {
        let token = report.token_address;
        if !self.registry.is_registered(token) {
            match self.registry.register_token(self.agent, token) {
                Ok(_) => {}
                Err(e) if e.code == ErrorCode::RegAlreadyRegistered => {}
                Err(e) => return Err(e),
            }
        }
        self.registry.update_risk_score(
            self.agent,
            token,
            ScoreUpdate {
                risk: report.overall_risk,
                honeypot: report.categories.honeypot,
                rug_pull: report.categories.rug_pull,
                // Registry stores liquidity as a risk score like its siblings
                liquidity: 100 - report.categories.liquidity_health.min(100),
            },
        )
    }

    /// Best-effort reputation feedback; failures are logged and dropped
    async fn report_feedback(&self, report: &AggregateReport) {
        let Some((client, agent_id)) = &self.identity else {
            return;
        };
        let feedback = Feedback {
            value: report.overall_risk as i64,
            decimals: 0,
            tag1: "risk_scan".to_string(),
            tag2: report.risk_level.as_str().to_string(),
            endpoint: String::new(),
            feedback_uri: String::new(),
            feedback_hash: String::new(),
        };
        if let Err(e) = client.give_feedback(*agent_id, feedback).await {
            warn!("Identity feedback failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::RegistryConfig;
    use crate::models::types::RiskLevel;
    use crate::providers::{StaticProvider, TokenContext};

    fn owner() -> Address {
        Address::repeat_byte(0x01)
    }

    fn agent() -> Address {
        Address::repeat_byte(0x02)
    }

    fn token() -> Address {
        Address::repeat_byte(0xbb)
    }

    fn publisher_with_context(ctx: TokenContext) -> RiskPublisher {
        let provider = Arc::new(StaticProvider::new());
        provider.insert(ctx);
        let registry = Arc::new(RiskRegistry::new(RegistryConfig::new(owner())));
        registry.authorize_agent(owner(), agent()).unwrap();
        RiskPublisher::new(RiskAggregator::new(provider), registry, agent())
    }

    #[tokio::test]
    async fn test_scan_and_publish_registers_and_updates() {
        let mut ctx = TokenContext::empty(token());
        ctx.bytecode = Some("6080604052".into());
        ctx.source_code = Some("contract Plain {}".into());
        let publisher = publisher_with_context(ctx);

        let outcome = publisher.scan_and_publish(token()).await.unwrap();
        assert!(outcome.published);
        assert!(outcome.publish_error.is_none());

        let record = publisher.registry().get_full_report(token()).unwrap();
        assert_eq!(record.risk_score, outcome.report.overall_risk);
        assert_ne!(record.risk_level, RiskLevel::Pending);
    }

    #[tokio::test]
    async fn test_republish_is_idempotent_under_retry() {
        let mut ctx = TokenContext::empty(token());
        ctx.bytecode = Some("6080604052".into());
        let publisher = publisher_with_context(ctx);

        let first = publisher.scan_and_publish(token()).await.unwrap();
        let second = publisher.scan_and_publish(token()).await.unwrap();
        assert!(first.published);
        assert!(second.published);
        assert_eq!(publisher.registry().total_tokens(), 1);
    }

    #[tokio::test]
    async fn test_publish_failure_keeps_report() {
        let mut ctx = TokenContext::empty(token());
        ctx.bytecode = Some("6080604052".into());
        let publisher = publisher_with_context(ctx);

        // Circuit breaker on: publication must fail, scan must not
        publisher.registry().pause(owner()).unwrap();
        let outcome = publisher.scan_and_publish(token()).await.unwrap();
        assert!(!outcome.published);
        assert!(outcome.publish_error.unwrap().contains("REG_PAUSED"));
        assert!(outcome.report.overall_risk <= 100);
    }

    #[tokio::test]
    async fn test_zero_address_is_fatal() {
        let publisher = publisher_with_context(TokenContext::empty(token()));
        let err = publisher.scan_and_publish(Address::ZERO).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InputZeroAddress);
    }
}
