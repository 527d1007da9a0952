//! Companion identity/reputation registry client
//!
//! The scoring core optionally reports to an external agent-identity
//! registry: one registration per scanning agent, one feedback entry per
//! published score. Only the call interface lives here; validation flows
//! belong to the external service.

use alloy_primitives::Address;
use async_trait::async_trait;
use tracing::info;

use crate::models::errors::AppResult;

/// Feedback payload mirrored from the external registry's interface
#[derive(Debug, Clone)]
pub struct Feedback {
    pub value: i64,
    pub decimals: u8,
    pub tag1: String,
    pub tag2: String,
    pub endpoint: String,
    pub feedback_uri: String,
    pub feedback_hash: String,
}

#[async_trait]
pub trait IdentityRegistryClient: Send + Sync {
    async fn register_agent(
        &self,
        wallet: Address,
        agent_type: &str,
        metadata_uri: &str,
    ) -> AppResult<u64>;

    async fn give_feedback(&self, agent_id: u64, feedback: Feedback) -> AppResult<()>;
}

/// Log-only stand-in used when no external registry is wired up
pub struct NullIdentityRegistry;

#[async_trait]
impl IdentityRegistryClient for NullIdentityRegistry {
    async fn register_agent(
        &self,
        wallet: Address,
        agent_type: &str,
        metadata_uri: &str,
    ) -> AppResult<u64> {
        info!(
            "Identity registry disabled; would register {} as {} ({})",
            wallet, agent_type, metadata_uri
        );
        Ok(0)
    }

    async fn give_feedback(&self, agent_id: u64, feedback: Feedback) -> AppResult<()> {
        info!(
            "Identity registry disabled; would record feedback {} for agent {} ({})",
            feedback.value, agent_id, feedback.tag1
        );
        Ok(())
    }
}
