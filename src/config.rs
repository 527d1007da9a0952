//! Configuration module for Token Sentry
//! All runtime-tunable parameters, read from the environment once at startup

use alloy_primitives::Address;
use std::str::FromStr;

use crate::core::registry::DEFAULT_STALENESS_SECS;

/// Service configuration shared by the CLI and the API binary
#[derive(Debug, Clone)]
pub struct SentryConfig {
    /// Bind address for the API service
    pub bind_addr: String,

    /// Registry owner principal (holds the authorization capability)
    pub owner: Address,

    /// Principal the publish adapter writes as
    pub agent: Address,

    /// Directory of token context JSON snapshots
    pub context_dir: String,

    /// Read-time staleness threshold in seconds
    pub staleness_secs: i64,

    /// Maximum concurrent scan requests
    pub max_concurrent_scans: usize,
}

fn env_address(key: &str, fallback: Address) -> Address {
    std::env::var(key)
        .ok()
        .and_then(|raw| Address::from_str(raw.trim()).ok())
        .unwrap_or(fallback)
}

impl Default for SentryConfig {
    fn default() -> Self {
        let owner = env_address("SENTRY_OWNER_ADDRESS", Address::repeat_byte(0x01));
        Self {
            bind_addr: std::env::var("SENTRY_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            owner,
            agent: env_address("SENTRY_AGENT_ADDRESS", owner),
            context_dir: std::env::var("SENTRY_CONTEXT_DIR")
                .unwrap_or_else(|_| "./contexts".to_string()),
            staleness_secs: std::env::var("SENTRY_STALENESS_HOURS")
                .ok()
                .and_then(|raw| raw.parse::<i64>().ok())
                .map(|hours| hours * 3600)
                .unwrap_or(DEFAULT_STALENESS_SECS),
            max_concurrent_scans: 50,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        let config = SentryConfig::default();
        assert_eq!(config.agent, config.owner);
        assert_eq!(config.staleness_secs, DEFAULT_STALENESS_SECS);
        assert_eq!(config.max_concurrent_scans, 50);
    }
}
