//! Canonical risk registry
//!
//! One access-controlled, pausable record per token. All state sits behind a
//! single lock, so every operation observes one sequential history and
//! concurrent updates resolve last-writer-wins with no partial merges.
//! Every successful mutation appends to an event log; the records map is the
//! materialized "current" projection of that log.

use alloy_primitives::Address;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;
use tracing::info;

use crate::models::errors::{AppError, AppResult};
use crate::models::types::RiskLevel;

/// Default staleness threshold: 24 hours
pub const DEFAULT_STALENESS_SECS: i64 = 24 * 3600;

/// Neutral score stamped on registration, before the first real update
pub const NEUTRAL_SCORE: u8 = 50;

/// Registry configuration. The owner capability is handed in here, not read
/// from ambient state.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub owner: Address,
    pub staleness_secs: i64,
}

impl RegistryConfig {
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            staleness_secs: DEFAULT_STALENESS_SECS,
        }
    }

    pub fn with_staleness_secs(mut self, secs: i64) -> Self {
        self.staleness_secs = secs;
        self
    }
}

/// Alert reasons, first matching condition wins, at most one per update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertReason {
    CriticalRisk,
    HoneypotWarning,
    RugPullWarning,
}

impl AlertReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertReason::CriticalRisk => "CRITICAL_RISK",
            AlertReason::HoneypotWarning => "HONEYPOT_WARNING",
            AlertReason::RugPullWarning => "RUG_PULL_WARNING",
        }
    }
}

/// Append-only registry event log entries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum RegistryEvent {
    TokenRegistered {
        token: Address,
        record_id: u64,
        timestamp: i64,
    },
    RiskScoreUpdated {
        token: Address,
        risk_score: u8,
        risk_level: RiskLevel,
        updated_by: Address,
        timestamp: i64,
    },
    AlertTriggered {
        token: Address,
        reason: AlertReason,
        risk_score: u8,
        timestamp: i64,
    },
    AgentAuthorized {
        agent: Address,
        timestamp: i64,
    },
    AgentRevoked {
        agent: Address,
        timestamp: i64,
    },
}

/// The materialized current state for one token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskRecord {
    pub record_id: u64,
    pub token_address: Address,
    pub risk_score: u8,
    pub honeypot_score: u8,
    pub rug_pull_score: u8,
    pub liquidity_score: u8,
    pub last_updated: i64,
    pub is_active: bool,
    pub risk_level: RiskLevel,
}

/// The four score inputs of one update, each in [0,100]
#[derive(Debug, Clone, Copy)]
pub struct ScoreUpdate {
    pub risk: u8,
    pub honeypot: u8,
    pub rug_pull: u8,
    pub liquidity: u8,
}

/// Read-side answer for the lightweight query path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskQuery {
    pub risk_score: u8,
    pub risk_level: RiskLevel,
    pub last_updated: i64,
    pub is_stale: bool,
}

struct RegistryState {
    records: HashMap<Address, RiskRecord>,
    next_record_id: u64,
    authorized: HashSet<Address>,
    paused: bool,
    events: Vec<RegistryEvent>,
}

pub struct RiskRegistry {
    config: RegistryConfig,
    state: RwLock<RegistryState>,
}

fn now_ts() -> i64 {
    Utc::now().timestamp()
}

impl RiskRegistry {
    fn write_state(&self) -> AppResult<std::sync::RwLockWriteGuard<'_, RegistryState>> {
        self.state
            .write()
            .map_err(|_| AppError::internal("registry lock poisoned"))
    }

    fn read_state(&self) -> AppResult<std::sync::RwLockReadGuard<'_, RegistryState>> {
        self.state
            .read()
            .map_err(|_| AppError::internal("registry lock poisoned"))
    }

    pub fn new(config: RegistryConfig) -> Self {
        Self {
            config,
            state: RwLock::new(RegistryState {
                records: HashMap::new(),
                next_record_id: 1,
                authorized: HashSet::new(),
                paused: false,
                events: Vec::new(),
            }),
        }
    }

    pub fn owner(&self) -> Address {
        self.config.owner
    }

    fn is_writer(&self, state: &RegistryState, caller: Address) -> bool {
        caller == self.config.owner || state.authorized.contains(&caller)
    }

    fn require_owner(&self, caller: Address) -> AppResult<()> {
        if caller != self.config.owner {
            return Err(AppError::not_owner(format!(
                "Caller {} is not the registry owner",
                caller
            )));
        }
        Ok(())
    }

    // ============================================
    // Write operations
    // ============================================

    /// Register a token once, ever. The record starts with neutral defaults
    /// and stays PENDING until the first score update.
    pub fn register_token(&self, caller: Address, token: Address) -> AppResult<u64> {
        if token == Address::ZERO {
            return Err(AppError::zero_address("token"));
        }
        let mut state = self.write_state()?;
        if state.paused {
            return Err(AppError::paused());
        }
        if state.records.contains_key(&token) {
            return Err(AppError::already_registered(token));
        }
        if !self.is_writer(&state, caller) {
            return Err(AppError::unauthorized(format!(
                "Caller {} is not an authorized writer",
                caller
            )));
        }

        let record_id = state.next_record_id;
        state.next_record_id += 1;
        let timestamp = now_ts();
        state.records.insert(
            token,
            RiskRecord {
                record_id,
                token_address: token,
                risk_score: NEUTRAL_SCORE,
                honeypot_score: NEUTRAL_SCORE,
                rug_pull_score: NEUTRAL_SCORE,
                liquidity_score: NEUTRAL_SCORE,
                last_updated: timestamp,
                is_active: true,
                risk_level: RiskLevel::Pending,
            },
        );
        state.events.push(RegistryEvent::TokenRegistered {
            token,
            record_id,
            timestamp,
        });
        info!("Token {} registered as record {}", token, record_id);
        Ok(record_id)
    }

    /// Replace the whole record atomically and recompute the level. Emits
    /// RiskScoreUpdated, then at most one AlertTriggered.
    pub fn update_risk_score(
        &self,
        caller: Address,
        token: Address,
        update: ScoreUpdate,
    ) -> AppResult<()> {
        let mut state = self.write_state()?;
        if state.paused {
            return Err(AppError::paused());
        }
        for (name, value) in [
            ("risk", update.risk),
            ("honeypot", update.honeypot),
            ("rug_pull", update.rug_pull),
            ("liquidity", update.liquidity),
        ] {
            if value > 100 {
                return Err(AppError::score_out_of_range(name, value));
            }
        }
        if !state.records.contains_key(&token) {
            return Err(AppError::not_registered(token));
        }
        if !self.is_writer(&state, caller) {
            return Err(AppError::unauthorized(format!(
                "Caller {} is not an authorized writer",
                caller
            )));
        }

        let timestamp = now_ts();
        let risk_level = RiskLevel::from_score(update.risk);
        let record = state
            .records
            .get_mut(&token)
            .ok_or_else(|| AppError::not_registered(token))?;
        // last_updated never decreases, even against clock skew
        let last_updated = timestamp.max(record.last_updated);
        *record = RiskRecord {
            record_id: record.record_id,
            token_address: token,
            risk_score: update.risk,
            honeypot_score: update.honeypot,
            rug_pull_score: update.rug_pull,
            liquidity_score: update.liquidity,
            last_updated,
            is_active: true,
            risk_level,
        };

        state.events.push(RegistryEvent::RiskScoreUpdated {
            token,
            risk_score: update.risk,
            risk_level,
            updated_by: caller,
            timestamp,
        });

        let alert = if update.risk >= 80 {
            Some(AlertReason::CriticalRisk)
        } else if update.honeypot >= 70 {
            Some(AlertReason::HoneypotWarning)
        } else if update.rug_pull >= 70 {
            Some(AlertReason::RugPullWarning)
        } else {
            None
        };
        if let Some(reason) = alert {
            state.events.push(RegistryEvent::AlertTriggered {
                token,
                reason,
                risk_score: update.risk,
                timestamp,
            });
            info!(
                "Alert {} for token {} (risk {})",
                reason.as_str(),
                token,
                update.risk
            );
        }
        Ok(())
    }

    /// Add an agent to the writer set. Owner only; idempotent.
    pub fn authorize_agent(&self, caller: Address, agent: Address) -> AppResult<()> {
        self.require_owner(caller)?;
        if agent == Address::ZERO {
            return Err(AppError::zero_address("agent"));
        }
        let mut state = self.write_state()?;
        if state.authorized.insert(agent) {
            state.events.push(RegistryEvent::AgentAuthorized {
                agent,
                timestamp: now_ts(),
            });
            info!("Agent {} authorized", agent);
        }
        Ok(())
    }

    /// Remove an agent from the writer set. Owner only; idempotent.
    pub fn revoke_agent(&self, caller: Address, agent: Address) -> AppResult<()> {
        self.require_owner(caller)?;
        if agent == Address::ZERO {
            return Err(AppError::zero_address("agent"));
        }
        let mut state = self.write_state()?;
        if state.authorized.remove(&agent) {
            state.events.push(RegistryEvent::AgentRevoked {
                agent,
                timestamp: now_ts(),
            });
            info!("Agent {} revoked", agent);
        }
        Ok(())
    }

    /// Circuit breaker: blocks every mutating operation for every caller
    pub fn pause(&self, caller: Address) -> AppResult<()> {
        self.require_owner(caller)?;
        let mut state = self.write_state()?;
        state.paused = true;
        info!("Registry paused");
        Ok(())
    }

    pub fn unpause(&self, caller: Address) -> AppResult<()> {
        self.require_owner(caller)?;
        let mut state = self.write_state()?;
        state.paused = false;
        info!("Registry unpaused");
        Ok(())
    }

    // ============================================
    // Read operations
    // ============================================

    /// Score, level, last update and read-time staleness for one token
    pub fn query_risk(&self, token: Address) -> AppResult<RiskQuery> {
        self.query_risk_at(token, now_ts())
    }

    /// Staleness is computed against the supplied clock, never stored
    pub fn query_risk_at(&self, token: Address, now: i64) -> AppResult<RiskQuery> {
        let state = self.read_state()?;
        let record = state
            .records
            .get(&token)
            .ok_or_else(|| AppError::not_registered(token))?;
        Ok(RiskQuery {
            risk_score: record.risk_score,
            risk_level: record.risk_level,
            last_updated: record.last_updated,
            is_stale: now - record.last_updated > self.config.staleness_secs,
        })
    }

    pub fn get_full_report(&self, token: Address) -> AppResult<RiskRecord> {
        let state = self.read_state()?;
        state
            .records
            .get(&token)
            .cloned()
            .ok_or_else(|| AppError::not_registered(token))
    }

    /// Never errors: unregistered and never-scored tokens are simply unsafe
    pub fn is_safe(&self, token: Address, max_risk: u8) -> bool {
        match self.read_state() {
            Ok(state) => match state.records.get(&token) {
                Some(record) if record.risk_level != RiskLevel::Pending => {
                    record.risk_score <= max_risk
                }
                _ => false,
            },
            Err(_) => false,
        }
    }

    pub fn is_registered(&self, token: Address) -> bool {
        self.read_state()
            .map(|state| state.records.contains_key(&token))
            .unwrap_or(false)
    }

    pub fn is_paused(&self) -> bool {
        self.read_state().map(|state| state.paused).unwrap_or(false)
    }

    pub fn total_tokens(&self) -> u64 {
        self.read_state()
            .map(|state| state.records.len() as u64)
            .unwrap_or(0)
    }

    /// Snapshot of the append-only event log
    pub fn events(&self) -> Vec<RegistryEvent> {
        self.read_state()
            .map(|state| state.events.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        Address::repeat_byte(0x01)
    }

    fn agent() -> Address {
        Address::repeat_byte(0x02)
    }

    fn stranger() -> Address {
        Address::repeat_byte(0x03)
    }

    fn token_a() -> Address {
        Address::repeat_byte(0xaa)
    }

    fn registry() -> RiskRegistry {
        let reg = RiskRegistry::new(RegistryConfig::new(owner()));
        reg.authorize_agent(owner(), agent()).unwrap();
        reg
    }

    fn update(risk: u8, honeypot: u8, rug: u8, liq: u8) -> ScoreUpdate {
        ScoreUpdate {
            risk,
            honeypot,
            rug_pull: rug,
            liquidity: liq,
        }
    }

    #[test]
    fn test_register_is_one_shot_for_any_caller() {
        let reg = registry();
        reg.register_token(agent(), token_a()).unwrap();

        let again = reg.register_token(agent(), token_a());
        assert_eq!(again.unwrap_err().code_str(), "REG_ALREADY_REGISTERED");
        // Same failure for a different caller, even the owner
        let by_owner = reg.register_token(owner(), token_a());
        assert_eq!(by_owner.unwrap_err().code_str(), "REG_ALREADY_REGISTERED");
    }

    #[test]
    fn test_register_rejects_zero_and_unauthorized() {
        let reg = registry();
        assert_eq!(
            reg.register_token(agent(), Address::ZERO)
                .unwrap_err()
                .code_str(),
            "INPUT_ZERO_ADDRESS"
        );
        assert_eq!(
            reg.register_token(stranger(), token_a())
                .unwrap_err()
                .code_str(),
            "REG_UNAUTHORIZED"
        );
    }

    #[test]
    fn test_fresh_record_has_neutral_defaults() {
        let reg = registry();
        let id = reg.register_token(agent(), token_a()).unwrap();
        assert_eq!(id, 1);

        let record = reg.get_full_report(token_a()).unwrap();
        assert_eq!(record.risk_score, 50);
        assert_eq!(record.risk_level, RiskLevel::Pending);
        assert_eq!(record.risk_level.as_str(), "PENDING");
        assert!(record.is_active);
    }

    #[test]
    fn test_record_ids_are_monotonic() {
        let reg = registry();
        let a = reg.register_token(agent(), Address::repeat_byte(0x10)).unwrap();
        let b = reg.register_token(agent(), Address::repeat_byte(0x11)).unwrap();
        let c = reg.register_token(agent(), Address::repeat_byte(0x12)).unwrap();
        assert!(a < b && b < c);
        assert_eq!(reg.total_tokens(), 3);
    }

    #[test]
    fn test_update_replaces_whole_record_and_levels() {
        let reg = registry();
        reg.register_token(agent(), token_a()).unwrap();
        reg.update_risk_score(agent(), token_a(), update(75, 60, 80, 30))
            .unwrap();

        let record = reg.get_full_report(token_a()).unwrap();
        assert_eq!(record.risk_level, RiskLevel::High);
        assert_eq!(record.honeypot_score, 60);
        assert_eq!(record.rug_pull_score, 80);
        assert_eq!(record.liquidity_score, 30);
    }

    #[test]
    fn test_update_rejects_any_value_over_100() {
        let reg = registry();
        reg.register_token(agent(), token_a()).unwrap();

        for bad in [
            update(101, 0, 0, 0),
            update(0, 101, 0, 0),
            update(0, 0, 101, 0),
            update(0, 0, 0, 101),
        ] {
            let err = reg.update_risk_score(agent(), token_a(), bad).unwrap_err();
            assert_eq!(err.code_str(), "REG_SCORE_OUT_OF_RANGE");
        }
        // Record untouched
        let record = reg.get_full_report(token_a()).unwrap();
        assert_eq!(record.risk_level, RiskLevel::Pending);
    }

    #[test]
    fn test_update_before_registration_fails() {
        let reg = registry();
        let err = reg
            .update_risk_score(agent(), token_a(), update(10, 10, 10, 10))
            .unwrap_err();
        assert_eq!(err.code_str(), "REG_NOT_REGISTERED");
    }

    #[test]
    fn test_at_most_one_alert_first_match_wins() {
        let reg = registry();
        reg.register_token(agent(), token_a()).unwrap();
        // overall 85 beats honeypot/rugpull conditions
        reg.update_risk_score(agent(), token_a(), update(85, 30, 30, 50))
            .unwrap();

        let alerts: Vec<_> = reg
            .events()
            .into_iter()
            .filter_map(|e| match e {
                RegistryEvent::AlertTriggered { reason, .. } => Some(reason),
                _ => None,
            })
            .collect();
        assert_eq!(alerts, vec![AlertReason::CriticalRisk]);
    }

    #[test]
    fn test_honeypot_and_rugpull_alerts() {
        let reg = registry();
        let t1 = Address::repeat_byte(0x21);
        let t2 = Address::repeat_byte(0x22);
        reg.register_token(agent(), t1).unwrap();
        reg.register_token(agent(), t2).unwrap();

        reg.update_risk_score(agent(), t1, update(50, 75, 10, 50)).unwrap();
        reg.update_risk_score(agent(), t2, update(50, 10, 75, 50)).unwrap();

        let alerts: Vec<_> = reg
            .events()
            .into_iter()
            .filter_map(|e| match e {
                RegistryEvent::AlertTriggered { token, reason, .. } => Some((token, reason)),
                _ => None,
            })
            .collect();
        assert_eq!(
            alerts,
            vec![
                (t1, AlertReason::HoneypotWarning),
                (t2, AlertReason::RugPullWarning)
            ]
        );
    }

    #[test]
    fn test_no_alert_below_thresholds() {
        let reg = registry();
        reg.register_token(agent(), token_a()).unwrap();
        reg.update_risk_score(agent(), token_a(), update(79, 69, 69, 0))
            .unwrap();
        assert!(!reg
            .events()
            .iter()
            .any(|e| matches!(e, RegistryEvent::AlertTriggered { .. })));
    }

    #[test]
    fn test_pause_blocks_every_writer_and_unpause_restores() {
        let reg = registry();
        reg.register_token(agent(), token_a()).unwrap();
        reg.pause(owner()).unwrap();
        assert!(reg.is_paused());

        let t2 = Address::repeat_byte(0x44);
        assert_eq!(
            reg.register_token(agent(), t2).unwrap_err().code_str(),
            "REG_PAUSED"
        );
        assert_eq!(
            reg.register_token(owner(), t2).unwrap_err().code_str(),
            "REG_PAUSED"
        );
        assert_eq!(
            reg.update_risk_score(agent(), token_a(), update(10, 10, 10, 10))
                .unwrap_err()
                .code_str(),
            "REG_PAUSED"
        );

        // Reads still work while paused
        assert!(reg.query_risk(token_a()).is_ok());

        reg.unpause(owner()).unwrap();
        reg.register_token(agent(), t2).unwrap();
        reg.update_risk_score(agent(), token_a(), update(10, 10, 10, 10))
            .unwrap();
    }

    #[test]
    fn test_pause_is_owner_only() {
        let reg = registry();
        assert_eq!(reg.pause(agent()).unwrap_err().code_str(), "REG_NOT_OWNER");
        assert_eq!(
            reg.unpause(stranger()).unwrap_err().code_str(),
            "REG_NOT_OWNER"
        );
    }

    #[test]
    fn test_authorize_and_revoke() {
        let reg = RiskRegistry::new(RegistryConfig::new(owner()));
        assert_eq!(
            reg.register_token(agent(), token_a())
                .unwrap_err()
                .code_str(),
            "REG_UNAUTHORIZED"
        );

        reg.authorize_agent(owner(), agent()).unwrap();
        reg.register_token(agent(), token_a()).unwrap();

        reg.revoke_agent(owner(), agent()).unwrap();
        let t2 = Address::repeat_byte(0x45);
        assert_eq!(
            reg.register_token(agent(), t2).unwrap_err().code_str(),
            "REG_UNAUTHORIZED"
        );

        // Owner gate on the set itself
        assert_eq!(
            reg.authorize_agent(agent(), stranger())
                .unwrap_err()
                .code_str(),
            "REG_NOT_OWNER"
        );
        assert_eq!(
            reg.authorize_agent(owner(), Address::ZERO)
                .unwrap_err()
                .code_str(),
            "INPUT_ZERO_ADDRESS"
        );
    }

    #[test]
    fn test_is_safe_semantics() {
        let reg = registry();
        // Unregistered: false, never an error
        assert!(!reg.is_safe(token_a(), 100));

        reg.register_token(agent(), token_a()).unwrap();
        // Registered but never scored: the neutral 50 must not pass
        assert!(!reg.is_safe(token_a(), 60));

        reg.update_risk_score(agent(), token_a(), update(40, 10, 10, 90))
            .unwrap();
        assert!(reg.is_safe(token_a(), 40));
        assert!(!reg.is_safe(token_a(), 39));
    }

    #[test]
    fn test_query_risk_staleness_at_read_time() {
        let reg = RiskRegistry::new(
            RegistryConfig::new(owner()).with_staleness_secs(3600),
        );
        reg.authorize_agent(owner(), agent()).unwrap();
        reg.register_token(agent(), token_a()).unwrap();
        reg.update_risk_score(agent(), token_a(), update(30, 10, 10, 80))
            .unwrap();

        let fresh = reg.query_risk(token_a()).unwrap();
        assert!(!fresh.is_stale);

        let later = reg
            .query_risk_at(token_a(), fresh.last_updated + 3601)
            .unwrap();
        assert!(later.is_stale);
        assert_eq!(later.risk_score, 30);
        assert_eq!(later.risk_level, RiskLevel::Low);
    }

    #[test]
    fn test_query_unregistered_fails() {
        let reg = registry();
        assert_eq!(
            reg.query_risk(token_a()).unwrap_err().code_str(),
            "REG_NOT_REGISTERED"
        );
        assert_eq!(
            reg.get_full_report(token_a()).unwrap_err().code_str(),
            "REG_NOT_REGISTERED"
        );
    }

    #[test]
    fn test_event_log_is_append_only_history() {
        let reg = registry();
        reg.register_token(agent(), token_a()).unwrap();
        reg.update_risk_score(agent(), token_a(), update(85, 0, 0, 0))
            .unwrap();

        let events = reg.events();
        // authorize (from fixture), register, update, alert
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], RegistryEvent::AgentAuthorized { .. }));
        assert!(matches!(events[1], RegistryEvent::TokenRegistered { .. }));
        assert!(matches!(events[2], RegistryEvent::RiskScoreUpdated { .. }));
        assert!(matches!(events[3], RegistryEvent::AlertTriggered { .. }));
    }

    #[test]
    fn test_concurrent_updates_last_writer_wins() {
        use std::sync::Arc;
        let reg = Arc::new(registry());
        reg.register_token(agent(), token_a()).unwrap();

        let mut handles = Vec::new();
        for risk in 1..=20u8 {
            let reg = reg.clone();
            handles.push(std::thread::spawn(move || {
                reg.update_risk_score(agent(), token_a(), update(risk, 0, 0, 0))
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // The record matches exactly one of the submitted updates
        let record = reg.get_full_report(token_a()).unwrap();
        assert!((1..=20).contains(&record.risk_score));
        // And the log holds all twenty serialized updates
        let updates = reg
            .events()
            .iter()
            .filter(|e| matches!(e, RegistryEvent::RiskScoreUpdated { .. }))
            .count();
        assert_eq!(updates, 20);
    }
}
