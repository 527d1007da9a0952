//! Providers Module - External Chain Data Sources
//!
//! The detector pipeline never talks to a chain directly: all bytecode,
//! source, holder, transfer and creator data arrives through the
//! `ChainDataProvider` boundary, already materialized as a `TokenContext`.

use alloy_primitives::Address;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crate::models::errors::{AppError, AppResult};

/// One ranked holder balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolderBalance {
    pub address: Address,
    pub balance: u128,
}

/// One observed token transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRecord {
    pub from: Address,
    pub to: Address,
    pub amount: u128,
    pub timestamp: i64,
}

/// Creator wallet statistics
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CreatorStats {
    pub wallet_age_days: u32,
    pub tokens_deployed: u32,
    /// Balance in native units (ETH-denominated)
    pub native_balance: f64,
}

/// Everything the detectors consume for one token.
/// Optional sections degrade the corresponding detector, never the scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenContext {
    pub token_address: Address,
    #[serde(default)]
    pub token_name: Option<String>,
    #[serde(default)]
    pub token_symbol: Option<String>,
    /// Raw runtime bytecode as hex text (0x prefix optional)
    #[serde(default)]
    pub bytecode: Option<String>,
    /// Verified source text; absence is itself a risk signal
    #[serde(default)]
    pub source_code: Option<String>,
    /// Current owner; the zero address means ownership was renounced
    #[serde(default)]
    pub owner: Option<Address>,
    #[serde(default)]
    pub is_proxy: bool,
    #[serde(default)]
    pub total_supply: u128,
    /// Holder balances ranked descending
    #[serde(default)]
    pub holders: Vec<HolderBalance>,
    #[serde(default)]
    pub transfers: Vec<TransferRecord>,
    #[serde(default)]
    pub creator: Option<CreatorStats>,
}

impl TokenContext {
    pub fn empty(token_address: Address) -> Self {
        Self {
            token_address,
            token_name: None,
            token_symbol: None,
            bytecode: None,
            source_code: None,
            owner: None,
            is_proxy: false,
            total_supply: 0,
            holders: Vec::new(),
            transfers: Vec::new(),
            creator: None,
        }
    }
}

/// Boundary to the external chain-data source
#[async_trait]
pub trait ChainDataProvider: Send + Sync {
    async fn fetch_context(&self, token: Address) -> AppResult<TokenContext>;
}

/// In-memory provider, seeded up front. Used by tests and demos.
#[derive(Default)]
pub struct StaticProvider {
    contexts: DashMap<Address, TokenContext>,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, ctx: TokenContext) {
        self.contexts.insert(ctx.token_address, ctx);
    }
}

#[async_trait]
impl ChainDataProvider for StaticProvider {
    async fn fetch_context(&self, token: Address) -> AppResult<TokenContext> {
        self.contexts
            .get(&token)
            .map(|entry| entry.clone())
            .ok_or_else(|| AppError::data_unavailable(format!("No context for token {}", token)))
    }
}

/// Reads `<dir>/<0xaddress>.json` context snapshots produced by the
/// external data pipeline. Lowercase address file names.
pub struct FileProvider {
    dir: PathBuf,
}

impl FileProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ChainDataProvider for FileProvider {
    async fn fetch_context(&self, token: Address) -> AppResult<TokenContext> {
        let path = self.dir.join(format!("{:#x}.json", token));
        debug!("Loading token context from {}", path.display());
        let raw = tokio::fs::read_to_string(&path).await.map_err(|e| {
            AppError::data_unavailable(format!("Cannot read {}: {}", path.display(), e))
        })?;
        let ctx: TokenContext = serde_json::from_str(&raw)?;
        if ctx.token_address != token {
            return Err(AppError::new(
                crate::models::errors::ErrorCode::DataMalformed,
                format!(
                    "Context file {} declares address {}",
                    path.display(),
                    ctx.token_address
                ),
            ));
        }
        Ok(ctx)
    }
}
