//! API Request/Response Types

use serde::{Deserialize, Serialize};

use crate::core::publish::PublishOutcome;
use crate::core::registry::{RegistryEvent, RiskRecord};
use crate::models::errors::AppError;
use crate::telemetry::StatsSnapshot;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error payload, code mirrors the internal error taxonomy
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code_str().to_string(),
            message: err.message.clone(),
        }
    }
}

// ============================================
// Scan
// ============================================

#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    pub token_address: String,
}

#[derive(Debug, Serialize)]
pub struct ScanData {
    pub scan_id: String,
    #[serde(flatten)]
    pub outcome: PublishOutcome,
}

// ============================================
// Registry reads
// ============================================

#[derive(Debug, Serialize)]
pub struct TokenReportData {
    pub record: RiskRecord,
    pub is_stale: bool,
}

#[derive(Debug, Deserialize)]
pub struct SafeQuery {
    pub max_risk: Option<u8>,
}

#[derive(Debug, Serialize)]
pub struct SafeData {
    pub token_address: String,
    pub max_risk: u8,
    pub is_safe: bool,
}

#[derive(Debug, Serialize)]
pub struct StatsData {
    pub total_tokens: u64,
    pub uptime_seconds: u64,
    #[serde(flatten)]
    pub pipeline: StatsSnapshot,
}

#[derive(Debug, Serialize)]
pub struct FeedData {
    pub events: Vec<RegistryEvent>,
}

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
