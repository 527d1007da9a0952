//! API Request Handlers

use alloy_primitives::Address;
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{error, info};

use super::types::*;
use crate::core::publish::RiskPublisher;
use crate::core::registry::RiskRegistry;
use crate::models::errors::AppError;
use crate::models::types::{parse_token_address, AggregateReport};
use crate::telemetry::ScanStats;

/// Safety threshold applied when the caller does not pass one
const DEFAULT_MAX_RISK: u8 = 40;

/// Most recent feed entries returned by /feed
const FEED_LIMIT: usize = 100;

/// Shared application state
pub struct AppState {
    pub publisher: Arc<RiskPublisher>,
    pub registry: Arc<RiskRegistry>,
    pub stats: Arc<ScanStats>,
    /// Latest aggregate report per token, last-write-wins
    pub reports: DashMap<Address, AggregateReport>,
    pub scan_semaphore: Arc<Semaphore>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        publisher: Arc<RiskPublisher>,
        registry: Arc<RiskRegistry>,
        max_concurrent_scans: usize,
    ) -> Self {
        Self {
            publisher,
            registry,
            stats: Arc::new(ScanStats::new()),
            reports: DashMap::new(),
            scan_semaphore: Arc::new(Semaphore::new(max_concurrent_scans)),
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

type HandlerError = (StatusCode, Json<ApiResponse<()>>);

fn reject(err: &AppError, start: Instant) -> HandlerError {
    let status = StatusCode::from_u16(err.code.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ApiResponse::error(
            ApiError::from(err),
            start.elapsed().as_secs_f64() * 1000.0,
        )),
    )
}

// ============================================
// Health Check
// ============================================

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();
    let data = HealthData {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    };
    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}

// ============================================
// Scan & Publish
// ============================================

pub async fn scan_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ScanRequest>,
) -> Result<Json<ApiResponse<ScanData>>, HandlerError> {
    let start = Instant::now();

    let token = parse_token_address(&req.token_address).map_err(|e| reject(&e, start))?;

    let _permit = state
        .scan_semaphore
        .acquire()
        .await
        .map_err(|_| reject(&AppError::internal("scan limiter closed"), start))?;

    let outcome = match state.publisher.scan_and_publish(token).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Scan failed for {}: {}", token, e);
            return Err(reject(&e, start));
        }
    };

    state.stats.record_scan(&outcome.report);
    state.stats.record_publish(outcome.published);
    state.reports.insert(token, outcome.report.clone());

    info!(
        "Scan {} -> {} ({}) published={}",
        token,
        outcome.report.overall_risk,
        outcome.report.risk_level.as_str(),
        outcome.published
    );

    let data = ScanData {
        scan_id: uuid::Uuid::new_v4().to_string(),
        outcome,
    };
    Ok(Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    )))
}

// ============================================
// Registry reads
// ============================================

pub async fn get_token(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
) -> Result<Json<ApiResponse<TokenReportData>>, HandlerError> {
    let start = Instant::now();
    let token = parse_token_address(&address).map_err(|e| reject(&e, start))?;

    let record = state
        .registry
        .get_full_report(token)
        .map_err(|e| reject(&e, start))?;
    let query = state
        .registry
        .query_risk(token)
        .map_err(|e| reject(&e, start))?;

    Ok(Json(ApiResponse::success(
        TokenReportData {
            record,
            is_stale: query.is_stale,
        },
        start.elapsed().as_secs_f64() * 1000.0,
    )))
}

pub async fn check_safe(
    State(state): State<Arc<AppState>>,
    Path(address): Path<String>,
    Query(params): Query<SafeQuery>,
) -> Result<Json<ApiResponse<SafeData>>, HandlerError> {
    let start = Instant::now();
    let token = parse_token_address(&address).map_err(|e| reject(&e, start))?;

    let max_risk = params.max_risk.unwrap_or(DEFAULT_MAX_RISK);
    let data = SafeData {
        token_address: format!("{:#x}", token),
        max_risk,
        is_safe: state.registry.is_safe(token, max_risk),
    };
    Ok(Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    )))
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatsData>> {
    let start = Instant::now();
    let data = StatsData {
        total_tokens: state.registry.total_tokens(),
        uptime_seconds: state.uptime_seconds(),
        pipeline: state.stats.snapshot(),
    };
    Json(ApiResponse::success(
        data,
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}

pub async fn get_feed(State(state): State<Arc<AppState>>) -> Json<ApiResponse<FeedData>> {
    let start = Instant::now();
    let mut events = state.registry.events();
    if events.len() > FEED_LIMIT {
        events = events.split_off(events.len() - FEED_LIMIT);
    }
    Json(ApiResponse::success(
        FeedData { events },
        start.elapsed().as_secs_f64() * 1000.0,
    ))
}
