//! Health, metrics and admin handlers

use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::info;

use super::state::AppState;
use crate::engine::EngineStats;

// ============== Admin Handlers ==============

/// GET /admin/stats
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        engine: state.engine.stats(),
        mock_servers: state.store.server_count(),
        mock_routes: state.store.route_count(),
        traffic_log_entries: state.traffic_log.len(),
    })
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub engine: EngineStats,
    pub mock_servers: usize,
    pub mock_routes: usize,
    pub traffic_log_entries: usize,
}

/// POST /admin/stats/reset
pub async fn reset_stats(State(state): State<AppState>) -> StatusCode {
    state.engine.reset_stats();
    StatusCode::NO_CONTENT
}

/// POST /admin/chaos/enable
pub async fn enable_chaos(State(state): State<AppState>) -> Json<ChaosStatusResponse> {
    state.engine.chaos_policy().set_enabled(true);
    info!("Chaos injection enabled");
    chaos_status(State(state)).await
}

/// POST /admin/chaos/disable
pub async fn disable_chaos(State(state): State<AppState>) -> Json<ChaosStatusResponse> {
    state.engine.chaos_policy().set_enabled(false);
    info!("Chaos injection disabled");
    chaos_status(State(state)).await
}

/// GET /admin/chaos/status
pub async fn chaos_status(State(state): State<AppState>) -> Json<ChaosStatusResponse> {
    let stats = state.engine.stats();
    Json(ChaosStatusResponse {
        enabled: state.engine.chaos_policy().is_enabled(),
        latency_enabled: state.engine.latency_simulator().is_enabled(),
        injected_total: stats.chaos_injected,
        error_message: state.config.chaos.error_message.clone(),
    })
}

#[derive(Debug, Serialize)]
pub struct ChaosStatusResponse {
    pub enabled: bool,
    pub latency_enabled: bool,
    pub injected_total: u64,
    pub error_message: String,
}

// ============== Health Handlers ==============

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<DetailedHealthResponse> {
    let mut checks = HashMap::new();
    let mut overall_status = HealthStatus::Healthy;

    checks.insert("engine".to_string(), check_engine(&state));

    let store_check = check_store(&state);
    if store_check.status == ComponentStatus::Warn {
        overall_status = HealthStatus::Degraded;
    }
    checks.insert("store".to_string(), store_check);

    let log_check = check_traffic_log(&state);
    if log_check.status == ComponentStatus::Warn {
        overall_status = HealthStatus::Degraded;
    }
    checks.insert("traffic_log".to_string(), log_check);

    if state.shutdown.is_draining() {
        overall_status = HealthStatus::Unhealthy;
        checks.insert(
            "shutdown".to_string(),
            ComponentHealth {
                status: ComponentStatus::Fail,
                message: Some("Server is draining".to_string()),
                value: None,
            },
        );
    }

    Json(DetailedHealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.engine.uptime().as_secs(),
        timestamp: chrono::Utc::now(),
        checks,
    })
}

/// GET /ready
pub async fn ready_check(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    if !state.shutdown.is_ready() {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyResponse {
                ready: false,
                reason: Some("Server is draining".to_string()),
            }),
        );
    }

    (
        StatusCode::OK,
        Json(ReadyResponse {
            ready: true,
            reason: None,
        }),
    )
}

/// GET /metrics
pub async fn metrics(State(state): State<AppState>) -> String {
    state.refresh_mock_gauges();
    state.metrics.export()
}

fn check_engine(state: &AppState) -> ComponentHealth {
    let stats = state.engine.stats();
    ComponentHealth {
        status: ComponentStatus::Pass,
        message: Some(format!("Simulated {} requests", stats.total_requests)),
        value: Some(stats.total_requests as f64),
    }
}

fn check_store(state: &AppState) -> ComponentHealth {
    let servers = state.store.server_count();
    if servers == 0 {
        ComponentHealth {
            status: ComponentStatus::Warn,
            message: Some("No mock servers configured".to_string()),
            value: Some(0.0),
        }
    } else {
        ComponentHealth {
            status: ComponentStatus::Pass,
            message: Some(format!(
                "{} mock servers, {} routes",
                servers,
                state.store.route_count()
            )),
            value: Some(servers as f64),
        }
    }
}

fn check_traffic_log(state: &AppState) -> ComponentHealth {
    let failures = state.engine.stats().log_write_failures;
    if failures > 0 {
        ComponentHealth {
            status: ComponentStatus::Warn,
            message: Some(format!("{} log writes failed", failures)),
            value: Some(failures as f64),
        }
    } else {
        ComponentHealth {
            status: ComponentStatus::Pass,
            message: Some(format!("{} entries retained", state.traffic_log.len())),
            value: None,
        }
    }
}

/// Detailed health response following health check RFC
#[derive(Debug, Clone, Serialize)]
pub struct DetailedHealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub checks: HashMap<String, ComponentHealth>,
}

/// Overall health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health
#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
}

/// Component status (pass/warn/fail)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Pass,
    Warn,
    Fail,
}

/// Readiness response
#[derive(Debug, Clone, Serialize)]
pub struct ReadyResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// GET /version
pub async fn version() -> Json<VersionResponse> {
    Json(VersionResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        rust_version: env!("CARGO_PKG_RUST_VERSION").to_string(),
    })
}

#[derive(Serialize)]
pub struct VersionResponse {
    pub name: String,
    pub version: String,
    pub rust_version: String,
}

/// GET /
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        name: "Mock Simulator".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: env!("CARGO_PKG_DESCRIPTION").to_string(),
        endpoints: vec![
            "/api/mock/simulator/{prefix}/{path}".to_string(),
            "/api/mocks/servers".to_string(),
            "/api/mocks/routes".to_string(),
            "/api/logs/server/{serverId}".to_string(),
            "/health".to_string(),
            "/metrics".to_string(),
        ],
    })
}

#[derive(Serialize)]
pub struct RootResponse {
    pub name: String,
    pub version: String,
    pub description: String,
    pub endpoints: Vec<String>,
}
