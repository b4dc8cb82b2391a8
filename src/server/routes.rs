//! Route definitions

use axum::{
    routing::{any, get, post},
    Router,
};

use super::state::AppState;
use super::{handlers, management, shutdown, simulator};

/// Inbound mock traffic for every mock server
pub fn simulator_routes() -> Router<AppState> {
    // `*rest` never matches an empty tail, so the bare base is routed too
    Router::new()
        .route("/api/mock/simulator", any(simulator::simulate))
        .route("/api/mock/simulator/", any(simulator::simulate))
        .route("/api/mock/simulator/*rest", any(simulator::simulate))
}

/// Mock server and route management
pub fn management_routes() -> Router<AppState> {
    Router::new()
        // Servers
        .route("/api/mocks/servers/create", post(management::create_server))
        .route(
            "/api/mocks/servers/:id",
            get(management::get_server)
                .put(management::update_server)
                .delete(management::delete_server),
        )
        .route(
            "/api/mocks/servers/workspace/:workspace_id",
            get(management::list_workspace_servers),
        )
        // Routes
        .route("/api/mocks/routes/create", post(management::create_route))
        .route(
            "/api/mocks/routes/:id",
            get(management::get_route)
                .put(management::update_route)
                .delete(management::delete_route),
        )
        .route(
            "/api/mocks/routes/server/:server_id",
            get(management::list_server_routes),
        )
}

/// Traffic log retrieval
pub fn log_routes() -> Router<AppState> {
    Router::new().route("/api/logs/server/:server_id", get(management::list_server_logs))
}

/// Prometheus exposition at the configured path
pub fn metrics_routes(path: &str) -> Router<AppState> {
    Router::new().route(path, get(handlers::metrics))
}

/// Admin routes
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // Statistics
        .route("/admin/stats", get(handlers::get_stats))
        .route("/admin/stats/reset", post(handlers::reset_stats))
        // Chaos switch
        .route("/admin/chaos/enable", post(handlers::enable_chaos))
        .route("/admin/chaos/disable", post(handlers::disable_chaos))
        .route("/admin/chaos/status", get(handlers::chaos_status))
        // Draining
        .route("/admin/drain", post(shutdown::admin_drain))
        .route("/admin/drain/status", get(shutdown::admin_drain_status))
}

/// Health and info routes
pub fn health_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/healthz", get(handlers::health_check))
        .route("/ready", get(handlers::ready_check))
        .route("/readyz", get(handlers::ready_check))
        // Version info
        .route("/version", get(handlers::version))
        // Root
        .route("/", get(handlers::root))
}
