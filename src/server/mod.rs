//! HTTP server implementation
//!
//! Hosts the simulated traffic endpoint next to the management, traffic
//! log, admin and health APIs.

mod handlers;
mod management;
mod middleware;
mod routes;
mod simulator;
mod state;
pub mod shutdown;

pub use handlers::*;
pub use management::*;
pub use middleware::*;
pub use routes::*;
pub use shutdown::*;
pub use simulator::*;
pub use state::*;

use std::net::SocketAddr;

use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::config::SimulatorConfig;
use crate::telemetry::{init_telemetry, shutdown_telemetry};

/// Run the simulator server
pub async fn run_server(config: SimulatorConfig) -> anyhow::Result<()> {
    init_telemetry(&config.telemetry)?;
    config.validate()?;

    let addr: SocketAddr = config.server.socket_addr()?;
    let state = AppState::new(config)?;
    let shutdown_state = state.shutdown.clone();

    info!(
        "Starting Mock Simulator v{} on {}",
        env!("CARGO_PKG_VERSION"),
        addr
    );
    info!(
        servers = state.store.server_count(),
        routes = state.store.route_count(),
        "Loaded mock definitions"
    );
    info!(
        "Latency simulation: {}",
        if state.engine.latency_simulator().is_enabled() { "enabled" } else { "disabled" }
    );
    info!(
        "Chaos injection: {}",
        if state.engine.chaos_policy().is_enabled() { "enabled" } else { "disabled" }
    );

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(graceful_shutdown(shutdown_state))
        .await?;

    info!("Server shutdown complete");
    shutdown_telemetry();
    Ok(())
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    let config = state.config.clone();

    // Simulated responses carry exactly the route's headers and accept any
    // body; the layers below stop at the simulator's own APIs
    let mut api = Router::new()
        .merge(routes::management_routes())
        .merge(routes::log_routes())
        .merge(routes::admin_routes())
        .merge(routes::health_routes())
        .merge(routes::metrics_routes(&config.telemetry.metrics_path))
        .layer(DefaultBodyLimit::max(config.server.max_body_bytes))
        .layer(from_fn(request_id_middleware));

    if let Some(cors) = build_cors_layer(&config.server) {
        api = api.layer(cors);
    }

    let mut router = api
        .merge(routes::simulator_routes())
        .layer(from_fn_with_state(
            state.shutdown.clone(),
            request_tracking_middleware,
        ));

    if config.server.request_logging {
        router = router.layer(from_fn(logging_middleware));
    }

    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(config.server.request_timeout));

    router.layer(middleware).with_state(state)
}
