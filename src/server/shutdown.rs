//! Graceful shutdown
//!
//! Tracks in-flight requests, answers 503 once draining has started and
//! waits a bounded time for outstanding requests (including ones parked in
//! a simulated delay) before the listener closes.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::ErrorResponse;

/// Shutdown state for tracking in-flight requests
#[derive(Debug)]
pub struct ShutdownState {
    in_flight: AtomicU64,
    draining: AtomicBool,
    ready: AtomicBool,
    drain_timeout: Duration,
    start_time: Instant,
}

impl ShutdownState {
    pub fn new(drain_timeout: Duration) -> Self {
        Self {
            in_flight: AtomicU64::new(0),
            draining: AtomicBool::new(false),
            ready: AtomicBool::new(true),
            drain_timeout,
            start_time: Instant::now(),
        }
    }

    /// Count a request as in flight until the guard is dropped
    pub fn track(self: &Arc<Self>) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            state: Arc::clone(self),
        }
    }

    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn is_draining(&self) -> bool {
        self.draining.load(Ordering::SeqCst)
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst) && !self.is_draining()
    }

    /// Stop accepting new requests
    pub fn start_drain(&self) {
        if !self.draining.swap(true, Ordering::SeqCst) {
            info!("Starting graceful shutdown, marking as draining");
        }
        self.ready.store(false, Ordering::SeqCst);
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn drain_timeout(&self) -> Duration {
        self.drain_timeout
    }

    pub fn status(&self) -> DrainStatus {
        DrainStatus {
            draining: self.is_draining(),
            in_flight_requests: self.in_flight_count(),
            ready: self.is_ready(),
            uptime_seconds: self.uptime().as_secs(),
        }
    }

    /// Wait for in-flight requests to finish, up to the drain timeout
    pub async fn wait_for_drain(&self) {
        let deadline = tokio::time::Instant::now() + self.drain_timeout;

        while self.in_flight_count() > 0 {
            if tokio::time::Instant::now() >= deadline {
                warn!(
                    remaining_requests = self.in_flight_count(),
                    "Drain timeout exceeded, forcing shutdown"
                );
                return;
            }

            info!(
                in_flight = self.in_flight_count(),
                "Waiting for in-flight requests to complete"
            );
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        info!("All requests drained, proceeding with shutdown");
    }
}

impl Default for ShutdownState {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

/// Decrements the in-flight count on drop, including when the request
/// future is cancelled
pub struct InFlightGuard {
    state: Arc<ShutdownState>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Drain status response
#[derive(Debug, Serialize)]
pub struct DrainStatus {
    pub draining: bool,
    pub in_flight_requests: u64,
    pub ready: bool,
    pub uptime_seconds: u64,
}

/// Request tracking middleware
pub async fn request_tracking_middleware(
    State(shutdown): State<Arc<ShutdownState>>,
    request: Request,
    next: Next,
) -> Result<Response, DrainError> {
    if shutdown.is_draining() {
        return Err(DrainError);
    }

    let _guard = shutdown.track();
    Ok(next.run(request).await)
}

/// Error returned when server is draining
#[derive(Debug)]
pub struct DrainError;

impl IntoResponse for DrainError {
    fn into_response(self) -> Response {
        let body = ErrorResponse::new(
            "service_unavailable",
            "Server is shutting down. Please retry your request.",
        );
        (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
    }
}

/// Resolve once `signal` fires and in-flight requests have drained
pub async fn drain_after<F>(state: Arc<ShutdownState>, signal: F)
where
    F: Future<Output = ()>,
{
    signal.await;
    state.start_drain();
    state.wait_for_drain().await;
}

/// Graceful shutdown on Ctrl-C or SIGTERM
pub async fn graceful_shutdown(state: Arc<ShutdownState>) {
    drain_after(state, os_signal()).await;
}

async fn os_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, starting graceful shutdown"),
    }
}

/// POST /admin/drain
pub async fn admin_drain(State(shutdown): State<Arc<ShutdownState>>) -> Json<DrainStatus> {
    shutdown.start_drain();
    Json(shutdown.status())
}

/// GET /admin/drain/status
pub async fn admin_drain_status(State(shutdown): State<Arc<ShutdownState>>) -> Json<DrainStatus> {
    Json(shutdown.status())
}
