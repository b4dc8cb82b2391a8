//! Core simulation engine
//!
//! The SimulationEngine answers inbound mock traffic:
//! - Resolving the mock server by path prefix
//! - Matching the request to an enabled route
//! - Rolling for chaos injection
//! - Applying the route's delay
//! - Recording every request in the traffic log

mod chaos;
mod matcher;
mod planner;
mod state;

pub use chaos::*;
pub use matcher::*;
pub use planner::*;
pub use state::*;

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::SimulatorConfig;
use crate::error::SimulationError;
use crate::latency::LatencySimulator;
use crate::store::{MockRepository, TrafficLog};
use crate::telemetry::SimulatorMetrics;
use crate::types::*;

/// An inbound simulated request, already split at the path prefix
#[derive(Debug, Clone, PartialEq)]
pub struct InboundRequest {
    pub method: String,
    pub prefix: String,
    /// Path under the prefix, with a leading slash
    pub path: String,
}

impl InboundRequest {
    pub fn new(method: &str, prefix: &str, path: &str) -> Self {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        Self {
            method: method.to_string(),
            prefix: prefix.to_string(),
            path,
        }
    }
}

/// How a dispatch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The route's configured response was sent
    Served,
    /// The chaos roll replaced the route's response with a failure
    ChaosInjected,
    ServerNotFound,
    RouteNotFound,
    /// The caller went away during the delay; never returned to a caller
    Aborted,
}

impl DispatchOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Served => "served",
            Self::ChaosInjected => "chaos",
            Self::ServerNotFound => "server_not_found",
            Self::RouteNotFound => "route_not_found",
            Self::Aborted => "aborted",
        }
    }
}

/// Response produced by a dispatch
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub outcome: DispatchOutcome,
}

impl SimulatedResponse {
    fn from_plan(plan: ResponsePlan, outcome: DispatchOutcome) -> Self {
        Self {
            status: plan.status,
            headers: plan.headers,
            body: plan.body,
            outcome,
        }
    }

    fn from_error(error: SimulationError, outcome: DispatchOutcome) -> Self {
        let body = serde_json::to_vec(&error.to_error_response()).unwrap_or_default();
        Self {
            status: error.status_code().as_u16(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body: Bytes::from(body),
            outcome,
        }
    }

    pub fn is_chaos(&self) -> bool {
        self.outcome == DispatchOutcome::ChaosInjected
    }
}

/// The main simulation engine
pub struct SimulationEngine {
    repository: Arc<dyn MockRepository>,
    traffic_log: Arc<dyn TrafficLog>,
    chaos: ChaosPolicy,
    latency: LatencySimulator,
    metrics: Arc<SimulatorMetrics>,
    state: EngineState,
    start_time: std::time::Instant,
}

impl SimulationEngine {
    /// Create a new engine reading routes from `repository`
    pub fn new(
        config: &SimulatorConfig,
        repository: Arc<dyn MockRepository>,
        traffic_log: Arc<dyn TrafficLog>,
    ) -> Self {
        Self {
            repository,
            traffic_log,
            chaos: ChaosPolicy::new(&config.chaos),
            latency: LatencySimulator::new(&config.latency),
            metrics: Arc::new(SimulatorMetrics::new()),
            state: EngineState::new(),
            start_time: std::time::Instant::now(),
        }
    }

    /// Replace the chaos random source
    pub fn with_random_source(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.chaos = self.chaos.with_random_source(random);
        self
    }

    /// Share a metrics registry with the rest of the server
    pub fn with_metrics(mut self, metrics: Arc<SimulatorMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Answer one inbound request.
    ///
    /// Never fails: misses become 404 responses. Every call that runs to
    /// completion appends one traffic entry; a call dropped during the
    /// delay appends an aborted entry instead.
    pub async fn dispatch(&self, request: InboundRequest) -> SimulatedResponse {
        let mut recorder = TrafficRecorder::start(self, &request);

        let Some(server) = self.repository.server_by_prefix(&request.prefix) else {
            let response = SimulatedResponse::from_error(
                SimulationError::ServerNotFound(request.prefix.clone()),
                DispatchOutcome::ServerNotFound,
            );
            recorder.finish(&response);
            return response;
        };
        recorder.server_id = Some(server.id);

        let routes = self.repository.routes_for_server(server.id);
        let Some(route) = RouteMatcher::find(&routes, &request.method, &request.path) else {
            let response = SimulatedResponse::from_error(
                SimulationError::RouteNotFound {
                    method: request.method.clone(),
                    path: request.path.clone(),
                },
                DispatchOutcome::RouteNotFound,
            );
            recorder.finish(&response);
            return response;
        };
        let resolved_at = Instant::now();
        recorder.route_id = Some(route.id);

        let (plan, outcome) = match self.chaos.decide(route.chaos_settings()) {
            ChaosDecision::Inject => {
                recorder.chaos = true;
                (self.chaos.failure_plan(), DispatchOutcome::ChaosInjected)
            }
            ChaosDecision::Pass => (ResponsePlanner::plan(route), DispatchOutcome::Served),
        };

        self.latency.delay_from(resolved_at, route.delay_ms).await;

        let response = SimulatedResponse::from_plan(plan, outcome);
        recorder.finish(&response);
        response
    }

    fn record(&self, entry: NewTrafficEntry, outcome: DispatchOutcome, elapsed: Duration) {
        if outcome == DispatchOutcome::ChaosInjected {
            self.metrics.record_chaos_injection();
        }
        if outcome == DispatchOutcome::Aborted {
            self.metrics.record_aborted();
        }
        self.metrics.record_request(outcome.as_str(), elapsed);
        let active = self.state.request_finished(outcome, elapsed);
        self.metrics.set_active_requests(active);

        debug!(
            server_id = ?entry.server_id,
            route_id = ?entry.route_id,
            method = %entry.method,
            path = %entry.path,
            status = entry.status_code,
            duration_ms = entry.duration_ms,
            outcome = outcome.as_str(),
            "Simulated request finished"
        );

        if let Err(e) = self.traffic_log.append(entry) {
            warn!(error = %e, "Failed to append traffic log entry");
            self.state.increment_log_failures();
            self.metrics.record_log_write_failure();
        }
    }

    /// Get engine uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Get engine statistics
    pub fn stats(&self) -> EngineStats {
        self.state.stats()
    }

    /// Reset engine statistics
    pub fn reset_stats(&self) {
        self.state.reset();
    }

    pub fn metrics(&self) -> &Arc<SimulatorMetrics> {
        &self.metrics
    }

    /// Get the chaos policy
    pub fn chaos_policy(&self) -> &ChaosPolicy {
        &self.chaos
    }

    /// Get the latency simulator
    pub fn latency_simulator(&self) -> &LatencySimulator {
        &self.latency
    }
}

/// Writes the traffic entry for one dispatch.
///
/// Dropped without [`finish`](Self::finish), it records the request as
/// aborted with the time elapsed so far.
struct TrafficRecorder<'a> {
    engine: &'a SimulationEngine,
    method: String,
    path: String,
    received_at: DateTime<Utc>,
    started: Instant,
    server_id: Option<ServerId>,
    route_id: Option<RouteId>,
    chaos: bool,
    done: bool,
}

impl<'a> TrafficRecorder<'a> {
    fn start(engine: &'a SimulationEngine, request: &InboundRequest) -> Self {
        let active = engine.state.request_started();
        engine.metrics.set_active_requests(active);

        Self {
            engine,
            method: request.method.clone(),
            path: request.path.clone(),
            received_at: Utc::now(),
            started: Instant::now(),
            server_id: None,
            route_id: None,
            chaos: false,
            done: false,
        }
    }

    fn finish(mut self, response: &SimulatedResponse) {
        self.done = true;
        self.write(response.status, TrafficOutcome::Completed, response.outcome);
    }

    fn write(&self, status_code: u16, outcome: TrafficOutcome, dispatch: DispatchOutcome) {
        let elapsed = self.started.elapsed();
        let entry = NewTrafficEntry {
            server_id: self.server_id,
            route_id: self.route_id,
            timestamp: self.received_at,
            method: self.method.clone(),
            path: self.path.clone(),
            status_code,
            duration_ms: elapsed.as_millis() as u64,
            is_chaos_triggered: self.chaos,
            outcome,
        };
        self.engine.record(entry, dispatch, elapsed);
    }
}

impl Drop for TrafficRecorder<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.write(CLIENT_CLOSED_STATUS, TrafficOutcome::Aborted, DispatchOutcome::Aborted);
        }
    }
}
