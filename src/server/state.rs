//! Server state management

use std::sync::Arc;

use axum::extract::FromRef;

use super::shutdown::ShutdownState;
use crate::config::SimulatorConfig;
use crate::engine::SimulationEngine;
use crate::error::SimulatorResult;
use crate::store::{InMemoryTrafficLog, MockStore};
use crate::telemetry::SimulatorMetrics;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SimulationEngine>,
    pub store: Arc<MockStore>,
    pub traffic_log: Arc<InMemoryTrafficLog>,
    pub metrics: Arc<SimulatorMetrics>,
    pub config: Arc<SimulatorConfig>,
    pub shutdown: Arc<ShutdownState>,
}

impl AppState {
    /// Build the store, log and engine, loading any configured mocks
    pub fn new(config: SimulatorConfig) -> SimulatorResult<Self> {
        let store = Arc::new(MockStore::new(config.route_rules()));
        store.seed(&config.mocks)?;

        let traffic_log = Arc::new(InMemoryTrafficLog::new(
            config.traffic_log.max_entries_per_server,
        ));
        let metrics = Arc::new(SimulatorMetrics::new());
        let engine = SimulationEngine::new(&config, store.clone(), traffic_log.clone())
            .with_metrics(metrics.clone());

        let state = Self {
            engine: Arc::new(engine),
            store,
            traffic_log,
            metrics,
            shutdown: Arc::new(ShutdownState::new(config.server.drain_timeout)),
            config: Arc::new(config),
        };
        state.refresh_mock_gauges();

        Ok(state)
    }

    /// Publish current server and route totals
    pub fn refresh_mock_gauges(&self) {
        self.metrics
            .set_mock_counts(self.store.server_count(), self.store.route_count());
    }
}

impl FromRef<AppState> for Arc<ShutdownState> {
    fn from_ref(state: &AppState) -> Self {
        state.shutdown.clone()
    }
}
