//! # Mock Simulator
//!
//! Serves user-defined mock API routes under per-server path prefixes.
//!
//! Each mock server owns a set of routes describing the response to return
//! for a method and path. Routes can delay their response and randomly fail
//! with a generic 500 to exercise client retry and timeout handling. Every
//! simulated request is written to an append-only traffic log.
//!
//! ## Features
//!
//! - **Live configuration**: route changes apply to the next request
//! - **Latency injection**: non-blocking per-route delays
//! - **Chaos injection**: per-route failure rates with a global kill switch
//! - **Traffic log**: per-server request history with bounded retention
//! - **Observability**: structured tracing and Prometheus metrics
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mock_simulator::{run_server, SimulatorConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = SimulatorConfig::default();
//!     run_server(config).await
//! }
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod latency;
pub mod server;
pub mod store;
pub mod telemetry;
pub mod types;

pub use config::SimulatorConfig;
pub use engine::{InboundRequest, SimulatedResponse, SimulationEngine};
pub use error::{SimulationError, SimulatorResult};
pub use server::run_server;
pub use store::{InMemoryTrafficLog, MockRepository, MockStore, TrafficLog};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default server port
pub const DEFAULT_PORT: u16 = 8080;
