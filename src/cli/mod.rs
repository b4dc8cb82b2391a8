//! CLI Module for Mock Simulator
//!
//! Provides subcommands for:
//! - Starting the simulator server
//! - Managing configuration
//! - Health checking and probing running instances

mod commands;

pub use commands::*;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::VERSION;

/// Mock Simulator: serve configurable mock APIs with latency and chaos
#[derive(Parser, Debug)]
#[command(name = "mock-simulator")]
#[command(version = VERSION)]
#[command(about = "Mock API route simulator with injectable latency and chaos failures")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Global configuration file path (YAML, TOML, or JSON)
    #[arg(short, long, global = true, env = "MOCK_SIMULATOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Global log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "MOCK_SIMULATOR_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Enable JSON log output
    #[arg(long, global = true, env = "MOCK_SIMULATOR_JSON_LOGS")]
    pub json_logs: bool,

    /// Quiet mode - suppress banner and non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the simulator server
    #[command(alias = "s")]
    Serve(ServeCommand),

    /// Configuration management
    #[command(alias = "cfg")]
    Config(ConfigCommand),

    /// Health check a running instance
    Health(HealthCommand),

    /// Fire requests at a mock endpoint and summarise the results
    Probe(ProbeCommand),

    /// Show version and build information
    Version,
}

/// Start the simulator server
#[derive(Parser, Debug)]
pub struct ServeCommand {
    /// Port to listen on
    #[arg(short, long, env = "MOCK_SIMULATOR_PORT")]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "MOCK_SIMULATOR_HOST")]
    pub host: Option<String>,

    /// Disable per-route delays
    #[arg(long)]
    pub no_latency: bool,

    /// Disable chaos injection for every route
    #[arg(long)]
    pub no_chaos: bool,

    /// Request timeout (e.g. 300s, 2m)
    #[arg(long, value_parser = crate::config::parse_duration)]
    pub timeout: Option<std::time::Duration>,

    /// Drain period for graceful shutdown (e.g. 30s)
    #[arg(long, value_parser = crate::config::parse_duration)]
    pub drain_period: Option<std::time::Duration>,
}

/// Configuration management
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show {
        /// Output format (yaml, toml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },

    /// Validate configuration file
    Validate {
        /// Configuration file to validate
        file: PathBuf,
    },

    /// Initialize a new configuration file
    Init {
        /// Output file path; the extension picks the format
        #[arg(short, long, default_value = "mock-simulator.yaml")]
        output: PathBuf,

        /// Include a sample mock server with routes
        #[arg(long)]
        with_sample: bool,

        /// Force overwrite existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show environment variable mappings
    Env,
}

/// Health check a running instance
#[derive(Parser, Debug)]
pub struct HealthCommand {
    /// Base URL of the simulator instance
    #[arg(short, long, default_value = "http://localhost:8080")]
    pub url: String,

    /// Timeout in seconds
    #[arg(short, long, default_value = "5")]
    pub timeout: u64,

    /// Check readiness instead of liveness
    #[arg(short, long)]
    pub ready: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

/// Fire requests at a simulated endpoint
#[derive(Parser, Debug)]
pub struct ProbeCommand {
    /// Full URL of the simulated endpoint
    pub url: String,

    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Number of requests to send
    #[arg(short = 'n', long, default_value = "100")]
    pub requests: usize,

    /// Concurrency level
    #[arg(short = 'j', long, default_value = "10")]
    pub concurrency: usize,

    /// Per-request timeout in seconds
    #[arg(short, long, default_value = "120")]
    pub timeout: u64,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}
