//! Configuration module for the mock simulator
//!
//! Provides layered configuration with support for:
//! - YAML/TOML/JSON config files
//! - Environment variable overrides
//! - Validation before the server starts

mod chaos;
mod latency;
mod mocks;

pub use chaos::*;
pub use latency::*;
pub use mocks::*;

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use crate::error::{SimulationError, SimulatorResult};
use crate::store::DEFAULT_MAX_ENTRIES_PER_SERVER;
use crate::types::RouteRules;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Route delay settings
    pub latency: LatencyConfig,
    /// Failure injection settings
    pub chaos: ChaosConfig,
    /// Retention of simulated request records
    pub traffic_log: TrafficLogConfig,
    /// Logging settings
    pub telemetry: TelemetryConfig,
    /// Servers and routes loaded at startup
    pub mocks: Vec<MockServerSeed>,
}

impl SimulatorConfig {
    /// Load configuration from a file
    pub fn from_file<P: AsRef<Path>>(path: P) -> SimulatorResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SimulationError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
                .map_err(|e| SimulationError::Config(format!("YAML parse error: {}", e)))?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| SimulationError::Config(format!("TOML parse error: {}", e)))?,
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| SimulationError::Config(format!("JSON parse error: {}", e)))?,
            _ => {
                return Err(SimulationError::Config(
                    "Unsupported config file format. Use .yaml, .toml, or .json".to_string(),
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Load the default configuration with environment variable overrides
    pub fn from_env() -> SimulatorResult<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `MOCK_SIMULATOR_*` environment overrides on top of this config
    pub fn apply_env(&mut self) -> SimulatorResult<()> {
        if let Ok(host) = std::env::var("MOCK_SIMULATOR_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("MOCK_SIMULATOR_PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| SimulationError::Config(format!("Invalid port number '{}'", port)))?;
        }

        if let Ok(val) = std::env::var("MOCK_SIMULATOR_LATENCY_ENABLED") {
            self.latency.enabled = parse_bool("MOCK_SIMULATOR_LATENCY_ENABLED", &val)?;
        }

        if let Ok(val) = std::env::var("MOCK_SIMULATOR_CHAOS_ENABLED") {
            self.chaos.enabled = parse_bool("MOCK_SIMULATOR_CHAOS_ENABLED", &val)?;
        }

        if let Ok(level) = std::env::var("MOCK_SIMULATOR_LOG_LEVEL") {
            self.telemetry.log_level = level;
        }

        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> SimulatorResult<()> {
        self.server.validate()?;
        self.latency.validate()?;
        self.chaos.validate()?;
        self.traffic_log.validate()?;
        self.telemetry.validate()?;

        if Duration::from_millis(self.latency.max_delay_ms) >= self.server.request_timeout {
            return Err(SimulationError::Config(format!(
                "latency.max_delay_ms ({}ms) must be below server.request_timeout ({}s)",
                self.latency.max_delay_ms,
                self.server.request_timeout.as_secs()
            )));
        }

        for seed in &self.mocks {
            seed.validate()?;
        }

        Ok(())
    }

    /// Save-time limits for routes
    pub fn route_rules(&self) -> RouteRules {
        RouteRules {
            max_delay_ms: self.latency.max_delay_ms,
        }
    }

    /// Configuration for local development: no delays, verbose logs
    pub fn development() -> Self {
        let mut config = Self::default();
        config.server.host = "127.0.0.1".to_string();
        config.latency.enabled = false;
        config.telemetry.log_level = "debug".to_string();
        config
    }
}

fn parse_bool(key: &str, value: &str) -> SimulatorResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SimulationError::Config(format!(
            "{} must be a boolean, got '{}'",
            key, value
        ))),
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Largest accepted request body in bytes
    pub max_body_bytes: usize,
    /// How long to wait for in-flight requests on shutdown
    #[serde(with = "humantime_serde")]
    pub drain_timeout: Duration,
    /// Enable CORS
    pub cors_enabled: bool,
    /// CORS allowed origins
    pub cors_origins: Vec<String>,
    /// Enable request logging
    pub request_logging: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout: Duration::from_secs(300),
            max_body_bytes: 10 * 1024 * 1024,
            drain_timeout: Duration::from_secs(30),
            cors_enabled: true,
            cors_origins: vec!["*".to_string()],
            request_logging: true,
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> SimulatorResult<()> {
        if self.port == 0 {
            return Err(SimulationError::invalid("server.port", "Port cannot be 0"));
        }
        if self.request_timeout.is_zero() {
            return Err(SimulationError::invalid(
                "server.request_timeout",
                "request_timeout must be greater than 0",
            ));
        }
        if self.max_body_bytes == 0 {
            return Err(SimulationError::invalid(
                "server.max_body_bytes",
                "max_body_bytes must be greater than 0",
            ));
        }
        Ok(())
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> SimulatorResult<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| SimulationError::Config(format!("Invalid socket address: {}", e)))
    }
}

/// Traffic log retention
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficLogConfig {
    /// Entries kept per mock server before the oldest are evicted
    pub max_entries_per_server: usize,
}

impl Default for TrafficLogConfig {
    fn default() -> Self {
        Self {
            max_entries_per_server: DEFAULT_MAX_ENTRIES_PER_SERVER,
        }
    }
}

impl TrafficLogConfig {
    pub fn validate(&self) -> SimulatorResult<()> {
        if self.max_entries_per_server == 0 {
            return Err(SimulationError::invalid(
                "traffic_log.max_entries_per_server",
                "max_entries_per_server must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Enable telemetry
    pub enabled: bool,
    /// Log level
    pub log_level: String,
    /// Enable JSON logging
    pub json_logs: bool,
    /// Prometheus metrics endpoint path
    pub metrics_path: String,
    /// Service name reported in logs
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_level: "info".to_string(),
            json_logs: false,
            metrics_path: "/metrics".to_string(),
            service_name: "mock-simulator".to_string(),
        }
    }
}

impl TelemetryConfig {
    pub fn validate(&self) -> SimulatorResult<()> {
        let reserved = ["/api/", "/admin/", "/health", "/ready"];
        if !self.metrics_path.starts_with('/')
            || self.metrics_path.len() < 2
            || reserved.iter().any(|r| self.metrics_path.starts_with(r))
        {
            return Err(SimulationError::invalid(
                "telemetry.metrics_path",
                format!("'{}' is not a usable metrics path", self.metrics_path),
            ));
        }
        Ok(())
    }
}

/// Helper module for Duration serialization
mod humantime_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if duration.subsec_millis() == 0 {
            serializer.serialize_str(&format!("{}s", duration.as_secs()))
        } else {
            serializer.serialize_str(&format!("{}ms", duration.as_millis()))
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    pub fn parse_duration(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        let invalid = || format!("Invalid duration: {}", s);

        if let Some(millis) = s.strip_suffix("ms") {
            millis.trim().parse::<u64>().map(Duration::from_millis).map_err(|_| invalid())
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.trim().parse::<u64>().map(Duration::from_secs).map_err(|_| invalid())
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.trim()
                .parse::<u64>()
                .map(|m| Duration::from_secs(m * 60))
                .map_err(|_| invalid())
        } else {
            s.parse::<u64>().map(Duration::from_secs).map_err(|_| invalid())
        }
    }
}

pub use humantime_serde::parse_duration;
