//! Latency simulation configuration

use serde::{Deserialize, Serialize};

use crate::error::{SimulationError, SimulatorResult};

/// Latency simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyConfig {
    /// Honor route delays. When off every response is emitted immediately.
    pub enabled: bool,
    /// Largest `delayMs` a route may be saved with
    pub max_delay_ms: u64,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_delay_ms: 60_000,
        }
    }
}

impl LatencyConfig {
    pub fn validate(&self) -> SimulatorResult<()> {
        if self.max_delay_ms == 0 && self.enabled {
            return Err(SimulationError::invalid(
                "latency.max_delay_ms",
                "max_delay_ms must be greater than 0 while latency is enabled",
            ));
        }
        Ok(())
    }
}
