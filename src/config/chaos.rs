//! Chaos injection configuration

use serde::{Deserialize, Serialize};

use crate::error::{SimulationError, SimulatorResult};

/// Process-wide chaos settings.
///
/// Per-route failure rates live on the routes themselves; this only holds
/// the master switch and the body returned for injected failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChaosConfig {
    /// Master switch. When off, no route injects failures.
    pub enabled: bool,
    /// Message placed in the generic error body of injected failures
    pub error_message: String,
}

impl Default for ChaosConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            error_message: "Simulated server error".to_string(),
        }
    }
}

impl ChaosConfig {
    pub fn validate(&self) -> SimulatorResult<()> {
        if self.error_message.trim().is_empty() {
            return Err(SimulationError::invalid(
                "chaos.error_message",
                "error_message cannot be empty",
            ));
        }
        Ok(())
    }

    /// JSON body sent in place of the route's response on injection
    pub fn error_body(&self) -> String {
        serde_json::json!({
            "error": {
                "message": self.error_message,
                "type": "chaos_injected",
            }
        })
        .to_string()
    }
}
