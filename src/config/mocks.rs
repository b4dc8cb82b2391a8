//! Mock servers declared in configuration

use serde::{Deserialize, Serialize};

use crate::error::{SimulationError, SimulatorResult};
use crate::types::{validate_prefix, RouteInput, WorkspaceId};

/// A mock server and its routes, loaded at startup.
///
/// Keys use the same camelCase names as the management API so a server
/// exported from the API can be pasted into a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockServerSeed {
    pub name: String,
    #[serde(default)]
    pub workspace_id: WorkspaceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path_prefix: Option<String>,
    #[serde(default)]
    pub routes: Vec<RouteInput>,
}

impl MockServerSeed {
    /// Structural checks; route contents are validated when the store loads them
    pub fn validate(&self) -> SimulatorResult<()> {
        if self.name.trim().is_empty() {
            return Err(SimulationError::Config(
                "mock server name cannot be empty".to_string(),
            ));
        }
        if let Some(prefix) = &self.path_prefix {
            validate_prefix(prefix).map_err(|e| {
                SimulationError::Config(format!("mock server '{}': {}", self.name, e))
            })?;
        }
        Ok(())
    }
}
