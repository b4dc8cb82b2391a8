//! Mock server definitions

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{ServerId, WorkspaceId};
use crate::error::{SimulationError, SimulatorResult};

const MAX_PREFIX_LEN: usize = 64;

/// A tenant's virtual backend, addressed by its path prefix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockServer {
    pub id: ServerId,
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub path_prefix: String,
}

/// Payload for creating or updating a mock server
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInput {
    pub name: Option<String>,
    pub workspace_id: Option<WorkspaceId>,
    pub path_prefix: Option<String>,
}

impl ServerInput {
    pub fn new(name: &str, workspace_id: WorkspaceId) -> Self {
        Self {
            name: Some(name.to_string()),
            workspace_id: Some(workspace_id),
            path_prefix: None,
        }
    }

    pub fn with_prefix(mut self, prefix: &str) -> Self {
        self.path_prefix = Some(prefix.to_string());
        self
    }
}

/// Check that a prefix is a single URL-safe segment
pub fn validate_prefix(prefix: &str) -> SimulatorResult<()> {
    if prefix.is_empty() {
        return Err(SimulationError::invalid("pathPrefix", "path prefix cannot be empty"));
    }
    if prefix.len() > MAX_PREFIX_LEN {
        return Err(SimulationError::invalid(
            "pathPrefix",
            format!("path prefix cannot exceed {} characters", MAX_PREFIX_LEN),
        ));
    }
    let valid = prefix
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if !valid {
        return Err(SimulationError::invalid(
            "pathPrefix",
            "path prefix may only contain lowercase letters, digits, '-' and '_'",
        ));
    }
    Ok(())
}

/// Derive a prefix from a display name plus a short random suffix
pub fn generate_prefix(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    let slug = if slug.is_empty() { "mock" } else { slug };
    let slug: String = slug.chars().take(MAX_PREFIX_LEN - 5).collect();

    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(4)
        .map(|b| (b as char).to_ascii_lowercase())
        .collect();

    format!("{}-{}", slug.trim_end_matches('-'), suffix)
}
