//! Data model for mock servers, routes and traffic records
//!
//! Wire names follow the dashboard's camelCase JSON so the management UI
//! can talk to the simulator without translation.

mod route;
mod server;
mod traffic;

pub use route::*;
pub use server::*;
pub use traffic::*;

/// Identifier of a mock server
pub type ServerId = u64;

/// Identifier of a mock route
pub type RouteId = u64;

/// Identifier of an owning workspace (managed outside the simulator)
pub type WorkspaceId = u64;

/// Normalize a route or inbound path for comparison.
///
/// Adds a missing leading slash and strips a single trailing slash.
/// The root path stays `/`.
pub fn normalize_path(path: &str) -> String {
    let mut normalized = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };

    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }

    normalized
}
