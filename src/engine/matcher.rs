//! Route matching

use crate::types::{normalize_path, MockRoute};

/// Resolves an inbound method and path to one of a server's routes
pub struct RouteMatcher;

impl RouteMatcher {
    /// Find the enabled route for `method` and `path`.
    ///
    /// Method and normalized path must match exactly. When several enabled
    /// routes qualify, the one with the highest id (the most recently
    /// created) wins.
    pub fn find<'a>(routes: &'a [MockRoute], method: &str, path: &str) -> Option<&'a MockRoute> {
        let path = normalize_path(path);

        routes
            .iter()
            .filter(|route| route.is_enabled)
            .filter(|route| route.method == method)
            .filter(|route| normalize_path(&route.path) == path)
            .max_by_key(|route| route.id)
    }
}
