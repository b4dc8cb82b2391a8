//! Property-based tests for route matching and path normalization

use proptest::prelude::*;
use mock_simulator::engine::RouteMatcher;
use mock_simulator::types::{normalize_path, MockRoute, SUPPORTED_METHODS};

fn segment() -> impl Strategy<Value = String> {
    "[a-z0-9_-]{1,8}"
}

fn route_path() -> impl Strategy<Value = String> {
    prop::collection::vec(segment(), 0..4).prop_map(|segments| format!("/{}", segments.join("/")))
}

fn method() -> impl Strategy<Value = String> {
    prop::sample::select(SUPPORTED_METHODS).prop_map(str::to_string)
}

fn route(id: u64, method: &str, path: &str, enabled: bool) -> MockRoute {
    let mut route = MockRoute::draft(id, 1);
    route.method = method.to_string();
    route.path = path.to_string();
    route.is_enabled = enabled;
    route
}

proptest! {
    /// Normalizing twice changes nothing
    #[test]
    fn test_normalize_is_idempotent(path in route_path(), trailing in any::<bool>()) {
        let path = if trailing { format!("{}/", path) } else { path };
        let once = normalize_path(&path);
        prop_assert_eq!(normalize_path(&once), once.clone());
        prop_assert!(once.starts_with('/'));
    }

    /// A single trailing slash never affects matching
    #[test]
    fn test_trailing_slash_matches(path in route_path(), method in method()) {
        let routes = vec![route(1, &method, &path, true)];

        let with_slash = format!("{}/", path.trim_end_matches('/'));
        let found = RouteMatcher::find(&routes, &method, &with_slash);
        prop_assert!(found.is_some(), "{} did not match {}", with_slash, path);
    }

    /// Whatever is returned is enabled and matches method and path exactly
    #[test]
    fn test_match_is_exact_and_enabled(
        specs in prop::collection::vec((method(), route_path(), any::<bool>()), 0..12),
        probe_method in method(),
        probe_path in route_path(),
    ) {
        let routes: Vec<MockRoute> = specs
            .iter()
            .enumerate()
            .map(|(i, (m, p, enabled))| route(i as u64 + 1, m, p, *enabled))
            .collect();

        let expected = routes
            .iter()
            .filter(|r| r.is_enabled && r.method == probe_method)
            .filter(|r| normalize_path(&r.path) == normalize_path(&probe_path))
            .map(|r| r.id)
            .max();

        let found = RouteMatcher::find(&routes, &probe_method, &probe_path);
        prop_assert_eq!(found.map(|r| r.id), expected);

        if let Some(found) = found {
            prop_assert!(found.is_enabled);
            prop_assert_eq!(&found.method, &probe_method);
        }
    }

    /// Route order in storage does not change the winner
    #[test]
    fn test_match_ignores_storage_order(
        path in route_path(),
        ids in prop::collection::hash_set(1u64..1000, 1..6),
    ) {
        let mut routes: Vec<MockRoute> = ids.iter().map(|id| route(*id, "GET", &path, true)).collect();
        let forward = RouteMatcher::find(&routes, "GET", &path).map(|r| r.id);
        routes.reverse();
        let backward = RouteMatcher::find(&routes, "GET", &path).map(|r| r.id);

        prop_assert_eq!(forward, backward);
        prop_assert_eq!(forward, ids.iter().max().copied());
    }
}
