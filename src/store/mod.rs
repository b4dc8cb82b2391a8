//! Mock configuration storage
//!
//! The dispatcher reads server and route definitions through the
//! [`MockRepository`] trait on every request, so management changes are
//! visible to the next inbound request without any cache to invalidate.
//! [`MockStore`] is the in-memory implementation that also serves the
//! management API.

mod traffic_log;

pub use traffic_log::*;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::config::MockServerSeed;
use crate::error::{SimulationError, SimulatorResult};
use crate::types::*;

/// Read-only view of mock configuration used by the dispatcher
pub trait MockRepository: Send + Sync {
    /// Resolve a server by its path prefix
    fn server_by_prefix(&self, prefix: &str) -> Option<MockServer>;

    /// Snapshot of every route (enabled or not) owned by a server
    fn routes_for_server(&self, server_id: ServerId) -> Vec<MockRoute>;
}

#[derive(Default)]
struct StoreInner {
    next_server_id: ServerId,
    next_route_id: RouteId,
    servers: BTreeMap<ServerId, MockServer>,
    prefixes: HashMap<String, ServerId>,
    routes: BTreeMap<RouteId, MockRoute>,
    server_routes: HashMap<ServerId, BTreeSet<RouteId>>,
}

impl StoreInner {
    fn server(&self, id: ServerId) -> SimulatorResult<&MockServer> {
        self.servers
            .get(&id)
            .ok_or(SimulationError::NotFound { entity: "mock server", id })
    }

    fn route_mut(&mut self, id: RouteId) -> SimulatorResult<&mut MockRoute> {
        self.routes
            .get_mut(&id)
            .ok_or(SimulationError::NotFound { entity: "route", id })
    }

    fn claim_prefix(&self, prefix: &str) -> SimulatorResult<()> {
        if self.prefixes.contains_key(prefix) {
            return Err(SimulationError::Conflict(format!(
                "path prefix '{}' is already in use",
                prefix
            )));
        }
        Ok(())
    }

    fn has_routes(&self, server_id: ServerId) -> bool {
        self.server_routes
            .get(&server_id)
            .map_or(false, |routes| !routes.is_empty())
    }
}

/// In-memory server and route tables
pub struct MockStore {
    inner: RwLock<StoreInner>,
    rules: RouteRules,
}

impl MockStore {
    pub fn new(rules: RouteRules) -> Self {
        Self {
            inner: RwLock::new(StoreInner::default()),
            rules,
        }
    }

    /// Limits applied to every route save
    pub fn rules(&self) -> RouteRules {
        self.rules
    }

    // ============== Servers ==============

    pub fn create_server(&self, input: ServerInput) -> SimulatorResult<MockServer> {
        let name = input
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| SimulationError::invalid("name", "server name is required"))?
            .to_string();
        let workspace_id = input
            .workspace_id
            .ok_or_else(|| SimulationError::invalid("workspaceId", "workspace id is required"))?;

        let mut inner = self.inner.write();

        let path_prefix = match input.path_prefix.as_deref().map(str::trim) {
            Some(prefix) if !prefix.is_empty() => {
                validate_prefix(prefix)?;
                inner.claim_prefix(prefix)?;
                prefix.to_string()
            }
            _ => Self::unused_prefix(&inner, &name)?,
        };

        inner.next_server_id += 1;
        let server = MockServer {
            id: inner.next_server_id,
            workspace_id,
            name,
            path_prefix,
        };

        inner.prefixes.insert(server.path_prefix.clone(), server.id);
        inner.servers.insert(server.id, server.clone());

        info!(server_id = server.id, prefix = %server.path_prefix, "Mock server created");
        Ok(server)
    }

    fn unused_prefix(inner: &StoreInner, name: &str) -> SimulatorResult<String> {
        for _ in 0..16 {
            let candidate = generate_prefix(name);
            if !inner.prefixes.contains_key(&candidate) {
                return Ok(candidate);
            }
        }
        Err(SimulationError::Conflict(
            "could not generate an unused path prefix".to_string(),
        ))
    }

    pub fn get_server(&self, id: ServerId) -> SimulatorResult<MockServer> {
        self.inner.read().server(id).cloned()
    }

    pub fn list_servers(&self, workspace_id: WorkspaceId) -> Vec<MockServer> {
        self.inner
            .read()
            .servers
            .values()
            .filter(|s| s.workspace_id == workspace_id)
            .cloned()
            .collect()
    }

    pub fn update_server(&self, id: ServerId, input: ServerInput) -> SimulatorResult<MockServer> {
        let mut inner = self.inner.write();
        let current = inner.server(id)?.clone();
        let mut updated = current.clone();

        if let Some(name) = input.name.as_deref().map(str::trim) {
            if name.is_empty() {
                return Err(SimulationError::invalid("name", "server name cannot be empty"));
            }
            updated.name = name.to_string();
        }

        if let Some(workspace_id) = input.workspace_id {
            if workspace_id != current.workspace_id {
                return Err(SimulationError::invalid(
                    "workspaceId",
                    "a mock server cannot move between workspaces",
                ));
            }
        }

        if let Some(prefix) = input.path_prefix.as_deref().map(str::trim) {
            if prefix != current.path_prefix {
                if inner.has_routes(id) {
                    return Err(SimulationError::Conflict(
                        "path prefix cannot change once routes are bound".to_string(),
                    ));
                }
                validate_prefix(prefix)?;
                inner.claim_prefix(prefix)?;
                updated.path_prefix = prefix.to_string();
            }
        }

        if updated.path_prefix != current.path_prefix {
            inner.prefixes.remove(&current.path_prefix);
            inner.prefixes.insert(updated.path_prefix.clone(), id);
        }
        inner.servers.insert(id, updated.clone());

        debug!(server_id = id, "Mock server updated");
        Ok(updated)
    }

    /// Delete a server and every route it owns
    pub fn delete_server(&self, id: ServerId) -> SimulatorResult<()> {
        let mut inner = self.inner.write();
        let server = inner
            .servers
            .remove(&id)
            .ok_or(SimulationError::NotFound { entity: "mock server", id })?;

        inner.prefixes.remove(&server.path_prefix);
        let owned = inner.server_routes.remove(&id).unwrap_or_default();
        for route_id in &owned {
            inner.routes.remove(route_id);
        }

        info!(server_id = id, removed_routes = owned.len(), "Mock server deleted");
        Ok(())
    }

    // ============== Routes ==============

    pub fn create_route(&self, input: RouteInput) -> SimulatorResult<MockRoute> {
        let server_id = input
            .mock_server_id
            .ok_or_else(|| SimulationError::invalid("mockServerId", "mock server id is required"))?;

        let mut inner = self.inner.write();
        inner.server(server_id)?;

        let mut route = MockRoute::draft(inner.next_route_id + 1, server_id);
        input.apply_to(&mut route, &self.rules)?;

        inner.next_route_id = route.id;
        inner
            .server_routes
            .entry(server_id)
            .or_default()
            .insert(route.id);
        inner.routes.insert(route.id, route.clone());

        debug!(route_id = route.id, server_id, method = %route.method, path = %route.path, "Route created");
        Ok(route)
    }

    pub fn get_route(&self, id: RouteId) -> SimulatorResult<MockRoute> {
        self.inner
            .read()
            .routes
            .get(&id)
            .cloned()
            .ok_or(SimulationError::NotFound { entity: "route", id })
    }

    pub fn list_routes(&self, server_id: ServerId) -> SimulatorResult<Vec<MockRoute>> {
        let inner = self.inner.read();
        inner.server(server_id)?;
        Ok(Self::collect_routes(&inner, server_id))
    }

    fn collect_routes(inner: &StoreInner, server_id: ServerId) -> Vec<MockRoute> {
        inner
            .server_routes
            .get(&server_id)
            .into_iter()
            .flatten()
            .filter_map(|id| inner.routes.get(id))
            .cloned()
            .collect()
    }

    pub fn update_route(&self, id: RouteId, input: RouteInput) -> SimulatorResult<MockRoute> {
        let mut inner = self.inner.write();
        let route = inner.route_mut(id)?;

        if let Some(server_id) = input.mock_server_id {
            if server_id != route.mock_server_id {
                return Err(SimulationError::invalid(
                    "mockServerId",
                    "a route cannot move between mock servers",
                ));
            }
        }

        input.apply_to(route, &self.rules)?;
        debug!(route_id = id, enabled = route.is_enabled, "Route updated");
        Ok(route.clone())
    }

    pub fn delete_route(&self, id: RouteId) -> SimulatorResult<()> {
        let mut inner = self.inner.write();
        let route = inner
            .routes
            .remove(&id)
            .ok_or(SimulationError::NotFound { entity: "route", id })?;

        if let Some(owned) = inner.server_routes.get_mut(&route.mock_server_id) {
            owned.remove(&id);
        }

        debug!(route_id = id, "Route deleted");
        Ok(())
    }

    // ============== Seeding & stats ==============

    /// Load servers and routes declared in configuration
    pub fn seed(&self, seeds: &[MockServerSeed]) -> SimulatorResult<()> {
        for seed in seeds {
            let mut input = ServerInput::new(&seed.name, seed.workspace_id);
            input.path_prefix = seed.path_prefix.clone();
            let server = self.create_server(input)?;

            for route in &seed.routes {
                let mut route = route.clone();
                route.mock_server_id = Some(server.id);
                self.create_route(route)?;
            }
        }
        Ok(())
    }

    pub fn server_count(&self) -> usize {
        self.inner.read().servers.len()
    }

    pub fn route_count(&self) -> usize {
        self.inner.read().routes.len()
    }
}

impl Default for MockStore {
    fn default() -> Self {
        Self::new(RouteRules::default())
    }
}

impl MockRepository for MockStore {
    fn server_by_prefix(&self, prefix: &str) -> Option<MockServer> {
        let inner = self.inner.read();
        inner
            .prefixes
            .get(prefix)
            .and_then(|id| inner.servers.get(id))
            .cloned()
    }

    fn routes_for_server(&self, server_id: ServerId) -> Vec<MockRoute> {
        Self::collect_routes(&self.inner.read(), server_id)
    }
}
