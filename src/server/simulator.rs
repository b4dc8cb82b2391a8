//! Simulated traffic endpoint

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use tracing::warn;

use super::state::AppState;
use crate::engine::{InboundRequest, SimulatedResponse};

/// Path under which every mock server is mounted
pub const SIMULATOR_BASE: &str = "/api/mock/simulator";

/// ANY /api/mock/simulator/{prefix}/{routePath}
///
/// The request body, query string and headers play no part in matching.
pub async fn simulate(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    let (prefix, path) = split_simulator_path(uri.path());
    let request = InboundRequest::new(method.as_str(), prefix, &path);

    state.engine.dispatch(request).await.into_response()
}

/// Split the raw request path into the server prefix and the route path
pub fn split_simulator_path(path: &str) -> (&str, String) {
    let rest = path
        .strip_prefix(SIMULATOR_BASE)
        .unwrap_or(path)
        .trim_start_matches('/');

    match rest.split_once('/') {
        Some((prefix, route_path)) => (prefix, format!("/{}", route_path)),
        None => (rest, "/".to_string()),
    }
}

impl IntoResponse for SimulatedResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;

        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.append(name, value);
                }
                _ => warn!(header = %name, "Skipping unrepresentable response header"),
            }
        }

        response
    }
}
