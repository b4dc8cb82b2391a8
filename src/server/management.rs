//! Management API handlers for mock servers, routes and traffic logs

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use super::state::AppState;
use crate::error::SimulationError;
use crate::store::TrafficLog;
use crate::types::*;

type ApiResult<T> = Result<T, SimulationError>;

// ============== Mock Servers ==============

/// POST /api/mocks/servers/create
pub async fn create_server(
    State(state): State<AppState>,
    payload: Result<Json<ServerInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MockServer>)> {
    let Json(input) = payload?;
    let server = state.store.create_server(input)?;

    state.metrics.record_management("create_server");
    state.refresh_mock_gauges();
    Ok((StatusCode::CREATED, Json(server)))
}

/// GET /api/mocks/servers/:id
pub async fn get_server(
    State(state): State<AppState>,
    Path(id): Path<ServerId>,
) -> ApiResult<Json<MockServer>> {
    Ok(Json(state.store.get_server(id)?))
}

/// PUT /api/mocks/servers/:id
pub async fn update_server(
    State(state): State<AppState>,
    Path(id): Path<ServerId>,
    payload: Result<Json<ServerInput>, JsonRejection>,
) -> ApiResult<Json<MockServer>> {
    let Json(input) = payload?;
    let server = state.store.update_server(id, input)?;

    state.metrics.record_management("update_server");
    Ok(Json(server))
}

/// DELETE /api/mocks/servers/:id
pub async fn delete_server(
    State(state): State<AppState>,
    Path(id): Path<ServerId>,
) -> ApiResult<StatusCode> {
    state.store.delete_server(id)?;

    state.metrics.record_management("delete_server");
    state.refresh_mock_gauges();
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/mocks/servers/workspace/:workspace_id
pub async fn list_workspace_servers(
    State(state): State<AppState>,
    Path(workspace_id): Path<WorkspaceId>,
) -> Json<Vec<MockServer>> {
    Json(state.store.list_servers(workspace_id))
}

// ============== Routes ==============

/// POST /api/mocks/routes/create
pub async fn create_route(
    State(state): State<AppState>,
    payload: Result<Json<RouteInput>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<MockRoute>)> {
    let Json(input) = payload?;
    let route = state.store.create_route(input)?;

    state.metrics.record_management("create_route");
    state.refresh_mock_gauges();
    Ok((StatusCode::CREATED, Json(route)))
}

/// GET /api/mocks/routes/:id
pub async fn get_route(
    State(state): State<AppState>,
    Path(id): Path<RouteId>,
) -> ApiResult<Json<MockRoute>> {
    Ok(Json(state.store.get_route(id)?))
}

/// PUT /api/mocks/routes/:id
///
/// Partial update: omitted fields keep their stored values.
pub async fn update_route(
    State(state): State<AppState>,
    Path(id): Path<RouteId>,
    payload: Result<Json<RouteInput>, JsonRejection>,
) -> ApiResult<Json<MockRoute>> {
    let Json(input) = payload?;
    let route = state.store.update_route(id, input)?;

    state.metrics.record_management("update_route");
    Ok(Json(route))
}

/// DELETE /api/mocks/routes/:id
pub async fn delete_route(
    State(state): State<AppState>,
    Path(id): Path<RouteId>,
) -> ApiResult<StatusCode> {
    state.store.delete_route(id)?;

    state.metrics.record_management("delete_route");
    state.refresh_mock_gauges();
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/mocks/routes/server/:server_id
pub async fn list_server_routes(
    State(state): State<AppState>,
    Path(server_id): Path<ServerId>,
) -> ApiResult<Json<Vec<MockRoute>>> {
    Ok(Json(state.store.list_routes(server_id)?))
}

// ============== Traffic Logs ==============

/// GET /api/logs/server/:server_id
///
/// Entries survive server deletion, so an unknown id yields whatever was
/// recorded for it (possibly nothing) rather than a 404.
pub async fn list_server_logs(
    State(state): State<AppState>,
    Path(server_id): Path<ServerId>,
) -> Json<Vec<TrafficLogEntry>> {
    Json(state.traffic_log.list_for_server(server_id))
}
