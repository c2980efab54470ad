//! Custom status handlers.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use orderflow_types::{CustomStatus, NewStatus, StatusPatch};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DeleteStatusResponse {
    pub message: String,
    pub reassigned_orders: usize,
}

/// `POST /api/v1/statuses`
pub async fn create_status(
    State(state): State<AppState>,
    Json(payload): Json<NewStatus>,
) -> ApiResult<(StatusCode, Json<CustomStatus>)> {
    let status = state.catalog.create(payload).await?;
    Ok((StatusCode::CREATED, Json(status)))
}

/// `GET /api/v1/statuses`
pub async fn list_statuses(State(state): State<AppState>) -> ApiResult<Json<Vec<CustomStatus>>> {
    Ok(Json(state.catalog.list().await?))
}

/// `GET /api/v1/statuses/:id`
pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<CustomStatus>> {
    state
        .catalog
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("status {id} not found")))
}

/// `PUT /api/v1/statuses/:id`
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<StatusPatch>,
) -> ApiResult<Json<CustomStatus>> {
    Ok(Json(state.catalog.update(id, patch).await?))
}

/// `DELETE /api/v1/statuses/:id`
///
/// Orders still in the status move to the fallback first; the row is only
/// removed after reassignment completes.
pub async fn delete_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeleteStatusResponse>> {
    let reassigned = state.catalog.delete(id).await?;
    Ok(Json(DeleteStatusResponse {
        message: "Status deleted successfully".to_string(),
        reassigned_orders: reassigned,
    }))
}

/// `GET /api/v1/workflow/next/:slug`: statuses reachable from the given
/// status via the stored rules, ordered by workflow position.
pub async fn next_possible_statuses(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Vec<CustomStatus>>> {
    Ok(Json(state.engine.next_possible_statuses(&slug).await?))
}
