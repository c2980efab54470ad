//! Order status change handlers.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use orderflow_engine::OrderGateway;
use orderflow_types::TimelineEntry;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status_slug: String,
    #[serde(default = "default_change_reason")]
    pub reason: String,
    #[serde(default)]
    pub changed_by: Option<i64>,
}

fn default_change_reason() -> String {
    "Status changed via admin".to_string()
}

#[derive(Debug, Deserialize)]
pub struct BulkStatusRequest {
    pub order_ids: Vec<i64>,
    pub status_slug: String,
    #[serde(default = "default_bulk_reason")]
    pub reason: String,
}

fn default_bulk_reason() -> String {
    "Status changed via bulk action".to_string()
}

#[derive(Debug, Serialize)]
pub struct ChangeStatusResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct BulkStatusResponse {
    pub message: String,
    pub updated_count: usize,
}

/// `POST /api/v1/orders/:id/status`: operator-driven transition. The
/// destination may be a custom or a built-in platform status.
pub async fn change_order_status(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    Json(payload): Json<ChangeStatusRequest>,
) -> ApiResult<Json<ChangeStatusResponse>> {
    if payload.status_slug.trim().is_empty() {
        return Err(ApiError::Validation("status_slug is required".to_string()));
    }
    state
        .engine
        .change_status(
            order_id,
            &payload.status_slug,
            payload.changed_by,
            &payload.reason,
        )
        .await?;
    Ok(Json(ChangeStatusResponse {
        message: format!("Order {order_id} moved to {}", payload.status_slug),
    }))
}

/// `POST /api/v1/orders/bulk-status`: move many orders to one status.
/// Unknown orders are skipped, matching the admin bulk action.
pub async fn bulk_update_orders(
    State(state): State<AppState>,
    Json(payload): Json<BulkStatusRequest>,
) -> ApiResult<Json<BulkStatusResponse>> {
    if payload.status_slug.trim().is_empty() {
        return Err(ApiError::Validation("status_slug is required".to_string()));
    }

    let mut updated = 0;
    for order_id in &payload.order_ids {
        match state
            .engine
            .change_status(*order_id, &payload.status_slug, None, &payload.reason)
            .await
        {
            Ok(()) => updated += 1,
            Err(err) if err.is_not_found() => {
                tracing::debug!(order_id, "skipping unknown order in bulk update");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(Json(BulkStatusResponse {
        message: format!("{updated} orders updated successfully"),
        updated_count: updated,
    }))
}

/// `GET /api/v1/orders/:id/timeline`: public transition timeline.
pub async fn order_timeline(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
) -> ApiResult<Json<Vec<TimelineEntry>>> {
    if state.orders.get(order_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("order {order_id} not found")));
    }
    Ok(Json(state.engine.timeline(order_id).await?))
}
