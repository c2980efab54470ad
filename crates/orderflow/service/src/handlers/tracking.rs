//! Customer-facing order tracking.
//!
//! Public, keyed by the order's opaque tracking key. Both the path form
//! (`/order-tracking/<key>`) and the query form (`/order-tracking?key=`)
//! resolve to the same view.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use orderflow_engine::OrderGateway;
use orderflow_types::{display_fallback_name, StatusDisplay, StatusVisibility, TimelineEntry};
use serde::{Deserialize, Serialize};

/// Badge color for statuses with no catalog row.
const FALLBACK_COLOR: &str = "#999";

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub key: String,
}

#[derive(Debug, Serialize)]
pub struct TrackingResponse {
    pub order_id: i64,
    pub order_number: String,
    pub status: StatusDisplay,
    pub order_date: String,
    pub order_total: String,
    pub page_title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Vec<TimelineEntry>>,
}

/// `GET /order-tracking/:key`
pub async fn track_order(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<TrackingResponse>> {
    track(state, &key).await.map(Json)
}

/// `GET /order-tracking?key=<key>`
pub async fn track_order_by_query(
    State(state): State<AppState>,
    Query(query): Query<TrackQuery>,
) -> ApiResult<Json<TrackingResponse>> {
    track(state, &query.key).await.map(Json)
}

async fn track(state: AppState, key: &str) -> ApiResult<TrackingResponse> {
    if !state.config.tracking.enabled {
        return Err(ApiError::NotFound("order tracking is disabled".to_string()));
    }

    let order = state
        .orders
        .find_by_key(key)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("Order not found or invalid tracking key".to_string())
        })?;

    let status = match state.catalog.display_info(&order.status).await? {
        Some(display) => display,
        None => StatusDisplay {
            name: display_fallback_name(&order.status),
            color: FALLBACK_COLOR.to_string(),
            icon: String::new(),
            visibility: StatusVisibility::Both,
        },
    };

    let timeline = if state.config.tracking.timeline {
        Some(state.engine.timeline(order.id).await?)
    } else {
        None
    };

    Ok(TrackingResponse {
        order_id: order.id,
        order_number: order.number,
        status,
        order_date: order.created_at.format("%B %-d, %Y").to_string(),
        order_total: order.total,
        page_title: state.config.tracking.page_title.clone(),
        timeline,
    })
}
