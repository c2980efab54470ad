//! Platform event injection.
//!
//! The host platform raises payment, processing, and stock events into the
//! engine's independent trigger entry points. These routes are the standalone
//! equivalent of its hook callbacks.

use crate::error::ApiResult;
use crate::state::AppState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PlatformEventRequest {
    pub order_id: i64,
}

#[derive(Debug, Serialize)]
pub struct PlatformEventResponse {
    pub message: String,
}

/// `POST /api/v1/events/payment-complete`
pub async fn payment_complete(
    State(state): State<AppState>,
    Json(payload): Json<PlatformEventRequest>,
) -> ApiResult<Json<PlatformEventResponse>> {
    state.engine.on_payment_complete(payload.order_id).await?;
    Ok(Json(PlatformEventResponse {
        message: "payment-complete processed".to_string(),
    }))
}

/// `POST /api/v1/events/order-processing`
pub async fn order_processing(
    State(state): State<AppState>,
    Json(payload): Json<PlatformEventRequest>,
) -> ApiResult<Json<PlatformEventResponse>> {
    state.engine.on_order_processing(payload.order_id).await?;
    Ok(Json(PlatformEventResponse {
        message: "order-processing processed".to_string(),
    }))
}

/// `POST /api/v1/events/stock-reduction`
pub async fn stock_reduction(
    State(state): State<AppState>,
    Json(payload): Json<PlatformEventRequest>,
) -> ApiResult<Json<PlatformEventResponse>> {
    state.engine.on_stock_reduction(payload.order_id).await?;
    Ok(Json(PlatformEventResponse {
        message: "stock-reduction processed".to_string(),
    }))
}
