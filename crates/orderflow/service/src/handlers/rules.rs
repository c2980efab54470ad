//! Workflow rule handlers.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use orderflow_storage::RuleStore;
use orderflow_types::{NewRule, RulePatch, TriggerType, WorkflowRule};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ListRulesQuery {
    pub trigger: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteRuleResponse {
    pub message: String,
}

/// `POST /api/v1/rules`
pub async fn create_rule(
    State(state): State<AppState>,
    Json(payload): Json<NewRule>,
) -> ApiResult<(StatusCode, Json<WorkflowRule>)> {
    payload.validate()?;
    let rule = state.store.create_rule(payload).await?;
    Ok((StatusCode::CREATED, Json(rule)))
}

/// `GET /api/v1/rules[?trigger=payment]`
pub async fn list_rules(
    State(state): State<AppState>,
    Query(query): Query<ListRulesQuery>,
) -> ApiResult<Json<Vec<WorkflowRule>>> {
    let rules = match query.trigger.as_deref() {
        Some(raw) => {
            let trigger: TriggerType = raw
                .parse()
                .map_err(|_| ApiError::BadRequest(format!("unknown trigger type '{raw}'")))?;
            state.store.list_rules_by_trigger(trigger).await?
        }
        None => state.store.list_rules().await?,
    };
    Ok(Json(rules))
}

/// `GET /api/v1/rules/:id`
pub async fn get_rule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<WorkflowRule>> {
    state
        .store
        .get_rule(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("rule {id} not found")))
}

/// `PUT /api/v1/rules/:id`
pub async fn update_rule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<RulePatch>,
) -> ApiResult<Json<WorkflowRule>> {
    patch.validate()?;
    Ok(Json(state.store.update_rule(id, patch).await?))
}

/// `DELETE /api/v1/rules/:id`
pub async fn delete_rule(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<DeleteRuleResponse>> {
    state.store.delete_rule(id).await?;
    Ok(Json(DeleteRuleResponse {
        message: "Workflow rule deleted successfully".to_string(),
    }))
}
