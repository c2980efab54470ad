//! Status API scenarios over in-memory backends.

mod common;

use axum::http::StatusCode;
use common::{request, request_with_token, test_app, test_app_with_config};
use orderflow_service::ServiceConfig;
use serde_json::json;

#[tokio::test]
async fn test_create_status_then_read_it_back() {
    let app = test_app();

    let (status, body) = request(
        &app.router,
        "POST",
        "/api/v1/statuses",
        Some(json!({
            "name": "Packed",
            "slug": "packed",
            "color": "#ff9500",
            "icon": "fas fa-box",
            "workflow_order": 3
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = body["id"].as_i64().unwrap();

    let (status, body) = request(
        &app.router,
        "GET",
        &format!("/api/v1/statuses/{id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Packed");
    assert_eq!(body["slug"], "packed");
    assert_eq!(body["color"], "#ff9500");
    assert_eq!(body["visibility"], "both");
}

#[tokio::test]
async fn test_duplicate_slug_conflicts_and_original_survives() {
    let app = test_app();

    request(
        &app.router,
        "POST",
        "/api/v1/statuses",
        Some(json!({"name": "Packed", "slug": "packed", "color": "#ff9500"})),
    )
    .await;

    let (status, body) = request(
        &app.router,
        "POST",
        "/api/v1/statuses",
        Some(json!({"name": "Other", "slug": "packed", "color": "#000000"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (_, list) = request(&app.router, "GET", "/api/v1/statuses", None).await;
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["name"], "Packed");
    assert_eq!(list[0]["color"], "#ff9500");
}

#[tokio::test]
async fn test_invalid_payload_is_a_validation_error() {
    let app = test_app();

    let (status, body) = request(
        &app.router,
        "POST",
        "/api/v1/statuses",
        Some(json!({"name": "Bad", "slug": "Not A Slug"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_partial_update_keeps_other_fields() {
    let app = test_app();

    let (_, created) = request(
        &app.router,
        "POST",
        "/api/v1/statuses",
        Some(json!({"name": "Packed", "slug": "packed", "color": "#ff9500"})),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let (status, updated) = request(
        &app.router,
        "PUT",
        &format!("/api/v1/statuses/{id}"),
        Some(json!({"name": "Boxed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Boxed");
    assert_eq!(updated["slug"], "packed");
    assert_eq!(updated["color"], "#ff9500");
}

#[tokio::test]
async fn test_delete_reassigns_orders_to_pending() {
    let app = test_app();
    app.orders.seed_order(1, "shop-packed", true);
    app.orders.seed_order(2, "shop-packed", false);

    let (_, created) = request(
        &app.router,
        "POST",
        "/api/v1/statuses",
        Some(json!({"name": "Packed", "slug": "packed"})),
    )
    .await;
    let id = created["id"].as_i64().unwrap();

    let (status, body) = request(
        &app.router,
        "DELETE",
        &format!("/api/v1/statuses/{id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reassigned_orders"], 2);

    use orderflow_engine::OrderGateway;
    assert!(app.orders.ids_in_status("packed").await.unwrap().is_empty());
    assert_eq!(app.orders.ids_in_status("pending").await.unwrap(), vec![1, 2]);

    // One history entry each, noting the fallback.
    let (_, timeline) = request(&app.router, "GET", "/api/v1/orders/1/timeline", None).await;
    let timeline = timeline.as_array().unwrap();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0]["to_status"], "pending");
    assert_eq!(timeline[0]["change_reason"], "Status deleted, moved to pending");
}

#[tokio::test]
async fn test_delete_unknown_status_is_404() {
    let app = test_app();
    let (status, body) = request(&app.router, "DELETE", "/api/v1/statuses/77", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_admin_routes_require_token_when_configured() {
    let mut config = ServiceConfig::default();
    config.auth.admin_token = Some("sekrit".to_string());
    let app = test_app_with_config(config);

    let payload = json!({"name": "Packed", "slug": "packed"});

    let (status, body) = request(
        &app.router,
        "POST",
        "/api/v1/statuses",
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "UNAUTHORIZED");

    let (status, _) = request_with_token(
        &app.router,
        "POST",
        "/api/v1/statuses",
        Some(payload.clone()),
        Some("wrong"),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request_with_token(
        &app.router,
        "POST",
        "/api/v1/statuses",
        Some(payload),
        Some("sekrit"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // Public routes stay open.
    let (status, _) = request(&app.router, "GET", "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
}
