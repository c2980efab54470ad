//! End-to-end workflow scenarios: operator transitions, bulk updates, and
//! platform event injection.

mod common;

use axum::http::StatusCode;
use common::{request, test_app};
use orderflow_engine::OrderGateway;
use serde_json::json;

#[tokio::test]
async fn test_operator_transition_runs_matching_rule() {
    let app = test_app();
    app.orders.seed_order(42, "shop-processing", true);

    request(
        &app.router,
        "POST",
        "/api/v1/rules",
        Some(json!({
            "from_status": "processing",
            "to_status": "packed",
            "trigger_type": "automatic",
            "email_notification": true,
            "email_template": "<p>Hi {customer_name}, order {order_number} is packed.</p>"
        })),
    )
    .await;

    let (status, _) = request(
        &app.router,
        "POST",
        "/api/v1/orders/42/status",
        Some(json!({"status_slug": "packed", "changed_by": 7})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Exactly one history entry for the transition.
    let (_, timeline) = request(&app.router, "GET", "/api/v1/orders/42/timeline", None).await;
    let timeline = timeline.as_array().unwrap();
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline[0]["from_status"], "processing");
    assert_eq!(timeline[0]["to_status"], "packed");
    assert_eq!(timeline[0]["changed_by"], 7);

    // Exactly one rule execution: order note + notification.
    let notes = app.orders.notes_for(42);
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0], "Workflow rule triggered: processing -> packed");
    assert_eq!(app.notifier.sent_count(), 1);
    assert!(app.notifier.sent()[0]
        .html_body
        .contains("order 42 is packed"));

    let order = app.orders.get(42).await.unwrap().unwrap();
    assert_eq!(order.status, "shop-packed");
}

#[tokio::test]
async fn test_transition_with_no_matching_rule_only_logs_history() {
    let app = test_app();
    app.orders.seed_order(42, "shop-processing", true);

    let (status, _) = request(
        &app.router,
        "POST",
        "/api/v1/orders/42/status",
        Some(json!({"status_slug": "on-hold"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, timeline) = request(&app.router, "GET", "/api/v1/orders/42/timeline", None).await;
    assert_eq!(timeline.as_array().unwrap().len(), 1);
    assert!(app.orders.notes_for(42).is_empty());
    assert_eq!(app.notifier.sent_count(), 0);
}

#[tokio::test]
async fn test_transition_on_unknown_order_is_404() {
    let app = test_app();
    let (status, _) = request(
        &app.router,
        "POST",
        "/api/v1/orders/404/status",
        Some(json!({"status_slug": "packed"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bulk_update_skips_unknown_orders() {
    let app = test_app();
    app.orders.seed_order(1, "shop-pending", false);
    app.orders.seed_order(2, "shop-processing", true);

    let (status, body) = request(
        &app.router,
        "POST",
        "/api/v1/orders/bulk-status",
        Some(json!({"order_ids": [1, 2, 999], "status_slug": "packed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updated_count"], 2);

    assert_eq!(app.orders.ids_in_status("packed").await.unwrap(), vec![1, 2]);

    // Bulk transitions log history with the bulk reason.
    let (_, timeline) = request(&app.router, "GET", "/api/v1/orders/1/timeline", None).await;
    assert_eq!(
        timeline.as_array().unwrap()[0]["change_reason"],
        "Status changed via bulk action"
    );
}

#[tokio::test]
async fn test_payment_complete_event_fires_payment_rules() {
    let app = test_app();
    // Unpaid order whose statuses match nothing: the payment path ignores both.
    app.orders.seed_order(5, "shop-on-hold", false);

    request(
        &app.router,
        "POST",
        "/api/v1/rules",
        Some(json!({"from_status": "pending", "to_status": "processing", "trigger_type": "payment"})),
    )
    .await;

    let (status, _) = request(
        &app.router,
        "POST",
        "/api/v1/events/payment-complete",
        Some(json!({"order_id": 5})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let notes = app.orders.notes_for(5);
    assert_eq!(notes.len(), 1);
    assert!(notes[0].contains("pending -> processing"));
}

#[tokio::test]
async fn test_order_processing_event_runs_pending_automatic_rules() {
    let app = test_app();
    app.orders.seed_order(6, "shop-processing", true);

    request(
        &app.router,
        "POST",
        "/api/v1/rules",
        Some(json!({"from_status": "pending", "to_status": "packed", "trigger_type": "automatic"})),
    )
    .await;
    request(
        &app.router,
        "POST",
        "/api/v1/rules",
        Some(json!({"from_status": "on-hold", "to_status": "packed", "trigger_type": "automatic"})),
    )
    .await;

    request(
        &app.router,
        "POST",
        "/api/v1/events/order-processing",
        Some(json!({"order_id": 6})),
    )
    .await;

    let notes = app.orders.notes_for(6);
    assert_eq!(notes.len(), 1);
    assert!(notes[0].contains("pending -> packed"));
}

#[tokio::test]
async fn test_stock_reduction_event_checks_condition() {
    let app = test_app();
    app.orders.seed_order(7, "shop-processing", true);
    app.orders.set_items(
        7,
        vec![orderflow_types::OrderLineItem {
            name: "Widget".to_string(),
            quantity: 1,
            product: Some(orderflow_types::ProductStock {
                in_stock: true,
                stock_quantity: Some(4),
            }),
        }],
    );

    request(
        &app.router,
        "POST",
        "/api/v1/rules",
        Some(json!({
            "from_status": "*",
            "to_status": "backordered",
            "trigger_type": "stock",
            "trigger_condition": "low_stock"
        })),
    )
    .await;

    request(
        &app.router,
        "POST",
        "/api/v1/events/stock-reduction",
        Some(json!({"order_id": 7})),
    )
    .await;

    assert_eq!(app.orders.notes_for(7).len(), 1);
}
