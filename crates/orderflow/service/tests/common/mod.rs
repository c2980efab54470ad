#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use orderflow_engine::{MemoryOrderGateway, StatusCatalog, WorkflowEngine};
use orderflow_notify::RecordingNotifier;
use orderflow_service::{create_router, AppState, ServiceConfig};
use orderflow_storage::InMemoryOrderflowStore;
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryOrderflowStore>,
    pub orders: Arc<MemoryOrderGateway>,
    pub notifier: Arc<RecordingNotifier>,
    pub engine: Arc<WorkflowEngine>,
}

/// Assemble a router over in-memory backends with the given configuration.
pub fn test_app_with_config(config: ServiceConfig) -> TestApp {
    let store = Arc::new(InMemoryOrderflowStore::new());
    let orders = Arc::new(MemoryOrderGateway::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let engine = Arc::new(
        WorkflowEngine::new(store.clone(), orders.clone(), notifier.clone())
            .with_notifications_enabled(config.notifications.enabled),
    );
    let catalog = Arc::new(StatusCatalog::new(
        store.clone(),
        orders.clone(),
        engine.clone(),
    ));
    let state = AppState::new(
        config,
        store.clone(),
        orders.clone(),
        engine.clone(),
        catalog,
    );
    TestApp {
        router: create_router(state),
        store,
        orders,
        notifier,
        engine,
    }
}

pub fn test_app() -> TestApp {
    test_app_with_config(ServiceConfig::default())
}

/// Issue a request and return `(status, parsed JSON body)`. Empty bodies
/// parse as JSON null.
pub async fn request(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    request_with_token(router, method, uri, body, None).await
}

pub async fn request_with_token(
    router: &Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
    bearer: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}
