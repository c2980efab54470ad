//! API router configuration.

use crate::auth::require_admin;
use crate::handlers;
use crate::state::AppState;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router.
pub fn create_router(state: AppState) -> Router {
    // Admin surface: role-checked before any mutation.
    let admin_routes = Router::new()
        // Custom statuses
        .route(
            "/statuses",
            post(handlers::create_status).get(handlers::list_statuses),
        )
        .route(
            "/statuses/:id",
            get(handlers::get_status)
                .put(handlers::update_status)
                .delete(handlers::delete_status),
        )
        .route(
            "/workflow/next/:slug",
            get(handlers::next_possible_statuses),
        )
        // Workflow rules
        .route(
            "/rules",
            post(handlers::create_rule).get(handlers::list_rules),
        )
        .route(
            "/rules/:id",
            get(handlers::get_rule)
                .put(handlers::update_rule)
                .delete(handlers::delete_rule),
        )
        // Order status changes
        .route("/orders/bulk-status", post(handlers::bulk_update_orders))
        .route("/orders/:id/status", post(handlers::change_order_status))
        // Platform event injection
        .route("/events/payment-complete", post(handlers::payment_complete))
        .route("/events/order-processing", post(handlers::order_processing))
        .route("/events/stock-reduction", post(handlers::stock_reduction))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // Public surface: no auth.
    let public_routes = Router::new()
        .route("/orders/:id/timeline", get(handlers::order_timeline))
        .route("/health", get(handlers::health_check));

    let mut router = Router::new()
        .nest("/api/v1", admin_routes.merge(public_routes))
        .route("/order-tracking/:key", get(handlers::track_order))
        .route("/order-tracking", get(handlers::track_order_by_query))
        .layer(TraceLayer::new_for_http());

    if state.config.server.enable_cors {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router.with_state(state)
}
