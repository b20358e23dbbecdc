use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{audit, handlers, items, middleware::metrics_middleware, publish, queue, schedule};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Audit
        .route("/audit", get(audit::query_audit))
        // Items
        .route("/items", get(items::list_items).post(items::create_item))
        .route("/items/generate", post(items::generate_items))
        .route("/items/{id}", get(items::get_item))
        .route("/items/{id}/edit", post(items::edit_item))
        .route("/items/{id}/approve", post(items::approve_item))
        .route("/items/{id}/unapprove", post(items::unapprove_item))
        .route("/items/{id}/recover", post(items::recover_item))
        .route("/items/{id}/confirm", post(items::confirm_item))
        // Schedule
        .route("/schedule", get(schedule::list_schedule))
        .route("/schedule/run", post(schedule::run_scheduler))
        // Publishing
        .route("/publish/sweep", post(publish::run_sweep))
        // Queue document
        .route("/queue/export", post(queue::export_queue))
        .route("/queue/sync", post(queue::sync_queue));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
