//! Health check endpoint

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

/// GET /api/health - liveness probe, no authentication
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Health routes
pub fn router<S: Clone + Send + Sync + 'static>() -> Router<S> {
    Router::new().route("/api/health", get(health))
}
