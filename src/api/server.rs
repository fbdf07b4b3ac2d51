//! Axum server setup
//!
//! Server skeleton with:
//! - Localhost-only CORS unless `cors_permissive` is set
//! - Tracing middleware
//! - Graceful shutdown on SIGTERM/Ctrl+C

use std::sync::Arc;

use axum::{Router, http::HeaderValue};
use sea_orm::DatabaseConnection;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::routes;
use crate::{auth::TokenService, config::AppConfig, errors::Result};

/// Shared application state
#[derive(Debug)]
pub struct AppState {
    /// Database connection pool
    pub db: DatabaseConnection,
    /// Loaded configuration
    pub config: Arc<AppConfig>,
    /// Token issuer/verifier
    pub tokens: TokenService,
}

impl AppState {
    /// Bundles the shared state handed to every handler.
    #[must_use]
    pub fn new(db: DatabaseConnection, config: AppConfig, tokens: TokenService) -> Self {
        Self {
            db,
            config: Arc::new(config),
            tokens,
        }
    }
}

fn cors_layer(permissive: bool) -> CorsLayer {
    if permissive {
        tracing::warn!("CORS: Permissive mode enabled - all origins allowed");
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin([
                HeaderValue::from_static("http://localhost:3000"),
                HeaderValue::from_static("http://localhost:5173"),
                HeaderValue::from_static("http://127.0.0.1:3000"),
                HeaderValue::from_static("http://127.0.0.1:5173"),
            ])
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

/// Builds the complete application router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.server.cors_permissive);

    Router::new()
        .merge(routes::health::router())
        .merge(routes::auth::router())
        .merge(routes::users::router())
        .merge(routes::clients::router())
        .merge(routes::products::router())
        .merge(routes::transactions::router())
        .merge(routes::staff::router())
        .merge(routes::staff_payments::router())
        .merge(routes::ledger::router())
        .merge(routes::templates::router())
        .merge(routes::dashboard::router())
        .merge(routes::client_portal::router())
        .merge(routes::staff_portal::router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds the configured address and serves until a shutdown signal arrives.
pub async fn serve(state: Arc<AppState>) -> Result<()> {
    let bind_addr = state.config.server.bind_addr.clone();
    let app = router(state);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_unknown_route_is_404() -> crate::errors::Result<()> {
        let state = setup_test_state().await?;
        let (status, _) = send(router(state), Method::GET, "/api/nope", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        Ok(())
    }

    #[tokio::test]
    async fn test_cors_preflight_from_localhost() -> crate::errors::Result<()> {
        use axum::{body::Body, http::Request};
        use tower::ServiceExt;

        let state = setup_test_state().await?;
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/health")
            .header("origin", "http://localhost:3000")
            .header("access-control-request-method", "GET")
            .body(Body::empty())
            .unwrap();
        let response = router(state).oneshot(request).await.unwrap();

        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:3000"
        );
        Ok(())
    }
}
