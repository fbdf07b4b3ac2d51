//! Admin dashboard endpoint

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};

use super::today;
use crate::api::{
    error::ApiError,
    extractors::{ADMIN, AuthUser},
    server::AppState,
};
use crate::core::report::{self, AdminDashboard};

/// GET /api/dashboard
async fn dashboard(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<AdminDashboard>, ApiError> {
    auth.require_role(ADMIN)?;
    Ok(Json(report::admin_dashboard(&state.db, today()).await?))
}

/// Dashboard routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/dashboard", get(dashboard))
}

#[cfg(test)]
mod tests {
    use crate::core::transaction::{self, NewPayment};
    use crate::entities::Role;
    use crate::test_utils::*;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_admin_dashboard_totals() -> crate::errors::Result<()> {
        let state = setup_test_state().await?;
        let (_, invoice) = setup_with_transaction(&state.db, 300.0).await?;
        setup_with_transaction(&state.db, 100.0).await?;
        transaction::record_payment(
            &state.db,
            invoice.id,
            NewPayment {
                amount: 120.0,
                payment_date: date(2026, 4, 1),
                method: None,
                notes: None,
            },
        )
        .await?;
        let token = login_as(&state, "admin@example.test", Role::Admin, None, None).await?;
        let app = crate::api::router(state);

        let (status, body) = send(app, Method::GET, "/api/dashboard", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["client_count"], 2);
        assert_eq!(body["total_invoiced"], 400.0);
        assert_eq!(body["total_received"], 120.0);
        assert_eq!(body["outstanding"], 280.0);
        assert_eq!(body["status_counts"]["partial"], 1);
        assert_eq!(body["status_counts"]["pending"], 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_dashboard_forbidden_for_portal_users() -> crate::errors::Result<()> {
        let state = setup_test_state().await?;
        let client = create_test_client(&state.db, "Acme").await?;
        let token =
            login_as(&state, "acme@portal.test", Role::Client, Some(client.id), None).await?;

        let (status, _) =
            send(crate::api::router(state), Method::GET, "/api/dashboard", Some(&token), None)
                .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        Ok(())
    }
}
