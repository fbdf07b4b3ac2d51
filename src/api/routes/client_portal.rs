//! Client portal - a client user's own invoices and totals

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use super::today;
use crate::api::{error::ApiError, extractors::AuthUser, server::AppState};
use crate::core::{
    report::{self, ClientDashboard},
    transaction::{self, TransactionDetail},
};
use crate::entities::TransactionModel;
use crate::errors::Error;

/// GET /api/client-portal/dashboard
async fn dashboard(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<ClientDashboard>, ApiError> {
    let client_id = auth.client_id()?;
    Ok(Json(
        report::client_dashboard(&state.db, client_id, today()).await?,
    ))
}

/// GET /api/client-portal/transactions
async fn transactions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<TransactionModel>>, ApiError> {
    let client_id = auth.client_id()?;
    Ok(Json(
        transaction::get_transactions_for_client(&state.db, client_id).await?,
    ))
}

/// GET /api/client-portal/transactions/{id}
async fn transaction_detail(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<TransactionDetail>, ApiError> {
    let client_id = auth.client_id()?;
    let detail = transaction::get_transaction_detail(&state.db, id).await?;
    if detail.transaction.client_id != client_id {
        return Err(Error::not_found("transaction", id).into());
    }
    Ok(Json(detail))
}

/// Client portal routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/client-portal/dashboard", get(dashboard))
        .route("/api/client-portal/transactions", get(transactions))
        .route(
            "/api/client-portal/transactions/{id}",
            get(transaction_detail),
        )
}

#[cfg(test)]
mod tests {
    use crate::entities::Role;
    use crate::test_utils::*;
    use axum::http::{Method, StatusCode};

    #[tokio::test]
    async fn test_client_sees_only_own_invoices() -> crate::errors::Result<()> {
        let state = setup_test_state().await?;
        let (acme, own) = setup_with_transaction(&state.db, 120.0).await?;
        let (_, foreign) = setup_with_transaction(&state.db, 75.0).await?;
        let token =
            login_as(&state, "acme@portal.test", Role::Client, Some(acme.id), None).await?;
        let app = crate::api::router(state);

        let (status, body) = send(
            app.clone(),
            Method::GET,
            "/api/client-portal/transactions",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["id"], own.id);

        let (status, _) = send(
            app.clone(),
            Method::GET,
            &format!("/api/client-portal/transactions/{}", own.id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            app.clone(),
            Method::GET,
            &format!("/api/client-portal/transactions/{}", foreign.id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            app,
            Method::GET,
            "/api/client-portal/dashboard",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["invoice_count"], 1);
        assert_eq!(body["outstanding"], 120.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_admin_is_not_a_client() -> crate::errors::Result<()> {
        let state = setup_test_state().await?;
        let token = login_as(&state, "admin@example.test", Role::Admin, None, None).await?;

        let (status, _) = send(
            crate::api::router(state),
            Method::GET,
            "/api/client-portal/dashboard",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        Ok(())
    }
}
