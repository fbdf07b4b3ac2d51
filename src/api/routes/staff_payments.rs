//! Staff payment endpoints (admin only)

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use serde::Deserialize;

use crate::api::{
    error::ApiError,
    extractors::{ADMIN, AuthUser},
    server::AppState,
};
use crate::core::staff_payment::{self, NewStaffPayment, StaffPaymentUpdate};
use crate::entities::StaffPaymentModel;
use crate::errors::Error;

/// Query parameters for listing staff payments
#[derive(Debug, Default, Deserialize)]
struct StaffPaymentQuery {
    staff_id: Option<i64>,
}

/// GET /api/staff-payments
async fn list_staff_payments(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<StaffPaymentQuery>,
) -> Result<Json<Vec<StaffPaymentModel>>, ApiError> {
    auth.require_role(ADMIN)?;
    Ok(Json(
        staff_payment::list_staff_payments(&state.db, query.staff_id).await?,
    ))
}

/// POST /api/staff-payments
async fn create_staff_payment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<NewStaffPayment>,
) -> Result<(StatusCode, Json<StaffPaymentModel>), ApiError> {
    auth.require_role(ADMIN)?;
    let created = staff_payment::create_staff_payment(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/staff-payments/{id}
async fn get_staff_payment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<StaffPaymentModel>, ApiError> {
    auth.require_role(ADMIN)?;
    let payment = staff_payment::get_staff_payment_by_id(&state.db, id)
        .await?
        .ok_or_else(|| Error::not_found("staff payment", id))?;
    Ok(Json(payment))
}

/// PUT /api/staff-payments/{id}
async fn update_staff_payment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<StaffPaymentUpdate>,
) -> Result<Json<StaffPaymentModel>, ApiError> {
    auth.require_role(ADMIN)?;
    Ok(Json(
        staff_payment::update_staff_payment(&state.db, id, req).await?,
    ))
}

/// DELETE /api/staff-payments/{id}
async fn delete_staff_payment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    auth.require_role(ADMIN)?;
    staff_payment::delete_staff_payment(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Staff payment routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/staff-payments",
            get(list_staff_payments).post(create_staff_payment),
        )
        .route(
            "/api/staff-payments/{id}",
            get(get_staff_payment)
                .put(update_staff_payment)
                .delete(delete_staff_payment),
        )
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use crate::core::ledger::{self, LedgerFilter};
    use crate::entities::{ReferenceType, Role};
    use crate::test_utils::*;
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    #[tokio::test]
    async fn test_payment_is_mirrored_to_ledger() -> crate::errors::Result<()> {
        let state = setup_test_state().await?;
        let staff = create_test_staff(&state.db, "Dana Dev").await?;
        let token = login_as(&state, "admin@example.test", Role::Admin, None, None).await?;
        let app = crate::api::router(state.clone());

        let (status, body) = send(
            app.clone(),
            Method::POST,
            "/api/staff-payments",
            Some(&token),
            Some(json!({
                "staff_id": staff.id,
                "amount": 1500.0,
                "payment_date": "2026-03-31",
                "period": "2026-03",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let uri = format!("/api/staff-payments/{}", body["id"]);

        let filter = LedgerFilter {
            reference_type: Some(ReferenceType::StaffPayment),
            ..Default::default()
        };
        let summary = ledger::summarize(&state.db, &filter).await?;
        assert_eq!(summary.total_expense, 1500.0);

        let (status, _) = send(
            app.clone(),
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({ "amount": 1600.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ledger::summarize(&state.db, &filter).await?.total_expense, 1600.0);

        let (status, _) = send(app, Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(ledger::summarize(&state.db, &filter).await?.entry_count, 0);

        Ok(())
    }

    #[tokio::test]
    async fn test_filter_by_staff() -> crate::errors::Result<()> {
        let state = setup_test_state().await?;
        let dana = create_test_staff(&state.db, "Dana Dev").await?;
        let eli = create_test_staff(&state.db, "Eli Ops").await?;
        create_test_staff_payment(&state.db, dana.id, 100.0).await?;
        create_test_staff_payment(&state.db, eli.id, 200.0).await?;
        let token = login_as(&state, "admin@example.test", Role::Admin, None, None).await?;

        let (status, body) = send(
            crate::api::router(state),
            Method::GET,
            &format!("/api/staff-payments?staff_id={}", eli.id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(1));
        assert_eq!(body[0]["amount"], 200.0);

        Ok(())
    }
}
