//! Quick template endpoints
//!
//! Invoice templates are shared by admins and staff; staff payment templates
//! are admin only, like the payments they create.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::Deserialize;

use super::today;
use crate::api::{
    error::ApiError,
    extractors::{ADMIN, AuthUser, BACK_OFFICE},
    server::AppState,
};
use crate::core::{
    template::{self, NewStaffPaymentTemplate, NewTransactionTemplate},
    transaction::{self, TransactionDetail},
};
use crate::entities::{StaffPaymentModel, StaffPaymentTemplateModel, TransactionTemplateModel};
use crate::errors::Error;

/// Apply invoice template request
#[derive(Debug, Default, Deserialize)]
struct ApplyTransactionTemplateRequest {
    /// Bill this client instead of the template's default
    #[serde(default)]
    client_id: Option<i64>,
}

/// GET /api/templates/transactions
async fn list_transaction_templates(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<TransactionTemplateModel>>, ApiError> {
    auth.require_role(BACK_OFFICE)?;
    Ok(Json(template::list_transaction_templates(&state.db).await?))
}

/// POST /api/templates/transactions
async fn create_transaction_template(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<NewTransactionTemplate>,
) -> Result<(StatusCode, Json<TransactionTemplateModel>), ApiError> {
    auth.require_role(BACK_OFFICE)?;
    let created = template::create_transaction_template(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/templates/transactions/{id}
async fn get_transaction_template(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<TransactionTemplateModel>, ApiError> {
    auth.require_role(BACK_OFFICE)?;
    let found = template::get_transaction_template_by_id(&state.db, id)
        .await?
        .ok_or_else(|| Error::not_found("transaction template", id))?;
    Ok(Json(found))
}

/// DELETE /api/templates/transactions/{id}
async fn delete_transaction_template(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    auth.require_role(BACK_OFFICE)?;
    template::delete_transaction_template(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/templates/transactions/{id}/apply - issue an invoice from the template
async fn apply_transaction_template(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<ApplyTransactionTemplateRequest>,
) -> Result<(StatusCode, Json<TransactionDetail>), ApiError> {
    auth.require_role(BACK_OFFICE)?;
    let created = template::apply_transaction_template(
        &state.db,
        id,
        req.client_id,
        auth.0.id,
        today(),
        &state.config.invoice.number_prefix,
    )
    .await?;
    let detail = transaction::get_transaction_detail(&state.db, created.id).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/templates/staff-payments
async fn list_staff_payment_templates(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<StaffPaymentTemplateModel>>, ApiError> {
    auth.require_role(ADMIN)?;
    Ok(Json(template::list_staff_payment_templates(&state.db).await?))
}

/// POST /api/templates/staff-payments
async fn create_staff_payment_template(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<NewStaffPaymentTemplate>,
) -> Result<(StatusCode, Json<StaffPaymentTemplateModel>), ApiError> {
    auth.require_role(ADMIN)?;
    let created = template::create_staff_payment_template(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// DELETE /api/templates/staff-payments/{id}
async fn delete_staff_payment_template(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    auth.require_role(ADMIN)?;
    template::delete_staff_payment_template(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/templates/staff-payments/{id}/apply - pay out today
async fn apply_staff_payment_template(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<(StatusCode, Json<StaffPaymentModel>), ApiError> {
    auth.require_role(ADMIN)?;
    let payment = template::apply_staff_payment_template(&state.db, id, today()).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// Template routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/templates/transactions",
            get(list_transaction_templates).post(create_transaction_template),
        )
        .route(
            "/api/templates/transactions/{id}",
            get(get_transaction_template).delete(delete_transaction_template),
        )
        .route(
            "/api/templates/transactions/{id}/apply",
            post(apply_transaction_template),
        )
        .route(
            "/api/templates/staff-payments",
            get(list_staff_payment_templates).post(create_staff_payment_template),
        )
        .route(
            "/api/templates/staff-payments/{id}",
            delete(delete_staff_payment_template),
        )
        .route(
            "/api/templates/staff-payments/{id}/apply",
            post(apply_staff_payment_template),
        )
}
