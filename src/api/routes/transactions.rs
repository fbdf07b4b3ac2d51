//! Invoice endpoints - CRUD, payments, overdue refresh and PDF download

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::today;
use crate::api::{
    error::ApiError,
    extractors::{ADMIN, AuthUser, BACK_OFFICE},
    server::AppState,
};
use crate::core::{
    add_days,
    invoice::render_invoice_pdf,
    transaction::{
        self, NewItem, NewPayment, NewTransaction, PaymentReceipt, TransactionDetail,
        TransactionFilter, TransactionUpdate,
    },
};
use crate::entities::{Role, TransactionModel, TransactionPaymentModel};
use crate::errors::Error;

/// Create invoice request; dates default from today and the configured due offset
#[derive(Debug, Deserialize)]
struct CreateTransactionRequest {
    client_id: i64,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    issue_date: Option<NaiveDate>,
    #[serde(default)]
    due_date: Option<NaiveDate>,
    #[serde(default)]
    notes: Option<String>,
    items: Vec<NewItem>,
    #[serde(default)]
    draft: bool,
}

/// Record payment request; the date defaults to today
#[derive(Debug, Deserialize)]
struct RecordPaymentRequest {
    amount: f64,
    #[serde(default)]
    payment_date: Option<NaiveDate>,
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    notes: Option<String>,
}

/// Result of an overdue sweep
#[derive(Debug, Serialize)]
struct RefreshOverdueResponse {
    updated: u64,
}

/// GET /api/transactions - filter by status, client and issue date range
async fn list_transactions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(filter): Query<TransactionFilter>,
) -> Result<Json<Vec<TransactionModel>>, ApiError> {
    auth.require_role(BACK_OFFICE)?;
    Ok(Json(transaction::list_transactions(&state.db, &filter).await?))
}

/// POST /api/transactions
async fn create_transaction(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<TransactionDetail>), ApiError> {
    auth.require_role(BACK_OFFICE)?;

    let issue_date = req.issue_date.unwrap_or_else(today);
    let due_date = match req.due_date {
        Some(due_date) => due_date,
        None => add_days(issue_date, state.config.invoice.default_due_days)?,
    };

    let created = transaction::create_transaction(
        &state.db,
        NewTransaction {
            client_id: req.client_id,
            description: req.description,
            issue_date,
            due_date,
            notes: req.notes,
            items: req.items,
            draft: req.draft,
        },
        auth.0.id,
        &state.config.invoice.number_prefix,
    )
    .await?;

    let detail = transaction::get_transaction_detail(&state.db, created.id).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/transactions/{id} - invoice with client, items and payments
async fn get_transaction(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<TransactionDetail>, ApiError> {
    auth.require_role(BACK_OFFICE)?;
    Ok(Json(transaction::get_transaction_detail(&state.db, id).await?))
}

/// PUT /api/transactions/{id}
async fn update_transaction(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<TransactionUpdate>,
) -> Result<Json<TransactionDetail>, ApiError> {
    auth.require_role(BACK_OFFICE)?;
    transaction::update_transaction(&state.db, id, req).await?;
    Ok(Json(transaction::get_transaction_detail(&state.db, id).await?))
}

/// DELETE /api/transactions/{id}
async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    auth.require_role(ADMIN)?;
    transaction::delete_transaction(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/transactions/{id}/payments
async fn list_payments(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<TransactionPaymentModel>>, ApiError> {
    auth.require_role(BACK_OFFICE)?;
    transaction::get_transaction_by_id(&state.db, id)
        .await?
        .ok_or_else(|| Error::not_found("transaction", id))?;
    Ok(Json(transaction::list_payments(&state.db, id).await?))
}

/// POST /api/transactions/{id}/payments
async fn record_payment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentReceipt>), ApiError> {
    auth.require_role(BACK_OFFICE)?;
    let receipt = transaction::record_payment(
        &state.db,
        id,
        NewPayment {
            amount: req.amount,
            payment_date: req.payment_date.unwrap_or_else(today),
            method: req.method,
            notes: req.notes,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// DELETE /api/payments/{id} - returns the invoice after the payment is undone
async fn delete_payment(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<TransactionModel>, ApiError> {
    auth.require_role(ADMIN)?;
    Ok(Json(transaction::delete_payment(&state.db, id).await?))
}

/// POST /api/transactions/refresh-overdue
async fn refresh_overdue(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<RefreshOverdueResponse>, ApiError> {
    auth.require_role(ADMIN)?;
    let updated = transaction::refresh_overdue(&state.db, today()).await?;
    Ok(Json(RefreshOverdueResponse { updated }))
}

/// GET /api/transactions/{id}/pdf
///
/// Client users may only download their own invoices; anything else is a 404.
async fn download_pdf(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let detail = transaction::get_transaction_detail(&state.db, id).await?;
    if user.role == Role::Client && user.client_id != Some(detail.transaction.client_id) {
        return Err(Error::not_found("transaction", id).into());
    }

    let pdf = render_invoice_pdf(
        &detail,
        &state.config.company,
        &state.config.invoice.currency_symbol,
    )?;
    let disposition = format!(
        "inline; filename=\"{}.pdf\"",
        detail.transaction.invoice_number
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf,
    )
        .into_response())
}

/// Transaction routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/transactions",
            get(list_transactions).post(create_transaction),
        )
        .route("/api/transactions/refresh-overdue", post(refresh_overdue))
        .route(
            "/api/transactions/{id}",
            get(get_transaction)
                .put(update_transaction)
                .delete(delete_transaction),
        )
        .route(
            "/api/transactions/{id}/payments",
            get(list_payments).post(record_payment),
        )
        .route("/api/transactions/{id}/pdf", get(download_pdf))
        .route("/api/payments/{id}", delete(delete_payment))
}
