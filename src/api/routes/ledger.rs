//! Ledger endpoints (admin only)
//!
//! Mirror rows are maintained by the transaction and staff payment flows; only
//! manual adjustments can be created or deleted here.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};

use crate::api::{
    error::ApiError,
    extractors::{ADMIN, AuthUser},
    server::AppState,
};
use crate::core::ledger::{self, LedgerFilter, LedgerSummary, NewLedgerEntry};
use crate::entities::LedgerModel;
use crate::errors::Error;

/// GET /api/ledger
async fn list_entries(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(filter): Query<LedgerFilter>,
) -> Result<Json<Vec<LedgerModel>>, ApiError> {
    auth.require_role(ADMIN)?;
    Ok(Json(ledger::list_entries(&state.db, &filter).await?))
}

/// GET /api/ledger/summary
async fn summary(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(filter): Query<LedgerFilter>,
) -> Result<Json<LedgerSummary>, ApiError> {
    auth.require_role(ADMIN)?;
    Ok(Json(ledger::summarize(&state.db, &filter).await?))
}

/// POST /api/ledger - manual adjustment
async fn create_entry(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<NewLedgerEntry>,
) -> Result<(StatusCode, Json<LedgerModel>), ApiError> {
    auth.require_role(ADMIN)?;
    let entry = ledger::create_manual_entry(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /api/ledger/{id}
async fn get_entry(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<LedgerModel>, ApiError> {
    auth.require_role(ADMIN)?;
    let entry = ledger::get_entry_by_id(&state.db, id)
        .await?
        .ok_or_else(|| Error::not_found("ledger entry", id))?;
    Ok(Json(entry))
}

/// DELETE /api/ledger/{id} - manual rows only
async fn delete_entry(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    auth.require_role(ADMIN)?;
    ledger::delete_manual_entry(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Ledger routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/ledger", get(list_entries).post(create_entry))
        .route("/api/ledger/summary", get(summary))
        .route("/api/ledger/{id}", get(get_entry).delete(delete_entry))
}
