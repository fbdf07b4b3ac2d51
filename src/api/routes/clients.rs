//! Client management endpoints

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
    extractors::{ADMIN, AuthUser, BACK_OFFICE},
    server::AppState,
};
use crate::core::{
    client::{self, ClientUpdate, NewClient},
    transaction,
};
use crate::entities::{ClientModel, TransactionModel};

/// Query parameters for listing clients
#[derive(Debug, Default, Deserialize)]
struct ClientQuery {
    /// Matches name, email or company
    search: Option<String>,
}

/// GET /api/clients - active clients, optionally filtered by a search term
async fn list_clients(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ClientQuery>,
) -> Result<Json<Vec<ClientModel>>, ApiError> {
    auth.require_role(BACK_OFFICE)?;
    let clients = match query.search.as_deref().map(str::trim) {
        Some(term) if !term.is_empty() => client::search_clients(&state.db, term).await?,
        _ => client::get_all_active_clients(&state.db).await?,
    };
    Ok(Json(clients))
}

/// POST /api/clients
async fn create_client(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<NewClient>,
) -> Result<(StatusCode, Json<ClientModel>), ApiError> {
    auth.require_role(BACK_OFFICE)?;
    let created = client::create_client(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/clients/{id}
async fn get_client(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<ClientModel>, ApiError> {
    auth.require_role(BACK_OFFICE)?;
    Ok(Json(client::require_active_client(&state.db, id).await?))
}

/// PUT /api/clients/{id}
async fn update_client(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<ClientUpdate>,
) -> Result<Json<ClientModel>, ApiError> {
    auth.require_role(BACK_OFFICE)?;
    Ok(Json(client::update_client(&state.db, id, req).await?))
}

/// DELETE /api/clients/{id} - soft delete, admin only
async fn delete_client(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    auth.require_role(ADMIN)?;
    client::delete_client(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/clients/{id}/transactions
async fn client_transactions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Vec<TransactionModel>>, ApiError> {
    auth.require_role(BACK_OFFICE)?;
    client::require_active_client(&state.db, id).await?;
    Ok(Json(
        transaction::get_transactions_for_client(&state.db, id).await?,
    ))
}

/// Client routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/clients", get(list_clients).post(create_client))
        .route(
            "/api/clients/{id}",
            get(get_client).put(update_client).delete(delete_client),
        )
        .route("/api/clients/{id}/transactions", get(client_transactions))
}
