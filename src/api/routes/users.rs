//! User account administration (admin only)

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;

use crate::api::{
    error::ApiError,
    extractors::{ADMIN, AuthUser},
    server::AppState,
};
use crate::core::user::{self, NewUser};
use crate::entities::{Role, UserModel};

/// Query parameters for listing users
#[derive(Debug, Default, Deserialize)]
struct UserQuery {
    role: Option<Role>,
}

/// GET /api/users - list accounts, optionally by role
async fn list_users(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<UserModel>>, ApiError> {
    auth.require_role(ADMIN)?;
    Ok(Json(user::list_users(&state.db, query.role).await?))
}

/// POST /api/users - create an account
async fn create_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<NewUser>,
) -> Result<(StatusCode, Json<UserModel>), ApiError> {
    auth.require_role(ADMIN)?;
    let created = user::create_user(&state.db, req, state.config.auth.bcrypt_cost).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/users/{id}/activate
async fn activate_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<UserModel>, ApiError> {
    auth.require_role(ADMIN)?;
    Ok(Json(user::set_user_active(&state.db, id, true).await?))
}

/// POST /api/users/{id}/deactivate
async fn deactivate_user(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<UserModel>, ApiError> {
    auth.require_role(ADMIN)?;
    Ok(Json(user::set_user_active(&state.db, id, false).await?))
}

/// User routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/{id}/activate", post(activate_user))
        .route("/api/users/{id}/deactivate", post(deactivate_user))
}
