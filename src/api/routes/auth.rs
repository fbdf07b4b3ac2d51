//! Login and session endpoints

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::api::{error::ApiError, extractors::AuthUser, server::AppState};
use crate::core::user;
use crate::entities::UserModel;

/// Login request
#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

/// Login response carrying the bearer token
#[derive(Serialize)]
struct LoginResponse {
    token: String,
    token_type: &'static str,
    expires_in_hours: i64,
    user: UserModel,
}

/// Change password request
#[derive(Deserialize)]
struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

/// POST /api/auth/login - exchange credentials for a token
async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let user = user::authenticate(&state.db, &req.email, &req.password).await?;
    let token = state.tokens.issue(&user)?;
    tracing::info!(user_id = user.id, role = %user.role, "User logged in");

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer",
        expires_in_hours: state.config.auth.token_ttl_hours,
        user,
    }))
}

/// GET /api/auth/me - the authenticated user
async fn me(AuthUser(user): AuthUser) -> Json<UserModel> {
    Json(user)
}

/// POST /api/auth/change-password
async fn change_password(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    user::change_password(
        &state.db,
        user.id,
        &req.current_password,
        &req.new_password,
        state.config.auth.bcrypt_cost,
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Auth routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/me", get(me))
        .route("/api/auth/change-password", post(change_password))
}
