//! Staff directory endpoints (admin only)

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};

use crate::api::{
    error::ApiError,
    extractors::{ADMIN, AuthUser},
    server::AppState,
};
use crate::core::staff::{self, NewStaff, StaffUpdate};
use crate::entities::StaffModel;

/// GET /api/staff
async fn list_staff(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<StaffModel>>, ApiError> {
    auth.require_role(ADMIN)?;
    Ok(Json(staff::get_all_active_staff(&state.db).await?))
}

/// POST /api/staff
async fn create_staff(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<NewStaff>,
) -> Result<(StatusCode, Json<StaffModel>), ApiError> {
    auth.require_role(ADMIN)?;
    let created = staff::create_staff(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/staff/{id}
async fn get_staff(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<StaffModel>, ApiError> {
    auth.require_role(ADMIN)?;
    Ok(Json(staff::require_active_staff(&state.db, id).await?))
}

/// PUT /api/staff/{id}
async fn update_staff(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(req): Json<StaffUpdate>,
) -> Result<Json<StaffModel>, ApiError> {
    auth.require_role(ADMIN)?;
    Ok(Json(staff::update_staff(&state.db, id, req).await?))
}

/// DELETE /api/staff/{id} - soft delete
async fn delete_staff(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    auth.require_role(ADMIN)?;
    staff::delete_staff(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Staff routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/staff", get(list_staff).post(create_staff))
        .route(
            "/api/staff/{id}",
            get(get_staff).put(update_staff).delete(delete_staff),
        )
}
