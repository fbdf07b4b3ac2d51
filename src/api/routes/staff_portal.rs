//! Staff portal - a staff user's own profile and payouts

use std::sync::Arc;

use axum::{Json, Router, extract::State, routing::get};

use crate::api::{error::ApiError, extractors::AuthUser, server::AppState};
use crate::core::{
    report::{self, StaffDashboard},
    staff, staff_payment,
};
use crate::entities::{StaffModel, StaffPaymentModel};
use crate::errors::Error;

/// GET /api/staff-portal/dashboard
async fn dashboard(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<StaffDashboard>, ApiError> {
    let staff_id = auth.staff_id()?;
    Ok(Json(report::staff_dashboard(&state.db, staff_id).await?))
}

/// GET /api/staff-portal/payments
async fn payments(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<StaffPaymentModel>>, ApiError> {
    let staff_id = auth.staff_id()?;
    Ok(Json(
        staff_payment::list_staff_payments(&state.db, Some(staff_id)).await?,
    ))
}

/// GET /api/staff-portal/profile
async fn profile(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<StaffModel>, ApiError> {
    let staff_id = auth.staff_id()?;
    let record = staff::get_staff_by_id(&state.db, staff_id)
        .await?
        .ok_or_else(|| Error::not_found("staff", staff_id))?;
    Ok(Json(record))
}

/// Staff portal routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/staff-portal/dashboard", get(dashboard))
        .route("/api/staff-portal/payments", get(payments))
        .route("/api/staff-portal/profile", get(profile))
}
