//! Custom Axum extractors

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{error::ApiError, server::AppState};
use crate::{
    core::user::get_user_by_id,
    entities::{Role, UserModel},
};

/// Admin-only routes
pub const ADMIN: &[Role] = &[Role::Admin];
/// Back-office routes open to admins and staff
pub const BACK_OFFICE: &[Role] = &[Role::Admin, Role::Staff];
/// Client portal routes
pub const CLIENT: &[Role] = &[Role::Client];
/// Staff portal routes
pub const STAFF: &[Role] = &[Role::Staff];

/// The authenticated caller.
///
/// Extracted from an `Authorization: Bearer <token>` header. After the token
/// checks out the user is reloaded, so a deactivated or deleted account is
/// locked out immediately rather than when its token expires.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserModel);

impl AuthUser {
    /// Fails with 403 unless the caller has one of `roles`.
    pub fn require_role(&self, roles: &[Role]) -> Result<(), ApiError> {
        if roles.contains(&self.0.role) {
            Ok(())
        } else {
            Err(ApiError::forbidden(format!(
                "{} users cannot access this resource",
                self.0.role
            )))
        }
    }

    /// The client a client-role caller is linked to.
    pub fn client_id(&self) -> Result<i64, ApiError> {
        self.require_role(CLIENT)?;
        self.0
            .client_id
            .ok_or_else(|| ApiError::forbidden("account is not linked to a client"))
    }

    /// The staff record a staff-role caller is linked to.
    pub fn staff_id(&self) -> Result<i64, ApiError> {
        self.require_role(STAFF)?;
        self.0
            .staff_id
            .ok_or_else(|| ApiError::forbidden("account is not linked to a staff record"))
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;

        let claims = state.tokens.verify(token)?;

        let user = get_user_by_id(&state.db, claims.sub)
            .await?
            .filter(|user| user.is_active)
            .ok_or_else(|| ApiError::unauthorized("account is inactive or no longer exists"))?;

        Ok(Self(user))
    }
}
