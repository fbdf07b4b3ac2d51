//! API error type with `IntoResponse`
//!
//! Core errors are converted to JSON bodies of the form
//! `{"error": "<code>", "message": "<text>"}` with a matching status code.
//! Server-side failures are logged and answered with a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::errors::Error;

/// API error wrapping a core [`Error`]
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    /// Shorthand for a 401 response.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self(Error::Unauthorized {
            message: message.into(),
        })
    }

    /// Shorthand for a 403 response.
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self(Error::Forbidden {
            message: message.into(),
        })
    }

    /// Status code and machine-readable code for the wrapped error.
    #[must_use]
    pub const fn status_and_code(&self) -> (StatusCode, &'static str) {
        match &self.0 {
            Error::Validation { .. } => (StatusCode::BAD_REQUEST, "validation_error"),
            Error::InvalidAmount { .. } => (StatusCode::BAD_REQUEST, "invalid_amount"),
            Error::Overpayment { .. } => (StatusCode::BAD_REQUEST, "overpayment"),
            Error::InvalidStatusTransition { .. } => {
                (StatusCode::BAD_REQUEST, "invalid_status_transition")
            }
            Error::Unauthorized { .. } => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Error::Forbidden { .. } => (StatusCode::FORBIDDEN, "forbidden"),
            Error::NotFound { .. } => (StatusCode::NOT_FOUND, "not_found"),
            Error::Conflict { .. } => (StatusCode::CONFLICT, "conflict"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            // Log the actual error, return generic message
            tracing::error!("Internal error: {}", self.0);
            "an internal error occurred".to_string()
        } else {
            match &self.0 {
                Error::Unauthorized { message }
                | Error::Forbidden { message }
                | Error::Conflict { message }
                | Error::Validation { message } => message.clone(),
                other => other.to_string(),
            }
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}
