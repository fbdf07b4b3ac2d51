//! Unified error type for the service.
//!
//! Core modules return [`Error`] and the HTTP layer maps each variant onto a
//! status code in [`crate::api::error`].

use thiserror::Error;

/// Every failure the core and API layers can produce.
#[derive(Debug, Error)]
pub enum Error {
    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Configuration could not be read or is inconsistent
    #[error("Configuration error: {message}")]
    Config {
        /// Details about the configuration problem
        message: String,
    },

    /// Input failed a business rule
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable reason
        message: String,
    },

    /// Amount is zero, negative where not allowed, or not finite
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// A referenced record does not exist (or is soft-deleted)
    #[error("{resource} '{id}' not found")]
    NotFound {
        /// Kind of record, e.g. `"client"`
        resource: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// The requested status change is not permitted
    #[error("Cannot move transaction from '{from}' to '{to}'")]
    InvalidStatusTransition {
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// A payment larger than the outstanding balance
    #[error("Payment of {attempted:.2} exceeds outstanding balance of {outstanding:.2}")]
    Overpayment {
        /// Balance still owed
        outstanding: f64,
        /// Amount the caller tried to record
        attempted: f64,
    },

    /// Missing or invalid credentials
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Reason shown to the caller
        message: String,
    },

    /// Authenticated but not allowed
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Reason shown to the caller
        message: String,
    },

    /// The operation clashes with existing state
    #[error("Conflict: {message}")]
    Conflict {
        /// Reason shown to the caller
        message: String,
    },

    /// Password hashing or verification failed
    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    /// Token encoding failed
    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    /// PDF rendering failed
    #[error("PDF error: {message}")]
    Pdf {
        /// Details from the renderer
        message: String,
    },

    /// JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O failure, e.g. binding the listener
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::NotFound`] keyed by a numeric id.
    #[must_use]
    pub fn not_found(resource: &'static str, id: i64) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
