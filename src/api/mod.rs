//! HTTP API - axum router, authentication and JSON error mapping.
//!
//! Every route lives under `/api`. Handlers authenticate with the
//! [`extractors::AuthUser`] extractor, check the caller's role and then call
//! straight into [`crate::core`]; core errors become JSON responses through
//! [`error::ApiError`].

pub mod error;
pub mod extractors;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use extractors::AuthUser;
pub use server::{AppState, router, serve};
