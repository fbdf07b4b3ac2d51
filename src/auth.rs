//! Authentication primitives - password hashing and bearer tokens.
//!
//! Passwords are hashed with bcrypt. Sessions are stateless HS256 JWTs that
//! carry the user's role and portal links so the HTTP layer can authorize a
//! request without a join.

use crate::entities::{Role, UserModel};
use crate::errors::{Error, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Minimum accepted password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Hashes a plaintext password with the given bcrypt cost.
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    bcrypt::hash(password, cost).map_err(Into::into)
}

/// Checks a plaintext password against a stored bcrypt hash.
///
/// A malformed hash counts as a mismatch rather than an error so callers can
/// treat every failure uniformly.
#[must_use]
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// Claims embedded in every issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: i64,
    /// User email at issue time
    pub email: String,
    /// Portal role
    pub role: Role,
    /// Linked client for client users
    pub client_id: Option<i64>,
    /// Linked staff record for staff users
    pub staff_id: Option<i64>,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}

/// Issues and verifies HS256 tokens with a shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("ttl_hours", &self.ttl.num_hours())
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// Creates a token service from a secret and a token lifetime in hours.
    ///
    /// # Errors
    /// Returns [`Error::Config`] when the secret is empty.
    pub fn new(secret: &str, ttl_hours: i64) -> Result<Self> {
        if secret.trim().is_empty() {
            return Err(Error::Config {
                message: "JWT secret cannot be empty".to_string(),
            });
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        })
    }

    /// Issues a token for the given user.
    pub fn issue(&self, user: &UserModel) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            client_id: user.client_id,
            staff_id: user.staff_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(Into::into)
    }

    /// Verifies a token's signature and expiry and returns its claims.
    ///
    /// # Errors
    /// Every verification failure maps to [`Error::Unauthorized`].
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Rejected token: {e}");
                Error::Unauthorized {
                    message: "invalid or expired token".to_string(),
                }
            })
    }
}
