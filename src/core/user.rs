//! User business logic - Accounts, credentials and portal links.
//!
//! Emails are stored trimmed and lowercased, so lookups are
//! case-insensitive. Authentication failures are deliberately uniform: an
//! unknown email, a wrong password and a deactivated account all produce the
//! same `Unauthorized` error.

use crate::{
    auth::{MIN_PASSWORD_LEN, hash_password, verify_password},
    core::{
        client::require_active_client, normalize_email, required_text, staff::require_active_staff,
    },
    entities::{Role, User, user},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// Input for [`create_user`]
#[derive(Clone, Deserialize)]
pub struct NewUser {
    /// Login email
    pub email: String,
    /// Plaintext password, hashed before storage
    pub password: String,
    /// Display name
    pub name: String,
    /// Portal role
    pub role: Role,
    /// Linked client, required for client users
    #[serde(default)]
    pub client_id: Option<i64>,
    /// Linked staff record, required for staff users
    #[serde(default)]
    pub staff_id: Option<i64>,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("email", &self.email)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("client_id", &self.client_id)
            .field("staff_id", &self.staff_id)
            .finish_non_exhaustive()
    }
}

fn invalid_credentials() -> Error {
    Error::Unauthorized {
        message: "invalid email or password".to_string(),
    }
}

fn check_password_strength(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Creates a user account.
///
/// # Errors
/// * `Validation` for a malformed email, short password or inconsistent
///   role links
/// * `Conflict` when the email is already registered
/// * `NotFound` when the linked client or staff record does not exist
#[instrument(skip(db), fields(email = %input.email, role = %input.role))]
pub async fn create_user(
    db: &DatabaseConnection,
    input: NewUser,
    bcrypt_cost: u32,
) -> Result<user::Model> {
    let email = normalize_email(&input.email)?;
    let name = required_text("User name", &input.name)?;
    check_password_strength(&input.password)?;

    match (input.role, input.client_id, input.staff_id) {
        (Role::Admin, None, None) | (Role::Client, Some(_), None) | (Role::Staff, None, Some(_)) => {}
        (role, ..) => {
            return Err(Error::validation(format!(
                "A {role} user needs {}",
                match role {
                    Role::Admin => "no client or staff link",
                    Role::Client => "a client_id and no staff_id",
                    Role::Staff => "a staff_id and no client_id",
                }
            )));
        }
    }
    if let Some(client_id) = input.client_id {
        require_active_client(db, client_id).await?;
    }
    if let Some(staff_id) = input.staff_id {
        require_active_staff(db, staff_id).await?;
    }

    if get_user_by_email(db, &email).await?.is_some() {
        return Err(Error::Conflict {
            message: format!("a user with email '{email}' already exists"),
        });
    }

    let password_hash = hash_password(&input.password, bcrypt_cost)?;

    let now = Utc::now();
    let user = user::ActiveModel {
        email: Set(email),
        password_hash: Set(password_hash),
        name: Set(name),
        role: Set(input.role),
        client_id: Set(input.client_id),
        staff_id: Set(input.staff_id),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(user_id = user.id, "Created user");
    Ok(user)
}

/// Checks credentials and returns the active user they belong to.
#[instrument(skip(db, password))]
pub async fn authenticate(db: &DatabaseConnection, email: &str, password: &str) -> Result<user::Model> {
    let email = email.trim().to_lowercase();
    let Some(user) = get_user_by_email(db, &email).await? else {
        return Err(invalid_credentials());
    };

    if !verify_password(password, &user.password_hash) {
        warn!(user_id = user.id, "Failed login attempt");
        return Err(invalid_credentials());
    }
    if !user.is_active {
        warn!(user_id = user.id, "Login attempt on deactivated account");
        return Err(invalid_credentials());
    }

    Ok(user)
}

/// Retrieves a user by ID.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Retrieves a user by email, ignoring case and surrounding whitespace.
pub async fn get_user_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Email.eq(email.trim().to_lowercase()))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists all users, optionally only those with one role.
pub async fn list_users(db: &DatabaseConnection, role: Option<Role>) -> Result<Vec<user::Model>> {
    let mut query = User::find();
    if let Some(role) = role {
        query = query.filter(user::Column::Role.eq(role));
    }
    query
        .order_by_asc(user::Column::Email)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Replaces a user's password after checking the current one.
#[instrument(skip(db, current_password, new_password))]
pub async fn change_password(
    db: &DatabaseConnection,
    user_id: i64,
    current_password: &str,
    new_password: &str,
    bcrypt_cost: u32,
) -> Result<()> {
    let user = get_user_by_id(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))?;

    if !verify_password(current_password, &user.password_hash) {
        return Err(Error::Unauthorized {
            message: "current password is incorrect".to_string(),
        });
    }
    check_password_strength(new_password)?;

    let mut active: user::ActiveModel = user.into();
    active.password_hash = Set(hash_password(new_password, bcrypt_cost)?);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;

    info!(user_id, "Changed password");
    Ok(())
}

/// Activates or deactivates an account.
///
/// # Errors
/// Returns `Conflict` when deactivating the last active admin.
#[instrument(skip(db))]
pub async fn set_user_active(
    db: &DatabaseConnection,
    user_id: i64,
    is_active: bool,
) -> Result<user::Model> {
    let user = get_user_by_id(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))?;

    if !is_active && user.is_active && user.role == Role::Admin {
        let active_admins = User::find()
            .filter(user::Column::Role.eq(Role::Admin))
            .filter(user::Column::IsActive.eq(true))
            .count(db)
            .await?;
        if active_admins <= 1 {
            return Err(Error::Conflict {
                message: "cannot deactivate the last active admin".to_string(),
            });
        }
    }

    let mut active: user::ActiveModel = user.into();
    active.is_active = Set(is_active);
    active.updated_at = Set(Utc::now());
    let updated = active.update(db).await?;

    info!(user_id, is_active, "Changed user activation");
    Ok(updated)
}
