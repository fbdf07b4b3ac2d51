//! User entity - Login accounts for the three portals.
//!
//! Each user carries a role. Client users are linked to a `clients` row and
//! staff users to a `staff` row; admins carry neither link.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role that decides which portal and routes a user may reach
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access to every resource
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Back-office staff: clients, invoices, payments
    #[sea_orm(string_value = "staff")]
    Staff,
    /// A client viewing its own invoices
    #[sea_orm(string_value = "client")]
    Client,
}

impl Role {
    /// Lowercase wire name of the role
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Login email, stored trimmed and lowercased
    #[sea_orm(unique)]
    pub email: String,
    /// bcrypt hash of the password
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Display name
    pub name: String,
    /// Portal role
    pub role: Role,
    /// Linked client record for `client` users
    pub client_id: Option<i64>,
    /// Linked staff record for `staff` users
    pub staff_id: Option<i64>,
    /// Deactivated users can no longer log in
    pub is_active: bool,
    /// When the account was created
    pub created_at: DateTimeUtc,
    /// When the account was last modified
    pub updated_at: DateTimeUtc,
}

/// `User` relationships are resolved by id lookups in the core layer
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
