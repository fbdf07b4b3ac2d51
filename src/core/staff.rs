//! Staff business logic - Handles staff member records.
//!
//! Staff records are soft-deleted; their payment history and ledger rows stay
//! intact after deletion.

use crate::{
    core::{ensure_non_negative, normalize_email, optional_text, required_text, round_cents},
    entities::{Staff, staff},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Input for [`create_staff`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewStaff {
    /// Full name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Optional phone number
    #[serde(default)]
    pub phone: Option<String>,
    /// Optional job title
    #[serde(default)]
    pub position: Option<String>,
    /// Agreed salary per pay period
    #[serde(default)]
    pub salary: f64,
}

/// Partial update for [`update_staff`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaffUpdate {
    /// New name
    #[serde(default)]
    pub name: Option<String>,
    /// New email
    #[serde(default)]
    pub email: Option<String>,
    /// New phone; blank clears it
    #[serde(default)]
    pub phone: Option<String>,
    /// New position; blank clears it
    #[serde(default)]
    pub position: Option<String>,
    /// New salary
    #[serde(default)]
    pub salary: Option<f64>,
}

/// Creates a new staff member.
#[instrument(skip(db))]
pub async fn create_staff(db: &DatabaseConnection, input: NewStaff) -> Result<staff::Model> {
    let name = required_text("Staff name", &input.name)?;
    let email = normalize_email(&input.email)?;
    ensure_non_negative(input.salary)?;

    let now = chrono::Utc::now();
    let staff = staff::ActiveModel {
        name: Set(name),
        email: Set(email),
        phone: Set(optional_text(input.phone)),
        position: Set(optional_text(input.position)),
        salary: Set(round_cents(input.salary)),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = staff.insert(db).await?;
    info!(staff_id = result.id, "Created staff member");
    Ok(result)
}

/// Retrieves a staff member by ID, including soft-deleted ones.
pub async fn get_staff_by_id(db: &DatabaseConnection, staff_id: i64) -> Result<Option<staff::Model>> {
    Staff::find_by_id(staff_id).one(db).await.map_err(Into::into)
}

/// Loads an active staff member or fails with `NotFound`.
pub async fn require_active_staff<C>(conn: &C, staff_id: i64) -> Result<staff::Model>
where
    C: ConnectionTrait,
{
    Staff::find_by_id(staff_id)
        .one(conn)
        .await?
        .filter(|s| !s.is_deleted)
        .ok_or_else(|| Error::not_found("staff", staff_id))
}

/// Retrieves all active staff members ordered by name.
pub async fn get_all_active_staff(db: &DatabaseConnection) -> Result<Vec<staff::Model>> {
    Staff::find()
        .filter(staff::Column::IsDeleted.eq(false))
        .order_by_asc(staff::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies a partial update to an active staff member.
#[instrument(skip(db))]
pub async fn update_staff(
    db: &DatabaseConnection,
    staff_id: i64,
    update: StaffUpdate,
) -> Result<staff::Model> {
    if let Some(salary) = update.salary {
        ensure_non_negative(salary)?;
    }

    let mut staff: staff::ActiveModel = require_active_staff(db, staff_id).await?.into();

    if let Some(name) = update.name {
        staff.name = Set(required_text("Staff name", &name)?);
    }
    if let Some(email) = update.email {
        staff.email = Set(normalize_email(&email)?);
    }
    if let Some(phone) = update.phone {
        staff.phone = Set(optional_text(Some(phone)));
    }
    if let Some(position) = update.position {
        staff.position = Set(optional_text(Some(position)));
    }
    if let Some(salary) = update.salary {
        staff.salary = Set(round_cents(salary));
    }
    staff.updated_at = Set(chrono::Utc::now());

    staff.update(db).await.map_err(Into::into)
}

/// Soft deletes a staff member, preserving payment history.
#[instrument(skip(db))]
pub async fn delete_staff(db: &DatabaseConnection, staff_id: i64) -> Result<staff::Model> {
    let mut staff: staff::ActiveModel = require_active_staff(db, staff_id).await?.into();
    staff.is_deleted = Set(true);
    staff.updated_at = Set(chrono::Utc::now());
    let result = staff.update(db).await?;
    info!(staff_id, "Soft deleted staff member");
    Ok(result)
}
