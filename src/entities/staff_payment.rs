//! Staff payment entity - Payroll-style payouts to staff members.
//!
//! Every staff payment is mirrored by exactly one `expense` row in the ledger.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Staff payment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "staff_payments")]
pub struct Model {
    /// Unique identifier for the payment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Staff member who was paid
    pub staff_id: i64,
    /// Amount paid out
    pub amount: f64,
    /// Date of the payout
    pub payment_date: Date,
    /// Pay period label, e.g. `"2026-09"`
    pub period: Option<String>,
    /// Optional description
    pub description: Option<String>,
    /// Payment method
    pub method: String,
    /// When the payment was recorded
    pub created_at: DateTimeUtc,
    /// When the payment was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between a staff payment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment belongs to one staff member
    #[sea_orm(
        belongs_to = "super::staff::Entity",
        from = "Column::StaffId",
        to = "super::staff::Column::Id"
    )]
    Staff,
}

impl Related<super::staff::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Staff.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
