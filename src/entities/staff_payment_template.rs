//! Staff payment template entity - Saved presets for recurring payouts.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Staff payment template database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "staff_payment_templates")]
pub struct Model {
    /// Unique identifier for the template
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name shown on the quick-action button
    pub name: String,
    /// Staff member to pay
    pub staff_id: i64,
    /// Amount to pay
    pub amount: f64,
    /// Description copied to the payment
    pub description: Option<String>,
    /// Payment method copied to the payment
    pub method: String,
    /// When the template was created
    pub created_at: DateTimeUtc,
}

/// `StaffPaymentTemplate` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
