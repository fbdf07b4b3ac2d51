//! Staff entity - Employees and contractors that receive staff payments.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Staff database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "staff")]
pub struct Model {
    /// Unique identifier for the staff member
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Full name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Optional phone number
    pub phone: Option<String>,
    /// Optional job title
    pub position: Option<String>,
    /// Agreed salary per pay period
    pub salary: f64,
    /// Soft delete flag
    pub is_deleted: bool,
    /// When the record was created
    pub created_at: DateTimeUtc,
    /// When the record was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Staff and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One staff member has many payments
    #[sea_orm(has_many = "super::staff_payment::Entity")]
    Payments,
}

impl Related<super::staff_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
