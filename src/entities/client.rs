//! Client entity - Customers that receive invoices.
//!
//! `total_spent` is an aggregate of the `paid_amount` of every transaction
//! billed to the client and is only ever changed through atomic delta updates.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Client database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "clients")]
pub struct Model {
    /// Unique identifier for the client
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Client or contact name
    pub name: String,
    /// Billing email
    pub email: String,
    /// Optional phone number
    pub phone: Option<String>,
    /// Optional company name
    pub company: Option<String>,
    /// Optional postal address printed on invoices
    pub address: Option<String>,
    /// Sum of all amounts paid by this client
    pub total_spent: f64,
    /// Soft delete flag - if true, client is hidden but history is preserved
    pub is_deleted: bool,
    /// When the client was created
    pub created_at: DateTimeUtc,
    /// When the client was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Client and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One client has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
