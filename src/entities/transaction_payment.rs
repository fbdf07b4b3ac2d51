//! Transaction payment entity - A single payment received against an invoice.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transaction_payments")]
pub struct Model {
    /// Unique identifier for the payment
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Transaction the payment settles (fully or partly)
    pub transaction_id: i64,
    /// Amount received
    pub amount: f64,
    /// Date the money was received
    pub payment_date: Date,
    /// Payment method, e.g. `"bank_transfer"`, `"cash"`, `"settlement"`
    pub method: String,
    /// Optional remark
    pub notes: Option<String>,
    /// When the payment was recorded
    pub created_at: DateTimeUtc,
}

/// Defines relationships between a payment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment belongs to one transaction
    #[sea_orm(
        belongs_to = "super::transaction::Entity",
        from = "Column::TransactionId",
        to = "super::transaction::Column::Id"
    )]
    Transaction,
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transaction.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
