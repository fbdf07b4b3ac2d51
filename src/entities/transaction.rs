//! Transaction entity - An invoice issued to a client.
//!
//! `total_amount` is the sum of the line items and `paid_amount` the sum of the
//! recorded payments. The `status` decides how the invoice is mirrored in the
//! ledger: a `paid` invoice appears as one income row for its full amount,
//! every other status is represented by one income row per payment.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an invoice
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Being prepared; cannot receive payments
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Issued and awaiting payment
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Fully settled
    #[sea_orm(string_value = "paid")]
    Paid,
    /// Some, but not all, of the total has been paid
    #[sea_orm(string_value = "partial")]
    Partial,
    /// Past the due date without any payment
    #[sea_orm(string_value = "overdue")]
    Overdue,
}

impl TransactionStatus {
    /// Lowercase wire name of the status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Partial => "partial",
            Self::Overdue => "overdue",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-facing invoice number, e.g. `INV-2026-00042`
    #[sea_orm(unique)]
    pub invoice_number: String,
    /// ID of the billed client
    pub client_id: i64,
    /// Optional summary line
    pub description: Option<String>,
    /// Lifecycle state
    pub status: TransactionStatus,
    /// Sum of all line item amounts
    pub total_amount: f64,
    /// Sum of all recorded payments
    pub paid_amount: f64,
    /// Date the invoice was issued
    pub issue_date: Date,
    /// Date payment is due
    pub due_date: Date,
    /// Free-form notes printed at the bottom of the invoice
    pub notes: Option<String>,
    /// ID of the user who created the invoice
    pub created_by: i64,
    /// When the transaction was created
    pub created_at: DateTimeUtc,
    /// When the transaction was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one client
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,
    /// One transaction has many line items
    #[sea_orm(has_many = "super::transaction_item::Entity")]
    Items,
    /// One transaction has many payments
    #[sea_orm(has_many = "super::transaction_payment::Entity")]
    Payments,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::transaction_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::transaction_payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
