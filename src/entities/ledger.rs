//! Ledger entity - The financial journal.
//!
//! Rows are mostly mirrors of other records, identified by the polymorphic
//! `reference_type`/`reference_id` pair. `manual` rows are admin adjustments
//! with no reference.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of money flow
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    /// Money received
    #[sea_orm(string_value = "income")]
    Income,
    /// Money paid out
    #[sea_orm(string_value = "expense")]
    Expense,
}

/// What a ledger row mirrors
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    /// A fully paid transaction
    #[sea_orm(string_value = "transaction")]
    Transaction,
    /// One payment of a not-fully-paid transaction
    #[sea_orm(string_value = "transaction_payment")]
    TransactionPayment,
    /// A staff payout
    #[sea_orm(string_value = "staff_payment")]
    StaffPayment,
    /// Admin adjustment
    #[sea_orm(string_value = "manual")]
    Manual,
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Transaction => "transaction",
            Self::TransactionPayment => "transaction_payment",
            Self::StaffPayment => "staff_payment",
            Self::Manual => "manual",
        })
    }
}

/// Ledger database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger")]
pub struct Model {
    /// Unique identifier for the entry
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Income or expense
    pub entry_type: EntryType,
    /// Always positive; the direction is carried by `entry_type`
    pub amount: f64,
    /// Human-readable description
    pub description: String,
    /// Accounting date
    pub entry_date: Date,
    /// Kind of record this row mirrors
    pub reference_type: ReferenceType,
    /// ID of the mirrored record, `None` for manual rows
    pub reference_id: Option<i64>,
    /// Client the money came from, if any
    pub client_id: Option<i64>,
    /// Staff member the money went to, if any
    pub staff_id: Option<i64>,
    /// When the entry was created
    pub created_at: DateTimeUtc,
    /// When the entry was last modified
    pub updated_at: DateTimeUtc,
}

/// Ledger rows link to their sources through `reference_type`/`reference_id`
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
