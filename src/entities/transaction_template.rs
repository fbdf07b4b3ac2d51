//! Transaction template entity - Saved presets for one-click invoices.
//!
//! The line items are stored as a JSON array of [`TemplateItem`] in a text
//! column so the same schema works on Postgres and `SQLite`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One stored line of a template
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TemplateItem {
    /// Catalog product, if the line comes from the catalog
    #[serde(default)]
    pub product_id: Option<i64>,
    /// Line description; defaults to the product name
    #[serde(default)]
    pub description: Option<String>,
    /// Number of units
    pub quantity: f64,
    /// Unit price; defaults to the product price
    #[serde(default)]
    pub unit_price: Option<f64>,
}

/// Transaction template database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transaction_templates")]
pub struct Model {
    /// Unique identifier for the template
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name shown on the quick-action button
    pub name: String,
    /// Default client, if the template is client-specific
    pub client_id: Option<i64>,
    /// Description copied to the invoice
    pub description: Option<String>,
    /// Days between issue and due date
    pub due_in_days: i32,
    /// Notes copied to the invoice
    pub notes: Option<String>,
    /// JSON-encoded `Vec<TemplateItem>`
    #[sea_orm(column_type = "Text")]
    pub items: String,
    /// When the template was created
    pub created_at: DateTimeUtc,
}

/// `TransactionTemplate` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
