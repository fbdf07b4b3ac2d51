//! Product entity - The product/service catalog.
//!
//! Catalog entries are templates for invoice line items: when an item refers to
//! a product, its description and unit price default to the catalog values.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether a catalog entry is a physical product or a service
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// A sellable good
    #[sea_orm(string_value = "product")]
    Product,
    /// Billable work
    #[sea_orm(string_value = "service")]
    Service,
}

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier for the product
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the product (e.g., "Logo design", "Hosting - monthly")
    pub name: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Unit price in the configured currency
    pub price: f64,
    /// Product or service
    pub kind: ProductKind,
    /// Soft delete flag - if true, product is hidden but line items keep their data
    pub is_deleted: bool,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One product appears on many line items
    #[sea_orm(has_many = "super::transaction_item::Entity")]
    Items,
}

impl Related<super::transaction_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
