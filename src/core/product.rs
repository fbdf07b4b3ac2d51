//! Product business logic - Handles the product/service catalog.
//!
//! Catalog entries are predefined items with fixed prices. Invoice line items
//! can reference a product, in which case the description and unit price
//! default to the catalog values at the time the invoice is written. Deleting a
//! product is a soft delete so existing line items keep their reference.

use crate::{
    core::{ensure_non_negative, optional_text, required_text, round_cents},
    entities::{Product, ProductKind, product},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::instrument;

/// Input for [`create_product`]
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    /// Name of the product
    pub name: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Unit price
    pub price: f64,
    /// Product or service
    pub kind: ProductKind,
}

/// Partial update for [`update_product`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductUpdate {
    /// New name
    #[serde(default)]
    pub name: Option<String>,
    /// New description; blank clears it
    #[serde(default)]
    pub description: Option<String>,
    /// New unit price
    #[serde(default)]
    pub price: Option<f64>,
    /// New kind
    #[serde(default)]
    pub kind: Option<ProductKind>,
}

/// Retrieves all active (non-deleted) products, ordered alphabetically by name.
///
/// When `kind` is given only products of that kind are returned.
pub async fn get_all_active_products(
    db: &DatabaseConnection,
    kind: Option<ProductKind>,
) -> Result<Vec<product::Model>> {
    let mut query = Product::find().filter(product::Column::IsDeleted.eq(false));
    if let Some(kind) = kind {
        query = query.filter(product::Column::Kind.eq(kind));
    }

    query
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Looks up an active product by exact name.
pub async fn get_product_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<product::Model>> {
    Product::find()
        .filter(product::Column::Name.eq(name))
        .filter(product::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a product by ID, including soft-deleted ones.
pub async fn get_product_by_id(
    db: &DatabaseConnection,
    product_id: i64,
) -> Result<Option<product::Model>> {
    Product::find_by_id(product_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new product, performing input validation.
///
/// # Errors
/// Returns an error if:
/// - The product name is empty or whitespace-only
/// - The price is negative or not finite (NaN, infinity)
/// - The database insert operation fails
#[instrument(skip(db))]
pub async fn create_product(db: &DatabaseConnection, input: NewProduct) -> Result<product::Model> {
    let name = required_text("Product name", &input.name)?;
    ensure_non_negative(input.price)?;

    let now = chrono::Utc::now();

    let product = product::ActiveModel {
        name: Set(name),
        description: Set(optional_text(input.description)),
        price: Set(round_cents(input.price)),
        kind: Set(input.kind),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    product.insert(db).await.map_err(Into::into)
}

/// Updates an existing product, performing input validation.
///
/// # Errors
/// Returns an error if:
/// - The new name is empty or whitespace-only
/// - The new price is negative or not finite (NaN, infinity)
/// - The product does not exist or is already deleted
/// - The database update operation fails
#[instrument(skip(db))]
pub async fn update_product(
    db: &DatabaseConnection,
    product_id: i64,
    update: ProductUpdate,
) -> Result<product::Model> {
    let new_name = update
        .name
        .as_deref()
        .map(|name| required_text("Product name", name))
        .transpose()?;

    if let Some(price) = update.price {
        ensure_non_negative(price)?;
    }

    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or_else(|| Error::not_found("product", product_id))?
        .into();

    if let Some(name) = new_name {
        product.name = Set(name);
    }
    if let Some(description) = update.description {
        product.description = Set(optional_text(Some(description)));
    }
    if let Some(price) = update.price {
        product.price = Set(round_cents(price));
    }
    if let Some(kind) = update.kind {
        product.kind = Set(kind);
    }
    product.updated_at = Set(chrono::Utc::now());

    product.update(db).await.map_err(Into::into)
}

/// Soft deletes a product by marking it as deleted, preserving invoice history.
///
/// # Errors
/// Returns an error if:
/// - The product does not exist or is already deleted
/// - The database update operation fails
#[instrument(skip(db))]
pub async fn delete_product(db: &DatabaseConnection, product_id: i64) -> Result<product::Model> {
    let mut product: product::ActiveModel = Product::find_by_id(product_id)
        .one(db)
        .await?
        .filter(|p| !p.is_deleted)
        .ok_or_else(|| Error::not_found("product", product_id))?
        .into();

    product.is_deleted = Set(true);
    product.updated_at = Set(chrono::Utc::now());

    product.update(db).await.map_err(Into::into)
}
