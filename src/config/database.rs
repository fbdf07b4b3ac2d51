//! Database configuration module for `InvoiceHub`.
//!
//! This module handles the database connection and table creation using `SeaORM`.
//! Production deployments point `DATABASE_URL` at Postgres; local runs and tests
//! use `SQLite`. Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written DDL.

use crate::entities::{
    Client, Ledger, Product, Staff, StaffPayment, StaffPaymentTemplate, Transaction,
    TransactionItem, TransactionPayment, TransactionTemplate, User,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityName, EntityTrait, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/invoicehub.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection using the `DATABASE_URL` environment variable.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    info!(backend = %database_url.split(':').next().unwrap_or("unknown"), "Connecting to database");
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    debug!(table = %entity.table_name(), "Ensuring table exists");
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates all tables that do not exist yet.
///
/// Parents are created before children so foreign-key-aware backends accept the DDL.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Client).await?;
    create_table(db, &schema, Staff).await?;
    create_table(db, &schema, User).await?;
    create_table(db, &schema, Product).await?;
    create_table(db, &schema, Transaction).await?;
    create_table(db, &schema, TransactionItem).await?;
    create_table(db, &schema, TransactionPayment).await?;
    create_table(db, &schema, StaffPayment).await?;
    create_table(db, &schema, Ledger).await?;
    create_table(db, &schema, TransactionTemplate).await?;
    create_table(db, &schema, StaffPaymentTemplate).await?;

    Ok(())
}
