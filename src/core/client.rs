//! Client business logic - Handles all client-related operations.
//!
//! Clients are soft-deleted so historic invoices keep resolving. The
//! `total_spent` aggregate is never written directly by callers; the
//! transaction module moves it with [`adjust_total_spent_atomic`] inside the
//! same database transaction that changes a `paid_amount`.

use crate::{
    core::{normalize_email, optional_text, required_text, round_cents},
    entities::{Client, Transaction, TransactionStatus, client, transaction},
    errors::{Error, Result},
};
use sea_orm::{
    Condition, QueryOrder, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, Func},
};
use serde::Deserialize;
use tracing::{info, instrument};

/// Input for [`create_client`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewClient {
    /// Client or contact name
    pub name: String,
    /// Billing email
    pub email: String,
    /// Optional phone number
    #[serde(default)]
    pub phone: Option<String>,
    /// Optional company name
    #[serde(default)]
    pub company: Option<String>,
    /// Optional postal address
    #[serde(default)]
    pub address: Option<String>,
}

/// Partial update for [`update_client`]; `None` leaves a field unchanged and
/// a blank string clears an optional field.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientUpdate {
    /// New name
    #[serde(default)]
    pub name: Option<String>,
    /// New email
    #[serde(default)]
    pub email: Option<String>,
    /// New phone
    #[serde(default)]
    pub phone: Option<String>,
    /// New company
    #[serde(default)]
    pub company: Option<String>,
    /// New address
    #[serde(default)]
    pub address: Option<String>,
}

/// Creates a new client with a zero `total_spent`.
///
/// # Errors
/// Returns a validation error when the name is blank or the email is malformed.
#[instrument(skip(db))]
pub async fn create_client(db: &DatabaseConnection, input: NewClient) -> Result<client::Model> {
    let name = required_text("Client name", &input.name)?;
    let email = normalize_email(&input.email)?;

    let now = chrono::Utc::now();
    let client = client::ActiveModel {
        name: Set(name),
        email: Set(email),
        phone: Set(optional_text(input.phone)),
        company: Set(optional_text(input.company)),
        address: Set(optional_text(input.address)),
        total_spent: Set(0.0),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let result = client.insert(db).await?;
    info!(client_id = result.id, "Created client");
    Ok(result)
}

/// Retrieves a specific client by its unique ID, including soft-deleted ones.
pub async fn get_client_by_id(
    db: &DatabaseConnection,
    client_id: i64,
) -> Result<Option<client::Model>> {
    Client::find_by_id(client_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads an active client or fails with `NotFound`.
///
/// Generic over the connection so it can run inside a database transaction.
pub async fn require_active_client<C>(conn: &C, client_id: i64) -> Result<client::Model>
where
    C: ConnectionTrait,
{
    Client::find_by_id(client_id)
        .one(conn)
        .await?
        .filter(|c| !c.is_deleted)
        .ok_or_else(|| Error::not_found("client", client_id))
}

/// Retrieves all active (non-deleted) clients, ordered alphabetically by name.
pub async fn get_all_active_clients(db: &DatabaseConnection) -> Result<Vec<client::Model>> {
    Client::find()
        .filter(client::Column::IsDeleted.eq(false))
        .order_by_asc(client::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Case-insensitive search over name, email and company of active clients.
pub async fn search_clients(db: &DatabaseConnection, term: &str) -> Result<Vec<client::Model>> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return get_all_active_clients(db).await;
    }
    let pattern = format!("%{term}%");

    let matches = Condition::any()
        .add(Expr::expr(Func::lower(Expr::col(client::Column::Name))).like(pattern.clone()))
        .add(Expr::expr(Func::lower(Expr::col(client::Column::Email))).like(pattern.clone()))
        .add(Expr::expr(Func::lower(Expr::col(client::Column::Company))).like(pattern));

    Client::find()
        .filter(client::Column::IsDeleted.eq(false))
        .filter(matches)
        .order_by_asc(client::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Applies a partial update to an active client.
#[instrument(skip(db))]
pub async fn update_client(
    db: &DatabaseConnection,
    client_id: i64,
    update: ClientUpdate,
) -> Result<client::Model> {
    let mut client: client::ActiveModel = require_active_client(db, client_id).await?.into();

    if let Some(name) = update.name {
        client.name = Set(required_text("Client name", &name)?);
    }
    if let Some(email) = update.email {
        client.email = Set(normalize_email(&email)?);
    }
    if let Some(phone) = update.phone {
        client.phone = Set(optional_text(Some(phone)));
    }
    if let Some(company) = update.company {
        client.company = Set(optional_text(Some(company)));
    }
    if let Some(address) = update.address {
        client.address = Set(optional_text(Some(address)));
    }
    client.updated_at = Set(chrono::Utc::now());

    client.update(db).await.map_err(Into::into)
}

/// Soft deletes a client.
///
/// # Errors
/// Returns `Conflict` while the client still has issued invoices that are not
/// fully paid.
#[instrument(skip(db))]
pub async fn delete_client(db: &DatabaseConnection, client_id: i64) -> Result<client::Model> {
    let txn = db.begin().await?;
    let mut client: client::ActiveModel = require_active_client(&txn, client_id).await?.into();

    let open_invoices = Transaction::find()
        .filter(transaction::Column::ClientId.eq(client_id))
        .filter(transaction::Column::Status.is_in([
            TransactionStatus::Pending,
            TransactionStatus::Partial,
            TransactionStatus::Overdue,
        ]))
        .count(&txn)
        .await?;

    if open_invoices > 0 {
        return Err(Error::Conflict {
            message: format!("client has {open_invoices} unpaid invoice(s)"),
        });
    }

    client.is_deleted = Set(true);
    client.updated_at = Set(chrono::Utc::now());
    let result = client.update(&txn).await?;
    txn.commit().await?;

    info!(client_id, "Soft deleted client");
    Ok(result)
}

/// Moves a client's `total_spent` by `delta` with a single atomic statement.
///
/// Runs `UPDATE clients SET total_spent = total_spent + delta WHERE id = ?`
/// rather than a read-modify-write.
pub async fn adjust_total_spent_atomic<C>(
    conn: &C,
    client_id: i64,
    delta: f64,
) -> Result<client::Model>
where
    C: ConnectionTrait,
{
    let delta = round_cents(delta);

    let result = Client::update_many()
        .col_expr(
            client::Column::TotalSpent,
            Expr::col(client::Column::TotalSpent).add(delta),
        )
        .filter(client::Column::Id.eq(client_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found("client", client_id));
    }

    Client::find_by_id(client_id)
        .one(conn)
        .await?
        .ok_or_else(|| Error::not_found("client", client_id))
}
