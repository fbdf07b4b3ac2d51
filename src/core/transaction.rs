//! Transaction business logic - Invoices, their line items and their payments.
//!
//! This is where the money moves. Every mutation runs inside one database
//! transaction that keeps four things consistent before it commits: the
//! invoice total against its items, `paid_amount` against the recorded
//! payments, the client's `total_spent` aggregate, and the ledger mirror
//! maintained by [`sync_transaction_ledger`]. Any error returns early and drops
//! the database transaction, which rolls back every statement made so far.

use crate::{
    core::{
        amounts_equal,
        client::{adjust_total_spent_atomic, require_active_client},
        ensure_non_negative, ensure_positive,
        ledger::{self, MirrorEntry},
        optional_text, required_text, round_cents,
    },
    entities::{
        Client, ClientModel, EntryType, Product, ReferenceType, Transaction, TransactionItem,
        TransactionPayment, TransactionStatus, transaction, transaction_item, transaction_payment,
    },
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Payment method recorded when an invoice is marked paid by hand
pub const SETTLEMENT_METHOD: &str = "settlement";

/// Payment method used when the caller does not name one
pub const DEFAULT_PAYMENT_METHOD: &str = "bank_transfer";

/// One line item of a new or replaced invoice.
///
/// Product-backed items take their description and unit price from the
/// catalog unless overridden; free-form items must carry both.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewItem {
    /// Catalog product this line bills for
    #[serde(default)]
    pub product_id: Option<i64>,
    /// Line description
    #[serde(default)]
    pub description: Option<String>,
    /// Quantity, defaults to 1
    #[serde(default = "default_quantity")]
    pub quantity: f64,
    /// Unit price override
    #[serde(default)]
    pub unit_price: Option<f64>,
}

const fn default_quantity() -> f64 {
    1.0
}

impl NewItem {
    /// A line that is not tied to the catalog.
    pub fn free_form(description: impl Into<String>, quantity: f64, unit_price: f64) -> Self {
        Self {
            product_id: None,
            description: Some(description.into()),
            quantity,
            unit_price: Some(unit_price),
        }
    }

    /// A line billed at the catalog price of `product_id`.
    #[must_use]
    pub const fn from_product(product_id: i64, quantity: f64) -> Self {
        Self {
            product_id: Some(product_id),
            description: None,
            quantity,
            unit_price: None,
        }
    }
}

/// Input for [`create_transaction`]
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransaction {
    /// Billed client
    pub client_id: i64,
    /// Short description shown on the invoice
    #[serde(default)]
    pub description: Option<String>,
    /// Issue date
    pub issue_date: NaiveDate,
    /// Due date, not before the issue date
    pub due_date: NaiveDate,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
    /// At least one line item
    pub items: Vec<NewItem>,
    /// Create as a draft instead of issuing it
    #[serde(default)]
    pub draft: bool,
}

/// Partial update for [`update_transaction`]; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionUpdate {
    /// Move the invoice to another client
    #[serde(default)]
    pub client_id: Option<i64>,
    /// New description, blank clears it
    #[serde(default)]
    pub description: Option<String>,
    /// New notes, blank clears them
    #[serde(default)]
    pub notes: Option<String>,
    /// New issue date
    #[serde(default)]
    pub issue_date: Option<NaiveDate>,
    /// New due date
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    /// Replacement line items
    #[serde(default)]
    pub items: Option<Vec<NewItem>>,
    /// Explicit status change
    #[serde(default)]
    pub status: Option<TransactionStatus>,
}

/// Input for [`record_payment`]
#[derive(Debug, Clone, Deserialize)]
pub struct NewPayment {
    /// Amount received
    pub amount: f64,
    /// Date the money arrived
    pub payment_date: NaiveDate,
    /// Payment method, defaults to [`DEFAULT_PAYMENT_METHOD`]
    #[serde(default)]
    pub method: Option<String>,
    /// Free-form notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Filter for [`list_transactions`]; every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TransactionFilter {
    /// Only this status
    #[serde(default)]
    pub status: Option<TransactionStatus>,
    /// Only this client
    #[serde(default)]
    pub client_id: Option<i64>,
    /// Inclusive lower bound on the issue date
    #[serde(default)]
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the issue date
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

/// An invoice with everything needed to display or render it
#[derive(Debug, Clone, Serialize)]
pub struct TransactionDetail {
    /// The invoice row
    pub transaction: transaction::Model,
    /// Billed client
    pub client: ClientModel,
    /// Line items in entry order
    pub items: Vec<transaction_item::Model>,
    /// Payments, oldest first
    pub payments: Vec<transaction_payment::Model>,
}

/// Result of [`record_payment`]
#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    /// The invoice after the payment was applied
    pub transaction: transaction::Model,
    /// The recorded payment
    pub payment: transaction_payment::Model,
}

/// A validated line item with its computed amount
#[derive(Debug, Clone)]
struct ResolvedItem {
    product_id: Option<i64>,
    description: String,
    quantity: f64,
    unit_price: f64,
    amount: f64,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Derives an invoice's status from its amounts and due date.
///
/// `Draft` is sticky: it is only left by an explicit status change.
#[must_use]
pub fn derive_status(
    current: TransactionStatus,
    paid: f64,
    total: f64,
    due_date: NaiveDate,
    today: NaiveDate,
) -> TransactionStatus {
    let has_payments = paid > 0.0 && !amounts_equal(paid, 0.0);
    if current == TransactionStatus::Draft {
        TransactionStatus::Draft
    } else if has_payments && (paid > total || amounts_equal(paid, total)) {
        TransactionStatus::Paid
    } else if has_payments {
        TransactionStatus::Partial
    } else if due_date < today {
        TransactionStatus::Overdue
    } else {
        TransactionStatus::Pending
    }
}

/// Checks everything about the items that does not need the catalog.
pub(crate) fn validate_item_shapes(items: &[NewItem]) -> Result<()> {
    if items.is_empty() {
        return Err(Error::validation("An invoice needs at least one item"));
    }

    for item in items {
        ensure_positive(item.quantity)?;
        if let Some(unit_price) = item.unit_price {
            ensure_non_negative(unit_price)?;
        }
        if item.product_id.is_none() {
            required_text("Item description", item.description.as_deref().unwrap_or_default())?;
            if item.unit_price.is_none() {
                return Err(Error::validation(
                    "Items without a product need a unit price",
                ));
            }
        }
    }

    Ok(())
}

fn validate_dates(issue_date: NaiveDate, due_date: NaiveDate) -> Result<()> {
    if due_date < issue_date {
        return Err(Error::validation(format!(
            "Due date {due_date} is before issue date {issue_date}"
        )));
    }
    Ok(())
}

async fn resolve_items<C>(conn: &C, items: &[NewItem]) -> Result<Vec<ResolvedItem>>
where
    C: ConnectionTrait,
{
    let mut resolved = Vec::with_capacity(items.len());

    for item in items {
        let (description, unit_price) = match item.product_id {
            Some(product_id) => {
                let product = Product::find_by_id(product_id)
                    .one(conn)
                    .await?
                    .filter(|p| !p.is_deleted)
                    .ok_or_else(|| Error::not_found("product", product_id))?;
                (
                    optional_text(item.description.clone()).unwrap_or(product.name),
                    item.unit_price.unwrap_or(product.price),
                )
            }
            None => (
                required_text("Item description", item.description.as_deref().unwrap_or_default())?,
                item.unit_price
                    .ok_or_else(|| Error::validation("Items without a product need a unit price"))?,
            ),
        };

        let unit_price = round_cents(unit_price);
        let amount = round_cents(item.quantity * unit_price);
        ensure_non_negative(amount)?;
        resolved.push(ResolvedItem {
            product_id: item.product_id,
            description,
            quantity: item.quantity,
            unit_price,
            amount,
        });
    }

    Ok(resolved)
}

fn invoice_total(items: &[ResolvedItem]) -> Result<f64> {
    let total = round_cents(items.iter().map(|item| item.amount).sum());
    ensure_non_negative(total)?;
    if total <= 0.0 || amounts_equal(total, 0.0) {
        return Err(Error::validation("Invoice total must be greater than zero"));
    }
    Ok(total)
}

/// Next free number in the `{prefix}-{year}-{seq:05}` sequence.
///
/// The padding stops holding lexical order once a year passes 99999 invoices,
/// so the suffixes are compared as numbers. Numbers of deleted invoices are
/// never reused while a higher one exists.
async fn next_invoice_number<C>(conn: &C, prefix: &str, year: i32) -> Result<String>
where
    C: ConnectionTrait,
{
    let stem = format!("{prefix}-{year}-");
    let issued: Vec<String> = Transaction::find()
        .select_only()
        .column(transaction::Column::InvoiceNumber)
        .filter(transaction::Column::InvoiceNumber.starts_with(&stem))
        .into_tuple()
        .all(conn)
        .await?;

    let next = issued
        .iter()
        .filter_map(|number| number.strip_prefix(&stem)?.parse::<u64>().ok())
        .max()
        .map_or(1, |seq| seq + 1);

    Ok(format!("{stem}{next:05}"))
}

async fn insert_items<C>(conn: &C, transaction_id: i64, items: Vec<ResolvedItem>) -> Result<()>
where
    C: ConnectionTrait,
{
    for item in items {
        transaction_item::ActiveModel {
            transaction_id: Set(transaction_id),
            product_id: Set(item.product_id),
            description: Set(item.description),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
            amount: Set(item.amount),
            ..Default::default()
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

async fn insert_payment<C>(
    conn: &C,
    transaction_id: i64,
    amount: f64,
    payment_date: NaiveDate,
    method: String,
    notes: Option<String>,
) -> Result<transaction_payment::Model>
where
    C: ConnectionTrait,
{
    transaction_payment::ActiveModel {
        transaction_id: Set(transaction_id),
        amount: Set(amount),
        payment_date: Set(payment_date),
        method: Set(method),
        notes: Set(notes),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .map_err(Into::into)
}

async fn find_transaction<C>(conn: &C, transaction_id: i64) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    Transaction::find_by_id(transaction_id)
        .one(conn)
        .await?
        .ok_or_else(|| Error::not_found("transaction", transaction_id))
}

async fn payments_for<C>(conn: &C, transaction_id: i64) -> Result<Vec<transaction_payment::Model>>
where
    C: ConnectionTrait,
{
    TransactionPayment::find()
        .filter(transaction_payment::Column::TransactionId.eq(transaction_id))
        .order_by_asc(transaction_payment::Column::PaymentDate)
        .order_by_asc(transaction_payment::Column::Id)
        .all(conn)
        .await
        .map_err(Into::into)
}

/// Reconciles the ledger rows that mirror one invoice.
///
/// A `paid` invoice is mirrored by a single income row referencing the
/// invoice itself, for its full total and dated at the last payment. Any
/// other status is mirrored by one income row per payment. Rows that already
/// match are left alone, rows that differ are updated in place, missing rows
/// are inserted and rows that no longer apply are deleted.
///
/// Rows for payments that no longer exist cannot be found from the invoice;
/// [`delete_payment`] and [`delete_transaction`] remove those themselves.
pub async fn sync_transaction_ledger<C>(conn: &C, transaction: &transaction::Model) -> Result<()>
where
    C: ConnectionTrait,
{
    let payments = payments_for(conn, transaction.id).await?;
    let payment_ids = payments.iter().map(|p| p.id).collect();

    let mut existing =
        ledger::find_mirrors(conn, ReferenceType::Transaction, vec![transaction.id]).await?;
    existing
        .extend(ledger::find_mirrors(conn, ReferenceType::TransactionPayment, payment_ids).await?);

    let desired = if transaction.status == TransactionStatus::Paid {
        let entry_date = payments
            .iter()
            .map(|p| p.payment_date)
            .max()
            .unwrap_or(transaction.issue_date);
        vec![MirrorEntry {
            entry_type: EntryType::Income,
            amount: transaction.total_amount,
            description: format!("Invoice {} paid in full", transaction.invoice_number),
            entry_date,
            reference_type: ReferenceType::Transaction,
            reference_id: transaction.id,
            client_id: Some(transaction.client_id),
            staff_id: None,
        }]
    } else {
        payments
            .iter()
            .map(|p| MirrorEntry {
                entry_type: EntryType::Income,
                amount: p.amount,
                description: format!("Payment for invoice {}", transaction.invoice_number),
                entry_date: p.payment_date,
                reference_type: ReferenceType::TransactionPayment,
                reference_id: p.id,
                client_id: Some(transaction.client_id),
                staff_id: None,
            })
            .collect()
    };

    debug!(
        transaction_id = transaction.id,
        rows = desired.len(),
        "Syncing ledger mirror"
    );
    ledger::reconcile_mirrors(conn, existing, desired).await
}

/// Re-reads the payments of an invoice and brings `paid_amount`, the status,
/// the client's `total_spent` and the ledger in line with them.
async fn apply_payments<C>(conn: &C, transaction: transaction::Model) -> Result<transaction::Model>
where
    C: ConnectionTrait,
{
    let payments = payments_for(conn, transaction.id).await?;
    let paid = round_cents(payments.iter().map(|p| p.amount).sum());
    let delta = round_cents(paid - transaction.paid_amount);
    let status = derive_status(
        transaction.status,
        paid,
        transaction.total_amount,
        transaction.due_date,
        today(),
    );
    let client_id = transaction.client_id;

    let mut active: transaction::ActiveModel = transaction.into();
    active.paid_amount = Set(paid);
    active.status = Set(status);
    active.updated_at = Set(Utc::now());
    let updated = active.update(conn).await?;

    if !amounts_equal(delta, 0.0) {
        adjust_total_spent_atomic(conn, client_id, delta).await?;
    }

    sync_transaction_ledger(conn, &updated).await?;
    Ok(updated)
}

/// Creates a new invoice with its line items.
///
/// The invoice number is allocated inside the same database transaction as
/// the insert. A non-draft invoice whose due date has already passed starts
/// out `overdue`.
///
/// # Errors
/// * `Validation` / `InvalidAmount` for malformed items or dates
/// * `NotFound` when the client or a referenced product does not exist
#[instrument(skip(db, input), fields(client_id = input.client_id))]
pub async fn create_transaction(
    db: &DatabaseConnection,
    input: NewTransaction,
    created_by: i64,
    number_prefix: &str,
) -> Result<transaction::Model> {
    validate_item_shapes(&input.items)?;
    validate_dates(input.issue_date, input.due_date)?;

    let txn = db.begin().await?;

    require_active_client(&txn, input.client_id).await?;
    let items = resolve_items(&txn, &input.items).await?;
    let total = invoice_total(&items)?;
    let invoice_number =
        next_invoice_number(&txn, number_prefix, input.issue_date.year()).await?;

    let status = if input.draft {
        TransactionStatus::Draft
    } else {
        derive_status(TransactionStatus::Pending, 0.0, total, input.due_date, today())
    };

    let now = Utc::now();
    let created = transaction::ActiveModel {
        invoice_number: Set(invoice_number),
        client_id: Set(input.client_id),
        description: Set(optional_text(input.description)),
        status: Set(status),
        total_amount: Set(total),
        paid_amount: Set(0.0),
        issue_date: Set(input.issue_date),
        due_date: Set(input.due_date),
        notes: Set(optional_text(input.notes)),
        created_by: Set(created_by),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    insert_items(&txn, created.id, items).await?;
    sync_transaction_ledger(&txn, &created).await?;

    txn.commit().await?;

    info!(
        transaction_id = created.id,
        invoice_number = %created.invoice_number,
        total = created.total_amount,
        status = %created.status,
        "Created transaction"
    );
    Ok(created)
}

/// Retrieves a specific invoice by its ID.
pub async fn get_transaction_by_id(
    db: &DatabaseConnection,
    transaction_id: i64,
) -> Result<Option<transaction::Model>> {
    Transaction::find_by_id(transaction_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads an invoice together with its client, items and payments.
pub async fn get_transaction_detail(
    db: &DatabaseConnection,
    transaction_id: i64,
) -> Result<TransactionDetail> {
    let transaction = find_transaction(db, transaction_id).await?;

    let client = Client::find_by_id(transaction.client_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("client", transaction.client_id))?;

    let items = TransactionItem::find()
        .filter(transaction_item::Column::TransactionId.eq(transaction_id))
        .order_by_asc(transaction_item::Column::Id)
        .all(db)
        .await?;

    let payments = payments_for(db, transaction_id).await?;

    Ok(TransactionDetail {
        transaction,
        client,
        items,
        payments,
    })
}

/// Lists invoices matching the filter, newest issue date first.
pub async fn list_transactions(
    db: &DatabaseConnection,
    filter: &TransactionFilter,
) -> Result<Vec<transaction::Model>> {
    let mut query = Transaction::find();
    if let Some(status) = filter.status {
        query = query.filter(transaction::Column::Status.eq(status));
    }
    if let Some(client_id) = filter.client_id {
        query = query.filter(transaction::Column::ClientId.eq(client_id));
    }
    if let Some(from) = filter.from {
        query = query.filter(transaction::Column::IssueDate.gte(from));
    }
    if let Some(to) = filter.to {
        query = query.filter(transaction::Column::IssueDate.lte(to));
    }

    query
        .order_by_desc(transaction::Column::IssueDate)
        .order_by_desc(transaction::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all invoices of one client, newest first.
pub async fn get_transactions_for_client(
    db: &DatabaseConnection,
    client_id: i64,
) -> Result<Vec<transaction::Model>> {
    let filter = TransactionFilter {
        client_id: Some(client_id),
        ..Default::default()
    };
    list_transactions(db, &filter).await
}

/// Updates any subset of an invoice's fields.
///
/// Replacing the items recomputes the total, which may not drop below what has
/// already been paid. An explicit `paid` status records a settlement payment
/// for the outstanding balance; `draft`, `pending` and `overdue` can only be
/// set while nothing has been paid, and `partial` is never set by hand.
/// Without an explicit status a non-draft invoice's status is re-derived.
/// Moving the invoice to another client moves its `paid_amount` between the
/// two clients' `total_spent`.
///
/// # Errors
/// * `InvalidStatusTransition` for a forbidden status change
/// * `Validation` for a total below `paid_amount` or inconsistent dates
/// * `NotFound` for a missing invoice, client or product
#[instrument(skip(db, update))]
pub async fn update_transaction(
    db: &DatabaseConnection,
    transaction_id: i64,
    update: TransactionUpdate,
) -> Result<transaction::Model> {
    if let Some(items) = &update.items {
        validate_item_shapes(items)?;
    }

    let txn = db.begin().await?;

    let current = find_transaction(&txn, transaction_id).await?;
    let old_client_id = current.client_id;
    let paid = current.paid_amount;
    let has_payments = !amounts_equal(paid, 0.0);

    if let Some(requested) = update.status {
        let allowed = match requested {
            TransactionStatus::Partial => false,
            TransactionStatus::Draft | TransactionStatus::Pending | TransactionStatus::Overdue => {
                !has_payments
            }
            TransactionStatus::Paid => true,
        };
        if !allowed {
            return Err(Error::InvalidStatusTransition {
                from: current.status.to_string(),
                to: requested.to_string(),
            });
        }
    }

    let client_id = match update.client_id {
        Some(new_client_id) if new_client_id != old_client_id => {
            require_active_client(&txn, new_client_id).await?;
            new_client_id
        }
        _ => old_client_id,
    };

    let issue_date = update.issue_date.unwrap_or(current.issue_date);
    let due_date = update.due_date.unwrap_or(current.due_date);
    validate_dates(issue_date, due_date)?;

    let mut total = current.total_amount;
    if let Some(items) = &update.items {
        let resolved = resolve_items(&txn, items).await?;
        total = invoice_total(&resolved)?;
        if total < paid && !amounts_equal(total, paid) {
            return Err(Error::validation(format!(
                "New total {total:.2} is below the {paid:.2} already paid"
            )));
        }

        TransactionItem::delete_many()
            .filter(transaction_item::Column::TransactionId.eq(transaction_id))
            .exec(&txn)
            .await?;
        insert_items(&txn, transaction_id, resolved).await?;
    }

    let status = match update.status {
        // Settled below, once the other changes are saved
        Some(TransactionStatus::Paid) if current.status == TransactionStatus::Draft => {
            TransactionStatus::Pending
        }
        Some(TransactionStatus::Paid) => current.status,
        Some(explicit) => explicit,
        None => derive_status(current.status, paid, total, due_date, today()),
    };
    let previous_status = current.status;

    let mut active: transaction::ActiveModel = current.into();
    active.client_id = Set(client_id);
    active.issue_date = Set(issue_date);
    active.due_date = Set(due_date);
    active.total_amount = Set(total);
    active.status = Set(status);
    active.updated_at = Set(Utc::now());
    if let Some(description) = update.description {
        active.description = Set(optional_text(Some(description)));
    }
    if let Some(notes) = update.notes {
        active.notes = Set(optional_text(Some(notes)));
    }
    let mut updated = active.update(&txn).await?;

    if client_id != old_client_id && has_payments {
        adjust_total_spent_atomic(&txn, old_client_id, -paid).await?;
        adjust_total_spent_atomic(&txn, client_id, paid).await?;
        debug!(
            from_client = old_client_id,
            to_client = client_id,
            amount = paid,
            "Moved paid amount between clients"
        );
    }

    if update.status == Some(TransactionStatus::Paid) {
        let outstanding = round_cents(updated.total_amount - updated.paid_amount);
        if outstanding > 0.0 && !amounts_equal(outstanding, 0.0) {
            insert_payment(
                &txn,
                updated.id,
                outstanding,
                today(),
                SETTLEMENT_METHOD.to_string(),
                Some("Marked as paid".to_string()),
            )
            .await?;
        }
        updated = apply_payments(&txn, updated).await?;
    } else {
        sync_transaction_ledger(&txn, &updated).await?;
    }

    txn.commit().await?;

    info!(
        transaction_id,
        from = %previous_status,
        to = %updated.status,
        total = updated.total_amount,
        "Updated transaction"
    );
    Ok(updated)
}

/// Deletes an invoice with its items, payments and ledger rows, and takes its
/// `paid_amount` back out of the client's `total_spent`.
#[instrument(skip(db))]
pub async fn delete_transaction(db: &DatabaseConnection, transaction_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let transaction = find_transaction(&txn, transaction_id).await?;
    let payment_ids = payments_for(&txn, transaction_id)
        .await?
        .iter()
        .map(|p| p.id)
        .collect();

    ledger::delete_mirrors(&txn, ReferenceType::Transaction, vec![transaction_id]).await?;
    ledger::delete_mirrors(&txn, ReferenceType::TransactionPayment, payment_ids).await?;

    TransactionPayment::delete_many()
        .filter(transaction_payment::Column::TransactionId.eq(transaction_id))
        .exec(&txn)
        .await?;
    TransactionItem::delete_many()
        .filter(transaction_item::Column::TransactionId.eq(transaction_id))
        .exec(&txn)
        .await?;
    Transaction::delete_by_id(transaction_id).exec(&txn).await?;

    if !amounts_equal(transaction.paid_amount, 0.0) {
        adjust_total_spent_atomic(&txn, transaction.client_id, -transaction.paid_amount).await?;
    }

    txn.commit().await?;

    info!(
        transaction_id,
        invoice_number = %transaction.invoice_number,
        "Deleted transaction"
    );
    Ok(())
}

/// Records a payment against an invoice.
///
/// # Errors
/// * `InvalidAmount` for a non-positive amount
/// * `InvalidStatusTransition` when the invoice is still a draft
/// * `Overpayment` when the amount exceeds the outstanding balance
#[instrument(skip(db, input), fields(amount = input.amount))]
pub async fn record_payment(
    db: &DatabaseConnection,
    transaction_id: i64,
    input: NewPayment,
) -> Result<PaymentReceipt> {
    ensure_positive(input.amount)?;
    let amount = round_cents(input.amount);
    ensure_positive(amount)?;
    let method =
        optional_text(input.method).unwrap_or_else(|| DEFAULT_PAYMENT_METHOD.to_string());

    let txn = db.begin().await?;

    let transaction = find_transaction(&txn, transaction_id).await?;
    if transaction.status == TransactionStatus::Draft {
        return Err(Error::InvalidStatusTransition {
            from: TransactionStatus::Draft.to_string(),
            to: TransactionStatus::Partial.to_string(),
        });
    }

    let outstanding = round_cents(transaction.total_amount - transaction.paid_amount);
    if amount > outstanding && !amounts_equal(amount, outstanding) {
        return Err(Error::Overpayment {
            outstanding,
            attempted: amount,
        });
    }

    let payment = insert_payment(
        &txn,
        transaction_id,
        amount,
        input.payment_date,
        method,
        optional_text(input.notes),
    )
    .await?;
    let transaction = apply_payments(&txn, transaction).await?;

    txn.commit().await?;

    info!(
        transaction_id,
        payment_id = payment.id,
        amount,
        status = %transaction.status,
        "Recorded payment"
    );
    Ok(PaymentReceipt {
        transaction,
        payment,
    })
}

/// Deletes a payment and reverses its effect on the invoice, the client and
/// the ledger. Returns the updated invoice.
#[instrument(skip(db))]
pub async fn delete_payment(db: &DatabaseConnection, payment_id: i64) -> Result<transaction::Model> {
    let txn = db.begin().await?;

    let payment = TransactionPayment::find_by_id(payment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("payment", payment_id))?;
    let transaction = find_transaction(&txn, payment.transaction_id).await?;

    ledger::delete_mirrors(&txn, ReferenceType::TransactionPayment, vec![payment_id]).await?;
    payment.delete(&txn).await?;
    let transaction = apply_payments(&txn, transaction).await?;

    txn.commit().await?;

    info!(
        payment_id,
        transaction_id = transaction.id,
        status = %transaction.status,
        "Deleted payment"
    );
    Ok(transaction)
}

/// Lists the payments of an invoice, oldest first.
pub async fn list_payments(
    db: &DatabaseConnection,
    transaction_id: i64,
) -> Result<Vec<transaction_payment::Model>> {
    payments_for(db, transaction_id).await
}

/// Retrieves a single payment.
pub async fn get_payment_by_id(
    db: &DatabaseConnection,
    payment_id: i64,
) -> Result<Option<transaction_payment::Model>> {
    TransactionPayment::find_by_id(payment_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Flips every `pending` invoice whose due date is before `today` to
/// `overdue`, returning how many changed.
///
/// Pending and overdue invoices are mirrored the same way, so the ledger is
/// not touched.
#[instrument(skip(db))]
pub async fn refresh_overdue(db: &DatabaseConnection, today: NaiveDate) -> Result<u64> {
    let result = Transaction::update_many()
        .col_expr(
            transaction::Column::Status,
            Expr::value(TransactionStatus::Overdue),
        )
        .col_expr(transaction::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(transaction::Column::Status.eq(TransactionStatus::Pending))
        .filter(transaction::Column::DueDate.lt(today))
        .exec(db)
        .await?;

    if result.rows_affected > 0 {
        info!(count = result.rows_affected, "Marked transactions overdue");
    }
    Ok(result.rows_affected)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::{client::get_client_by_id, ledger::LedgerFilter},
        entities::{ClientModel, ledger as ledger_entity},
        test_utils::*,
    };
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn invoice(client_id: i64, items: Vec<NewItem>) -> NewTransaction {
        let today = today();
        NewTransaction {
            client_id,
            description: Some("Consulting".to_string()),
            issue_date: today,
            due_date: today + Duration::days(14),
            notes: None,
            items,
            draft: false,
        }
    }

    fn payment(amount: f64) -> NewPayment {
        NewPayment {
            amount,
            payment_date: today(),
            method: None,
            notes: None,
        }
    }

    async fn ledger_rows(db: &DatabaseConnection) -> Vec<ledger_entity::Model> {
        ledger::list_entries(db, &LedgerFilter::default()).await.unwrap()
    }

    async fn reload_client(db: &DatabaseConnection, client: &ClientModel) -> ClientModel {
        get_client_by_id(db, client.id).await.unwrap().unwrap()
    }

    #[test]
    fn test_derive_status() {
        let today = date(2026, 5, 10);
        let later = date(2026, 6, 1);
        let earlier = date(2026, 5, 1);
        let status = |current, paid, due| derive_status(current, paid, 100.0, due, today);

        assert_eq!(status(TransactionStatus::Pending, 0.0, later), TransactionStatus::Pending);
        assert_eq!(status(TransactionStatus::Pending, 0.0, earlier), TransactionStatus::Overdue);
        assert_eq!(status(TransactionStatus::Overdue, 40.0, earlier), TransactionStatus::Partial);
        assert_eq!(status(TransactionStatus::Partial, 100.0, earlier), TransactionStatus::Paid);
        assert_eq!(status(TransactionStatus::Paid, 60.0, later), TransactionStatus::Partial);
        assert_eq!(status(TransactionStatus::Draft, 0.0, earlier), TransactionStatus::Draft);
        // Float noise is not a payment
        assert_eq!(status(TransactionStatus::Pending, 0.001, later), TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn test_create_transaction_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_transaction(&db, invoice(1, vec![]), 1, "INV").await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let zero_qty = invoice(1, vec![NewItem::free_form("Work", 0.0, 10.0)]);
        let result = create_transaction(&db, zero_qty, 1, "INV").await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));

        let negative_price = invoice(1, vec![NewItem::free_form("Work", 1.0, -5.0)]);
        let result = create_transaction(&db, negative_price, 1, "INV").await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));

        let mut no_price = NewItem::free_form("Work", 1.0, 1.0);
        no_price.unit_price = None;
        let result = create_transaction(&db, invoice(1, vec![no_price]), 1, "INV").await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let mut backwards = invoice(1, vec![NewItem::free_form("Work", 1.0, 10.0)]);
        backwards.due_date = backwards.issue_date - Duration::days(1);
        let result = create_transaction(&db, backwards, 1, "INV").await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_transaction_client_not_found() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<ClientModel>::new()])
            .into_connection();

        let input = invoice(999, vec![NewItem::free_form("Work", 1.0, 10.0)]);
        let result = create_transaction(&db, input, 1, "INV").await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound { resource: "client", .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_transaction_resolves_items_and_numbers() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_client(&db, "Acme").await?;
        let product = create_test_product(&db, "Design").await?;

        let items = vec![
            NewItem::from_product(product.id, 3.0),
            NewItem::free_form("Hosting", 2.0, 12.346),
        ];
        let first = create_transaction(&db, invoice(client.id, items), 1, "INV").await?;

        let year = today().year();
        assert_eq!(first.invoice_number, format!("INV-{year}-00001"));
        assert_eq!(first.status, TransactionStatus::Pending);
        assert_eq!(first.paid_amount, 0.0);
        // 3 x 10.00 + 2 x 12.35
        assert_eq!(first.total_amount, 54.7);

        let detail = get_transaction_detail(&db, first.id).await?;
        assert_eq!(detail.client.id, client.id);
        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.items[0].description, "Design");
        assert_eq!(detail.items[0].unit_price, 10.0);
        assert_eq!(detail.items[0].amount, 30.0);
        assert_eq!(detail.items[1].unit_price, 12.35);
        assert_eq!(detail.items[1].amount, 24.7);
        assert!(detail.payments.is_empty());

        let second = create_test_transaction(&db, client.id, 5.0).await?;
        assert_eq!(second.invoice_number, format!("INV-{year}-00002"));

        // Fresh invoices have nothing to mirror
        assert!(ledger_rows(&db).await.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_invoice_numbers_continue_after_delete() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_client(&db, "Acme").await?;

        create_test_transaction(&db, client.id, 10.0).await?;
        let second = create_test_transaction(&db, client.id, 10.0).await?;
        let third = create_test_transaction(&db, client.id, 10.0).await?;
        delete_transaction(&db, second.id).await?;

        let fourth = create_test_transaction(&db, client.id, 10.0).await?;
        assert!(third.invoice_number.ends_with("-00003"));
        assert!(fourth.invoice_number.ends_with("-00004"));

        Ok(())
    }

    #[tokio::test]
    async fn test_invoice_numbers_continue_past_five_digits() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_client(&db, "Acme").await?;
        let year = today().year();

        let seeded = create_test_transaction(&db, client.id, 10.0).await?;
        let mut seeded: transaction::ActiveModel = seeded.into();
        seeded.invoice_number = Set(format!("INV-{year}-99999"));
        seeded.update(&db).await?;

        let next = create_test_transaction(&db, client.id, 10.0).await?;
        assert_eq!(next.invoice_number, format!("INV-{year}-100000"));

        // "100000" sorts below "99999" as text
        let after = create_test_transaction(&db, client.id, 10.0).await?;
        assert_eq!(after.invoice_number, format!("INV-{year}-100001"));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_transaction_rejects_overflowing_amounts() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_client(&db, "Acme").await?;

        let input = invoice(client.id, vec![NewItem::free_form("Galaxy", 1e200, 1e200)]);
        let result = create_transaction(&db, input, 1, "INV").await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));
        assert_eq!(Transaction::find().count(&db).await?, 0);

        let huge = ResolvedItem {
            product_id: None,
            description: "Huge".to_string(),
            quantity: 1.0,
            unit_price: f64::MAX,
            amount: f64::MAX,
        };
        let result = invoice_total(&[huge.clone(), huge]);
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_transaction_rejects_deleted_product() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_client(&db, "Acme").await?;
        let product = create_test_product(&db, "Retired").await?;
        crate::core::product::delete_product(&db, product.id).await?;

        let input = invoice(client.id, vec![NewItem::from_product(product.id, 1.0)]);
        let result = create_transaction(&db, input, 1, "INV").await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound { resource: "product", .. }
        ));
        assert!(list_transactions(&db, &TransactionFilter::default()).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_create_past_due_and_draft() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_client(&db, "Acme").await?;

        let mut late = invoice(client.id, vec![NewItem::free_form("Work", 1.0, 50.0)]);
        late.issue_date = today() - Duration::days(40);
        late.due_date = today() - Duration::days(10);
        let late = create_transaction(&db, late, 1, "INV").await?;
        assert_eq!(late.status, TransactionStatus::Overdue);

        let mut draft = invoice(client.id, vec![NewItem::free_form("Work", 1.0, 50.0)]);
        draft.draft = true;
        let draft = create_transaction(&db, draft, 1, "INV").await?;
        assert_eq!(draft.status, TransactionStatus::Draft);

        let result = record_payment(&db, draft.id, payment(10.0)).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidStatusTransition { .. }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_partial_then_full_payment_mirrors_ledger() -> Result<()> {
        let db = setup_test_db().await?;
        let (client, transaction) = setup_with_transaction(&db, 300.0).await?;

        let receipt = record_payment(&db, transaction.id, payment(100.0)).await?;
        assert_eq!(receipt.transaction.status, TransactionStatus::Partial);
        assert_eq!(receipt.transaction.paid_amount, 100.0);
        assert_eq!(receipt.payment.method, DEFAULT_PAYMENT_METHOD);

        let rows = ledger_rows(&db).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].reference_type, ReferenceType::TransactionPayment);
        assert_eq!(rows[0].reference_id, Some(receipt.payment.id));
        assert_eq!(rows[0].amount, 100.0);
        assert_eq!(rows[0].client_id, Some(client.id));
        assert_eq!(reload_client(&db, &client).await.total_spent, 100.0);

        let receipt = record_payment(&db, transaction.id, payment(200.0)).await?;
        assert_eq!(receipt.transaction.status, TransactionStatus::Paid);
        assert_eq!(receipt.transaction.paid_amount, 300.0);

        // Settlement collapses the payment rows into one invoice row
        let rows = ledger_rows(&db).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].reference_type, ReferenceType::Transaction);
        assert_eq!(rows[0].reference_id, Some(transaction.id));
        assert_eq!(rows[0].entry_type, EntryType::Income);
        assert_eq!(rows[0].amount, 300.0);
        assert_eq!(reload_client(&db, &client).await.total_spent, 300.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_overpayment_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let (client, transaction) = setup_with_transaction(&db, 100.0).await?;

        record_payment(&db, transaction.id, payment(60.0)).await?;
        let result = record_payment(&db, transaction.id, payment(40.01)).await;
        match result.unwrap_err() {
            Error::Overpayment {
                outstanding,
                attempted,
            } => {
                assert_eq!(outstanding, 40.0);
                assert_eq!(attempted, 40.01);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        record_payment(&db, transaction.id, payment(40.0)).await?;
        let result = record_payment(&db, transaction.id, payment(1.0)).await;
        assert!(matches!(result.unwrap_err(), Error::Overpayment { .. }));

        let result = record_payment(&db, transaction.id, payment(0.0)).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));

        assert_eq!(reload_client(&db, &client).await.total_spent, 100.0);
        assert_eq!(list_payments(&db, transaction.id).await?.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_record_payment_missing_transaction() -> Result<()> {
        let db = setup_test_db().await?;
        let result = record_payment(&db, 404, payment(1.0)).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::NotFound { resource: "transaction", .. }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_payment_reopens_invoice() -> Result<()> {
        let db = setup_test_db().await?;
        let (client, transaction) = setup_with_transaction(&db, 200.0).await?;

        let first = record_payment(&db, transaction.id, payment(50.0)).await?.payment;
        let second = record_payment(&db, transaction.id, payment(150.0)).await?.payment;

        let reopened = delete_payment(&db, second.id).await?;
        assert_eq!(reopened.status, TransactionStatus::Partial);
        assert_eq!(reopened.paid_amount, 50.0);
        assert_eq!(reload_client(&db, &client).await.total_spent, 50.0);

        // The invoice row expands back into the remaining payment's row
        let rows = ledger_rows(&db).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].reference_type, ReferenceType::TransactionPayment);
        assert_eq!(rows[0].reference_id, Some(first.id));

        let reopened = delete_payment(&db, first.id).await?;
        assert_eq!(reopened.status, TransactionStatus::Pending);
        assert_eq!(reopened.paid_amount, 0.0);
        assert!(ledger_rows(&db).await.is_empty());
        assert_eq!(reload_client(&db, &client).await.total_spent, 0.0);

        let missing = delete_payment(&db, first.id).await;
        assert!(matches!(missing.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_payment_on_partial_drops_only_its_row() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, transaction) = setup_with_transaction(&db, 200.0).await?;

        let keep = record_payment(&db, transaction.id, payment(30.0)).await?.payment;
        let drop = record_payment(&db, transaction.id, payment(20.0)).await?.payment;
        assert_eq!(ledger_rows(&db).await.len(), 2);

        delete_payment(&db, drop.id).await?;
        let rows = ledger_rows(&db).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].reference_id, Some(keep.id));

        Ok(())
    }

    #[tokio::test]
    async fn test_mark_paid_records_settlement() -> Result<()> {
        let db = setup_test_db().await?;
        let (client, transaction) = setup_with_transaction(&db, 150.0).await?;
        record_payment(&db, transaction.id, payment(50.0)).await?;

        let update = TransactionUpdate {
            status: Some(TransactionStatus::Paid),
            ..Default::default()
        };
        let paid = update_transaction(&db, transaction.id, update).await?;
        assert_eq!(paid.status, TransactionStatus::Paid);
        assert_eq!(paid.paid_amount, 150.0);

        let payments = list_payments(&db, transaction.id).await?;
        assert_eq!(payments.len(), 2);
        let settlement = payments.iter().find(|p| p.method == SETTLEMENT_METHOD).unwrap();
        assert_eq!(settlement.amount, 100.0);

        let rows = ledger_rows(&db).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].reference_type, ReferenceType::Transaction);
        assert_eq!(rows[0].amount, 150.0);
        assert_eq!(reload_client(&db, &client).await.total_spent, 150.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_mark_draft_paid() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_client(&db, "Acme").await?;
        let mut draft = invoice(client.id, vec![NewItem::free_form("Work", 2.0, 40.0)]);
        draft.draft = true;
        let draft = create_transaction(&db, draft, 1, "INV").await?;

        let update = TransactionUpdate {
            status: Some(TransactionStatus::Paid),
            ..Default::default()
        };
        let paid = update_transaction(&db, draft.id, update).await?;
        assert_eq!(paid.status, TransactionStatus::Paid);
        assert_eq!(paid.paid_amount, 80.0);
        assert_eq!(reload_client(&db, &client).await.total_spent, 80.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_forbidden_status_changes() -> Result<()> {
        let db = setup_test_db().await?;
        let (_, transaction) = setup_with_transaction(&db, 100.0).await?;

        let to_partial = TransactionUpdate {
            status: Some(TransactionStatus::Partial),
            ..Default::default()
        };
        let result = update_transaction(&db, transaction.id, to_partial).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::InvalidStatusTransition { .. }
        ));

        // Allowed while nothing has been paid
        let to_draft = TransactionUpdate {
            status: Some(TransactionStatus::Draft),
            ..Default::default()
        };
        let draft = update_transaction(&db, transaction.id, to_draft).await?;
        assert_eq!(draft.status, TransactionStatus::Draft);

        let to_pending = TransactionUpdate {
            status: Some(TransactionStatus::Pending),
            ..Default::default()
        };
        update_transaction(&db, transaction.id, to_pending.clone()).await?;
        record_payment(&db, transaction.id, payment(10.0)).await?;

        let result = update_transaction(&db, transaction.id, to_pending).await;
        match result.unwrap_err() {
            Error::InvalidStatusTransition { from, to } => {
                assert_eq!(from, "partial");
                assert_eq!(to, "pending");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        Ok(())
    }

    #[tokio::test]
    async fn test_replacing_items_rederives_status() -> Result<()> {
        let db = setup_test_db().await?;
        let (client, transaction) = setup_with_transaction(&db, 100.0).await?;
        let settled = record_payment(&db, transaction.id, payment(100.0)).await?;
        assert_eq!(settled.transaction.status, TransactionStatus::Paid);

        let too_small = TransactionUpdate {
            items: Some(vec![NewItem::free_form("Smaller", 1.0, 99.0)]),
            ..Default::default()
        };
        let result = update_transaction(&db, transaction.id, too_small).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let bigger = TransactionUpdate {
            items: Some(vec![
                NewItem::free_form("Work", 1.0, 100.0),
                NewItem::free_form("Extra", 1.0, 50.0),
            ]),
            ..Default::default()
        };
        let reopened = update_transaction(&db, transaction.id, bigger).await?;
        assert_eq!(reopened.total_amount, 150.0);
        assert_eq!(reopened.status, TransactionStatus::Partial);

        let rows = ledger_rows(&db).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].reference_type, ReferenceType::TransactionPayment);
        assert_eq!(rows[0].reference_id, Some(settled.payment.id));
        assert_eq!(reload_client(&db, &client).await.total_spent, 100.0);

        let detail = get_transaction_detail(&db, transaction.id).await?;
        assert_eq!(detail.items.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_moving_client_moves_total_spent() -> Result<()> {
        let db = setup_test_db().await?;
        let (old_client, transaction) = setup_with_transaction(&db, 100.0).await?;
        let new_client = create_test_client(&db, "Globex").await?;
        record_payment(&db, transaction.id, payment(100.0)).await?;

        let update = TransactionUpdate {
            client_id: Some(new_client.id),
            notes: Some("Rebilled".to_string()),
            ..Default::default()
        };
        let moved = update_transaction(&db, transaction.id, update).await?;
        assert_eq!(moved.client_id, new_client.id);
        assert_eq!(moved.status, TransactionStatus::Paid);
        assert_eq!(moved.notes.as_deref(), Some("Rebilled"));

        assert_eq!(reload_client(&db, &old_client).await.total_spent, 0.0);
        assert_eq!(reload_client(&db, &new_client).await.total_spent, 100.0);

        let rows = ledger_rows(&db).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].client_id, Some(new_client.id));

        let missing = TransactionUpdate {
            client_id: Some(9999),
            ..Default::default()
        };
        let result = update_transaction(&db, transaction.id, missing).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_transaction_cleans_up() -> Result<()> {
        let db = setup_test_db().await?;
        let (client, transaction) = setup_with_transaction(&db, 100.0).await?;
        let (_, other) = setup_with_transaction(&db, 40.0).await?;
        record_payment(&db, transaction.id, payment(30.0)).await?;
        record_payment(&db, other.id, payment(40.0)).await?;

        delete_transaction(&db, transaction.id).await?;

        assert!(get_transaction_by_id(&db, transaction.id).await?.is_none());
        assert!(list_payments(&db, transaction.id).await?.is_empty());
        assert_eq!(reload_client(&db, &client).await.total_spent, 0.0);

        // Only the other invoice's row survives
        let rows = ledger_rows(&db).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].reference_id, Some(other.id));

        let missing = delete_transaction(&db, transaction.id).await;
        assert!(matches!(missing.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_refresh_overdue() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_client(&db, "Acme").await?;
        let pending = create_test_transaction(&db, client.id, 10.0).await?;
        let partly_paid = create_test_transaction(&db, client.id, 10.0).await?;
        record_payment(&db, partly_paid.id, payment(5.0)).await?;

        let far_future = today() + Duration::days(365);
        assert_eq!(refresh_overdue(&db, far_future).await?, 1);
        assert_eq!(refresh_overdue(&db, far_future).await?, 0);

        let flipped = get_transaction_by_id(&db, pending.id).await?.unwrap();
        assert_eq!(flipped.status, TransactionStatus::Overdue);
        let untouched = get_transaction_by_id(&db, partly_paid.id).await?.unwrap();
        assert_eq!(untouched.status, TransactionStatus::Partial);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_transactions_filters() -> Result<()> {
        let db = setup_test_db().await?;
        let (acme, first) = setup_with_transaction(&db, 10.0).await?;
        let globex = create_test_client(&db, "Globex").await?;
        let second = create_test_transaction(&db, globex.id, 20.0).await?;
        record_payment(&db, second.id, payment(20.0)).await?;

        let all = list_transactions(&db, &TransactionFilter::default()).await?;
        assert_eq!(all.len(), 2);
        // Same issue date, so newest ID first
        assert_eq!(all[0].id, second.id);

        let paid = TransactionFilter {
            status: Some(TransactionStatus::Paid),
            ..Default::default()
        };
        let paid = list_transactions(&db, &paid).await?;
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].id, second.id);

        let for_acme = get_transactions_for_client(&db, acme.id).await?;
        assert_eq!(for_acme.len(), 1);
        assert_eq!(for_acme[0].id, first.id);

        let future = TransactionFilter {
            from: Some(today() + Duration::days(1)),
            ..Default::default()
        };
        assert!(list_transactions(&db, &future).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_client_total_matches_ledger_income() -> Result<()> {
        let db = setup_test_db().await?;
        let (client, first) = setup_with_transaction(&db, 120.0).await?;
        let second = create_test_transaction(&db, client.id, 80.0).await?;

        record_payment(&db, first.id, payment(20.0)).await?;
        record_payment(&db, second.id, payment(80.0)).await?;
        let extra = record_payment(&db, first.id, payment(30.0)).await?.payment;
        delete_payment(&db, extra.id).await?;

        let filter = LedgerFilter {
            client_id: Some(client.id),
            ..Default::default()
        };
        let summary = ledger::summarize(&db, &filter).await?;
        let client = reload_client(&db, &client).await;
        assert_eq!(client.total_spent, 100.0);
        assert_eq!(summary.total_income, client.total_spent);

        Ok(())
    }
}
