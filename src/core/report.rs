//! Report generation business logic.
//!
//! This module computes the statistics behind the three dashboards. All
//! functions are framework-agnostic and return structured data that the HTTP
//! layer serializes as-is.

use crate::{
    core::{
        amounts_equal,
        client::require_active_client,
        ledger::{self, LedgerFilter, LedgerSummary},
        round_cents,
        staff::require_active_staff,
        staff_payment,
        transaction::get_transactions_for_client,
    },
    entities::{
        Client, Product, Staff, Transaction, TransactionStatus, client, product, staff,
        staff_payment as staff_payment_entity, transaction,
    },
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{QueryOrder, QuerySelect, prelude::*};
use serde::Serialize;

/// How many invoices the admin dashboard lists
const RECENT_TRANSACTIONS: u64 = 5;

/// Number of invoices per status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    /// Drafts
    pub draft: u64,
    /// Issued, nothing paid yet
    pub pending: u64,
    /// Partly paid
    pub partial: u64,
    /// Fully paid
    pub paid: u64,
    /// Past due, nothing paid
    pub overdue: u64,
}

impl StatusCounts {
    fn tally(&mut self, status: TransactionStatus) {
        match status {
            TransactionStatus::Draft => self.draft += 1,
            TransactionStatus::Pending => self.pending += 1,
            TransactionStatus::Partial => self.partial += 1,
            TransactionStatus::Paid => self.paid += 1,
            TransactionStatus::Overdue => self.overdue += 1,
        }
    }
}

/// Everything the admin dashboard shows
#[derive(Debug, Clone, Serialize)]
pub struct AdminDashboard {
    /// Active clients
    pub client_count: u64,
    /// Active staff
    pub staff_count: u64,
    /// Active catalog entries
    pub product_count: u64,
    /// Invoices by status
    pub status_counts: StatusCounts,
    /// Sum of all non-draft invoice totals
    pub total_invoiced: f64,
    /// Sum of all payments received
    pub total_received: f64,
    /// Invoiced but not yet received
    pub outstanding: f64,
    /// Outstanding on invoices past their due date
    pub overdue_amount: f64,
    /// Ledger totals
    pub ledger: LedgerSummary,
    /// Most recently issued invoices
    pub recent_transactions: Vec<transaction::Model>,
}

/// Everything a client sees on its portal landing page
#[derive(Debug, Clone, Serialize)]
pub struct ClientDashboard {
    /// The client itself
    pub client: client::Model,
    /// Non-draft invoices
    pub invoice_count: u64,
    /// Lifetime amount paid
    pub total_spent: f64,
    /// Still owed across open invoices
    pub outstanding: f64,
    /// Open invoices past their due date
    pub overdue_count: u64,
}

/// Everything a staff member sees on its portal landing page
#[derive(Debug, Clone, Serialize)]
pub struct StaffDashboard {
    /// The staff record
    pub staff: staff::Model,
    /// Number of payouts received
    pub payment_count: u64,
    /// Lifetime amount received
    pub total_paid: f64,
    /// Latest payout
    pub last_payment: Option<staff_payment_entity::Model>,
}

fn is_open(status: TransactionStatus) -> bool {
    matches!(
        status,
        TransactionStatus::Pending | TransactionStatus::Partial | TransactionStatus::Overdue
    )
}

fn balance_due(t: &transaction::Model) -> f64 {
    round_cents(t.total_amount - t.paid_amount)
}

/// An open invoice counts as overdue once its due date has passed, whether or
/// not its stored status has been refreshed yet.
fn is_past_due(t: &transaction::Model, today: NaiveDate) -> bool {
    is_open(t.status) && t.due_date < today && !amounts_equal(balance_due(t), 0.0)
}

/// Builds the admin dashboard as of `today`.
pub async fn admin_dashboard(db: &DatabaseConnection, today: NaiveDate) -> Result<AdminDashboard> {
    let client_count = Client::find()
        .filter(client::Column::IsDeleted.eq(false))
        .count(db)
        .await?;
    let staff_count = Staff::find()
        .filter(staff::Column::IsDeleted.eq(false))
        .count(db)
        .await?;
    let product_count = Product::find()
        .filter(product::Column::IsDeleted.eq(false))
        .count(db)
        .await?;

    let transactions = Transaction::find().all(db).await?;

    let mut status_counts = StatusCounts::default();
    let mut total_invoiced = 0.0;
    let mut total_received = 0.0;
    let mut overdue_amount = 0.0;
    for t in &transactions {
        status_counts.tally(t.status);
        total_received += t.paid_amount;
        if t.status != TransactionStatus::Draft {
            total_invoiced += t.total_amount;
        }
        if is_past_due(t, today) {
            overdue_amount += balance_due(t);
        }
    }

    let ledger = ledger::summarize(db, &LedgerFilter::default()).await?;

    let recent_transactions = Transaction::find()
        .order_by_desc(transaction::Column::IssueDate)
        .order_by_desc(transaction::Column::Id)
        .limit(RECENT_TRANSACTIONS)
        .all(db)
        .await?;

    Ok(AdminDashboard {
        client_count,
        staff_count,
        product_count,
        status_counts,
        total_invoiced: round_cents(total_invoiced),
        total_received: round_cents(total_received),
        outstanding: round_cents(total_invoiced - total_received),
        overdue_amount: round_cents(overdue_amount),
        ledger,
        recent_transactions,
    })
}

/// Builds the portal dashboard for one client as of `today`.
pub async fn client_dashboard(
    db: &DatabaseConnection,
    client_id: i64,
    today: NaiveDate,
) -> Result<ClientDashboard> {
    let client = require_active_client(db, client_id).await?;
    let transactions = get_transactions_for_client(db, client_id).await?;

    let issued = transactions
        .iter()
        .filter(|t| t.status != TransactionStatus::Draft);
    let invoice_count = issued.clone().count() as u64;
    let outstanding = issued
        .clone()
        .filter(|t| is_open(t.status))
        .map(balance_due)
        .sum::<f64>();
    let overdue_count = issued.filter(|t| is_past_due(t, today)).count() as u64;

    Ok(ClientDashboard {
        total_spent: client.total_spent,
        client,
        invoice_count,
        outstanding: round_cents(outstanding),
        overdue_count,
    })
}

/// Builds the portal dashboard for one staff member.
pub async fn staff_dashboard(db: &DatabaseConnection, staff_id: i64) -> Result<StaffDashboard> {
    let staff = require_active_staff(db, staff_id).await?;
    let payments = staff_payment::list_staff_payments(db, Some(staff_id)).await?;

    let total_paid = round_cents(payments.iter().map(|p| p.amount).sum());
    let payment_count = payments.len() as u64;
    // Newest first
    let last_payment = payments.into_iter().next();

    Ok(StaffDashboard {
        staff,
        payment_count,
        total_paid,
        last_payment,
    })
}
