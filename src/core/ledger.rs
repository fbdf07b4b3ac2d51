//! Ledger business logic - Queries, manual adjustments and mirror maintenance.
//!
//! Most ledger rows are mirrors: they exist because a paid invoice, an invoice
//! payment or a staff payment exists, and they are created, updated and
//! deleted only through [`reconcile_mirrors`] and [`delete_mirrors`] inside the
//! database transaction that changes the mirrored record. Admins may add
//! `manual` rows for adjustments that have no source record.

use crate::{
    core::{ensure_positive, required_text, round_cents},
    entities::{EntryType, Ledger, ReferenceType, ledger},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Input for [`create_manual_entry`]
#[derive(Debug, Clone, Deserialize)]
pub struct NewLedgerEntry {
    /// Income or expense
    pub entry_type: EntryType,
    /// Positive amount
    pub amount: f64,
    /// What the adjustment is for
    pub description: String,
    /// Accounting date
    pub entry_date: NaiveDate,
}

/// Filter for [`list_entries`] and [`summarize`]; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerFilter {
    /// Only income or only expense
    #[serde(default)]
    pub entry_type: Option<EntryType>,
    /// Only rows mirroring this kind of record
    #[serde(default)]
    pub reference_type: Option<ReferenceType>,
    /// Only rows attributed to this client
    #[serde(default)]
    pub client_id: Option<i64>,
    /// Only rows attributed to this staff member
    #[serde(default)]
    pub staff_id: Option<i64>,
    /// Inclusive lower bound on `entry_date`
    #[serde(default)]
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on `entry_date`
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

/// Totals over a set of ledger rows
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LedgerSummary {
    /// Sum of income rows
    pub total_income: f64,
    /// Sum of expense rows
    pub total_expense: f64,
    /// `total_income - total_expense`
    pub net: f64,
    /// Number of rows summed
    pub entry_count: usize,
}

/// Desired state of one mirrored ledger row
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MirrorEntry {
    pub entry_type: EntryType,
    pub amount: f64,
    pub description: String,
    pub entry_date: NaiveDate,
    pub reference_type: ReferenceType,
    pub reference_id: i64,
    pub client_id: Option<i64>,
    pub staff_id: Option<i64>,
}

impl MirrorEntry {
    fn matches(&self, row: &ledger::Model) -> bool {
        row.reference_type == self.reference_type && row.reference_id == Some(self.reference_id)
    }

    fn differs_from(&self, row: &ledger::Model) -> bool {
        row.entry_type != self.entry_type
            || !crate::core::amounts_equal(row.amount, self.amount)
            || row.description != self.description
            || row.entry_date != self.entry_date
            || row.client_id != self.client_id
            || row.staff_id != self.staff_id
    }
}

/// Loads the mirror rows for the given references.
pub(crate) async fn find_mirrors<C>(
    conn: &C,
    reference_type: ReferenceType,
    reference_ids: Vec<i64>,
) -> Result<Vec<ledger::Model>>
where
    C: ConnectionTrait,
{
    if reference_ids.is_empty() {
        return Ok(Vec::new());
    }

    Ledger::find()
        .filter(ledger::Column::ReferenceType.eq(reference_type))
        .filter(ledger::Column::ReferenceId.is_in(reference_ids))
        .all(conn)
        .await
        .map_err(Into::into)
}

/// Deletes the mirror rows for the given references, returning how many went.
pub(crate) async fn delete_mirrors<C>(
    conn: &C,
    reference_type: ReferenceType,
    reference_ids: Vec<i64>,
) -> Result<u64>
where
    C: ConnectionTrait,
{
    if reference_ids.is_empty() {
        return Ok(0);
    }

    let result = Ledger::delete_many()
        .filter(ledger::Column::ReferenceType.eq(reference_type))
        .filter(ledger::Column::ReferenceId.is_in(reference_ids))
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Brings `existing` mirror rows in line with `desired`.
///
/// Rows present in both are updated when any mirrored field differs, desired
/// rows with no counterpart are inserted and existing rows that are no longer
/// desired are deleted.
pub(crate) async fn reconcile_mirrors<C>(
    conn: &C,
    existing: Vec<ledger::Model>,
    desired: Vec<MirrorEntry>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let mut remaining = existing;

    for entry in desired {
        let amount = round_cents(entry.amount);
        match remaining.iter().position(|row| entry.matches(row)) {
            Some(index) => {
                let row = remaining.swap_remove(index);
                if entry.differs_from(&row) {
                    debug!(ledger_id = row.id, reference = %entry.reference_type, "Updating ledger mirror");
                    let mut active: ledger::ActiveModel = row.into();
                    active.entry_type = Set(entry.entry_type);
                    active.amount = Set(amount);
                    active.description = Set(entry.description);
                    active.entry_date = Set(entry.entry_date);
                    active.client_id = Set(entry.client_id);
                    active.staff_id = Set(entry.staff_id);
                    active.updated_at = Set(now);
                    active.update(conn).await?;
                }
            }
            None => {
                debug!(reference = %entry.reference_type, reference_id = entry.reference_id, "Creating ledger mirror");
                ledger::ActiveModel {
                    entry_type: Set(entry.entry_type),
                    amount: Set(amount),
                    description: Set(entry.description),
                    entry_date: Set(entry.entry_date),
                    reference_type: Set(entry.reference_type),
                    reference_id: Set(Some(entry.reference_id)),
                    client_id: Set(entry.client_id),
                    staff_id: Set(entry.staff_id),
                    created_at: Set(now),
                    updated_at: Set(now),
                    ..Default::default()
                }
                .insert(conn)
                .await?;
            }
        }
    }

    for stale in remaining {
        debug!(ledger_id = stale.id, reference = %stale.reference_type, "Removing ledger mirror");
        stale.delete(conn).await?;
    }

    Ok(())
}

/// Records a manual income or expense adjustment.
#[instrument(skip(db))]
pub async fn create_manual_entry(
    db: &DatabaseConnection,
    input: NewLedgerEntry,
) -> Result<ledger::Model> {
    ensure_positive(input.amount)?;
    let description = required_text("Ledger description", &input.description)?;

    let now = Utc::now();
    let entry = ledger::ActiveModel {
        entry_type: Set(input.entry_type),
        amount: Set(round_cents(input.amount)),
        description: Set(description),
        entry_date: Set(input.entry_date),
        reference_type: Set(ReferenceType::Manual),
        reference_id: Set(None),
        client_id: Set(None),
        staff_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(ledger_id = entry.id, "Created manual ledger entry");
    Ok(entry)
}

/// Deletes a manual ledger entry.
///
/// # Errors
/// Mirrored rows cannot be deleted directly and return `Forbidden`; delete the
/// payment or transaction they mirror instead.
#[instrument(skip(db))]
pub async fn delete_manual_entry(db: &DatabaseConnection, entry_id: i64) -> Result<()> {
    let entry = Ledger::find_by_id(entry_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("ledger entry", entry_id))?;

    if entry.reference_type != ReferenceType::Manual {
        return Err(Error::Forbidden {
            message: format!(
                "ledger entry {entry_id} mirrors a {} and cannot be deleted directly",
                entry.reference_type
            ),
        });
    }

    entry.delete(db).await?;
    info!(ledger_id = entry_id, "Deleted manual ledger entry");
    Ok(())
}

/// Retrieves a single ledger entry.
pub async fn get_entry_by_id(db: &DatabaseConnection, entry_id: i64) -> Result<Option<ledger::Model>> {
    Ledger::find_by_id(entry_id).one(db).await.map_err(Into::into)
}

/// Lists ledger entries matching the filter, newest first.
pub async fn list_entries(db: &DatabaseConnection, filter: &LedgerFilter) -> Result<Vec<ledger::Model>> {
    let mut query = Ledger::find();
    if let Some(entry_type) = filter.entry_type {
        query = query.filter(ledger::Column::EntryType.eq(entry_type));
    }
    if let Some(reference_type) = filter.reference_type {
        query = query.filter(ledger::Column::ReferenceType.eq(reference_type));
    }
    if let Some(client_id) = filter.client_id {
        query = query.filter(ledger::Column::ClientId.eq(client_id));
    }
    if let Some(staff_id) = filter.staff_id {
        query = query.filter(ledger::Column::StaffId.eq(staff_id));
    }
    if let Some(from) = filter.from {
        query = query.filter(ledger::Column::EntryDate.gte(from));
    }
    if let Some(to) = filter.to {
        query = query.filter(ledger::Column::EntryDate.lte(to));
    }

    query
        .order_by_desc(ledger::Column::EntryDate)
        .order_by_desc(ledger::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Sums the entries matching the filter.
pub async fn summarize(db: &DatabaseConnection, filter: &LedgerFilter) -> Result<LedgerSummary> {
    let entries = list_entries(db, filter).await?;
    Ok(summarize_entries(&entries))
}

/// Sums an already loaded set of entries.
#[must_use]
pub fn summarize_entries(entries: &[ledger::Model]) -> LedgerSummary {
    let (income, expense) = entries
        .iter()
        .fold((0.0, 0.0), |(income, expense), entry| match entry.entry_type {
            EntryType::Income => (income + entry.amount, expense),
            EntryType::Expense => (income, expense + entry.amount),
        });

    LedgerSummary {
        total_income: round_cents(income),
        total_expense: round_cents(expense),
        net: round_cents(income - expense),
        entry_count: entries.len(),
    }
}
