//! Staff payment business logic - Payouts and their expense ledger rows.
//!
//! Each staff payment owns exactly one `expense` ledger row. The row is
//! written, rewritten and removed in the same database transaction as the
//! payment itself.

use crate::{
    core::{
        ensure_positive,
        ledger::{self, MirrorEntry},
        optional_text, round_cents,
        staff::require_active_staff,
    },
    entities::{EntryType, ReferenceType, Staff, StaffPayment, staff, staff_payment},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Method used when the caller does not name one
pub const DEFAULT_STAFF_PAYMENT_METHOD: &str = "bank_transfer";

/// Input for [`create_staff_payment`]
#[derive(Debug, Clone, Deserialize)]
pub struct NewStaffPayment {
    /// Paid staff member
    pub staff_id: i64,
    /// Positive amount
    pub amount: f64,
    /// Date of the payout
    pub payment_date: NaiveDate,
    /// Pay period label, e.g. `"2026-03"`
    #[serde(default)]
    pub period: Option<String>,
    /// Free-form description
    #[serde(default)]
    pub description: Option<String>,
    /// Payment method
    #[serde(default)]
    pub method: Option<String>,
}

/// Partial update for [`update_staff_payment`]
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaffPaymentUpdate {
    /// New amount
    #[serde(default)]
    pub amount: Option<f64>,
    /// New date
    #[serde(default)]
    pub payment_date: Option<NaiveDate>,
    /// New period; blank clears it
    #[serde(default)]
    pub period: Option<String>,
    /// New description; blank clears it
    #[serde(default)]
    pub description: Option<String>,
    /// New method
    #[serde(default)]
    pub method: Option<String>,
}

fn ledger_description(payment: &staff_payment::Model, staff: &staff::Model) -> String {
    match (&payment.description, &payment.period) {
        (Some(description), _) => description.clone(),
        (None, Some(period)) => format!("Staff payment to {} ({period})", staff.name),
        (None, None) => format!("Staff payment to {}", staff.name),
    }
}

/// Reconciles the single expense row mirroring a staff payment.
async fn sync_staff_payment_ledger<C>(
    conn: &C,
    payment: &staff_payment::Model,
    staff: &staff::Model,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing =
        ledger::find_mirrors(conn, ReferenceType::StaffPayment, vec![payment.id]).await?;
    let desired = vec![MirrorEntry {
        entry_type: EntryType::Expense,
        amount: payment.amount,
        description: ledger_description(payment, staff),
        entry_date: payment.payment_date,
        reference_type: ReferenceType::StaffPayment,
        reference_id: payment.id,
        client_id: None,
        staff_id: Some(payment.staff_id),
    }];
    ledger::reconcile_mirrors(conn, existing, desired).await
}

/// Records a payout to an active staff member together with its expense row.
///
/// # Errors
/// * `InvalidAmount` for a non-positive amount
/// * `NotFound` when the staff member does not exist or was deleted
#[instrument(skip(db, input), fields(staff_id = input.staff_id, amount = input.amount))]
pub async fn create_staff_payment(
    db: &DatabaseConnection,
    input: NewStaffPayment,
) -> Result<staff_payment::Model> {
    ensure_positive(input.amount)?;
    let method = optional_text(input.method)
        .unwrap_or_else(|| DEFAULT_STAFF_PAYMENT_METHOD.to_string());

    let txn = db.begin().await?;

    let staff = require_active_staff(&txn, input.staff_id).await?;

    let now = Utc::now();
    let payment = staff_payment::ActiveModel {
        staff_id: Set(staff.id),
        amount: Set(round_cents(input.amount)),
        payment_date: Set(input.payment_date),
        period: Set(optional_text(input.period)),
        description: Set(optional_text(input.description)),
        method: Set(method),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    sync_staff_payment_ledger(&txn, &payment, &staff).await?;

    txn.commit().await?;

    info!(payment_id = payment.id, "Recorded staff payment");
    Ok(payment)
}

/// Updates a staff payment; its ledger row follows in the same transaction.
#[instrument(skip(db, update))]
pub async fn update_staff_payment(
    db: &DatabaseConnection,
    payment_id: i64,
    update: StaffPaymentUpdate,
) -> Result<staff_payment::Model> {
    if let Some(amount) = update.amount {
        ensure_positive(amount)?;
    }

    let txn = db.begin().await?;

    let payment = StaffPayment::find_by_id(payment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("staff payment", payment_id))?;
    // Deleted staff keep their history editable
    let staff = Staff::find_by_id(payment.staff_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("staff", payment.staff_id))?;

    let mut active: staff_payment::ActiveModel = payment.into();
    if let Some(amount) = update.amount {
        active.amount = Set(round_cents(amount));
    }
    if let Some(payment_date) = update.payment_date {
        active.payment_date = Set(payment_date);
    }
    if let Some(period) = update.period {
        active.period = Set(optional_text(Some(period)));
    }
    if let Some(description) = update.description {
        active.description = Set(optional_text(Some(description)));
    }
    if let Some(method) = optional_text(update.method) {
        active.method = Set(method);
    }
    active.updated_at = Set(Utc::now());
    let updated = active.update(&txn).await?;

    sync_staff_payment_ledger(&txn, &updated, &staff).await?;

    txn.commit().await?;

    info!(payment_id, amount = updated.amount, "Updated staff payment");
    Ok(updated)
}

/// Deletes a staff payment and its ledger row.
#[instrument(skip(db))]
pub async fn delete_staff_payment(db: &DatabaseConnection, payment_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let payment = StaffPayment::find_by_id(payment_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("staff payment", payment_id))?;

    ledger::delete_mirrors(&txn, ReferenceType::StaffPayment, vec![payment_id]).await?;
    payment.delete(&txn).await?;

    txn.commit().await?;

    info!(payment_id, "Deleted staff payment");
    Ok(())
}

/// Retrieves a single staff payment.
pub async fn get_staff_payment_by_id(
    db: &DatabaseConnection,
    payment_id: i64,
) -> Result<Option<staff_payment::Model>> {
    StaffPayment::find_by_id(payment_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists staff payments, newest first, optionally for one staff member.
pub async fn list_staff_payments(
    db: &DatabaseConnection,
    staff_id: Option<i64>,
) -> Result<Vec<staff_payment::Model>> {
    let mut query = StaffPayment::find();
    if let Some(staff_id) = staff_id {
        query = query.filter(staff_payment::Column::StaffId.eq(staff_id));
    }
    query
        .order_by_desc(staff_payment::Column::PaymentDate)
        .order_by_desc(staff_payment::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::{ledger::LedgerFilter, staff::delete_staff},
        test_utils::*,
    };
    use sea_orm::{DatabaseBackend, MockDatabase};

    async fn expense_rows(db: &DatabaseConnection) -> Vec<crate::entities::LedgerModel> {
        let filter = LedgerFilter {
            entry_type: Some(EntryType::Expense),
            ..Default::default()
        };
        ledger::list_entries(db, &filter).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_staff_payment_validation() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let input = NewStaffPayment {
            staff_id: 1,
            amount: -5.0,
            payment_date: date(2026, 1, 31),
            period: None,
            description: None,
            method: None,
        };
        let result = create_staff_payment(&db, input).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_staff_payment_writes_expense() -> Result<()> {
        let db = setup_test_db().await?;
        let staff = create_test_staff(&db, "Dana").await?;

        let payment = create_test_staff_payment(&db, staff.id, 1500.0).await?;
        assert_eq!(payment.method, DEFAULT_STAFF_PAYMENT_METHOD);

        let rows = expense_rows(&db).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].reference_type, ReferenceType::StaffPayment);
        assert_eq!(rows[0].reference_id, Some(payment.id));
        assert_eq!(rows[0].amount, 1500.0);
        assert_eq!(rows[0].staff_id, Some(staff.id));
        assert_eq!(rows[0].description, "Staff payment to Dana (2026-01)");

        Ok(())
    }

    #[tokio::test]
    async fn test_create_staff_payment_for_deleted_staff() -> Result<()> {
        let db = setup_test_db().await?;
        let staff = create_test_staff(&db, "Gone").await?;
        delete_staff(&db, staff.id).await?;

        let result = create_test_staff_payment(&db, staff.id, 10.0).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        assert!(expense_rows(&db).await.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn test_update_staff_payment_mirrors_ledger() -> Result<()> {
        let db = setup_test_db().await?;
        let staff = create_test_staff(&db, "Dana").await?;
        let payment = create_test_staff_payment(&db, staff.id, 1500.0).await?;
        let row_id = expense_rows(&db).await[0].id;

        let updated = update_staff_payment(
            &db,
            payment.id,
            StaffPaymentUpdate {
                amount: Some(1750.0),
                payment_date: Some(date(2026, 2, 28)),
                description: Some("February salary".to_string()),
                ..Default::default()
            },
        )
        .await?;
        assert_eq!(updated.amount, 1750.0);

        let rows = expense_rows(&db).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, row_id);
        assert_eq!(rows[0].amount, 1750.0);
        assert_eq!(rows[0].entry_date, date(2026, 2, 28));
        assert_eq!(rows[0].description, "February salary");

        let result = update_staff_payment(
            &db,
            payment.id,
            StaffPaymentUpdate {
                amount: Some(0.0),
                ..Default::default()
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_staff_payment_removes_expense() -> Result<()> {
        let db = setup_test_db().await?;
        let staff = create_test_staff(&db, "Dana").await?;
        let keep = create_test_staff_payment(&db, staff.id, 100.0).await?;
        let drop = create_test_staff_payment(&db, staff.id, 200.0).await?;

        delete_staff_payment(&db, drop.id).await?;

        assert!(get_staff_payment_by_id(&db, drop.id).await?.is_none());
        let rows = expense_rows(&db).await;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].reference_id, Some(keep.id));

        let missing = delete_staff_payment(&db, drop.id).await;
        assert!(matches!(missing.unwrap_err(), Error::NotFound { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_staff_payments() -> Result<()> {
        let db = setup_test_db().await?;
        let dana = create_test_staff(&db, "Dana").await?;
        let eli = create_test_staff(&db, "Eli").await?;
        create_test_staff_payment(&db, dana.id, 100.0).await?;
        create_test_staff_payment(&db, dana.id, 150.0).await?;
        create_test_staff_payment(&db, eli.id, 90.0).await?;

        assert_eq!(list_staff_payments(&db, None).await?.len(), 3);
        let for_dana = list_staff_payments(&db, Some(dana.id)).await?;
        assert_eq!(for_dana.len(), 2);
        assert!(for_dana.iter().all(|p| p.staff_id == dana.id));

        Ok(())
    }
}
