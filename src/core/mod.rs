//! Core business logic - framework-agnostic operations over the database.
//!
//! Every function takes a `SeaORM` connection and returns the crate
//! [`Result`](crate::errors::Result). Operations that touch more than one row
//! run inside a database transaction that is committed only when every
//! statement succeeded; returning early drops the transaction, which rolls it
//! back.

/// Client management and the `total_spent` aggregate
pub mod client;
/// PDF invoice rendering
pub mod invoice;
/// Ledger queries, manual entries and summaries
pub mod ledger;
/// Product/service catalog
pub mod product;
/// Dashboard statistics for the three portals
pub mod report;
/// First-start seeding from configuration
pub mod seed;
/// Staff records
pub mod staff;
/// Staff payments and their expense ledger rows
pub mod staff_payment;
/// Quick templates for transactions and staff payments
pub mod template;
/// Invoices, line items, payments and ledger mirroring
pub mod transaction;
/// User accounts and authentication
pub mod user;

use crate::errors::{Error, Result};
use chrono::{Duration, NaiveDate};

/// Half a cent: two amounts closer than this are the same amount of money.
const CENT_TOLERANCE: f64 = 0.005;

/// Rounds a monetary amount to whole cents.
#[must_use]
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Compares two monetary amounts at cent precision.
#[must_use]
pub fn amounts_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < CENT_TOLERANCE
}

/// Rejects amounts that are zero, negative or not finite.
pub(crate) fn ensure_positive(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// Rejects amounts that are negative or not finite.
pub(crate) fn ensure_non_negative(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}

/// Moves `date` by `days`, failing instead of leaving the calendar range.
pub(crate) fn add_days(date: NaiveDate, days: i64) -> Result<NaiveDate> {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .ok_or_else(|| Error::validation(format!("{date} plus {days} days is out of range")))
}

/// Trims a required text field, failing when nothing is left.
pub(crate) fn required_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Trims an optional text field; blank values become `None`.
pub(crate) fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Trims and lowercases an email address and checks its basic shape.
pub(crate) fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(Error::validation(format!("'{email}' is not a valid email"))),
    }
}
