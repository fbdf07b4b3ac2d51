//! Route handlers organized by resource

pub mod auth;
pub mod client_portal;
pub mod clients;
pub mod dashboard;
pub mod health;
pub mod ledger;
pub mod products;
pub mod staff;
pub mod staff_payments;
pub mod staff_portal;
pub mod templates;
pub mod transactions;
pub mod users;

use chrono::{NaiveDate, Utc};

/// Today's date in UTC, used for request defaults and status derivation.
pub(crate) fn today() -> NaiveDate {
    Utc::now().date_naive()
}
