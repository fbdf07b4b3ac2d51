//! Shared test utilities for `InvoiceHub`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    api::AppState,
    auth::TokenService,
    config::AppConfig,
    core::{
        client::{self, NewClient},
        product::{self, NewProduct},
        staff::{self, NewStaff},
        staff_payment::{self, NewStaffPayment},
        transaction::{self, NewItem, NewTransaction},
        user::{self, NewUser},
    },
    entities::{self, ProductKind, Role},
    errors::Result,
};
use axum::{
    body::{Body, Bytes, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use chrono::{Duration, NaiveDate, Utc};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

/// Password given to every user created by [`create_test_user`]
pub const TEST_PASSWORD: &str = "password123";

/// Cheapest bcrypt cost, so tests that hash passwords stay fast
pub const TEST_BCRYPT_COST: u32 = 4;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Shorthand for a calendar date in tests.
///
/// # Panics
/// Panics on an impossible date.
#[allow(clippy::unwrap_used)]
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Creates a test client with sensible defaults.
///
/// # Defaults
/// * `email`: derived from the name, e.g. `"acme-corp@example.test"`
/// * `company`: the name
pub async fn create_test_client(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::client::Model> {
    let slug = name.to_lowercase().replace(' ', "-");
    client::create_client(
        db,
        NewClient {
            name: name.to_string(),
            email: format!("{slug}@example.test"),
            company: Some(name.to_string()),
            ..Default::default()
        },
    )
    .await
}

/// Creates a test staff member.
///
/// # Defaults
/// * `salary`: 2000.0
/// * `position`: "Engineer"
pub async fn create_test_staff(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::staff::Model> {
    let slug = name.to_lowercase().replace(' ', ".");
    staff::create_staff(
        db,
        NewStaff {
            name: name.to_string(),
            email: format!("{slug}@staff.test"),
            phone: None,
            position: Some("Engineer".to_string()),
            salary: 2000.0,
        },
    )
    .await
}

/// Creates a test catalog entry.
///
/// # Defaults
/// * `price`: 10.0
/// * `kind`: service
pub async fn create_test_product(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::product::Model> {
    product::create_product(
        db,
        NewProduct {
            name: name.to_string(),
            description: None,
            price: 10.0,
            kind: ProductKind::Service,
        },
    )
    .await
}

/// Creates a pending invoice with a single free-form line of `amount`.
///
/// # Defaults
/// * `issue_date`: today
/// * `due_date`: today + 30 days
/// * `created_by`: 1
/// * number prefix: `"INV"`
pub async fn create_test_transaction(
    db: &DatabaseConnection,
    client_id: i64,
    amount: f64,
) -> Result<entities::transaction::Model> {
    let today = Utc::now().date_naive();
    transaction::create_transaction(
        db,
        NewTransaction {
            client_id,
            description: Some("Test invoice".to_string()),
            issue_date: today,
            due_date: today + Duration::days(30),
            notes: None,
            items: vec![NewItem::free_form("Test work", 1.0, amount)],
            draft: false,
        },
        1,
        "INV",
    )
    .await
}

/// Creates a fresh client with one pending invoice of `amount`.
/// Returns (client, transaction) for payment and ledger tests.
pub async fn setup_with_transaction(
    db: &DatabaseConnection,
    amount: f64,
) -> Result<(entities::client::Model, entities::transaction::Model)> {
    let count = client::get_all_active_clients(db).await?.len();
    let client = create_test_client(db, &format!("Client {}", count + 1)).await?;
    let transaction = create_test_transaction(db, client.id, amount).await?;
    Ok((client, transaction))
}

/// Records a staff payment of `amount` dated today.
pub async fn create_test_staff_payment(
    db: &DatabaseConnection,
    staff_id: i64,
    amount: f64,
) -> Result<entities::staff_payment::Model> {
    staff_payment::create_staff_payment(
        db,
        NewStaffPayment {
            staff_id,
            amount,
            payment_date: Utc::now().date_naive(),
            period: Some("2026-01".to_string()),
            description: None,
            method: None,
        },
    )
    .await
}

/// Creates an active user with [`TEST_PASSWORD`].
///
/// Client users need `client_id`, staff users need `staff_id`.
pub async fn create_test_user(
    db: &DatabaseConnection,
    email: &str,
    role: Role,
    client_id: Option<i64>,
    staff_id: Option<i64>,
) -> Result<entities::user::Model> {
    user::create_user(
        db,
        NewUser {
            email: email.to_string(),
            password: TEST_PASSWORD.to_string(),
            name: format!("Test {role}"),
            role,
            client_id,
            staff_id,
        },
        TEST_BCRYPT_COST,
    )
    .await
}

/// Builds API state over a fresh in-memory database.
///
/// Uses the default config with [`TEST_BCRYPT_COST`] and a fixed signing secret.
pub async fn setup_test_state() -> Result<Arc<AppState>> {
    let db = setup_test_db().await?;
    let mut config = AppConfig::default();
    config.auth.bcrypt_cost = TEST_BCRYPT_COST;
    let tokens = TokenService::new("test-secret", 1)?;
    Ok(Arc::new(AppState::new(db, config, tokens)))
}

/// Issues a bearer token for `user` with the state's token service.
///
/// # Panics
/// Panics if token encoding fails.
#[allow(clippy::unwrap_used)]
pub fn bearer_token(state: &AppState, user: &entities::user::Model) -> String {
    state.tokens.issue(user).unwrap()
}

/// Creates a user with `role` and returns a token for it.
pub async fn login_as(
    state: &AppState,
    email: &str,
    role: Role,
    client_id: Option<i64>,
    staff_id: Option<i64>,
) -> Result<String> {
    let user = create_test_user(&state.db, email, role, client_id, staff_id).await?;
    Ok(bearer_token(state, &user))
}

/// Sends one request through the full router and returns the raw response.
///
/// # Panics
/// Panics if the request cannot be built or the body cannot be read.
#[allow(clippy::unwrap_used)]
pub async fn send_raw(
    app: axum::Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, HeaderMap, Bytes) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&json).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, headers, bytes)
}

/// Like [`send_raw`] but parses the body as JSON (`Value::Null` when empty).
///
/// # Panics
/// Panics if a non-empty body is not JSON.
#[allow(clippy::unwrap_used)]
pub async fn send(
    app: axum::Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let (status, _, bytes) = send_raw(app, method, uri, token, body).await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
