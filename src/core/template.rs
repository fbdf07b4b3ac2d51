//! Quick templates - Saved presets that become invoices or staff payments in
//! one call.
//!
//! Applying a template goes through the regular create operations, so the
//! result obeys exactly the same validation and ledger rules as a hand-made
//! record.

use crate::{
    core::{
        add_days,
        client::require_active_client,
        ensure_positive, optional_text, required_text, round_cents,
        staff::require_active_staff,
        staff_payment::{self, DEFAULT_STAFF_PAYMENT_METHOD, NewStaffPayment},
        transaction::{self, NewItem, NewTransaction, validate_item_shapes},
    },
    entities::{
        StaffPaymentTemplate, TemplateItem, TransactionTemplate, staff_payment as staff_payment_entity,
        staff_payment_template, transaction as transaction_entity, transaction_template,
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Input for [`create_transaction_template`]
#[derive(Debug, Clone, Deserialize)]
pub struct NewTransactionTemplate {
    /// Display name
    pub name: String,
    /// Default client; may be overridden when applying
    #[serde(default)]
    pub client_id: Option<i64>,
    /// Invoice description
    #[serde(default)]
    pub description: Option<String>,
    /// Days between issue and due date
    #[serde(default = "default_due_in_days")]
    pub due_in_days: i32,
    /// Invoice notes
    #[serde(default)]
    pub notes: Option<String>,
    /// Line items
    pub items: Vec<TemplateItem>,
}

const fn default_due_in_days() -> i32 {
    30
}

/// Longest payment term a template may carry, ten years
pub const MAX_DUE_IN_DAYS: i32 = 3650;

/// Input for [`create_staff_payment_template`]
#[derive(Debug, Clone, Deserialize)]
pub struct NewStaffPaymentTemplate {
    /// Display name
    pub name: String,
    /// Paid staff member
    pub staff_id: i64,
    /// Positive amount
    pub amount: f64,
    /// Payment description
    #[serde(default)]
    pub description: Option<String>,
    /// Payment method
    #[serde(default)]
    pub method: Option<String>,
}

impl From<TemplateItem> for NewItem {
    fn from(item: TemplateItem) -> Self {
        Self {
            product_id: item.product_id,
            description: item.description,
            quantity: item.quantity,
            unit_price: item.unit_price,
        }
    }
}

/// Decodes the line items stored on a template.
pub fn template_items(template: &transaction_template::Model) -> Result<Vec<TemplateItem>> {
    serde_json::from_str(&template.items).map_err(Into::into)
}

/// Saves a transaction template.
///
/// Items are checked the same way invoice items are; product references are
/// resolved when the template is applied, so a product deleted in between
/// surfaces as `NotFound` at that point.
#[instrument(skip(db, input))]
pub async fn create_transaction_template(
    db: &DatabaseConnection,
    input: NewTransactionTemplate,
) -> Result<transaction_template::Model> {
    let name = required_text("Template name", &input.name)?;
    if !(0..=MAX_DUE_IN_DAYS).contains(&input.due_in_days) {
        return Err(Error::validation(format!(
            "due_in_days must be between 0 and {MAX_DUE_IN_DAYS}"
        )));
    }
    let items: Vec<NewItem> = input.items.iter().cloned().map(Into::into).collect();
    validate_item_shapes(&items)?;

    if let Some(client_id) = input.client_id {
        require_active_client(db, client_id).await?;
    }

    let template = transaction_template::ActiveModel {
        name: Set(name),
        client_id: Set(input.client_id),
        description: Set(optional_text(input.description)),
        due_in_days: Set(input.due_in_days),
        notes: Set(optional_text(input.notes)),
        items: Set(serde_json::to_string(&input.items)?),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(template_id = template.id, "Created transaction template");
    Ok(template)
}

/// Retrieves a single transaction template.
pub async fn get_transaction_template_by_id(
    db: &DatabaseConnection,
    template_id: i64,
) -> Result<Option<transaction_template::Model>> {
    TransactionTemplate::find_by_id(template_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists transaction templates by name.
pub async fn list_transaction_templates(
    db: &DatabaseConnection,
) -> Result<Vec<transaction_template::Model>> {
    TransactionTemplate::find()
        .order_by_asc(transaction_template::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes a transaction template. Invoices created from it are unaffected.
#[instrument(skip(db))]
pub async fn delete_transaction_template(db: &DatabaseConnection, template_id: i64) -> Result<()> {
    let result = TransactionTemplate::delete_by_id(template_id).exec(db).await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("transaction template", template_id));
    }
    info!(template_id, "Deleted transaction template");
    Ok(())
}

/// Creates a pending invoice from a template, issued `today` and due
/// `due_in_days` later.
///
/// # Errors
/// Returns `Validation` when neither the template nor `client_override`
/// names a client.
#[instrument(skip(db))]
pub async fn apply_transaction_template(
    db: &DatabaseConnection,
    template_id: i64,
    client_override: Option<i64>,
    created_by: i64,
    today: NaiveDate,
    number_prefix: &str,
) -> Result<transaction_entity::Model> {
    let template = get_transaction_template_by_id(db, template_id)
        .await?
        .ok_or_else(|| Error::not_found("transaction template", template_id))?;

    let client_id = client_override
        .or(template.client_id)
        .ok_or_else(|| Error::validation("A client is required to apply this template"))?;
    let items = template_items(&template)?
        .into_iter()
        .map(Into::into)
        .collect();
    let due_date = add_days(today, i64::from(template.due_in_days))?;

    let input = NewTransaction {
        client_id,
        description: template.description,
        issue_date: today,
        due_date,
        notes: template.notes,
        items,
        draft: false,
    };
    let created = transaction::create_transaction(db, input, created_by, number_prefix).await?;

    info!(
        template_id,
        transaction_id = created.id,
        "Applied transaction template"
    );
    Ok(created)
}

/// Saves a staff payment template for an active staff member.
#[instrument(skip(db, input))]
pub async fn create_staff_payment_template(
    db: &DatabaseConnection,
    input: NewStaffPaymentTemplate,
) -> Result<staff_payment_template::Model> {
    let name = required_text("Template name", &input.name)?;
    ensure_positive(input.amount)?;
    require_active_staff(db, input.staff_id).await?;

    let template = staff_payment_template::ActiveModel {
        name: Set(name),
        staff_id: Set(input.staff_id),
        amount: Set(round_cents(input.amount)),
        description: Set(optional_text(input.description)),
        method: Set(optional_text(input.method)
            .unwrap_or_else(|| DEFAULT_STAFF_PAYMENT_METHOD.to_string())),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(template_id = template.id, "Created staff payment template");
    Ok(template)
}

/// Lists staff payment templates by name.
pub async fn list_staff_payment_templates(
    db: &DatabaseConnection,
) -> Result<Vec<staff_payment_template::Model>> {
    StaffPaymentTemplate::find()
        .order_by_asc(staff_payment_template::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes a staff payment template.
#[instrument(skip(db))]
pub async fn delete_staff_payment_template(
    db: &DatabaseConnection,
    template_id: i64,
) -> Result<()> {
    let result = StaffPaymentTemplate::delete_by_id(template_id)
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("staff payment template", template_id));
    }
    info!(template_id, "Deleted staff payment template");
    Ok(())
}

/// Records a staff payment from a template, dated `today` with the month as
/// its period.
#[instrument(skip(db))]
pub async fn apply_staff_payment_template(
    db: &DatabaseConnection,
    template_id: i64,
    today: NaiveDate,
) -> Result<staff_payment_entity::Model> {
    let template = StaffPaymentTemplate::find_by_id(template_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("staff payment template", template_id))?;

    let input = NewStaffPayment {
        staff_id: template.staff_id,
        amount: template.amount,
        payment_date: today,
        period: Some(today.format("%Y-%m").to_string()),
        description: template.description,
        method: Some(template.method),
    };
    let payment = staff_payment::create_staff_payment(db, input).await?;

    info!(
        template_id,
        payment_id = payment.id,
        "Applied staff payment template"
    );
    Ok(payment)
}
