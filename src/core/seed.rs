//! First-start seeding from configuration.
//!
//! Both operations are safe to run on every start: they only add what is
//! missing.

use crate::{
    config::AppConfig,
    core::{
        product::{NewProduct, create_product, get_product_by_name},
        user::{NewUser, create_user, list_users},
    },
    entities::{Role, user},
    errors::Result,
};
use sea_orm::DatabaseConnection;
use tracing::{debug, info, warn};

/// Creates the configured admin account when no admin exists yet.
///
/// Returns the created account, or `None` when an admin already exists or
/// there is not enough information to create one (no `[bootstrap]` section or
/// no password).
pub async fn seed_bootstrap_admin(
    db: &DatabaseConnection,
    config: &AppConfig,
    password: Option<&str>,
) -> Result<Option<user::Model>> {
    if !list_users(db, Some(Role::Admin)).await?.is_empty() {
        debug!("Admin account present, skipping bootstrap");
        return Ok(None);
    }

    let Some(bootstrap) = &config.bootstrap else {
        warn!("No admin account exists and no [bootstrap] section is configured");
        return Ok(None);
    };
    let Some(password) = password else {
        warn!(
            email = %bootstrap.admin_email,
            "No admin account exists and ADMIN_PASSWORD is not set"
        );
        return Ok(None);
    };

    let admin = create_user(
        db,
        NewUser {
            email: bootstrap.admin_email.clone(),
            password: password.to_string(),
            name: bootstrap.admin_name.clone(),
            role: Role::Admin,
            client_id: None,
            staff_id: None,
        },
        config.auth.bcrypt_cost,
    )
    .await?;

    info!(email = %admin.email, "Created bootstrap admin account");
    Ok(Some(admin))
}

/// Adds configured catalog entries whose name is not in the catalog yet.
/// Returns how many were added.
pub async fn seed_products(db: &DatabaseConnection, config: &AppConfig) -> Result<usize> {
    let mut added = 0;

    for seed in &config.products {
        if get_product_by_name(db, seed.name.trim()).await?.is_some() {
            continue;
        }
        create_product(
            db,
            NewProduct {
                name: seed.name.clone(),
                description: seed.description.clone(),
                price: seed.price,
                kind: seed.kind,
            },
        )
        .await?;
        added += 1;
    }

    if added > 0 {
        info!(count = added, "Seeded catalog products");
    }
    Ok(added)
}
