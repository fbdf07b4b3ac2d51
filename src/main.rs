use std::{env, sync::Arc};

use dotenvy::dotenv;
use invoicehub::{
    api::{self, AppState},
    auth::TokenService,
    config::{database, settings},
    core::seed,
    errors::{Error, Result},
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the application configuration
    let app_config = settings::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    info!("Successfully processed application configuration.");

    // JWT_SECRET is read here, directly before use, and never stored in AppConfig
    let secret = env::var("JWT_SECRET").map_err(|_| Error::Config {
        message: "JWT_SECRET must be set".to_string(),
    })?;
    let tokens = TokenService::new(&secret, app_config.auth.token_ttl_hours)?;

    // 4. Connect and create tables
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed the bootstrap admin and catalog
    let admin_password = env::var("ADMIN_PASSWORD").ok();
    seed::seed_bootstrap_admin(&db, &app_config, admin_password.as_deref()).await?;
    let seeded = seed::seed_products(&db, &app_config).await?;
    info!(count = seeded, "Catalog seeding complete");

    // 6. Serve the API
    let state = Arc::new(AppState::new(db, app_config, tokens));
    api::serve(state).await
}
