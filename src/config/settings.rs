//! Application settings loaded from config.toml
//!
//! The TOML file carries everything that is safe to commit: listener address,
//! token lifetime, company details printed on invoices, invoice numbering, the
//! bootstrap admin identity and an optional catalog seed. Secrets (`JWT_SECRET`,
//! `ADMIN_PASSWORD`) and `DATABASE_URL` are read from the environment instead.

use crate::entities::ProductKind;
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Environment variable that overrides the config file location
pub const CONFIG_PATH_ENV: &str = "INVOICEHUB_CONFIG";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// HTTP listener settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Token and password hashing settings
    #[serde(default)]
    pub auth: AuthSettings,
    /// Company details printed on invoices
    #[serde(default)]
    pub company: CompanySettings,
    /// Invoice numbering and defaults
    #[serde(default)]
    pub invoice: InvoiceSettings,
    /// Admin account created on first start
    #[serde(default)]
    pub bootstrap: Option<BootstrapSettings>,
    /// Catalog entries to seed
    #[serde(default)]
    pub products: Vec<ProductSeed>,
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Socket address to bind, e.g. `"0.0.0.0:8080"`
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Allow any CORS origin instead of localhost only
    #[serde(default)]
    pub cors_permissive: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            cors_permissive: false,
        }
    }
}

fn default_bind_addr() -> String {
    "127.0.0.1:3000".to_string()
}

/// Token and password hashing settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// Lifetime of issued tokens
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    /// bcrypt work factor
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            token_ttl_hours: default_token_ttl_hours(),
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

const fn default_token_ttl_hours() -> i64 {
    24
}

const fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

/// Company details printed in the invoice header
#[derive(Debug, Clone, Deserialize)]
pub struct CompanySettings {
    /// Company name
    #[serde(default = "default_company_name")]
    pub name: String,
    /// Postal address
    #[serde(default)]
    pub address: Option<String>,
    /// Contact email
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone
    #[serde(default)]
    pub phone: Option<String>,
}

impl Default for CompanySettings {
    fn default() -> Self {
        Self {
            name: default_company_name(),
            address: None,
            email: None,
            phone: None,
        }
    }
}

fn default_company_name() -> String {
    "InvoiceHub".to_string()
}

/// Invoice numbering and defaults
#[derive(Debug, Clone, Deserialize)]
pub struct InvoiceSettings {
    /// Prefix of generated invoice numbers (`INV` gives `INV-2026-00001`)
    #[serde(default = "default_number_prefix")]
    pub number_prefix: String,
    /// Due date offset used when a request omits the due date
    #[serde(default = "default_due_days")]
    pub default_due_days: i64,
    /// Symbol printed in front of amounts on the PDF
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

impl Default for InvoiceSettings {
    fn default() -> Self {
        Self {
            number_prefix: default_number_prefix(),
            default_due_days: default_due_days(),
            currency_symbol: default_currency_symbol(),
        }
    }
}

fn default_number_prefix() -> String {
    "INV".to_string()
}

const fn default_due_days() -> i64 {
    30
}

fn default_currency_symbol() -> String {
    "$".to_string()
}

/// Identity of the admin account created when no admin exists
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapSettings {
    /// Admin login email
    pub admin_email: String,
    /// Admin display name
    #[serde(default = "default_admin_name")]
    pub admin_name: String,
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

/// Configuration for a single catalog entry
#[derive(Debug, Clone, Deserialize)]
pub struct ProductSeed {
    /// Name of the product
    pub name: String,
    /// Unit price
    pub price: f64,
    /// Product or service
    #[serde(default = "default_kind")]
    pub kind: ProductKind,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
}

const fn default_kind() -> ProductKind {
    ProductKind::Service
}

/// Loads application configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.as_ref().display()),
    })?;

    parse_config(&contents)
}

/// Parses configuration from a TOML string
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from `$INVOICEHUB_CONFIG` or `./config.toml`.
///
/// A missing file is not an error: every section has defaults, so the service
/// can start from environment variables alone.
pub fn load_default_config() -> Result<AppConfig> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config.toml".to_string());
    if Path::new(&path).exists() {
        tracing::debug!(path = %path, "Loading configuration file");
        load_config(&path)
    } else {
        tracing::warn!(path = %path, "Configuration file not found, using defaults");
        Ok(AppConfig::default())
    }
}
