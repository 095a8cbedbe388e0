#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for vendo
//!
//! All runtime configuration is collected into one [`Config`] constructed
//! at startup and injected into each component. Request handling never
//! reads the environment; everything it needs arrives through this
//! struct.

use std::path::PathBuf;
use std::time::Duration;

use vendo_errors::{ConfigError, Error};

/// Default per-file object-storage fetch timeout in seconds.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 3000;

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared secret for webhook HMAC verification.
    pub webhook_secret: String,
    /// Object-storage base URL, e.g. `https://storage.example.com/object/public`.
    pub storage_base_url: String,
    /// Object-storage bucket name.
    pub storage_bucket: String,
    /// Mail transport API key.
    pub mail_api_key: String,
    /// Sender address for redemption emails.
    pub sender_email: String,
    /// Sender display name for redemption emails.
    pub sender_name: String,
    /// Externally reachable base URL used to build redemption links.
    pub download_base_url: String,
    /// Listening port.
    pub port: u16,
    /// Path to the SQLite credential database.
    pub database_path: PathBuf,
    /// Path to the TOML catalog mapping.
    pub catalog_path: PathBuf,
    /// Per-file fetch timeout during bundle streaming.
    pub fetch_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required: `SHOPIFY_WEBHOOK_SECRET`, `STORAGE_BASE_URL`,
    /// `STORAGE_BUCKET`, `MAILERSEND_API_KEY`, `SENDER_EMAIL`,
    /// `DOWNLOAD_BASE_URL`.
    ///
    /// Optional: `SENDER_NAME`, `PORT`, `DATABASE_PATH`, `CATALOG_PATH`,
    /// `FETCH_TIMEOUT_SECS`.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a numeric
    /// variable fails to parse.
    pub fn from_env() -> Result<Self, Error> {
        let port = match optional_var("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                var: "PORT".to_string(),
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let fetch_timeout_secs = match optional_var("FETCH_TIMEOUT_SECS") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                var: "FETCH_TIMEOUT_SECS".to_string(),
                value: raw,
            })?,
            None => DEFAULT_FETCH_TIMEOUT_SECS,
        };

        Ok(Self {
            webhook_secret: required_var("SHOPIFY_WEBHOOK_SECRET")?,
            storage_base_url: required_var("STORAGE_BASE_URL")?,
            storage_bucket: required_var("STORAGE_BUCKET")?,
            mail_api_key: required_var("MAILERSEND_API_KEY")?,
            sender_email: required_var("SENDER_EMAIL")?,
            sender_name: optional_var("SENDER_NAME").unwrap_or_else(|| "Downloads".to_string()),
            download_base_url: required_var("DOWNLOAD_BASE_URL")?,
            port,
            database_path: optional_var("DATABASE_PATH")
                .map_or_else(|| PathBuf::from("vendo.sqlite"), PathBuf::from),
            catalog_path: optional_var("CATALOG_PATH")
                .map_or_else(|| PathBuf::from("catalog.toml"), PathBuf::from),
            fetch_timeout: Duration::from_secs(fetch_timeout_secs),
        })
    }
}

fn required_var(var: &str) -> Result<String, Error> {
    optional_var(var).ok_or_else(|| {
        ConfigError::EnvVarNotFound {
            var: var.to_string(),
        }
        .into()
    })
}

fn optional_var(var: &str) -> Option<String> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}
