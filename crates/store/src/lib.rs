#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Credential store for vendo
//!
//! This crate manages the `SQLite` database holding download
//! credentials: opaque single-use keys mapped to the ordered file list
//! they unlock. Redemption is a single atomic conditional update at the
//! storage layer, which is what makes one-time-use hold under
//! concurrent requests — see [`manager::CredentialStore::redeem`].

pub mod manager;
pub mod models;

pub use manager::CredentialStore;
pub use models::{CredentialRecord, Issued};

use std::path::Path;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use vendo_errors::Error;

/// Create a new `SQLite` connection pool
///
/// # Errors
///
/// Returns an error if the database connection fails or configuration is invalid.
pub async fn create_pool(db_path: &Path) -> Result<Pool<Sqlite>, Error> {
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .map_err(|e| {
            Error::from(vendo_errors::StoreError::Database {
                message: e.to_string(),
            })
        })?;

    if let Ok(mut conn) = pool.acquire().await {
        let _ = sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&mut *conn)
            .await;
        let _ = sqlx::query("PRAGMA temp_store = MEMORY")
            .execute(&mut *conn)
            .await;
    }

    Ok(pool)
}

/// Run database migrations
///
/// # Errors
///
/// Returns an error if any migration fails to execute.
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<(), Error> {
    sqlx::migrate!("./migrations").run(pool).await.map_err(|e| {
        vendo_errors::StoreError::MigrationFailed {
            message: e.to_string(),
        }
        .into()
    })
}
