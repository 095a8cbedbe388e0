//! Credential store implementation
//!
//! All operations go through single SQL statements so their atomicity
//! is the database's, not the process's. That matters for [`redeem`]:
//! a read-then-write sequence would let two concurrent requests both
//! observe an unconsumed credential and both walk away with the file
//! list. The conditional `UPDATE ... RETURNING` below cannot.
//!
//! [`redeem`]: CredentialStore::redeem

use rand::RngCore as _;
use sqlx::{Pool, Row as _, Sqlite};
use tracing::{debug, info};
use vendo_errors::{Error, StoreError};
use vendo_types::CredentialKey;

use crate::models::{CredentialRecord, Issued};

/// Number of random bytes behind a credential key. 32 bytes hex-encode
/// to 64 characters and give 256 bits of entropy, comfortably past the
/// 128-bit unguessability floor.
const KEY_BYTES: usize = 32;

/// Durable mapping of opaque one-time keys to the file lists they
/// unlock, with atomic consume-once semantics.
#[derive(Clone)]
pub struct CredentialStore {
    pool: Pool<Sqlite>,
}

impl CredentialStore {
    #[must_use]
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Issue a credential for an order/line-item pair.
    ///
    /// Issuance is idempotent on `order_ref`: the insert is a single
    /// `ON CONFLICT DO NOTHING` statement, and when it affects no row
    /// the previously issued key is returned as [`Issued::Existing`].
    /// Redelivered webhooks therefore never create a second live
    /// credential for the same purchase.
    ///
    /// # Errors
    ///
    /// Returns an error if `files` is empty or the database is
    /// unavailable. Callers must not send a notification when issuance
    /// fails.
    pub async fn issue(&self, order_ref: &str, files: &[String]) -> Result<Issued, Error> {
        if files.is_empty() {
            return Err(StoreError::EmptyFileList {
                order_ref: order_ref.to_string(),
            }
            .into());
        }

        let key = generate_key();
        let files_json = serde_json::to_string(files)?;
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            "INSERT INTO credentials (key, order_ref, files, issued_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(order_ref) DO NOTHING",
        )
        .bind(key.as_str())
        .bind(order_ref)
        .bind(&files_json)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            info!(order_ref, key = %key, files = files.len(), "credential issued");
            return Ok(Issued::New(key));
        }

        // Lost to an earlier delivery of the same order; hand back the
        // key that delivery created.
        let row = sqlx::query("SELECT key FROM credentials WHERE order_ref = ?1")
            .bind(order_ref)
            .fetch_one(&self.pool)
            .await?;
        let existing: String = row.get("key");
        debug!(order_ref, "credential already issued");
        Ok(Issued::Existing(CredentialKey::new(existing)))
    }

    /// Redeem a credential, consuming it.
    ///
    /// The check-and-mark happens in one conditional `UPDATE ...
    /// RETURNING` statement, so under N concurrent redemptions of the
    /// same key exactly one caller gets the file list and the rest get
    /// `None`. Unknown and already-consumed keys are indistinguishable
    /// here on purpose; callers surface both as "invalid or expired".
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unavailable or the stored
    /// file list fails to decode.
    pub async fn redeem(&self, key: &CredentialKey) -> Result<Option<Vec<String>>, Error> {
        let now = chrono::Utc::now().timestamp();

        let row = sqlx::query(
            "UPDATE credentials
             SET consumed_at = ?1
             WHERE key = ?2 AND consumed_at IS NULL
             RETURNING files",
        )
        .bind(now)
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let files_json: String = row.get("files");
                let files: Vec<String> = serde_json::from_str(&files_json)?;
                info!(key = %key, files = files.len(), "credential redeemed");
                Ok(Some(files))
            }
            None => {
                debug!(key = %key, "redeem miss: unknown or consumed key");
                Ok(None)
            }
        }
    }

    /// Read a credential row without consuming it. Support and test
    /// tooling only; the redemption path never calls this.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is unavailable or the stored
    /// file list fails to decode.
    pub async fn lookup(&self, key: &CredentialKey) -> Result<Option<CredentialRecord>, Error> {
        let row = sqlx::query(
            "SELECT key, order_ref, files, issued_at, consumed_at
             FROM credentials WHERE key = ?1",
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let files_json: String = row.get("files");
                Ok(Some(CredentialRecord {
                    key: CredentialKey::new(row.get("key")),
                    order_ref: row.get("order_ref"),
                    files: serde_json::from_str(&files_json)?,
                    issued_at: row.get("issued_at"),
                    consumed_at: row.get("consumed_at"),
                }))
            }
            None => Ok(None),
        }
    }
}

/// Generate a fresh credential key from OS randomness.
fn generate_key() -> CredentialKey {
    let mut bytes = [0u8; KEY_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    CredentialKey::new(hex::encode(bytes))
}
