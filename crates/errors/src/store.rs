//! Credential store error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("database error: {message}")]
    Database { message: String },

    #[error("migration failed: {message}")]
    MigrationFailed { message: String },

    #[error("refusing to issue credential with empty file list for {order_ref}")]
    EmptyFileList { order_ref: String },
}
