#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Error types for the vendo fulfillment service
//!
//! This crate provides fine-grained error types organized by domain.
//! All error types implement Clone for easier handling across task
//! boundaries.

use thiserror::Error;

pub mod catalog;
pub mod config;
pub mod fetch;
pub mod notify;
pub mod store;

// Re-export all error types at the root
pub use catalog::CatalogError;
pub use config::ConfigError;
pub use fetch::FetchError;
pub use notify::NotifyError;
pub use store::StoreError;

/// Generic error type for cross-crate boundaries
#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("notify error: {0}")]
    Notify(#[from] NotifyError),

    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("I/O error: {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl Error {
    /// Create an internal error with a message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        Self::Store(StoreError::Database {
            message: err.to_string(),
        })
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {err}"))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Fetch(FetchError::Timeout {
                url: err.url().map(ToString::to_string).unwrap_or_default(),
            })
        } else {
            Self::Fetch(FetchError::Request {
                message: err.to_string(),
            })
        }
    }
}

/// Result type alias for vendo operations
pub type Result<T> = std::result::Result<T, Error>;
