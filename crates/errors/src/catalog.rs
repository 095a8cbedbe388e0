//! Catalog error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog file not found: {path}")]
    NotFound { path: String },

    #[error("catalog parse error: {message}")]
    ParseError { message: String },

    #[error("empty file list configured for product {sku}")]
    EmptyFileList { sku: String },
}
