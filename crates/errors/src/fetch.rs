//! Object-storage fetch error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error("fetch request failed: {message}")]
    Request { message: String },

    #[error("fetch timed out: {url}")]
    Timeout { url: String },

    #[error("upstream returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("invalid object URL: {message}")]
    InvalidUrl { message: String },

    #[error("every file in the bundle failed to fetch")]
    AllFetchesFailed,
}
