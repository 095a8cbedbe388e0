//! Notification dispatch error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum NotifyError {
    #[error("mail request failed: {message}")]
    Request { message: String },

    #[error("mail API error {status}: {message}")]
    Api { status: u16, message: String },
}
