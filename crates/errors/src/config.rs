//! Configuration error types

use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("environment variable not found: {var}")]
    EnvVarNotFound { var: String },

    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },

    #[error("config file not found: {path}")]
    NotFound { path: String },

    #[error("parse error: {message}")]
    ParseError { message: String },
}
