#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Core type definitions for the vendo fulfillment service
//!
//! This crate provides the domain types shared across the system:
//! the parsed order event from the commerce platform webhook and the
//! opaque credential key that unlocks a download bundle.

pub mod order;

pub use order::{LineItem, OrderEvent};

use serde::{Deserialize, Serialize};

/// Opaque single-use download credential key.
///
/// Keys are 64 lowercase hex characters (256 bits of entropy), generated
/// by the credential store at issuance. The key is the only thing the
/// buyer ever sees; it carries no information about the order or files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CredentialKey(String);

impl CredentialKey {
    #[must_use]
    pub fn new(key: String) -> Self {
        Self(key)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CredentialKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl From<&str> for CredentialKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}
