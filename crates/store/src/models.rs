//! Database models for the credential store

use vendo_types::CredentialKey;

/// A durable credential row.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub key: CredentialKey,
    /// Order/line-item identity the credential was issued for.
    pub order_ref: String,
    /// Ordered file identifiers the key unlocks.
    pub files: Vec<String>,
    /// Unix timestamp of issuance.
    pub issued_at: i64,
    /// Unix timestamp of redemption; `None` while the credential is live.
    pub consumed_at: Option<i64>,
}

impl CredentialRecord {
    #[must_use]
    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }
}

/// Outcome of an issuance attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issued {
    /// A fresh credential was created for this order reference.
    New(CredentialKey),
    /// A credential for this order reference already existed; its key
    /// is returned unchanged. The caller must not notify again.
    Existing(CredentialKey),
}

impl Issued {
    #[must_use]
    pub fn key(&self) -> &CredentialKey {
        match self {
            Self::New(key) | Self::Existing(key) => key,
        }
    }
}
