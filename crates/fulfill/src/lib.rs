#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Fulfillment orchestration for vendo
//!
//! Drives one inbound webhook from raw bytes to an [`Outcome`]:
//! signature verification, catalog resolution, idempotent credential
//! issuance, and buyer notification. The commerce platform delivers
//! webhooks at least once, so every decision here is written for
//! redelivery: business-logic non-matches acknowledge rather than
//! error, duplicate deliveries reuse the already-issued credential,
//! and only a storage failure asks the platform to retry.

use tracing::{error, info, warn};
use vendo_catalog::Catalog;
use vendo_errors::Result;
use vendo_notify::{redemption_email, Mailer};
use vendo_store::{CredentialStore, Issued};
use vendo_types::{CredentialKey, OrderEvent};

/// Why a webhook was acknowledged without issuing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The body passed signature verification but is not a parseable
    /// order payload.
    InvalidPayload,
    /// The order carries no buyer email address.
    NoRecipient,
    /// No line item maps to a configured product.
    NoResolvableItem,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidPayload => f.write_str("unparseable order payload"),
            Self::NoRecipient => f.write_str("no recipient address"),
            Self::NoResolvableItem => f.write_str("no resolvable product"),
        }
    }
}

/// Terminal state of one webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Signature missing or invalid. Maps to 401; the platform will
    /// not be asked to retry an unauthenticated request.
    Rejected,
    /// Handled but deliberately actionless. Maps to 200 so the
    /// platform's delivery guarantee does not become a redelivery
    /// storm over a permanent business-logic non-match.
    Skipped(SkipReason),
    /// A previous delivery of this order already issued a credential.
    /// No second email is sent; the original remains valid.
    AlreadyIssued { key: CredentialKey },
    /// A credential was issued. `notified` records whether the email
    /// actually went out; a dispatch failure is absorbed because
    /// retrying the webhook could never recover the lost email, only
    /// re-trigger issuance.
    Fulfilled { key: CredentialKey, notified: bool },
}

/// Webhook-to-email fulfillment pipeline.
pub struct Fulfillment<M: Mailer> {
    webhook_secret: String,
    download_base_url: String,
    catalog: Catalog,
    store: CredentialStore,
    mailer: M,
}

impl<M: Mailer> Fulfillment<M> {
    #[must_use]
    pub fn new(
        webhook_secret: String,
        download_base_url: String,
        catalog: Catalog,
        store: CredentialStore,
        mailer: M,
    ) -> Self {
        Self {
            webhook_secret,
            download_base_url,
            catalog,
            store,
            mailer,
        }
    }

    /// Process one webhook delivery.
    ///
    /// `raw_body` must be the untouched request bytes; the signature is
    /// computed over exactly what the platform sent, and any
    /// re-serialization upstream of this call is a correctness bug.
    ///
    /// # Errors
    ///
    /// Returns an error only for credential-store failures during
    /// issuance. That is the one case the HTTP layer surfaces as a
    /// server error, so the platform's delivery mechanism retries.
    pub async fn handle(&self, raw_body: &[u8], signature: Option<&str>) -> Result<Outcome> {
        let Some(signature) = signature else {
            warn!("webhook rejected: missing signature header");
            return Ok(Outcome::Rejected);
        };
        if !vendo_signing::verify(&self.webhook_secret, raw_body, signature) {
            warn!("webhook rejected: signature mismatch");
            return Ok(Outcome::Rejected);
        }

        let order: OrderEvent = match serde_json::from_slice(raw_body) {
            Ok(order) => order,
            Err(e) => {
                warn!(error = %e, "authenticated webhook with unparseable payload");
                return Ok(Outcome::Skipped(SkipReason::InvalidPayload));
            }
        };

        if order.email.trim().is_empty() {
            info!(order_id = ?order.id, "order skipped: no recipient address");
            return Ok(Outcome::Skipped(SkipReason::NoRecipient));
        }

        let Some(resolved) = self.catalog.resolve_order(&order.line_items) else {
            info!(
                order_id = ?order.id,
                skus = ?order.line_items.iter().map(|i| i.sku.as_str()).collect::<Vec<_>>(),
                "order skipped: no line item maps to a configured product"
            );
            return Ok(Outcome::Skipped(SkipReason::NoResolvableItem));
        };
        if !resolved.skipped.is_empty() {
            // Single-item fulfillment is a documented limitation; make
            // the passed-over items visible.
            warn!(
                order_id = ?order.id,
                fulfilled = %resolved.item.sku,
                skipped = ?resolved.skipped,
                "order has multiple line items; fulfilling the first resolvable one"
            );
        }

        let order_ref = order.order_ref(resolved.item);
        match self.store.issue(&order_ref, resolved.files).await? {
            Issued::Existing(key) => {
                info!(%order_ref, "redelivered webhook: credential already issued");
                Ok(Outcome::AlreadyIssued { key })
            }
            Issued::New(key) => {
                let (subject, body) = redemption_email(&self.download_base_url, &key);
                let notified = match self.mailer.send(&order.email, &subject, &body).await {
                    Ok(()) => true,
                    Err(e) => {
                        // The credential stays valid; support can
                        // resend the link manually.
                        error!(%order_ref, error = %e, "redemption email dispatch failed");
                        false
                    }
                };
                Ok(Outcome::Fulfilled { key, notified })
            }
        }
    }
}

#[cfg(test)]
mod tests;
