#![deny(clippy::pedantic, unsafe_code)]

//! Webhook signature verification.
//!
//! The commerce platform signs every webhook delivery with an
//! HMAC-SHA256 tag over the raw request body, base64-encoded into the
//! `X-Shopify-Hmac-Sha256` header. Verification must run over the
//! untouched byte stream: parsing and re-serializing the body before
//! verifying invalidates the signature.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Verify a webhook body against its signature header.
///
/// Returns `false` for a malformed header as well as for a tag that
/// does not match; callers treat both as an unauthenticated request.
/// The comparison itself is constant-time.
#[must_use]
pub fn verify(secret: &str, body: &[u8], signature_b64: &str) -> bool {
    let Ok(expected) = STANDARD.decode(signature_b64.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Compute the base64 HMAC-SHA256 tag for a body.
///
/// Counterpart of [`verify`]; used by tests and local tooling to
/// produce valid deliveries.
#[must_use]
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any size"));
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}
