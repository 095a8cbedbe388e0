//! HTTP request handlers
//!
//! Thin adapters from HTTP to the fulfillment and bundle crates. The
//! webhook handler hands the *raw* body bytes to the pipeline; the
//! body is never parsed before its signature is checked.

use axum::body::{Body, Bytes};
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tracing::error;
use vendo_bundle::{Bundle, ZIP_FILENAME};
use vendo_errors::Error;
use vendo_fulfill::Outcome;
use vendo_types::CredentialKey;

use crate::server::AppState;

/// Signature header set by the commerce platform on every delivery.
pub const SIGNATURE_HEADER: &str = "x-shopify-hmac-sha256";

/// Message for unknown and consumed keys alike; which of the two it
/// was is deliberately not disclosed.
const INVALID_LINK: &str = "This download link is invalid or has expired.\n";

/// `GET /` - liveness probe, no side effects.
pub async fn health() -> &'static str {
    "ok\n"
}

/// `POST /webhook` - order fulfillment entry point.
///
/// 200 for every handled outcome including business-logic skips, 401
/// for signature failures, 500 only when credential issuance hit the
/// store - the one case where the platform should redeliver.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, &'static str) {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    match state.fulfillment.handle(&body, signature).await {
        Ok(Outcome::Rejected) => (StatusCode::UNAUTHORIZED, "invalid webhook signature\n"),
        Ok(Outcome::Skipped(_)) => (StatusCode::OK, "acknowledged\n"),
        Ok(Outcome::AlreadyIssued { .. }) => (StatusCode::OK, "already issued\n"),
        Ok(Outcome::Fulfilled { .. }) => (StatusCode::OK, "download link sent\n"),
        Err(e) => {
            error!(error = %e, "webhook fulfillment failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "fulfillment failed\n")
        }
    }
}

/// `GET /download/{key}` - one-time credential redemption.
///
/// The credential is consumed before any fetch starts; a request that
/// later fails upstream has still spent the key. That ordering is what
/// guarantees at-most-one download even when two requests race.
pub async fn download(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    let key = CredentialKey::from(key);

    let files = match state.store.redeem(&key).await {
        Ok(Some(files)) => files,
        Ok(None) => return (StatusCode::NOT_FOUND, INVALID_LINK).into_response(),
        Err(e) => {
            error!(error = %e, "credential store unavailable during redemption");
            return (StatusCode::INTERNAL_SERVER_ERROR, "redemption failed\n").into_response();
        }
    };

    match state.bundle.fetch_bundle(&files).await {
        Ok(Bundle::Single {
            filename,
            content_type,
            body,
        }) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{filename}\""),
                ),
            ],
            Body::from_stream(body),
        )
            .into_response(),
        Ok(Bundle::Zip { data, skipped }) => {
            if !skipped.is_empty() {
                error!(?skipped, "bundle delivered without files that failed to fetch");
            }
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/zip".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{ZIP_FILENAME}\""),
                    ),
                ],
                Body::from(data),
            )
                .into_response()
        }
        Err(e @ Error::Fetch(_)) => {
            error!(error = %e, "upstream storage unavailable");
            (StatusCode::BAD_GATEWAY, "upstream storage unavailable\n").into_response()
        }
        Err(e) => {
            error!(error = %e, "bundle assembly failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "download failed\n").into_response()
        }
    }
}
