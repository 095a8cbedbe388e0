#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Redemption email composition and dispatch
//!
//! Composes the single-use download email and sends it through a
//! MailerSend-style JSON API. Dispatch sits behind the [`Mailer`] trait
//! so the fulfillment orchestrator can be exercised without a live
//! transport.

pub mod template;

pub use template::redemption_email;

use async_trait::async_trait;
use tracing::debug;
use vendo_errors::{Error, NotifyError};

/// Production MailerSend API base.
pub const DEFAULT_API_BASE: &str = "https://api.mailersend.com/v1";

/// Outbound email transport seam.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Dispatch one plain-text email.
    ///
    /// # Errors
    ///
    /// Returns an error when the transport rejects or fails the send.
    /// Callers report the failure but never roll back credential
    /// issuance over it.
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), Error>;
}

/// MailerSend JSON API client.
pub struct MailerSendClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    sender_email: String,
    sender_name: String,
}

impl MailerSendClient {
    #[must_use]
    pub fn new(api_key: String, sender_email: String, sender_name: String) -> Self {
        Self::with_api_base(DEFAULT_API_BASE.to_string(), api_key, sender_email, sender_name)
    }

    /// Point the client at a different API base. Tests use this to
    /// target a local mock server.
    #[must_use]
    pub fn with_api_base(
        api_base: String,
        api_key: String,
        sender_email: String,
        sender_name: String,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            sender_email,
            sender_name,
        }
    }
}

#[async_trait]
impl Mailer for MailerSendClient {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), Error> {
        let payload = serde_json::json!({
            "from": {
                "email": self.sender_email,
                "name": self.sender_name,
            },
            "to": [{ "email": to }],
            "subject": subject,
            "text": body,
        });

        let response = self
            .client
            .post(format!("{}/email", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Request {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        debug!(to, subject, "redemption email dispatched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(server: &MockServer) -> MailerSendClient {
        MailerSendClient::with_api_base(
            server.base_url(),
            "test-key".to_string(),
            "shop@example.com".to_string(),
            "Entropy Store".to_string(),
        )
    }

    #[tokio::test]
    async fn sends_expected_payload() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/email")
                .header("authorization", "Bearer test-key")
                .json_body_partial(
                    r#"{"from":{"email":"shop@example.com"},"to":[{"email":"a@b.com"}]}"#,
                );
            then.status(202);
        });

        client(&server)
            .send("a@b.com", "Your One-Time Download Link", "hello")
            .await
            .unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn api_rejection_surfaces_as_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/email");
            then.status(422).body("invalid recipient");
        });

        let err = client(&server)
            .send("bad", "subject", "body")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("422"));
    }
}
