use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;
use vendo_catalog::Catalog;
use vendo_errors::{Error, NotifyError};
use vendo_notify::Mailer;
use vendo_store::{create_pool, run_migrations, CredentialStore};

use super::*;

const SECRET: &str = "whsec_test123";
const BASE_URL: &str = "https://shop.example.com";

#[derive(Clone, Default)]
struct MockMailer {
    sent: Arc<Mutex<Vec<(String, String, String)>>>,
    fail: bool,
}

impl MockMailer {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> std::result::Result<(), Error> {
        if self.fail {
            return Err(NotifyError::Request {
                message: "transport down".to_string(),
            }
            .into());
        }
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }
}

async fn fixture(mailer: MockMailer) -> (TempDir, Fulfillment<MockMailer>, CredentialStore) {
    let dir = TempDir::new().unwrap();
    let pool = create_pool(&dir.path().join("test.sqlite")).await.unwrap();
    run_migrations(&pool).await.unwrap();
    let store = CredentialStore::new(pool);

    let mut products = HashMap::new();
    products.insert(
        "DUBPACK-1".to_string(),
        vec!["A.wav".to_string(), "B.wav".to_string()],
    );
    products.insert("SINGLE-1".to_string(), vec!["C.wav".to_string()]);
    let catalog = Catalog::from_map(products).unwrap();

    let fulfillment = Fulfillment::new(
        SECRET.to_string(),
        BASE_URL.to_string(),
        catalog,
        store.clone(),
        mailer,
    );
    (dir, fulfillment, store)
}

fn signed(body: &[u8]) -> String {
    vendo_signing::sign(SECRET, body)
}

const ORDER: &[u8] =
    br#"{"id":100,"email":"a@b.com","line_items":[{"id":1,"sku":"DUBPACK-1","title":"Vertigo"}]}"#;

#[tokio::test]
async fn missing_signature_is_rejected() {
    let (_dir, fulfillment, _) = fixture(MockMailer::default()).await;
    assert_eq!(
        fulfillment.handle(ORDER, None).await.unwrap(),
        Outcome::Rejected
    );
}

#[tokio::test]
async fn bad_signature_is_rejected_without_side_effects() {
    let mailer = MockMailer::default();
    let (_dir, fulfillment, store) = fixture(mailer.clone()).await;

    let tag = vendo_signing::sign("wrong-secret", ORDER);
    assert_eq!(
        fulfillment.handle(ORDER, Some(&tag)).await.unwrap(),
        Outcome::Rejected
    );
    assert!(mailer.sent().is_empty());

    // Nothing was issued either.
    let pool_probe = store
        .lookup(&vendo_types::CredentialKey::from("0".repeat(64)))
        .await
        .unwrap();
    assert!(pool_probe.is_none());
}

#[tokio::test]
async fn valid_order_issues_and_notifies() {
    let mailer = MockMailer::default();
    let (_dir, fulfillment, store) = fixture(mailer.clone()).await;

    let outcome = fulfillment
        .handle(ORDER, Some(&signed(ORDER)))
        .await
        .unwrap();
    let Outcome::Fulfilled { key, notified } = outcome else {
        panic!("expected fulfillment");
    };
    assert!(notified);

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    let (to, _, body) = &sent[0];
    assert_eq!(to, "a@b.com");
    assert!(body.contains(&format!("{BASE_URL}/download/{key}")));

    let record = store.lookup(&key).await.unwrap().unwrap();
    assert_eq!(record.files, ["A.wav", "B.wav"]);
    assert!(!record.is_consumed());
}

#[tokio::test]
async fn redelivery_reuses_credential_and_sends_no_second_email() {
    let mailer = MockMailer::default();
    let (_dir, fulfillment, _) = fixture(mailer.clone()).await;

    let first = fulfillment
        .handle(ORDER, Some(&signed(ORDER)))
        .await
        .unwrap();
    let Outcome::Fulfilled { key: first_key, .. } = first else {
        panic!("expected fulfillment");
    };

    let second = fulfillment
        .handle(ORDER, Some(&signed(ORDER)))
        .await
        .unwrap();
    assert_eq!(second, Outcome::AlreadyIssued { key: first_key });
    assert_eq!(mailer.sent().len(), 1);
}

#[tokio::test]
async fn unknown_sku_is_acknowledged_without_action() {
    let mailer = MockMailer::default();
    let (_dir, fulfillment, _) = fixture(mailer.clone()).await;

    let body = br#"{"id":100,"email":"a@b.com","line_items":[{"id":1,"sku":"NOT-A-PRODUCT","title":"x"}]}"#;
    let outcome = fulfillment.handle(body, Some(&signed(body))).await.unwrap();
    assert_eq!(outcome, Outcome::Skipped(SkipReason::NoResolvableItem));
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn missing_recipient_is_acknowledged_without_action() {
    let (_dir, fulfillment, _) = fixture(MockMailer::default()).await;
    let body = br#"{"id":100,"email":"","line_items":[{"id":1,"sku":"DUBPACK-1","title":"x"}]}"#;
    let outcome = fulfillment.handle(body, Some(&signed(body))).await.unwrap();
    assert_eq!(outcome, Outcome::Skipped(SkipReason::NoRecipient));
}

#[tokio::test]
async fn unparseable_payload_with_valid_signature_is_skipped() {
    let (_dir, fulfillment, _) = fixture(MockMailer::default()).await;
    let body = b"this is not json";
    let outcome = fulfillment.handle(body, Some(&signed(body))).await.unwrap();
    assert_eq!(outcome, Outcome::Skipped(SkipReason::InvalidPayload));
}

#[tokio::test]
async fn mail_failure_is_absorbed_and_credential_survives() {
    let (_dir, fulfillment, store) = fixture(MockMailer::failing()).await;

    let outcome = fulfillment
        .handle(ORDER, Some(&signed(ORDER)))
        .await
        .unwrap();
    let Outcome::Fulfilled { key, notified } = outcome else {
        panic!("expected fulfillment");
    };
    assert!(!notified);

    // The credential is still redeemable; support can resend the link.
    assert!(store.redeem(&key).await.unwrap().is_some());
}

#[tokio::test]
async fn multi_item_order_fulfills_first_resolvable() {
    let mailer = MockMailer::default();
    let (_dir, fulfillment, store) = fixture(mailer.clone()).await;

    let body = br#"{"id":100,"email":"a@b.com","line_items":[{"id":1,"sku":"UNMAPPED","title":"x"},{"id":2,"sku":"DUBPACK-1","title":"y"}]}"#;
    let outcome = fulfillment.handle(body, Some(&signed(body))).await.unwrap();
    let Outcome::Fulfilled { key, .. } = outcome else {
        panic!("expected fulfillment");
    };

    let record = store.lookup(&key).await.unwrap().unwrap();
    assert_eq!(record.order_ref, "100-2");
}

#[tokio::test]
async fn multi_item_order_with_both_mapped_fulfills_the_first() {
    let mailer = MockMailer::default();
    let (_dir, fulfillment, store) = fixture(mailer.clone()).await;

    let body = br#"{"id":100,"email":"a@b.com","line_items":[{"id":1,"sku":"DUBPACK-1","title":"x"},{"id":2,"sku":"SINGLE-1","title":"y"}]}"#;
    let outcome = fulfillment.handle(body, Some(&signed(body))).await.unwrap();
    let Outcome::Fulfilled { key, .. } = outcome else {
        panic!("expected fulfillment");
    };

    // The second mapped item is passed over, not fulfilled: exactly one
    // credential and one email exist, tied to the first line item.
    let record = store.lookup(&key).await.unwrap().unwrap();
    assert_eq!(record.order_ref, "100-1");
    assert_eq!(record.files, ["A.wav", "B.wav"]);
    assert_eq!(mailer.sent().len(), 1);
}
