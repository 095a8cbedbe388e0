//! Credential store integration tests against a real SQLite database.

use tempfile::TempDir;
use vendo_store::{create_pool, run_migrations, CredentialStore, Issued};
use vendo_types::CredentialKey;

async fn temp_store() -> (TempDir, CredentialStore) {
    let dir = TempDir::new().unwrap();
    let pool = create_pool(&dir.path().join("test.sqlite")).await.unwrap();
    run_migrations(&pool).await.unwrap();
    (dir, CredentialStore::new(pool))
}

fn files(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

#[tokio::test]
async fn issue_then_redeem_returns_files_unchanged() {
    let (_dir, store) = temp_store().await;
    let list = files(&["b.wav", "a.wav", "c.wav"]);

    let issued = store.issue("1-1", &list).await.unwrap();
    let Issued::New(key) = issued else {
        panic!("expected a fresh credential");
    };

    // Order must survive the round trip exactly.
    let redeemed = store.redeem(&key).await.unwrap().unwrap();
    assert_eq!(redeemed, list);
}

#[tokio::test]
async fn second_redeem_is_a_miss() {
    let (_dir, store) = temp_store().await;
    let issued = store.issue("1-1", &files(&["a.wav"])).await.unwrap();
    let key = issued.key().clone();

    assert!(store.redeem(&key).await.unwrap().is_some());
    assert!(store.redeem(&key).await.unwrap().is_none());

    // The row is kept, flagged consumed.
    let record = store.lookup(&key).await.unwrap().unwrap();
    assert!(record.is_consumed());
}

#[tokio::test]
async fn unknown_key_is_a_miss() {
    let (_dir, store) = temp_store().await;
    let bogus = CredentialKey::from("0".repeat(64));
    assert!(store.redeem(&bogus).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_order_ref_returns_existing_key() {
    let (_dir, store) = temp_store().await;
    let list = files(&["a.wav", "b.wav"]);

    let first = store.issue("42-7", &list).await.unwrap();
    let second = store.issue("42-7", &list).await.unwrap();

    let Issued::New(first_key) = first else {
        panic!("first issuance should be new");
    };
    let Issued::Existing(second_key) = second else {
        panic!("second issuance should be deduplicated");
    };
    assert_eq!(first_key, second_key);

    // Still exactly one live credential: one redeem wins, the retry
    // did not mint a second key.
    assert!(store.redeem(&first_key).await.unwrap().is_some());
    assert!(store.redeem(&first_key).await.unwrap().is_none());
}

#[tokio::test]
async fn different_orders_get_different_keys() {
    let (_dir, store) = temp_store().await;
    let a = store.issue("1-1", &files(&["a.wav"])).await.unwrap();
    let b = store.issue("2-1", &files(&["a.wav"])).await.unwrap();
    assert_ne!(a.key(), b.key());
}

#[tokio::test]
async fn empty_file_list_is_rejected() {
    let (_dir, store) = temp_store().await;
    assert!(store.issue("1-1", &[]).await.is_err());
}

#[tokio::test]
async fn concurrent_redeems_have_exactly_one_winner() {
    let (_dir, store) = temp_store().await;
    let list = files(&["a.wav", "b.wav"]);
    let key = store.issue("9-9", &list).await.unwrap().key().clone();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = store.clone();
        let key = key.clone();
        handles.push(tokio::spawn(async move { store.redeem(&key).await }));
    }

    let mut winners = 0;
    let mut misses = 0;
    for handle in handles {
        match handle.await.unwrap().unwrap() {
            Some(redeemed) => {
                assert_eq!(redeemed, list);
                winners += 1;
            }
            None => misses += 1,
        }
    }

    assert_eq!(winners, 1, "at-most-one-redeemer violated");
    assert_eq!(misses, 15);
}
