//! Router construction and shared application state

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use vendo_bundle::BundleStreamer;
use vendo_catalog::Catalog;
use vendo_config::Config;
use vendo_errors::Error;
use vendo_fulfill::Fulfillment;
use vendo_notify::MailerSendClient;
use vendo_store::{create_pool, run_migrations, CredentialStore};

use crate::handlers;

/// Shared state handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub fulfillment: Arc<Fulfillment<MailerSendClient>>,
    pub store: CredentialStore,
    pub bundle: Arc<BundleStreamer>,
}

impl AppState {
    /// Build the full component graph from configuration: catalog,
    /// database pool (with migrations), mail client, bundle streamer,
    /// and the fulfillment pipeline on top of them.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog fails to load, the database
    /// cannot be opened or migrated, or the storage base URL is
    /// invalid.
    pub async fn from_config(config: &Config) -> Result<Self, Error> {
        let catalog = Catalog::load(&config.catalog_path)?;
        tracing::info!(
            path = %config.catalog_path.display(),
            products = catalog.len(),
            "catalog loaded"
        );

        let pool = create_pool(&config.database_path).await?;
        run_migrations(&pool).await?;
        let store = CredentialStore::new(pool);

        let mailer = MailerSendClient::new(
            config.mail_api_key.clone(),
            config.sender_email.clone(),
            config.sender_name.clone(),
        );

        let bundle = BundleStreamer::new(
            &config.storage_base_url,
            &config.storage_bucket,
            config.fetch_timeout,
        )?;

        let fulfillment = Fulfillment::new(
            config.webhook_secret.clone(),
            config.download_base_url.clone(),
            catalog,
            store.clone(),
            mailer,
        );

        Ok(Self {
            fulfillment: Arc::new(fulfillment),
            store,
            bundle: Arc::new(bundle),
        })
    }
}

/// Build the application router.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health))
        .route("/webhook", post(handlers::webhook))
        .route("/download/{key}", get(handlers::download))
        .with_state(state)
}
