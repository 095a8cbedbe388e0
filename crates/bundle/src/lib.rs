#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Bundle assembly for redeemed credentials
//!
//! Fetches each backing file from object storage and produces either a
//! straight passthrough stream (single file) or a deflate-compressed
//! zip archive (multiple files). Fetches run sequentially and entries
//! are appended in the credential's stored order, so archive order
//! never depends on upstream timing.
//!
//! Per-file failure policy: log and skip. The archive is always
//! finalized, so the client receives a well-formed zip containing the
//! files that did fetch. Only when every fetch fails does the request
//! error out. Every fetch carries the configured per-file timeout; a
//! stalled upstream counts as a failed fetch.
//!
//! Multi-file archives are fully buffered: the fetched files and the
//! finished zip are held in memory before the first response byte, so
//! peak memory tracks the total size of one product's file list.
//! Single-file bundles stream through without buffering.

use std::io::{Cursor, Write as _};
use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, TryStreamExt as _};
use tracing::{debug, warn};
use url::Url;
use vendo_errors::{Error, FetchError};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Streamed body of a single-file bundle.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, Error>> + Send>>;

/// Archive filename used for multi-file bundles.
pub const ZIP_FILENAME: &str = "download.zip";

/// A bundle ready to be written to an HTTP response.
pub enum Bundle {
    /// One backing file, streamed through without buffering.
    Single {
        filename: String,
        content_type: String,
        body: ByteStream,
    },
    /// Several backing files assembled into one zip archive.
    Zip {
        data: Vec<u8>,
        /// Files that failed to fetch and were left out of the archive.
        skipped: Vec<String>,
    },
}

impl std::fmt::Debug for Bundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Bundle::Single {
                filename,
                content_type,
                ..
            } => f
                .debug_struct("Single")
                .field("filename", filename)
                .field("content_type", content_type)
                .finish_non_exhaustive(),
            Bundle::Zip { data, skipped } => f
                .debug_struct("Zip")
                .field("data_len", &data.len())
                .field("skipped", skipped)
                .finish(),
        }
    }
}

/// Fetches backing files and assembles download bundles.
pub struct BundleStreamer {
    client: reqwest::Client,
    storage_base: String,
    bucket: String,
    fetch_timeout: Duration,
}

impl BundleStreamer {
    /// # Errors
    ///
    /// Returns an error if the storage base is not a valid URL.
    pub fn new(storage_base: &str, bucket: &str, fetch_timeout: Duration) -> Result<Self, Error> {
        let base = storage_base.trim_end_matches('/');
        Url::parse(base).map_err(|e| FetchError::InvalidUrl {
            message: format!("{base}: {e}"),
        })?;
        Ok(Self {
            client: reqwest::Client::new(),
            storage_base: base.to_string(),
            bucket: bucket.to_string(),
            fetch_timeout,
        })
    }

    fn file_url(&self, file: &str) -> String {
        format!("{}/{}/{}", self.storage_base, self.bucket, file)
    }

    /// Assemble the bundle for a redeemed credential's file list.
    ///
    /// # Errors
    ///
    /// Single-file bundles error when the one fetch fails (nothing has
    /// been sent yet, so the caller can still answer with a server
    /// error). Multi-file bundles error only when no file fetched at
    /// all.
    pub async fn fetch_bundle(&self, files: &[String]) -> Result<Bundle, Error> {
        match files {
            [] => Err(Error::internal("bundle requested for empty file list")),
            [file] => self.single(file).await,
            _ => self.zipped(files).await,
        }
    }

    async fn single(&self, file: &str) -> Result<Bundle, Error> {
        let response = self.fetch(file).await?;
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();

        let body: ByteStream = Box::pin(response.bytes_stream().map_err(Error::from));
        Ok(Bundle::Single {
            filename: file.to_string(),
            content_type,
            body,
        })
    }

    async fn zipped(&self, files: &[String]) -> Result<Bundle, Error> {
        let mut entries = Vec::with_capacity(files.len());
        let mut skipped = Vec::new();

        for file in files {
            match self.fetch_bytes(file).await {
                Ok(bytes) => {
                    debug!(%file, size = bytes.len(), "bundle entry fetched");
                    entries.push((file.clone(), bytes));
                }
                Err(e) => {
                    warn!(%file, error = %e, "skipping file that failed to fetch");
                    skipped.push(file.clone());
                }
            }
        }

        if entries.is_empty() {
            return Err(FetchError::AllFetchesFailed.into());
        }

        // Deflating is CPU work; keep it off the async threads.
        let data = tokio::task::spawn_blocking(move || build_zip(&entries))
            .await
            .map_err(|e| Error::internal(format!("zip task failed: {e}")))??;

        Ok(Bundle::Zip { data, skipped })
    }

    async fn fetch(&self, file: &str) -> Result<reqwest::Response, Error> {
        let url = self.file_url(file);
        let response = self
            .client
            .get(&url)
            .timeout(self.fetch_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url,
            }
            .into());
        }
        Ok(response)
    }

    async fn fetch_bytes(&self, file: &str) -> Result<Bytes, Error> {
        let response = self.fetch(file).await?;
        Ok(response.bytes().await?)
    }
}

/// Write entries into a deflate-compressed zip archive, in the order
/// given. The archive is finalized before returning, so the result is
/// always openable.
fn build_zip(entries: &[(String, Bytes)]) -> Result<Vec<u8>, Error> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, bytes) in entries {
        writer
            .start_file(name.as_str(), options)
            .map_err(|e| Error::internal(format!("zip entry {name}: {e}")))?;
        writer.write_all(bytes)?;
    }

    let cursor = writer
        .finish()
        .map_err(|e| Error::internal(format!("zip finalize: {e}")))?;
    Ok(cursor.into_inner())
}
