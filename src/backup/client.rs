//! HTTP client wrapper for fetching remote media.
//!
//! [`HttpClient`] issues a single GET per call with connect and per-read
//! inactivity timeouts and streams a 200 response body to disk unchanged. Anything but 200 is an
//! error; there are no retries at this level.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

use super::constants::FETCH_TIMEOUT_SECS;
use super::error::DownloadError;

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/media-backup";

/// Default User-Agent for fetch requests (identifies the tool).
#[must_use]
pub fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("media-backup/{version} (+{PROJECT_UA_URL})")
}

/// Something that can persist the body of a URL to a file.
///
/// The pipeline depends on this trait rather than on [`HttpClient`] so tests
/// can substitute a recording stub.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetches `url` and writes its body to `dest`, returning bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] for invalid URLs, transport failures, non-200
    /// statuses and write failures. No partial file is left behind on error.
    async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64, DownloadError>;
}

/// HTTP client for fetching media files.
///
/// Created once per run and reused for every fetch, taking advantage of
/// connection pooling.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    max_bytes: Option<u64>,
}

impl HttpClient {
    /// Creates a client with the default 15 second connect and read timeouts.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
    }

    /// Creates a client whose connect and per-read timeouts are `timeout`.
    ///
    /// There is no whole-request limit: a slow body that keeps arriving is
    /// not cut off, a stalled one is.
    ///
    /// # Errors
    ///
    /// Returns the reqwest error if the TLS backend cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .gzip(true)
            .user_agent(default_user_agent())
            .build()?;
        Ok(Self {
            client,
            max_bytes: None,
        })
    }

    /// Caps the number of body bytes accepted per fetch.
    #[must_use]
    pub fn with_max_bytes(mut self, max_bytes: Option<u64>) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, DownloadError> {
        let parsed = Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host().is_none() {
            return Err(DownloadError::invalid_url(url));
        }

        let response = self.client.get(parsed).send().await.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        let status = response.status().as_u16();
        if status != 200 {
            return Err(DownloadError::http_status(url, status));
        }
        Ok(response)
    }
}

#[async_trait]
impl Fetch for HttpClient {
    #[instrument(skip(self), fields(url = %url, dest = %dest.display()))]
    async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64, DownloadError> {
        debug!("starting fetch");
        let response = self.get(url).await?;

        if let (Some(limit), Some(length)) = (self.max_bytes, response.content_length())
            && length > limit
        {
            return Err(DownloadError::too_large(url, limit));
        }

        let mut file = File::create(dest)
            .await
            .map_err(|e| DownloadError::io(dest, e))?;

        let result = stream_to_file(&mut file, response, url, dest, self.max_bytes).await;
        if result.is_err() {
            debug!("cleaning up partial file after error");
            drop(file);
            let _ = tokio::fs::remove_file(dest).await;
        }
        result
    }
}

/// Streams the response body to `file`, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
    max_bytes: Option<u64>,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| {
            if e.is_timeout() {
                DownloadError::timeout(url)
            } else {
                DownloadError::network(url, e)
            }
        })?;

        bytes_written += chunk.len() as u64;
        if let Some(limit) = max_bytes
            && bytes_written > limit
        {
            return Err(DownloadError::too_large(url, limit));
        }

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}
