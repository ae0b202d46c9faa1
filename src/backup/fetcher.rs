//! Remote reference download into the backup root.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{info, instrument, warn};

use super::client::Fetch;
use super::error::DownloadError;
use crate::pipeline::{AttemptResult, AttemptStatus, FailureReason};
use crate::reference::MediaReference;

/// Downloads remote references, honoring skip-if-exists and an optional cap
/// on the number of network requests per run.
pub struct RemoteFetcher {
    client: Arc<dyn Fetch>,
    max_fetches: Option<usize>,
    fetches_started: AtomicUsize,
}

impl std::fmt::Debug for RemoteFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteFetcher")
            .field("max_fetches", &self.max_fetches)
            .field("fetches_started", &self.fetches_started())
            .finish_non_exhaustive()
    }
}

impl RemoteFetcher {
    /// Creates a fetcher with no request cap.
    pub fn new(client: Arc<dyn Fetch>) -> Self {
        Self {
            client,
            max_fetches: None,
            fetches_started: AtomicUsize::new(0),
        }
    }

    /// Caps the number of network requests issued over the fetcher's lifetime.
    #[must_use]
    pub fn with_max_fetches(mut self, max_fetches: Option<usize>) -> Self {
        self.max_fetches = max_fetches;
        self
    }

    /// Number of network requests issued so far.
    #[must_use]
    pub fn fetches_started(&self) -> usize {
        self.fetches_started.load(Ordering::SeqCst)
    }

    /// Fetches one remote reference to `destination`.
    ///
    /// Never fails: every outcome, including transport errors, is an
    /// [`AttemptResult`]. No request is made when the destination exists.
    #[instrument(skip(self, reference), fields(url = %reference))]
    pub async fn fetch(
        &self,
        reference: &MediaReference,
        destination: Option<&Path>,
    ) -> AttemptResult {
        let status = match (reference.url(), destination) {
            (Some(url), Some(dest)) => self.fetch_one(url, dest).await,
            _ => {
                warn!("no usable filename in URL, skipping");
                AttemptStatus::Failed(FailureReason::NoDestination)
            }
        };
        AttemptResult::new(
            reference.clone(),
            destination.map(Path::to_path_buf),
            status,
        )
    }

    async fn fetch_one(&self, url: &str, dest: &Path) -> AttemptStatus {
        if tokio::fs::try_exists(dest).await.unwrap_or(false) {
            info!(dest = %dest.display(), "Skipped (already exists)");
            return AttemptStatus::SkippedExisting;
        }

        if let Some(limit) = self.max_fetches
            && self.fetches_started() >= limit
        {
            warn!(limit, "remote fetch limit reached, not downloading");
            return AttemptStatus::Failed(FailureReason::FetchLimitReached);
        }
        self.fetches_started.fetch_add(1, Ordering::SeqCst);

        info!("Downloading external file");
        match self.client.fetch_to_file(url, dest).await {
            Ok(bytes) => {
                info!(dest = %dest.display(), bytes, "Downloaded");
                AttemptStatus::Downloaded
            }
            Err(e) => {
                warn!(error = %e, "Download failed");
                AttemptStatus::Failed(failure_reason(&e))
            }
        }
    }
}

/// Maps a download error onto the reason recorded in the ledgers.
fn failure_reason(error: &DownloadError) -> FailureReason {
    match error {
        DownloadError::HttpStatus { status, .. } => FailureReason::HttpStatus(*status),
        DownloadError::Io { .. } | DownloadError::TooLarge { .. } => {
            FailureReason::Io(error.to_string())
        }
        DownloadError::Network { .. }
        | DownloadError::Timeout { .. }
        | DownloadError::InvalidUrl { .. } => FailureReason::Transport(error.to_string()),
    }
}
