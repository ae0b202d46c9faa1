//! Orchestration: scan, transfer, verify, retry, report.
//!
//! [`Pipeline::run`] drives the whole flow. The individual stages are public
//! so callers (and tests) can interleave their own actions between them.
//! Everything inside a pass is per-reference and non-fatal; only setup and
//! report writing can fail.

mod result;
mod retry;
mod verify;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument};

pub use result::{AttemptResult, AttemptStatus, FailureReason, RunResult, Summary};
pub use retry::{DEFAULT_MAX_ATTEMPTS, MAX_ATTEMPTS_LIMIT, RetryDecision, RetryPolicy};
pub use verify::Verifier;

use crate::backup::{DestinationPlanner, Fetch, HttpClient, LocalCopier, RemoteFetcher};
use crate::config::BackupConfig;
use crate::reference::{MediaReference, ReferenceKind, ReferenceSet, default_extractors};
use crate::report::{ReportError, SummaryReporter};
use crate::scan::{ScanOutcome, Scanner};

/// Errors that stop a run before or after the transfer passes.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The scan root does not exist or cannot be resolved.
    #[error("cannot resolve scan root {path}: {source}")]
    Root {
        /// The configured root.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The backup root cannot be created.
    #[error("cannot create backup root {path}: {source}")]
    BackupRoot {
        /// The configured backup root.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A media extension produced an invalid pattern.
    #[error("invalid media extension pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The HTTP client could not be built.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// A report artifact could not be written.
    #[error(transparent)]
    Report(#[from] ReportError),
}

impl PipelineError {
    fn root(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Root {
            path: path.into(),
            source,
        }
    }

    fn backup_root(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::BackupRoot {
            path: path.into(),
            source,
        }
    }
}

/// A configured backup run.
#[derive(Debug)]
pub struct Pipeline {
    scanner: Scanner,
    planner: DestinationPlanner,
    copier: LocalCopier,
    fetcher: RemoteFetcher,
    verifier: Verifier,
    retry: RetryPolicy,
    reporter: SummaryReporter,
}

impl Pipeline {
    /// Builds a pipeline fetching over HTTP with the configured timeout and
    /// size cap.
    ///
    /// # Errors
    ///
    /// See [`Pipeline::new`]; additionally [`PipelineError::HttpClient`].
    pub fn from_config(config: &BackupConfig) -> Result<Self, PipelineError> {
        let client = HttpClient::with_timeout(config.fetch_timeout)
            .map_err(PipelineError::HttpClient)?
            .with_max_bytes(config.max_download_bytes);
        Self::new(config, Arc::new(client))
    }

    /// Builds a pipeline around an arbitrary fetcher.
    ///
    /// Resolves the scan root and creates the backup root; both are fatal on
    /// failure.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Root`], [`PipelineError::BackupRoot`] or
    /// [`PipelineError::Pattern`].
    pub fn new(config: &BackupConfig, client: Arc<dyn Fetch>) -> Result<Self, PipelineError> {
        let root = config
            .root
            .canonicalize()
            .map_err(|e| PipelineError::root(&config.root, e))?;
        std::fs::create_dir_all(&config.backup_root)
            .map_err(|e| PipelineError::backup_root(&config.backup_root, e))?;
        let backup_root = config
            .backup_root
            .canonicalize()
            .map_err(|e| PipelineError::backup_root(&config.backup_root, e))?;
        debug!(root = %root.display(), backup_root = %backup_root.display(), "roots resolved");

        let extractors = default_extractors(&config.media_extensions)?;
        let scanner = Scanner::new(
            &root,
            extractors,
            &config.media_extensions,
            &config.text_extensions,
        )
        .with_exclude_dirs(&config.exclude_dirs)
        .skip_path(&backup_root)
        .extract_references(config.extract_references)
        .collect_media_files(config.collect_media_files);

        let planner = DestinationPlanner::new(&backup_root, &root, config.layout);
        Ok(Self {
            scanner,
            verifier: Verifier::new(planner.clone()),
            planner,
            copier: LocalCopier::new(),
            fetcher: RemoteFetcher::new(client).with_max_fetches(config.max_remote_fetches),
            retry: config.retry,
            reporter: SummaryReporter::new(&backup_root),
        })
    }

    /// Resolved scan root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.scanner.root()
    }

    /// Resolved backup root.
    #[must_use]
    pub fn backup_root(&self) -> &Path {
        self.planner.backup_root()
    }

    /// Destination planner shared by the transfer and verify stages.
    #[must_use]
    pub fn planner(&self) -> &DestinationPlanner {
        &self.planner
    }

    /// Walks the tree and collects references.
    #[must_use]
    pub fn scan(&self) -> ScanOutcome {
        self.scanner.scan()
    }

    /// Copies or fetches each reference once, in the order given.
    #[instrument(skip_all)]
    pub async fn transfer_pass<'a, I>(&self, references: I) -> RunResult
    where
        I: IntoIterator<Item = &'a MediaReference>,
    {
        let mut result = RunResult::new();
        let mut fresh = 0usize;
        for reference in references {
            let destination = self.planner.destination(reference);
            let attempt = match reference.kind() {
                ReferenceKind::Local => self.copier.copy(reference, destination.as_deref()).await,
                ReferenceKind::Remote => {
                    self.fetcher.fetch(reference, destination.as_deref()).await
                }
            };
            if attempt.status.is_fresh() {
                fresh += 1;
            }
            result.record(attempt);
        }
        info!(fresh, "Transfer pass complete");
        result
    }

    /// References whose destination is absent from the backup root.
    #[must_use]
    pub fn verify<'a, I>(&self, references: I) -> Vec<MediaReference>
    where
        I: IntoIterator<Item = &'a MediaReference>,
    {
        self.verifier.missing(references)
    }

    /// Runs further passes over the missing set while the policy allows, then
    /// records what is still missing.
    ///
    /// `after_attempt` is the number of passes already made.
    #[instrument(skip_all)]
    pub async fn retry_missing(
        &self,
        references: &ReferenceSet,
        after_attempt: u32,
    ) -> RunResult {
        let mut result = RunResult::new();
        let mut attempt = after_attempt;
        let mut missing = self.verify(references.iter());

        while let RetryDecision::Retry { attempt: next } =
            self.retry.should_retry(attempt, missing.len())
        {
            info!(attempt = next, missing = missing.len(), "Retrying missing references");
            let pass = self.transfer_pass(&missing).await.with_retried(missing.len());
            result.merge(pass);
            attempt = next;
            missing = self.verify(references.iter());
        }

        if missing.is_empty() {
            info!("All referenced media are present in the backup root");
        } else {
            info!(missing = missing.len(), "References still missing");
        }
        result.set_still_missing(missing.len());
        result
    }

    /// Scan, first pass, retries. Does not write the report.
    #[instrument(skip_all, fields(root = %self.root().display()))]
    pub async fn run(&self) -> RunResult {
        let ScanOutcome {
            references,
            files_scanned,
            errors,
        } = self.scan();
        let mut result = RunResult::from_scan(files_scanned, errors);

        info!(
            local = references.local_len(),
            remote = references.remote_len(),
            "Copying and downloading"
        );
        result.merge(self.transfer_pass(references.iter()).await);
        result.merge(self.retry_missing(&references, 1).await);
        result
    }

    /// Writes the report artifacts for `summary`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Report`] if an artifact cannot be written.
    pub fn write_report(&self, summary: &Summary) -> Result<(), PipelineError> {
        self.reporter.write(summary)?;
        Ok(())
    }

    /// Runs everything and writes the report. Returns the summary.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Report`] if an artifact cannot be written.
    pub async fn execute(&self) -> Result<Summary, PipelineError> {
        let summary = self.run().await.summary();
        self.write_report(&summary)?;
        Ok(summary)
    }
}
