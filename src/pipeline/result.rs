//! Per-reference outcomes and the run aggregate they fold into.
//!
//! Each pipeline stage returns a [`RunResult`]; the pipeline merges them in
//! order, so a retry pass overrides the first pass for the references it
//! touched. The immutable [`Summary`] is derived once at the end.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::reference::{MediaReference, ReferenceKind};
use crate::scan::ScanError;

/// Why a copy or fetch did not produce a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The server answered with a status other than 200.
    HttpStatus(u16),
    /// Timeout, DNS, connection or TLS failure.
    Transport(String),
    /// Local filesystem error (including an oversized body).
    Io(String),
    /// The per-run remote fetch cap was reached before this reference.
    FetchLimitReached,
    /// No safe destination filename could be derived.
    NoDestination,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpStatus(code) => write!(f, "status {code}"),
            Self::Transport(_) => f.write_str("download failed"),
            Self::Io(message) => f.write_str(message),
            Self::FetchLimitReached => f.write_str("remote fetch limit reached"),
            Self::NoDestination => f.write_str("no usable destination filename"),
        }
    }
}

/// Outcome of one attempt on one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptStatus {
    /// Local source copied into the backup root.
    Copied,
    /// Remote body downloaded into the backup root.
    Downloaded,
    /// Destination already present; nothing written.
    SkippedExisting,
    /// Local source does not exist.
    SourceMissing,
    /// The attempt failed.
    Failed(FailureReason),
}

impl AttemptStatus {
    /// Returns true for outcomes that wrote a new file.
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Copied | Self::Downloaded)
    }
}

/// One reference's outcome for one pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptResult {
    /// The reference attempted.
    pub reference: MediaReference,
    /// Where it was (or would have been) written.
    pub destination: Option<PathBuf>,
    /// What happened.
    pub status: AttemptStatus,
}

impl AttemptResult {
    /// Creates an attempt result.
    #[must_use]
    pub fn new(
        reference: MediaReference,
        destination: Option<PathBuf>,
        status: AttemptStatus,
    ) -> Self {
        Self {
            reference,
            destination,
            status,
        }
    }

    /// Destination file name, if any.
    fn file_name(&self) -> Option<String> {
        self.destination
            .as_deref()
            .and_then(|d| d.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }

    /// Skip-ledger line for non-fresh outcomes.
    fn ledger_line(&self) -> Option<String> {
        let destination_or_source = || {
            self.destination
                .as_deref()
                .or_else(|| self.reference.path())
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| self.reference.to_string())
        };
        match (&self.status, self.reference.kind()) {
            (AttemptStatus::Copied | AttemptStatus::Downloaded, _) => None,
            (AttemptStatus::SkippedExisting, _) | (AttemptStatus::Failed(_), ReferenceKind::Local) => {
                Some(destination_or_source())
            }
            (AttemptStatus::SourceMissing, _) | (AttemptStatus::Failed(_), ReferenceKind::Remote) => {
                Some(self.reference.to_string())
            }
        }
    }

    /// `external_media_links.txt` line for remote references.
    fn external_link_line(&self) -> Option<String> {
        let url = self.reference.url()?;
        let name = self.file_name().unwrap_or_default();
        Some(match &self.status {
            AttemptStatus::SkippedExisting => format!("{url} | {name} | Skipped (already exists)"),
            AttemptStatus::Failed(FailureReason::HttpStatus(code)) => {
                format!("{url} | Download failed (status {code})")
            }
            AttemptStatus::Failed(_) | AttemptStatus::SourceMissing => {
                format!("{url} | Download failed")
            }
            AttemptStatus::Copied | AttemptStatus::Downloaded => format!("{url} | {name}"),
        })
    }
}

/// Aggregate of everything one or more stages produced.
#[derive(Debug, Default)]
pub struct RunResult {
    attempts: BTreeMap<MediaReference, AttemptResult>,
    retried: usize,
    still_missing: Option<usize>,
    files_scanned: usize,
    scan_errors: Vec<ScanError>,
}

impl RunResult {
    /// Creates an empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the result of a scan stage.
    #[must_use]
    pub fn from_scan(files_scanned: usize, scan_errors: Vec<ScanError>) -> Self {
        Self {
            files_scanned,
            scan_errors,
            ..Self::default()
        }
    }

    /// Records an attempt, replacing any earlier outcome for the same reference.
    pub fn record(&mut self, attempt: AttemptResult) {
        self.attempts.insert(attempt.reference.clone(), attempt);
    }

    /// Marks `count` references as re-attempted by a retry pass.
    #[must_use]
    pub fn with_retried(mut self, count: usize) -> Self {
        self.retried += count;
        self
    }

    /// Sets the number of references absent after the final pass.
    pub fn set_still_missing(&mut self, count: usize) {
        self.still_missing = Some(count);
    }

    /// Folds a later stage into this one. Later outcomes win.
    pub fn merge(&mut self, later: RunResult) {
        self.attempts.extend(later.attempts);
        self.retried += later.retried;
        self.still_missing = later.still_missing.or(self.still_missing);
        self.files_scanned += later.files_scanned;
        self.scan_errors.extend(later.scan_errors);
    }

    /// Latest outcome per reference: locals in path order, then remotes in URL order.
    pub fn attempts(&self) -> impl Iterator<Item = &AttemptResult> {
        self.attempts.values()
    }

    /// Latest outcome for `reference`.
    #[must_use]
    pub fn get(&self, reference: &MediaReference) -> Option<&AttemptResult> {
        self.attempts.get(reference)
    }

    /// Scan errors collected so far.
    #[must_use]
    pub fn scan_errors(&self) -> &[ScanError] {
        &self.scan_errors
    }

    /// Derives the final summary.
    #[must_use]
    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            retried: self.retried,
            still_missing: self.still_missing.unwrap_or(0),
            files_scanned: self.files_scanned,
            scan_errors: self.scan_errors.len(),
            ..Summary::default()
        };

        for attempt in self.attempts.values() {
            let kind = attempt.reference.kind();
            match (&attempt.status, kind) {
                (AttemptStatus::Copied, _) => summary.local_copied += 1,
                (AttemptStatus::Downloaded, _) => summary.external_downloaded += 1,
                (AttemptStatus::SkippedExisting, _) => summary.skipped_existing += 1,
                (AttemptStatus::SourceMissing, _) => summary.missing_sources += 1,
                (AttemptStatus::Failed(_), ReferenceKind::Local) => summary.local_failed += 1,
                (AttemptStatus::Failed(_), ReferenceKind::Remote) => summary.external_failed += 1,
            }
            if let Some(line) = attempt.ledger_line() {
                summary.skip_ledger.push(line);
            }
            if let Some(line) = attempt.external_link_line() {
                summary.external_links.push(line);
            }
        }
        summary
    }
}

/// Final counts of one run. Counts are per reference, by final outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Local files copied.
    pub local_copied: usize,
    /// Remote files downloaded.
    pub external_downloaded: usize,
    /// Remote references that ended in failure.
    pub external_failed: usize,
    /// Local references whose copy failed.
    pub local_failed: usize,
    /// Local references whose source does not exist.
    pub missing_sources: usize,
    /// References whose destination was already present.
    pub skipped_existing: usize,
    /// References re-attempted by retry passes.
    pub retried: usize,
    /// References still absent from the backup root at the end.
    pub still_missing: usize,
    /// Text files searched.
    pub files_scanned: usize,
    /// Files or directories the scan could not process.
    pub scan_errors: usize,
    /// Destination paths, source paths or URLs of every non-fresh outcome.
    pub skip_ledger: Vec<String>,
    /// One line per remote reference, in URL order.
    pub external_links: Vec<String>,
}

impl Summary {
    /// References that ended with a new file or an existing one.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.local_copied + self.external_downloaded + self.skipped_existing
    }

    /// References that ended without a backup file.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.local_failed + self.external_failed + self.missing_sources
    }

    /// `(label, count)` pairs in `summary.log` order.
    #[must_use]
    pub fn labelled_counts(&self) -> [(&'static str, usize); 11] {
        [
            ("Local files copied", self.local_copied),
            ("External files downloaded", self.external_downloaded),
            ("External files failed", self.external_failed),
            ("Local files failed", self.local_failed),
            ("Local sources missing", self.missing_sources),
            ("Skipped (already exists)", self.skipped_existing),
            ("Retried references", self.retried),
            ("Still missing after retry", self.still_missing),
            ("Files scanned", self.files_scanned),
            ("Scan errors", self.scan_errors),
            ("Skip ledger entries", self.skip_ledger.len()),
        ]
    }
}
