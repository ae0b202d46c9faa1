//! Persists the run summary into the backup root.
//!
//! Three plain-text artifacts are rewritten on every run, including runs that
//! found nothing: the remote links ledger, the skip ledger and the counters.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, instrument};

use crate::backup::{EXTERNAL_LINKS_FILE, SKIPPED_FILES_LOG, SUMMARY_LOG};
use crate::pipeline::Summary;

/// Failure writing a report artifact.
#[derive(Debug, Error)]
#[error("failed to write {path}: {source}")]
pub struct ReportError {
    /// Artifact path.
    pub path: PathBuf,
    /// The underlying IO error.
    #[source]
    pub source: std::io::Error,
}

/// Writes `external_media_links.txt`, `skipped_files.log` and `summary.log`.
#[derive(Debug, Clone)]
pub struct SummaryReporter {
    backup_root: PathBuf,
}

impl SummaryReporter {
    /// Creates a reporter writing into `backup_root`.
    pub fn new(backup_root: impl Into<PathBuf>) -> Self {
        Self {
            backup_root: backup_root.into(),
        }
    }

    /// Writes all three artifacts.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError`] for the first artifact that cannot be written.
    #[instrument(skip_all, fields(backup_root = %self.backup_root.display()))]
    pub fn write(&self, summary: &Summary) -> Result<(), ReportError> {
        self.write_lines(EXTERNAL_LINKS_FILE, &summary.external_links)?;
        self.write_lines(SKIPPED_FILES_LOG, &summary.skip_ledger)?;
        self.write_file(SUMMARY_LOG, &render_counts(summary))?;
        info!("Summary written");
        Ok(())
    }

    fn write_lines(&self, name: &str, lines: &[String]) -> Result<(), ReportError> {
        let mut body = String::new();
        for line in lines {
            body.push_str(line);
            body.push('\n');
        }
        self.write_file(name, &body)
    }

    fn write_file(&self, name: &str, body: &str) -> Result<(), ReportError> {
        let path = self.backup_root.join(name);
        std::fs::write(&path, body).map_err(|source| ReportError { path, source })
    }

    /// Returns the backup root.
    #[must_use]
    pub fn backup_root(&self) -> &Path {
        &self.backup_root
    }
}

/// Renders `<label>: <count>` lines.
#[must_use]
pub fn render_counts(summary: &Summary) -> String {
    let mut out = String::new();
    for (label, count) in summary.labelled_counts() {
        let _ = writeln!(out, "{label}: {count}");
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_empty_summary_writes_all_artifacts() {
        let dir = TempDir::new().unwrap();
        SummaryReporter::new(dir.path())
            .write(&Summary::default())
            .unwrap();

        let counts = std::fs::read_to_string(dir.path().join(SUMMARY_LOG)).unwrap();
        assert!(counts.starts_with("Local files copied: 0\n"));
        assert!(counts.ends_with("Skip ledger entries: 0\n"));
        assert_eq!(counts.lines().count(), 11);
        assert_eq!(
            std::fs::read_to_string(dir.path().join(SKIPPED_FILES_LOG)).unwrap(),
            ""
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join(EXTERNAL_LINKS_FILE)).unwrap(),
            ""
        );
    }

    #[test]
    fn test_ledgers_are_line_per_entry() {
        let dir = TempDir::new().unwrap();
        let summary = Summary {
            external_failed: 1,
            skip_ledger: vec!["https://x.test/a.png".into()],
            external_links: vec!["https://x.test/a.png | Download failed (status 404)".into()],
            ..Summary::default()
        };
        SummaryReporter::new(dir.path()).write(&summary).unwrap();

        assert_eq!(
            std::fs::read_to_string(dir.path().join(EXTERNAL_LINKS_FILE)).unwrap(),
            "https://x.test/a.png | Download failed (status 404)\n"
        );
        let counts = std::fs::read_to_string(dir.path().join(SUMMARY_LOG)).unwrap();
        assert!(counts.contains("External files failed: 1\n"));
        assert!(counts.contains("Skip ledger entries: 1\n"));
    }

    #[test]
    fn test_scan_errors_written_to_summary_log() {
        let dir = TempDir::new().unwrap();
        let unreadable = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let summary = crate::pipeline::RunResult::from_scan(
            2,
            vec![crate::scan::ScanError::read(dir.path().join("a.html"), unreadable)],
        )
        .summary();
        SummaryReporter::new(dir.path()).write(&summary).unwrap();

        let counts = std::fs::read_to_string(dir.path().join(SUMMARY_LOG)).unwrap();
        assert!(counts.contains("Files scanned: 2\n"));
        assert!(counts.contains("Scan errors: 1\n"));
    }

    #[test]
    fn test_rewrites_previous_run() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SKIPPED_FILES_LOG), "stale\n").unwrap();
        SummaryReporter::new(dir.path())
            .write(&Summary::default())
            .unwrap();
        assert_eq!(
            std::fs::read_to_string(dir.path().join(SKIPPED_FILES_LOG)).unwrap(),
            ""
        );
    }

    #[test]
    fn test_unwritable_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("absent");
        let err = SummaryReporter::new(&missing)
            .write(&Summary::default())
            .unwrap_err();
        assert_eq!(err.path, missing.join(EXTERNAL_LINKS_FILE));
    }
}
