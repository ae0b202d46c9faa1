//! Constants for the backup module (timeouts, artifact names).

/// Connect and per-read HTTP timeout for remote fetches (15 seconds).
pub const FETCH_TIMEOUT_SECS: u64 = 15;

/// Ledger of every remote reference and its outcome.
pub const EXTERNAL_LINKS_FILE: &str = "external_media_links.txt";

/// Ledger of every reference that was not freshly copied or downloaded.
pub const SKIPPED_FILES_LOG: &str = "skipped_files.log";

/// Plain `<label>: <count>` run summary.
pub const SUMMARY_LOG: &str = "summary.log";
