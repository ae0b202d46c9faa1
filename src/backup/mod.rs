//! Transfers into the backup root: destination planning, local copy and
//! remote fetch.
//!
//! Both transfer components return an [`AttemptResult`](crate::pipeline::AttemptResult)
//! for every reference and never abort the run. They share one rule: an
//! existing destination is never overwritten.

mod client;
mod constants;
mod copier;
mod destination;
mod error;
mod fetcher;

pub use client::{Fetch, HttpClient, default_user_agent};
pub use constants::{EXTERNAL_LINKS_FILE, FETCH_TIMEOUT_SECS, SKIPPED_FILES_LOG, SUMMARY_LOG};
pub use copier::LocalCopier;
pub use destination::{BackupLayout, DestinationPlanner, remote_filename};
pub use error::{CopyError, DownloadError};
pub use fetcher::RemoteFetcher;
