//! Media Backup Core Library
//!
//! Finds every media asset a project references, on disk or by URL, and
//! consolidates copies of them into one backup directory. A verification
//! pass checks the result and re-attempts whatever is missing.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`reference`] - Reference extraction dialects and classification
//! - [`scan`] - Project tree walk
//! - [`backup`] - Destination planning, local copy and HTTP fetch
//! - [`pipeline`] - Transfer passes, verification, retry and the run aggregate
//! - [`report`] - Ledger and summary artifacts
//! - [`config`] - Defaults and the optional TOML config file

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backup;
pub mod config;
pub mod pipeline;
pub mod reference;
pub mod report;
pub mod scan;

// Re-export commonly used types
pub use backup::{BackupLayout, DestinationPlanner, Fetch, HttpClient};
pub use config::{BackupConfig, ConfigError, FileConfig};
pub use pipeline::{
    AttemptResult, AttemptStatus, FailureReason, Pipeline, PipelineError, RetryDecision,
    RetryPolicy, RunResult, Summary,
};
pub use reference::{MediaReference, ReferenceExtractor, ReferenceSet};
pub use scan::{ScanError, ScanOutcome, Scanner};
