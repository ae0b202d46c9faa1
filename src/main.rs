//! CLI entry point for the media-backup tool.

use std::process::ExitCode;

use clap::Parser;

mod app;
mod cli;

use cli::Args;

/// Process outcome, mapped to the exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Every reference is backed up.
    Success,
    /// Some references failed or are still missing.
    Partial,
    /// Nothing that was attempted succeeded.
    Failure,
    /// The run could not start or could not write its report.
    Fatal,
}

impl ProcessExit {
    pub(crate) fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::Partial => 1,
            Self::Failure => 2,
            Self::Fatal => 3,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let outcome = match app::runtime::run_backup(args).await {
        Ok(outcome) => outcome,
        Err(error) => {
            eprintln!("error: {error:#}");
            ProcessExit::Fatal
        }
    };
    ExitCode::from(outcome.code())
}
