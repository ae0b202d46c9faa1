//! Per-file scan failures.
//!
//! A scan error never aborts the scan; the scanner records it and moves on,
//! and the run summary reports how many occurred.

use std::path::PathBuf;

use thiserror::Error;

/// A file or directory the scanner could not process.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The file could not be opened or read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The directory walk could not enter or list an entry.
    #[error("cannot walk {path}: {message}")]
    Walk {
        /// Entry that failed, or the scan root when the walker did not say.
        path: PathBuf,
        /// Walker error text.
        message: String,
    },
}

impl ScanError {
    /// Creates a read error.
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a walk error from a `walkdir` error.
    pub fn walk(fallback: impl Into<PathBuf>, error: &walkdir::Error) -> Self {
        Self::Walk {
            path: error
                .path()
                .map_or_else(|| fallback.into(), std::path::Path::to_path_buf),
            message: error.to_string(),
        }
    }

    /// Returns the path this error concerns.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::Read { path, .. } | Self::Walk { path, .. } => path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_display_names_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = ScanError::read("/p/locked.html", io);
        let msg = error.to_string();
        assert!(msg.contains("/p/locked.html"), "Expected path in: {msg}");
        assert!(msg.contains("denied"), "Expected cause in: {msg}");
    }
}
