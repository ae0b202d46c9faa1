//! Error types for copy and fetch operations.
//!
//! These errors never escape a pipeline pass: each one is converted into a
//! [`FailureReason`](crate::pipeline::FailureReason) at the reference boundary.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while fetching a remote reference.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error downloading {url}: {source}")]
    Network {
        /// The URL that failed to download.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout downloading {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// The server answered with anything other than 200.
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned the status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// File system error while persisting the body.
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The URL is malformed, not http(s), or has no host.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// The body exceeded the configured size cap.
    #[error("{url} exceeds the download size limit of {limit} bytes")]
    TooLarge {
        /// The URL being downloaded.
        url: String,
        /// Configured cap in bytes.
        limit: u64,
    },
}

impl DownloadError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a size-cap error.
    pub fn too_large(url: impl Into<String>, limit: u64) -> Self {
        Self::TooLarge {
            url: url.into(),
            limit,
        }
    }

    /// Returns the HTTP status when the failure was a non-200 response.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors that can occur while copying a local reference.
#[derive(Debug, Error)]
pub enum CopyError {
    /// Creating the destination's parent directory failed.
    #[error("cannot create directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Copying bytes failed.
    #[error("cannot copy {from} to {to}: {source}")]
    Copy {
        /// Source file.
        from: PathBuf,
        /// Destination file.
        to: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The copy succeeded but the modification time could not be carried over.
    #[error("cannot preserve modification time on {path}: {source}")]
    Metadata {
        /// Destination file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl CopyError {
    /// Creates a directory-creation error.
    pub fn create_dir(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::CreateDir {
            path: path.into(),
            source,
        }
    }

    /// Creates a copy error.
    pub fn copy(from: impl Into<PathBuf>, to: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Copy {
            from: from.into(),
            to: to.into(),
            source,
        }
    }

    /// Creates a metadata error.
    pub fn metadata(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Metadata {
            path: path.into(),
            source,
        }
    }
}

// Constructors instead of `From<std::io::Error>`: every variant needs the
// path or URL the source error does not carry.

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_error_http_status_display() {
        let error = DownloadError::http_status("https://example.com/photo.jpg", 404);
        let msg = error.to_string();
        assert!(msg.contains("404"), "Expected '404' in: {msg}");
        assert!(
            msg.contains("https://example.com/photo.jpg"),
            "Expected URL in: {msg}"
        );
        assert_eq!(error.status(), Some(404));
    }

    #[test]
    fn test_download_error_timeout_has_no_status() {
        let error = DownloadError::timeout("https://example.com/clip.mp4");
        assert!(error.to_string().contains("timeout"));
        assert_eq!(error.status(), None);
    }

    #[test]
    fn test_download_error_too_large_display() {
        let error = DownloadError::too_large("https://example.com/big.mov", 1024);
        let msg = error.to_string();
        assert!(msg.contains("1024"), "Expected limit in: {msg}");
    }

    #[test]
    fn test_copy_error_display_names_both_paths() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = CopyError::copy("/p/a.png", "/b/a.png", io);
        let msg = error.to_string();
        assert!(msg.contains("/p/a.png"), "Expected source in: {msg}");
        assert!(msg.contains("/b/a.png"), "Expected destination in: {msg}");
    }
}
