//! Local file copy into the backup root.

use std::path::Path;

use tracing::{debug, info, instrument, warn};

use super::error::CopyError;
use crate::pipeline::{AttemptResult, AttemptStatus, FailureReason};
use crate::reference::MediaReference;

/// Copies local references into the backup root.
///
/// Skip-if-exists is by presence only: an existing destination is never
/// overwritten, even if the source has changed since it was copied.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalCopier;

impl LocalCopier {
    /// Creates a copier.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Copies one local reference to `destination`.
    ///
    /// Never fails: every outcome, including IO errors, is an [`AttemptResult`].
    #[instrument(skip(self, reference), fields(source = %reference))]
    pub async fn copy(
        &self,
        reference: &MediaReference,
        destination: Option<&Path>,
    ) -> AttemptResult {
        let Some(source) = reference.path() else {
            return AttemptResult::new(
                reference.clone(),
                destination.map(Path::to_path_buf),
                AttemptStatus::Failed(FailureReason::NoDestination),
            );
        };

        let status = if let Some(dest) = destination {
            copy_one(source, dest).await
        } else {
            warn!("no usable destination name, skipping");
            AttemptStatus::Failed(FailureReason::NoDestination)
        };

        AttemptResult::new(
            reference.clone(),
            destination.map(Path::to_path_buf),
            status,
        )
    }
}

async fn copy_one(source: &Path, dest: &Path) -> AttemptStatus {
    if !tokio::fs::try_exists(source).await.unwrap_or(false) {
        info!("Local file not found (skipped)");
        return AttemptStatus::SourceMissing;
    }
    if tokio::fs::try_exists(dest).await.unwrap_or(false) {
        if sizes_differ(source, dest).await {
            warn!(dest = %dest.display(), "Skipped (already exists), existing file differs in size");
        } else {
            info!(dest = %dest.display(), "Skipped (already exists)");
        }
        return AttemptStatus::SkippedExisting;
    }
    match copy_preserving_mtime(source, dest).await {
        Ok(bytes) => {
            info!(dest = %dest.display(), bytes, "Copied local file");
            AttemptStatus::Copied
        }
        Err(e) => {
            warn!(error = %e, "Failed to copy");
            AttemptStatus::Failed(FailureReason::Io(e.to_string()))
        }
    }
}

/// Flat-layout basename collisions land here with a different source file.
async fn sizes_differ(source: &Path, dest: &Path) -> bool {
    match (
        tokio::fs::metadata(source).await,
        tokio::fs::metadata(dest).await,
    ) {
        (Ok(a), Ok(b)) => a.len() != b.len(),
        _ => false,
    }
}

/// Copies bytes (and permissions) from `source` to `dest`, then carries over
/// the source modification time.
async fn copy_preserving_mtime(source: &Path, dest: &Path) -> Result<u64, CopyError> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CopyError::create_dir(parent, e))?;
    }

    let bytes = tokio::fs::copy(source, dest)
        .await
        .map_err(|e| CopyError::copy(source, dest, e))?;

    let modified = tokio::fs::metadata(source)
        .await
        .and_then(|meta| meta.modified())
        .map_err(|e| CopyError::metadata(dest, e))?;
    // Read-only handle: the copy carries the source permissions, which may
    // forbid writing, and the owner can set times without write access.
    let file = tokio::fs::File::open(dest)
        .await
        .map_err(|e| CopyError::metadata(dest, e))?
        .into_std()
        .await;
    file.set_modified(modified)
        .map_err(|e| CopyError::metadata(dest, e))?;

    debug!(bytes, "copy complete");
    Ok(bytes)
}
