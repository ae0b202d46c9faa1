//! Local/Remote classification with scan-root containment.

use std::path::{Component, Path, PathBuf};

use tracing::trace;

use super::MediaReference;

/// Returns true if `raw` starts with `http://` or `https://` (ASCII case-insensitive).
#[must_use]
pub fn is_remote(raw: &str) -> bool {
    ["http://", "https://"].iter().any(|prefix| {
        raw.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    })
}

/// Classifies one raw capture found in `containing_file`.
///
/// URLs become [`MediaReference::Remote`]. Anything else is resolved against the
/// containing file's directory; it becomes [`MediaReference::Local`] only when
/// the result is `root` itself or lies beneath it, and is discarded otherwise.
/// `root` must be absolute and canonical.
#[must_use]
pub fn classify(raw: &str, containing_file: &Path, root: &Path) -> Option<MediaReference> {
    if is_remote(raw) {
        return Some(MediaReference::remote(raw));
    }

    let base = containing_file.parent().unwrap_or(root);
    let joined = normalize_lexically(&base.join(raw));

    // Existing paths are canonicalized so a symlink cannot point outside the root.
    let resolved = match joined.canonicalize() {
        Ok(canonical) => canonical,
        Err(_) => joined,
    };

    if resolved.starts_with(root) {
        Some(MediaReference::local(raw, resolved))
    } else {
        trace!(
            raw,
            resolved = %resolved.display(),
            file = %containing_file.display(),
            "discarding reference outside scan root"
        );
        None
    }
}

/// Normalizes a path without touching the filesystem: drops `.` components and
/// lets `..` remove the preceding normal component.
#[must_use]
pub fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push(Component::ParentDir);
                }
            }
            other => out.push(other),
        }
    }
    out
}
