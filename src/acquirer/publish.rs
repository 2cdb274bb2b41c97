//! Atomic temp-to-final publish and temporary file cleanup.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Removes the temporary file on drop unless the attempt published it
///
/// Guards every attempt from its first write to the final rename, so a
/// failure, cancellation, or an abandoned (dropped) future all leave the
/// temp directory clean and the canonical path untouched.
pub(super) struct TempFileGuard {
    path: PathBuf,
    armed: bool,
}

impl TempFileGuard {
    pub(super) fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    /// The temp file was published; nothing left to clean up
    pub(super) fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TempFileGuard {
    fn drop(&mut self) {
        if self.armed {
            match std::fs::remove_file(&self.path) {
                Ok(()) => {
                    tracing::debug!(path = %self.path.display(), "Removed temporary file");
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!(
                        path = %self.path.display(),
                        error = %e,
                        "Failed to remove temporary file"
                    );
                }
            }
        }
    }
}

/// Atomically publish the verified temporary file to the canonical path
///
/// Rename is tried first: on Unix it replaces an existing destination in one
/// step, so no observer ever sees a partially written file. When the rename
/// fails (the temp directory on a different filesystem, or a platform that
/// refuses to replace an existing destination), the bytes are first staged
/// as a sibling of the final path. The previous artifact is removed only
/// once the staged copy fully exists, and the last hop is a same-directory
/// rename, so a failed publish always leaves the canonical path with its
/// prior content.
pub(super) async fn publish_atomic(temp_path: &Path, final_path: &Path) -> Result<()> {
    // The temp file must be intact before the canonical path is touched at
    // all; otherwise a doomed publish could destroy the previous artifact
    tokio::fs::metadata(temp_path).await.map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!(
                "Temporary file '{}' unavailable for publish: {}",
                temp_path.display(),
                e
            ),
        ))
    })?;

    if tokio::fs::rename(temp_path, final_path).await.is_ok() {
        return Ok(());
    }

    publish_via_sibling(temp_path, final_path).await
}

/// Fallback publish: stage a copy next to the final path, then rename
///
/// The canonical path is untouched until the sibling copy has fully
/// succeeded, so a failed copy (destination disk full, permissions) leaves
/// the previous artifact in place.
pub(super) async fn publish_via_sibling(temp_path: &Path, final_path: &Path) -> Result<()> {
    let mut sibling_name = final_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    sibling_name.push(".publish.tmp");
    let sibling = final_path.with_file_name(sibling_name);

    if let Err(e) = tokio::fs::copy(temp_path, &sibling).await {
        tokio::fs::remove_file(&sibling).await.ok();
        return Err(Error::Io(std::io::Error::new(
            e.kind(),
            format!(
                "Failed to copy '{}' to '{}': {}",
                temp_path.display(),
                sibling.display(),
                e
            ),
        )));
    }

    if tokio::fs::rename(&sibling, final_path).await.is_ok() {
        tokio::fs::remove_file(temp_path).await.ok();
        return Ok(());
    }

    // Platforms that refuse to replace an existing destination: the bytes
    // are already staged in the final directory, so the old file can go
    match tokio::fs::remove_file(final_path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tokio::fs::remove_file(&sibling).await.ok();
            return Err(Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to remove existing artifact '{}': {}",
                    final_path.display(),
                    e
                ),
            )));
        }
    }

    if let Err(e) = tokio::fs::rename(&sibling, final_path).await {
        tokio::fs::remove_file(&sibling).await.ok();
        return Err(Error::Io(std::io::Error::new(
            e.kind(),
            format!(
                "Failed to move '{}' to '{}': {}",
                sibling.display(),
                final_path.display(),
                e
            ),
        )));
    }

    tokio::fs::remove_file(temp_path).await.ok();
    Ok(())
}
