//! Local filesystem probe for existing valid artifact copies.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::types::ArtifactSpec;

use super::ArtifactAcquirer;

impl ArtifactAcquirer {
    /// Probe the canonical path for a valid existing copy of the artifact
    ///
    /// A copy is valid when the file exists, is non-empty, and (when the
    /// spec's expected size is known and nonzero) matches that size exactly.
    /// Returns the canonical path on a hit, None on a miss (including an
    /// invalid copy, which a subsequent download will replace).
    pub(super) async fn probe_local(&self, spec: &ArtifactSpec) -> Result<Option<PathBuf>> {
        let path = self.artifact_path(&spec.identifier);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() && meta.len() > 0 => {
                if spec.expected_size_bytes > 0 && meta.len() != spec.expected_size_bytes {
                    tracing::warn!(
                        identifier = %spec.identifier,
                        actual_size = meta.len(),
                        expected_size = spec.expected_size_bytes,
                        "Existing artifact has unexpected size, re-acquiring"
                    );
                    Ok(None)
                } else {
                    tracing::debug!(
                        identifier = %spec.identifier,
                        size = meta.len(),
                        "Found valid local artifact"
                    );
                    Ok(Some(path))
                }
            }
            // Present but empty, or not a regular file
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to probe artifact '{}': {}", path.display(), e),
            ))),
        }
    }

    /// Whether a valid local copy of the artifact already exists
    ///
    /// Synchronous convenience for UI layers; applies the same validity rules
    /// as the `Checking` phase of
    /// [`ensure_ready`](ArtifactAcquirer::ensure_ready).
    pub fn is_acquired(&self, spec: &ArtifactSpec) -> bool {
        let path = self.artifact_path(&spec.identifier);
        match std::fs::metadata(&path) {
            Ok(meta) if meta.is_file() && meta.len() > 0 => {
                spec.expected_size_bytes == 0 || meta.len() == spec.expected_size_bytes
            }
            _ => false,
        }
    }
}
