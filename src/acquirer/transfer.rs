//! Streaming fetch with progress reporting.

use futures::StreamExt;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::platform;
use crate::types::ArtifactSpec;

use super::ArtifactAcquirer;

/// Result of a completed transfer into the temporary file
pub(super) struct TransferOutcome {
    /// Bytes actually received and written
    pub(super) transferred: u64,
    /// Total the transfer promised, when known (Content-Length, else the
    /// spec's expected size)
    pub(super) expected: Option<u64>,
}

impl ArtifactAcquirer {
    /// Stream the artifact from its source into the temporary file
    ///
    /// Any non-success status is a `TransferFailed`, never a partial success.
    /// Progress is recorded per chunk and broadcast to subscribers without
    /// blocking the transfer. Cancellation is observed between chunks; the
    /// caller owns temp file cleanup.
    pub(super) async fn stream_to_temp(
        &self,
        spec: &ArtifactSpec,
        temp_path: &Path,
        token: &CancellationToken,
    ) -> Result<TransferOutcome> {
        let response = tokio::select! {
            _ = token.cancelled() => {
                tracing::info!(identifier = %spec.identifier, "Transfer cancelled");
                return Err(Error::Cancelled);
            }
            response = self.client.get(&spec.source_location).send() => response?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(Error::TransferFailed {
                message: format!("HTTP {} from {}", status, spec.source_location),
                status: Some(status.as_u16()),
            });
        }

        // Content-Length wins; fall back to the spec's expected size; stay
        // indeterminate when neither is known
        let expected = response
            .content_length()
            .filter(|n| *n > 0)
            .or((spec.expected_size_bytes > 0).then_some(spec.expected_size_bytes));

        if let Some(expected) = expected {
            self.check_disk_space(temp_path, expected)?;
        }

        tracing::info!(
            identifier = %spec.identifier,
            source = %spec.source_location,
            expected_bytes = ?expected,
            "Starting transfer"
        );

        self.update_progress(&spec.identifier, 0, expected);

        let mut file = tokio::fs::File::create(temp_path).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create temporary file '{}': {}",
                    temp_path.display(),
                    e
                ),
            ))
        })?;

        let mut stream = response.bytes_stream();
        let mut transferred: u64 = 0;

        loop {
            let chunk = tokio::select! {
                _ = token.cancelled() => {
                    tracing::info!(identifier = %spec.identifier, "Transfer cancelled");
                    return Err(Error::Cancelled);
                }
                chunk = stream.next() => match chunk {
                    Some(chunk) => chunk?,
                    None => break,
                },
            };

            file.write_all(&chunk).await?;
            transferred += chunk.len() as u64;
            self.update_progress(&spec.identifier, transferred, expected);
        }

        // The rename in the publish step must move fully persisted bytes
        file.flush().await?;
        file.sync_all().await?;

        tracing::debug!(
            identifier = %spec.identifier,
            transferred = transferred,
            "Transfer complete"
        );

        Ok(TransferOutcome {
            transferred,
            expected,
        })
    }

    /// Refuse to start a transfer that cannot fit on disk
    ///
    /// A failing space probe is logged and ignored; only a definitive "not
    /// enough room" answer aborts the attempt.
    fn check_disk_space(&self, temp_path: &Path, required: u64) -> Result<()> {
        let dir = temp_path.parent().unwrap_or_else(|| Path::new("."));
        match platform::available_disk_space(dir) {
            Ok(available) if available < required => Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::StorageFull,
                format!(
                    "insufficient disk space: need {} bytes, have {} bytes",
                    required, available
                ),
            ))),
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::warn!(error = %e, "Could not check disk space, proceeding");
                Ok(())
            }
        }
    }
}
