//! The `ensure_ready` state machine orchestration.

use std::path::PathBuf;

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::retry::acquire_with_retry;
use crate::types::{ArtifactSpec, Phase};

use super::publish::{publish_atomic, TempFileGuard};
use super::ArtifactAcquirer;

impl ArtifactAcquirer {
    /// Ensure the artifact is present and valid at its canonical path
    ///
    /// Runs one acquisition attempt through the state machine:
    /// `Checking -> Downloading -> Publishing -> Ready`, short-circuiting
    /// `Checking -> Ready` when a valid local copy exists (no network access,
    /// so repeated calls on an acquired artifact never re-download).
    ///
    /// On success the canonical path is returned and the state is `Ready`.
    /// On any failure the canonical path is byte-for-byte unchanged, no
    /// temporary file remains, and the state is `Failed` with `last_error`
    /// set. Failures are never retried internally; see
    /// [`ensure_ready_with_retry`](ArtifactAcquirer::ensure_ready_with_retry)
    /// for an opt-in policy.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidSource`] - empty/invalid identifier or malformed URL
    /// - [`Error::TransferFailed`] - connection failure or non-success status
    /// - [`Error::Io`] - cannot create, write, or move files
    /// - [`Error::SizeMismatch`] - expected size known and the transfer disagrees
    /// - [`Error::Cancelled`] - [`cancel`](ArtifactAcquirer::cancel) was called
    pub async fn ensure_ready(&self, spec: &ArtifactSpec) -> Result<PathBuf> {
        // Precondition failures never enter the state machine
        spec.validate()?;

        self.set_phase(&spec.identifier, Phase::Checking);

        match self.probe_local(spec).await {
            Ok(Some(path)) => {
                self.mark_ready(&spec.identifier, path.clone(), true);
                return Ok(path);
            }
            Ok(None) => {}
            Err(e) => {
                self.mark_failed(&spec.identifier, &e);
                return Err(e);
            }
        }

        let attempt_id = self.next_attempt_id();
        let token = self.register_attempt(&spec.identifier, attempt_id);
        let result = self.run_attempt(spec, attempt_id, &token).await;
        self.clear_attempt(&spec.identifier, attempt_id);

        match result {
            Ok(path) => {
                self.mark_ready(&spec.identifier, path.clone(), false);
                Ok(path)
            }
            Err(e) => {
                self.mark_failed(&spec.identifier, &e);
                Err(e)
            }
        }
    }

    /// [`ensure_ready`](ArtifactAcquirer::ensure_ready) wrapped in the
    /// caller-parameterized retry policy
    ///
    /// Only transient failures (connection errors, timeouts, 5xx responses)
    /// are retried; a 404, an invalid spec, or a cancellation returns
    /// immediately.
    pub async fn ensure_ready_with_retry(
        &self,
        spec: &ArtifactSpec,
        retry: &RetryConfig,
    ) -> Result<PathBuf> {
        acquire_with_retry(retry, || self.ensure_ready(spec)).await
    }

    /// One download-and-publish attempt against a unique temporary file
    ///
    /// The temp file is guarded for the whole attempt: any early return (or
    /// the caller dropping this future) removes it, leaving the canonical
    /// path untouched.
    async fn run_attempt(
        &self,
        spec: &ArtifactSpec,
        attempt_id: u64,
        token: &tokio_util::sync::CancellationToken,
    ) -> Result<PathBuf> {
        let final_path = self.artifact_path(&spec.identifier);
        let temp_path = self
            .config
            .temp_dir()
            .join(format!("{}.{}.part", spec.identifier, attempt_id));

        let mut guard = TempFileGuard::new(temp_path.clone());

        self.set_phase(&spec.identifier, Phase::Downloading);
        let outcome = self.stream_to_temp(spec, &temp_path, token).await?;

        // Full transfer, but the wrong amount of data is still a failure
        if let Some(expected) = outcome.expected {
            if outcome.transferred != expected {
                return Err(Error::SizeMismatch {
                    expected,
                    actual: outcome.transferred,
                });
            }
        }
        if spec.expected_size_bytes > 0 && outcome.transferred != spec.expected_size_bytes {
            return Err(Error::SizeMismatch {
                expected: spec.expected_size_bytes,
                actual: outcome.transferred,
            });
        }

        self.set_phase(&spec.identifier, Phase::Publishing);
        publish_atomic(&temp_path, &final_path).await?;
        guard.disarm();

        Ok(final_path)
    }
}
