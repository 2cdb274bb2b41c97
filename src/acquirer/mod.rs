//! Core acquirer implementation split into focused submodules.
//!
//! The `ArtifactAcquirer` struct and its methods are organized by concern:
//! - [`probe`] - Local filesystem probe for existing valid copies
//! - [`transfer`] - Streaming fetch with progress reporting
//! - [`publish`] - Atomic temp-to-final publish and temp cleanup
//! - [`ensure`] - The `ensure_ready` state machine orchestration

mod ensure;
mod probe;
mod publish;
mod transfer;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{AcquisitionStatus, Event, Phase};

/// Artifact acquisition manager (cloneable - all fields are Arc-wrapped)
///
/// Owns one acquisition state machine per artifact identifier. Created once
/// per process and shared; all methods take `&self`.
#[derive(Clone)]
pub struct ArtifactAcquirer {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Shared HTTP client with the configured timeouts and user agent
    pub(crate) client: reqwest::Client,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Per-artifact acquisition state, keyed by identifier
    states: Arc<Mutex<HashMap<String, AcquisitionStatus>>>,
    /// Cancellation tokens for in-flight attempts, keyed by identifier and
    /// tagged with the attempt id that registered them
    active: Arc<Mutex<HashMap<String, (u64, tokio_util::sync::CancellationToken)>>>,
    /// Process-wide attempt counter; makes temp file names unique across
    /// interleaved re-acquisitions of the same spec
    attempt_seq: Arc<AtomicU64>,
}

impl ArtifactAcquirer {
    /// Create a new ArtifactAcquirer instance
    ///
    /// Creates the artifacts and temporary directories and builds the shared
    /// HTTP client. No network activity happens here.
    pub async fn new(config: Config) -> Result<Self> {
        tokio::fs::create_dir_all(config.artifacts_dir())
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create artifacts directory '{}': {}",
                        config.artifacts_dir().display(),
                        e
                    ),
                ))
            })?;
        tokio::fs::create_dir_all(config.temp_dir())
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create temp directory '{}': {}",
                        config.temp_dir().display(),
                        e
                    ),
                ))
            })?;

        let client = reqwest::Client::builder()
            .timeout(config.network.request_timeout)
            .connect_timeout(config.network.connect_timeout)
            .user_agent(config.network.user_agent.clone())
            .build()?;

        // Buffer of 1000 events lets slow subscribers lag without ever
        // blocking the transfer
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        Ok(Self {
            config: Arc::new(config),
            client,
            event_tx,
            states: Arc::new(Mutex::new(HashMap::new())),
            active: Arc::new(Mutex::new(HashMap::new())),
            attempt_seq: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Subscribe to acquisition events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all
    /// events independently. Events are buffered, but a subscriber that falls
    /// behind by more than 1000 events receives `RecvError::Lagged` rather
    /// than stalling the transfer.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Canonical on-disk path for an artifact identifier
    ///
    /// The artifact is stored as one file named by its identifier directly
    /// under the artifacts directory.
    pub fn artifact_path(&self, identifier: &str) -> PathBuf {
        self.config.artifacts_dir().join(identifier)
    }

    /// Current phase for an artifact; `Idle` when acquisition was never
    /// requested
    pub fn current_phase(&self, identifier: &str) -> Phase {
        self.lock_states()
            .get(identifier)
            .map(|s| s.phase)
            .unwrap_or_default()
    }

    /// Current progress for an artifact as a fraction in [0.0, 1.0]
    ///
    /// Returns None while the total is unknown (indeterminate progress) or
    /// acquisition was never requested.
    pub fn current_progress(&self, identifier: &str) -> Option<f32> {
        self.lock_states().get(identifier).and_then(|s| s.fraction())
    }

    /// Full status snapshot for an artifact, if acquisition was ever requested
    pub fn status(&self, identifier: &str) -> Option<AcquisitionStatus> {
        self.lock_states().get(identifier).cloned()
    }

    /// Cancel an in-flight attempt
    ///
    /// The caller awaiting `ensure_ready` observes [`Error::Cancelled`]; the
    /// temporary file is removed and the canonical path stays untouched.
    /// Returns true when an attempt was actually in flight.
    pub fn cancel(&self, identifier: &str) -> bool {
        let active = self.lock_active();
        match active.get(identifier) {
            Some((_, token)) => {
                tracing::info!(identifier = %identifier, "Cancelling acquisition attempt");
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Reset a terminal state back to `Idle` so a new `Checking` cycle can be
    /// entered explicitly (e.g. a manual retry after failure)
    ///
    /// Returns false when the artifact has an attempt in flight or no state
    /// at all.
    pub fn reset(&self, identifier: &str) -> bool {
        let mut states = self.lock_states();
        match states.get_mut(identifier) {
            Some(status) if status.phase.is_terminal() => {
                *status = AcquisitionStatus::default();
                tracing::debug!(identifier = %identifier, "Acquisition state reset");
                true
            }
            _ => false,
        }
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// acquisition proceeds whether or not anyone is listening.
    pub(crate) fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine
        self.event_tx.send(event).ok();
    }

    /// Transition an artifact to a new phase and notify subscribers
    ///
    /// Entering `Checking` begins a fresh attempt: counters, error, and path
    /// are cleared.
    pub(crate) fn set_phase(&self, identifier: &str, phase: Phase) {
        {
            let mut states = self.lock_states();
            let status = states.entry(identifier.to_string()).or_default();
            if phase == Phase::Checking {
                *status = AcquisitionStatus::default();
            }
            status.phase = phase;
        }
        tracing::debug!(identifier = %identifier, phase = ?phase, "Phase transition");
        self.emit_event(Event::PhaseChanged {
            identifier: identifier.to_string(),
            phase,
        });
    }

    /// Record transfer progress and notify subscribers
    ///
    /// `bytes_transferred` is kept monotonically non-decreasing and is
    /// clamped to `bytes_expected` once that is known and nonzero.
    pub(crate) fn update_progress(
        &self,
        identifier: &str,
        bytes_transferred: u64,
        bytes_expected: Option<u64>,
    ) {
        let (transferred, expected, fraction) = {
            let mut states = self.lock_states();
            let status = states.entry(identifier.to_string()).or_default();
            if let Some(expected) = bytes_expected {
                status.bytes_expected = expected;
            }
            let clamped = if status.bytes_expected > 0 {
                bytes_transferred.min(status.bytes_expected)
            } else {
                bytes_transferred
            };
            status.bytes_transferred = status.bytes_transferred.max(clamped);
            (
                status.bytes_transferred,
                (status.bytes_expected > 0).then_some(status.bytes_expected),
                status.fraction(),
            )
        };
        self.emit_event(Event::Progress {
            identifier: identifier.to_string(),
            bytes_transferred: transferred,
            bytes_expected: expected,
            fraction,
        });
    }

    /// Finish an attempt successfully: `Ready` with `local_path` set
    pub(crate) fn mark_ready(&self, identifier: &str, path: PathBuf, from_cache: bool) {
        {
            let mut states = self.lock_states();
            let status = states.entry(identifier.to_string()).or_default();
            status.phase = Phase::Ready;
            status.local_path = Some(path.clone());
            status.last_error = None;
        }
        tracing::info!(
            identifier = %identifier,
            path = %path.display(),
            from_cache = from_cache,
            "Artifact ready"
        );
        self.emit_event(Event::PhaseChanged {
            identifier: identifier.to_string(),
            phase: Phase::Ready,
        });
        self.emit_event(Event::Ready {
            identifier: identifier.to_string(),
            path,
            from_cache,
        });
    }

    /// Finish an attempt in failure: `Failed` with `last_error` set and
    /// `local_path` unset
    pub(crate) fn mark_failed(&self, identifier: &str, error: &Error) {
        let message = error.to_string();
        {
            let mut states = self.lock_states();
            let status = states.entry(identifier.to_string()).or_default();
            status.phase = Phase::Failed;
            status.last_error = Some(message.clone());
            status.local_path = None;
        }
        tracing::warn!(identifier = %identifier, error = %error, "Acquisition failed");
        self.emit_event(Event::PhaseChanged {
            identifier: identifier.to_string(),
            phase: Phase::Failed,
        });
        self.emit_event(Event::Failed {
            identifier: identifier.to_string(),
            error: message,
        });
    }

    /// Register a new attempt for cancellation tracking
    ///
    /// A token already present for this identifier (an interleaved attempt on
    /// the same spec) is replaced, so `cancel` always reaches the newest
    /// attempt; unique temp names keep the attempts from interfering on disk.
    pub(crate) fn register_attempt(
        &self,
        identifier: &str,
        attempt_id: u64,
    ) -> tokio_util::sync::CancellationToken {
        let token = tokio_util::sync::CancellationToken::new();
        self.lock_active()
            .insert(identifier.to_string(), (attempt_id, token.clone()));
        token
    }

    /// Drop the cancellation token for a finished attempt
    ///
    /// Only the finishing attempt's own token is removed: an older attempt
    /// finishing late must not unregister a newer in-flight one, which would
    /// leave it uncancellable.
    pub(crate) fn clear_attempt(&self, identifier: &str, attempt_id: u64) {
        let mut active = self.lock_active();
        if active
            .get(identifier)
            .is_some_and(|(id, _)| *id == attempt_id)
        {
            active.remove(identifier);
        }
    }

    /// Next value of the process-wide attempt counter
    pub(crate) fn next_attempt_id(&self) -> u64 {
        self.attempt_seq
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
    }

    // Lock helpers that recover from poisoning; state updates are plain
    // field writes, so a panicked holder cannot leave them inconsistent.
    fn lock_states(&self) -> MutexGuard<'_, HashMap<String, AcquisitionStatus>> {
        self.states.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_active(
        &self,
    ) -> MutexGuard<'_, HashMap<String, (u64, tokio_util::sync::CancellationToken)>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}
