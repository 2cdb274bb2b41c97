//! Core types and events for artifact-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Immutable descriptor of an artifact to acquire
///
/// Created at configuration time and never mutated. The `identifier` doubles
/// as the on-disk file name under the artifacts directory, so it must be a
/// plain file name (no path separators, not `.` or `..`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSpec {
    /// Unique key for this artifact; also its canonical file name
    pub identifier: String,

    /// HTTP(S) URL the artifact is fetched from
    pub source_location: String,

    /// Expected size in bytes; 0 means unknown/unverified
    #[serde(default)]
    pub expected_size_bytes: u64,
}

impl ArtifactSpec {
    /// Create a new spec
    pub fn new(
        identifier: impl Into<String>,
        source_location: impl Into<String>,
        expected_size_bytes: u64,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            source_location: source_location.into(),
            expected_size_bytes,
        }
    }

    /// Validate the spec before any filesystem or network activity
    ///
    /// Checks that the identifier is a non-empty plain file name and that the
    /// source parses as an http(s) URL. All violations are
    /// [`Error::InvalidSource`] so callers see a single precondition failure
    /// class.
    pub fn validate(&self) -> Result<()> {
        if self.identifier.is_empty() {
            return Err(Error::InvalidSource("identifier is empty".to_string()));
        }
        if self.identifier == "." || self.identifier == ".." {
            return Err(Error::InvalidSource(format!(
                "identifier '{}' is not a file name",
                self.identifier
            )));
        }
        if self.identifier.contains('/') || self.identifier.contains('\\') {
            return Err(Error::InvalidSource(format!(
                "identifier '{}' contains a path separator",
                self.identifier
            )));
        }

        let parsed = url::Url::parse(&self.source_location)
            .map_err(|e| Error::InvalidSource(format!("{}: {}", self.source_location, e)))?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(Error::InvalidSource(format!(
                "unsupported scheme '{}' in {}",
                other, self.source_location
            ))),
        }
    }
}

/// Phase of the acquisition state machine for one artifact
///
/// Transitions: `Idle -> Checking -> Downloading -> Publishing -> Ready`, with
/// `Checking -> Ready` directly when a valid local copy is found, and any
/// in-flight phase able to move to `Failed`. `Ready` is terminal and
/// success-only; `Failed` is terminal per attempt but a new `Checking` cycle
/// may be entered explicitly via [`reset`](crate::ArtifactAcquirer::reset).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Acquisition has not been requested
    #[default]
    Idle,
    /// Probing the filesystem for an existing valid copy
    Checking,
    /// Streaming the artifact into a temporary file
    Downloading,
    /// Moving the verified temporary file to the canonical path
    Publishing,
    /// Artifact present and valid at its canonical path
    Ready,
    /// Attempt failed; see `last_error`
    Failed,
}

impl Phase {
    /// Whether this phase ends an attempt
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Ready | Phase::Failed)
    }
}

/// Observable snapshot of one artifact's acquisition state
///
/// Invariants: `local_path` is set if and only if `phase == Ready`, and
/// `bytes_transferred` never exceeds `bytes_expected` once the latter is
/// known and nonzero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionStatus {
    /// Current phase of the state machine
    pub phase: Phase,

    /// Bytes received so far; monotonically non-decreasing within an attempt
    pub bytes_transferred: u64,

    /// Total bytes expected; 0 until the transfer header (or spec) makes it
    /// known
    pub bytes_expected: u64,

    /// Description of the most recent failure, set only in `Failed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,

    /// Canonical path of the acquired artifact, set only in `Ready`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_path: Option<PathBuf>,
}

impl AcquisitionStatus {
    /// Fraction complete in [0.0, 1.0], or None while the total is unknown
    pub fn fraction(&self) -> Option<f32> {
        if self.bytes_expected == 0 {
            return None;
        }
        let f = self.bytes_transferred as f64 / self.bytes_expected as f64;
        Some(f.clamp(0.0, 1.0) as f32)
    }
}

/// Event emitted during the acquisition lifecycle
///
/// Delivered via the broadcast channel returned by
/// [`subscribe`](crate::ArtifactAcquirer::subscribe). Emission never blocks
/// the transfer; a subscriber that falls behind loses old events rather than
/// stalling the pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The state machine entered a new phase
    PhaseChanged {
        /// Artifact identifier
        identifier: String,
        /// Phase entered
        phase: Phase,
    },

    /// Transfer progress update
    Progress {
        /// Artifact identifier
        identifier: String,
        /// Bytes received so far
        bytes_transferred: u64,
        /// Total bytes expected, when known
        #[serde(skip_serializing_if = "Option::is_none")]
        bytes_expected: Option<u64>,
        /// Fraction complete in [0.0, 1.0]; None while indeterminate
        #[serde(skip_serializing_if = "Option::is_none")]
        fraction: Option<f32>,
    },

    /// Artifact is present and valid at its canonical path
    Ready {
        /// Artifact identifier
        identifier: String,
        /// Canonical path of the artifact
        path: PathBuf,
        /// True when a valid local copy was found without any transfer
        from_cache: bool,
    },

    /// The attempt failed; the canonical path is unchanged
    Failed {
        /// Artifact identifier
        identifier: String,
        /// Description of the failure
        error: String,
    },
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_spec_validation_accepts_https() {
        let spec = ArtifactSpec::new("model-a", "https://example/model-a.bin", 1000);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn test_spec_validation_rejects_empty_identifier() {
        let spec = ArtifactSpec::new("", "https://example/model-a.bin", 0);
        let err = spec.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSource);
    }

    #[test]
    fn test_spec_validation_rejects_path_traversal() {
        for bad in ["../model", "a/b", "a\\b", "..", "."] {
            let spec = ArtifactSpec::new(bad, "https://example/m.bin", 0);
            assert!(
                spec.validate().is_err(),
                "identifier '{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_spec_validation_rejects_bad_url() {
        let spec = ArtifactSpec::new("model-a", "not a url", 0);
        assert_eq!(spec.validate().unwrap_err().kind(), ErrorKind::InvalidSource);

        let spec = ArtifactSpec::new("model-a", "ftp://example/m.bin", 0);
        assert_eq!(spec.validate().unwrap_err().kind(), ErrorKind::InvalidSource);
    }

    #[test]
    fn test_fraction_clamped_and_indeterminate() {
        let mut status = AcquisitionStatus {
            bytes_transferred: 400,
            bytes_expected: 1000,
            ..Default::default()
        };
        assert_eq!(status.fraction(), Some(0.4));

        status.bytes_expected = 0;
        assert_eq!(status.fraction(), None);

        status.bytes_expected = 100;
        status.bytes_transferred = 250;
        assert_eq!(status.fraction(), Some(1.0));
    }

    #[test]
    fn test_phase_terminality() {
        assert!(Phase::Ready.is_terminal());
        assert!(Phase::Failed.is_terminal());
        assert!(!Phase::Idle.is_terminal());
        assert!(!Phase::Downloading.is_terminal());
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = Event::Progress {
            identifier: "model-a".to_string(),
            bytes_transferred: 400,
            bytes_expected: Some(1000),
            fraction: Some(0.4),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"progress\""));
        assert!(json.contains("\"bytes_transferred\":400"));
    }
}
