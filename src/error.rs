//! Error types for artifact-dl
//!
//! The taxonomy is deliberately small and stable: every failure a caller of
//! [`ensure_ready`](crate::ArtifactAcquirer::ensure_ready) can observe maps to
//! exactly one variant, so retry-vs-abort decisions can be made on the
//! [`ErrorKind`] alone. Nothing is swallowed or retried internally.

use thiserror::Error;

/// Result type alias for artifact-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for artifact-dl
#[derive(Debug, Error)]
pub enum Error {
    /// The artifact spec is unusable: malformed source URI, unsupported
    /// scheme, or an identifier that is empty or not a plain file name
    #[error("invalid source: {0}")]
    InvalidSource(String),

    /// The transfer did not complete: connection failure, timeout, or a
    /// non-success HTTP status. A partial response is never a success.
    #[error("transfer failed: {message}")]
    TransferFailed {
        /// Human-readable description of the failure
        message: String,
        /// HTTP status code, when the server responded at all
        status: Option<u16>,
    },

    /// Local I/O failure: cannot create a directory, write the temporary
    /// file, or move it to the canonical path
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The expected size was known and the fully transferred artifact
    /// disagrees with it
    #[error("size mismatch: expected {expected} bytes, got {actual} bytes")]
    SizeMismatch {
        /// Size the spec or transfer header promised
        expected: u64,
        /// Size actually received
        actual: u64,
    },

    /// The attempt was cancelled. The temporary file has been removed and
    /// the canonical path is untouched.
    #[error("acquisition cancelled")]
    Cancelled,
}

/// Machine-readable classification of an [`Error`]
///
/// Mirrors the error variants one-to-one so UI layers can render the failure
/// class and callers can parameterize retry policy without string matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed URI or invalid identifier
    InvalidSource,
    /// Non-success response or connection error
    TransferFailed,
    /// Directory, write, or move failure
    Io,
    /// Final artifact size disagrees with the expected size
    SizeMismatch,
    /// Attempt cancelled by the caller
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::InvalidSource => "invalid_source",
            ErrorKind::TransferFailed => "transfer_failed",
            ErrorKind::Io => "io",
            ErrorKind::SizeMismatch => "size_mismatch",
            ErrorKind::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

impl Error {
    /// Classify this error for callers deciding retry vs. abort policy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidSource(_) => ErrorKind::InvalidSource,
            Error::TransferFailed { .. } => ErrorKind::TransferFailed,
            Error::Io(_) => ErrorKind::Io,
            Error::SizeMismatch { .. } => ErrorKind::SizeMismatch,
            Error::Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::TransferFailed {
            message: e.to_string(),
            status: e.status().map(|s| s.as_u16()),
        }
    }
}
