//! Configuration types for artifact-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Storage layout configuration (artifacts and temporary directories)
///
/// Groups settings for where artifacts live on disk. Used as a nested
/// sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory artifacts are published into, one file per identifier
    /// (default: the platform application-data directory under
    /// `artifact-dl/artifacts`, falling back to `./artifacts`)
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,

    /// Directory in-flight transfers are written to (default: a `.partial`
    /// subdirectory of the artifacts directory)
    ///
    /// Keeping this on the same filesystem as `artifacts_dir` lets the
    /// publish step use an atomic rename.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            artifacts_dir: default_artifacts_dir(),
            temp_dir: default_temp_dir(),
        }
    }
}

/// Network behavior configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Total request timeout covering the whole transfer (default: 300 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Connection establishment timeout (default: 30 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,

    /// User-Agent header sent with transfer requests
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Retry behavior configuration for transient failures
///
/// Retry is the caller's policy: the acquirer never retries on its own, but
/// [`ensure_ready_with_retry`](crate::ArtifactAcquirer::ensure_ready_with_retry)
/// and [`acquire_with_retry`](crate::retry::acquire_with_retry) consume this
/// config.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the initial try (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

/// Top-level configuration for [`ArtifactAcquirer`](crate::ArtifactAcquirer)
///
/// Works out of the box with zero configuration; every field has a sensible
/// default and deserializes from partial JSON.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Storage layout (artifacts and temp directories)
    #[serde(default)]
    pub storage: StorageConfig,

    /// Network behavior (timeouts, user agent)
    #[serde(default)]
    pub network: NetworkConfig,

    /// Retry behavior for callers that opt into retries
    #[serde(default)]
    pub retry: RetryConfig,
}

// Convenience accessors keep call sites short without reaching through
// the sub-config structs.
impl Config {
    /// Artifacts directory
    pub fn artifacts_dir(&self) -> &PathBuf {
        &self.storage.artifacts_dir
    }

    /// Temporary directory
    pub fn temp_dir(&self) -> &PathBuf {
        &self.storage.temp_dir
    }
}

fn default_artifacts_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("artifact-dl").join("artifacts"))
        .unwrap_or_else(|| PathBuf::from("./artifacts"))
}

fn default_temp_dir() -> PathBuf {
    default_artifacts_dir().join(".partial")
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("artifact-dl/{}", env!("CARGO_PKG_VERSION"))
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
