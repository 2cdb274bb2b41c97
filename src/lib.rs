//! # artifact-dl
//!
//! Embeddable artifact acquisition library: given a named artifact
//! (identifier, source URL, expected size), guarantee a valid local copy
//! exists before signalling readiness.
//!
//! ## Design Philosophy
//!
//! artifact-dl is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to phase and progress events,
//!   no polling required
//! - **Crash-safe** - Artifacts are streamed to a temporary file and
//!   atomically published; the canonical path never holds a partial file
//! - **Sensible defaults** - Works out of the box with zero configuration
//!
//! ## Quick Start
//!
//! ```no_run
//! use artifact_dl::{ArtifactAcquirer, ArtifactSpec, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let acquirer = ArtifactAcquirer::new(Config::default()).await?;
//!
//!     // Subscribe to events
//!     let mut events = acquirer.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let spec = ArtifactSpec::new(
//!         "model-a",
//!         "https://example.com/model-a.bin",
//!         1000,
//!     );
//!     let path = acquirer.ensure_ready(&spec).await?;
//!     println!("Artifact ready at {}", path.display());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Core acquirer implementation (decomposed into focused submodules)
pub mod acquirer;
/// Built-in artifact catalog
pub mod catalog;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Platform capability queries
pub mod platform;
/// Retry logic with exponential backoff
pub mod retry;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use acquirer::ArtifactAcquirer;
pub use catalog::CatalogEntry;
pub use config::{Config, NetworkConfig, RetryConfig, StorageConfig};
pub use error::{Error, ErrorKind, Result};
pub use retry::{acquire_with_retry, IsRetryable};
pub use types::{AcquisitionStatus, ArtifactSpec, Event, Phase};
