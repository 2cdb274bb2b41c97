//! Tests for the acquirer, organized by concern.

use super::ArtifactAcquirer;
use crate::config::{Config, StorageConfig};
use crate::types::{ArtifactSpec, Event};
use tempfile::{tempdir, TempDir};

mod ensure;
mod probe;

/// Helper to create a test ArtifactAcquirer backed by a scratch directory.
/// Returns the acquirer and the tempdir (which must be kept alive).
pub(crate) async fn create_test_acquirer() -> (ArtifactAcquirer, TempDir) {
    let temp_dir = tempdir().unwrap();

    let config = Config {
        storage: StorageConfig {
            artifacts_dir: temp_dir.path().join("artifacts"),
            temp_dir: temp_dir.path().join("partial"),
        },
        ..Default::default()
    };

    let acquirer = ArtifactAcquirer::new(config).await.unwrap();
    (acquirer, temp_dir)
}

/// Spec pointing at the given mock server, matching the concrete scenario
/// from the acceptance checklist: identifier "model-a", expected 1000 bytes.
pub(crate) fn model_a_spec(server_uri: &str, expected_size_bytes: u64) -> ArtifactSpec {
    ArtifactSpec::new(
        "model-a",
        format!("{}/model-a.bin", server_uri),
        expected_size_bytes,
    )
}

/// Drain all events buffered on a subscription.
pub(crate) fn drain_events(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Assert that no leftover files remain in the temp (partial) directory.
pub(crate) fn assert_temp_dir_clean(acquirer: &ArtifactAcquirer) {
    let entries: Vec<_> = std::fs::read_dir(acquirer.get_config().temp_dir())
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    assert!(
        entries.is_empty(),
        "temp dir should be clean, found {:?}",
        entries
    );
}
