use super::*;

#[tokio::test]
async fn test_is_acquired_requires_nonempty_file() {
    let (acquirer, _temp_dir) = create_test_acquirer().await;
    let spec = ArtifactSpec::new("model-a", "https://example/model-a.bin", 0);

    assert!(!acquirer.is_acquired(&spec), "missing file");

    std::fs::write(acquirer.artifact_path("model-a"), b"").unwrap();
    assert!(!acquirer.is_acquired(&spec), "empty file is not a valid copy");

    std::fs::write(acquirer.artifact_path("model-a"), b"data").unwrap();
    assert!(acquirer.is_acquired(&spec));
}

#[tokio::test]
async fn test_is_acquired_checks_expected_size() {
    let (acquirer, _temp_dir) = create_test_acquirer().await;
    std::fs::write(acquirer.artifact_path("model-a"), vec![0u8; 500]).unwrap();

    let matching = ArtifactSpec::new("model-a", "https://example/model-a.bin", 500);
    assert!(acquirer.is_acquired(&matching));

    let mismatched = ArtifactSpec::new("model-a", "https://example/model-a.bin", 1000);
    assert!(!acquirer.is_acquired(&mismatched));

    // Size 0 means unknown: any non-empty file counts
    let unknown = ArtifactSpec::new("model-a", "https://example/model-a.bin", 0);
    assert!(acquirer.is_acquired(&unknown));
}

#[tokio::test]
async fn test_probe_ignores_directories() {
    let (acquirer, _temp_dir) = create_test_acquirer().await;
    std::fs::create_dir(acquirer.artifact_path("model-a")).unwrap();

    let spec = ArtifactSpec::new("model-a", "https://example/model-a.bin", 0);
    assert!(!acquirer.is_acquired(&spec));
    assert!(acquirer.probe_local(&spec).await.unwrap().is_none());
}

#[tokio::test]
async fn test_artifact_path_is_identifier_under_artifacts_dir() {
    let (acquirer, _temp_dir) = create_test_acquirer().await;
    let path = acquirer.artifact_path("model-a");
    assert_eq!(path.file_name().unwrap(), "model-a");
    assert_eq!(path.parent().unwrap(), acquirer.get_config().artifacts_dir());
}
