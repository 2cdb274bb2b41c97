use super::*;
use crate::error::ErrorKind;
use crate::types::Phase;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_download_success_publishes_and_reaches_ready() {
    let (acquirer, _temp_dir) = create_test_acquirer().await;
    let mock_server = MockServer::start().await;

    let body = vec![0x5a_u8; 1000];
    Mock::given(method("GET"))
        .and(path("/model-a.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&mock_server)
        .await;

    let spec = model_a_spec(&mock_server.uri(), 1000);
    let mut events = acquirer.subscribe();

    let result_path = acquirer.ensure_ready(&spec).await.unwrap();

    assert_eq!(result_path, acquirer.artifact_path("model-a"));
    assert_eq!(std::fs::read(&result_path).unwrap(), body);
    assert_eq!(acquirer.current_phase("model-a"), Phase::Ready);
    assert_eq!(acquirer.current_progress("model-a"), Some(1.0));
    assert_temp_dir_clean(&acquirer);

    let status = acquirer.status("model-a").unwrap();
    assert_eq!(status.local_path, Some(result_path));
    assert_eq!(status.bytes_transferred, 1000);
    assert_eq!(status.bytes_expected, 1000);
    assert!(status.last_error.is_none());

    // Progress observations form a non-decreasing sequence ending at the
    // full size, and the terminal event reports a non-cached Ready
    let events = drain_events(&mut events);
    let mut last_transferred = 0;
    let mut progress_seen = 0;
    for event in &events {
        if let Event::Progress {
            bytes_transferred, ..
        } = event
        {
            assert!(
                *bytes_transferred >= last_transferred,
                "progress went backwards: {} after {}",
                bytes_transferred,
                last_transferred
            );
            last_transferred = *bytes_transferred;
            progress_seen += 1;
        }
    }
    assert!(progress_seen >= 1, "at least one progress observation");
    assert_eq!(last_transferred, 1000);
    assert!(events.iter().any(
        |e| matches!(e, Event::Ready { identifier, from_cache, .. } if identifier == "model-a" && !from_cache)
    ));
}

#[tokio::test]
async fn test_not_found_fails_and_leaves_no_trace() {
    let (acquirer, _temp_dir) = create_test_acquirer().await;
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/model-a.bin"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let spec = model_a_spec(&mock_server.uri(), 1000);
    let mut events = acquirer.subscribe();

    let err = acquirer.ensure_ready(&spec).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TransferFailed);
    assert!(!acquirer.artifact_path("model-a").exists());
    assert_temp_dir_clean(&acquirer);
    assert_eq!(acquirer.current_phase("model-a"), Phase::Failed);

    let status = acquirer.status("model-a").unwrap();
    assert!(status.local_path.is_none());
    assert!(status.last_error.as_deref().unwrap().contains("404"));

    let events = drain_events(&mut events);
    assert!(events
        .iter()
        .any(|e| matches!(e, Event::Failed { identifier, .. } if identifier == "model-a")));
}

#[tokio::test]
async fn test_existing_valid_artifact_short_circuits_without_network() {
    let (acquirer, _temp_dir) = create_test_acquirer().await;
    let mock_server = MockServer::start().await;

    // Any request against the server would violate the idempotence guarantee
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let canonical = acquirer.artifact_path("model-a");
    std::fs::write(&canonical, vec![0x11_u8; 1000]).unwrap();

    let spec = model_a_spec(&mock_server.uri(), 1000);
    let mut events = acquirer.subscribe();

    let path = acquirer.ensure_ready(&spec).await.unwrap();
    assert_eq!(path, canonical);
    assert_eq!(acquirer.current_phase("model-a"), Phase::Ready);

    // Repeated calls on an acquired artifact never re-download
    let path = acquirer.ensure_ready(&spec).await.unwrap();
    assert_eq!(path, canonical);

    let events = drain_events(&mut events);
    assert!(events.iter().any(
        |e| matches!(e, Event::Ready { from_cache, .. } if *from_cache)
    ));
    // mock_server verifies the zero-request expectation on drop
}

#[tokio::test]
async fn test_existing_artifact_with_wrong_size_is_replaced() {
    let (acquirer, _temp_dir) = create_test_acquirer().await;
    let mock_server = MockServer::start().await;

    let body = vec![0x22_u8; 1000];
    Mock::given(method("GET"))
        .and(path("/model-a.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Stale copy: non-empty but disagrees with the expected size
    let canonical = acquirer.artifact_path("model-a");
    std::fs::write(&canonical, vec![0x22_u8; 500]).unwrap();

    let spec = model_a_spec(&mock_server.uri(), 1000);
    let path = acquirer.ensure_ready(&spec).await.unwrap();

    assert_eq!(std::fs::metadata(&path).unwrap().len(), 1000);
    assert_eq!(std::fs::read(&path).unwrap(), body);
}

#[tokio::test]
async fn test_truncated_body_is_a_size_mismatch() {
    let (acquirer, _temp_dir) = create_test_acquirer().await;
    let mock_server = MockServer::start().await;

    // Server delivers fewer bytes than the spec promises
    Mock::given(method("GET"))
        .and(path("/model-a.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x33_u8; 400]))
        .mount(&mock_server)
        .await;

    let spec = model_a_spec(&mock_server.uri(), 1000);
    let err = acquirer.ensure_ready(&spec).await.unwrap_err();

    match err {
        crate::error::Error::SizeMismatch { expected, actual } => {
            assert_eq!(expected, 1000);
            assert_eq!(actual, 400);
        }
        other => panic!("expected SizeMismatch, got {:?}", other),
    }
    assert!(!acquirer.artifact_path("model-a").exists());
    assert_temp_dir_clean(&acquirer);
}

#[tokio::test]
async fn test_failed_attempt_preserves_previous_artifact() {
    let (acquirer, _temp_dir) = create_test_acquirer().await;
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/model-a.bin"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    // Previous content at the canonical path; spec expects a different size
    // so the probe rejects it and a (failing) transfer is attempted
    let canonical = acquirer.artifact_path("model-a");
    let previous = b"previous valid artifact content".to_vec();
    std::fs::write(&canonical, &previous).unwrap();

    let spec = model_a_spec(&mock_server.uri(), 1000);
    let err = acquirer.ensure_ready(&spec).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::TransferFailed);
    assert_eq!(
        std::fs::read(&canonical).unwrap(),
        previous,
        "canonical path must be byte-for-byte unchanged after a failed attempt"
    );
    assert_temp_dir_clean(&acquirer);
}

#[tokio::test]
async fn test_write_failure_fails_cleanly_and_preserves_previous_artifact() {
    let (acquirer, _temp_dir) = create_test_acquirer().await;
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/model-a.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x88_u8; 1000]))
        .mount(&mock_server)
        .await;

    // Previous content the probe rejects (wrong size), forcing a transfer
    let canonical = acquirer.artifact_path("model-a");
    let previous = b"previous valid artifact content".to_vec();
    std::fs::write(&canonical, &previous).unwrap();

    // A plain file where the temp directory should be makes every temp file
    // creation fail
    let temp_dir = acquirer.get_config().temp_dir().clone();
    std::fs::remove_dir_all(&temp_dir).unwrap();
    std::fs::write(&temp_dir, b"").unwrap();

    let spec = model_a_spec(&mock_server.uri(), 1000);
    let err = acquirer.ensure_ready(&spec).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Io);
    assert_eq!(acquirer.current_phase("model-a"), Phase::Failed);
    assert_eq!(
        std::fs::read(&canonical).unwrap(),
        previous,
        "canonical path must be byte-for-byte unchanged after a write failure"
    );

    std::fs::remove_file(&temp_dir).unwrap();
    std::fs::create_dir(&temp_dir).unwrap();
    assert_temp_dir_clean(&acquirer);
}

#[tokio::test]
async fn test_invalid_source_rejected_before_any_activity() {
    let (acquirer, _temp_dir) = create_test_acquirer().await;

    let spec = ArtifactSpec::new("model-a", "not a url", 0);
    let err = acquirer.ensure_ready(&spec).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSource);

    // Precondition failures never enter the state machine
    assert_eq!(acquirer.current_phase("model-a"), Phase::Idle);
    assert!(acquirer.status("model-a").is_none());
}

#[tokio::test]
async fn test_unknown_size_download_with_indeterminate_progress() {
    let (acquirer, _temp_dir) = create_test_acquirer().await;
    let mock_server = MockServer::start().await;

    let body = vec![0x44_u8; 256];
    Mock::given(method("GET"))
        .and(path("/model-a.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
        .mount(&mock_server)
        .await;

    // Expected size unknown; Content-Length still makes progress determinate
    let spec = model_a_spec(&mock_server.uri(), 0);
    let path = acquirer.ensure_ready(&spec).await.unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), body);
    assert_eq!(acquirer.current_phase("model-a"), Phase::Ready);
}

#[tokio::test]
async fn test_retry_recovers_from_server_errors() {
    use crate::config::RetryConfig;
    use std::time::Duration;

    let (acquirer, _temp_dir) = create_test_acquirer().await;
    let mock_server = MockServer::start().await;

    // Two transient failures, then success
    Mock::given(method("GET"))
        .and(path("/model-a.bin"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/model-a.bin"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x55_u8; 1000]))
        .mount(&mock_server)
        .await;

    let retry = RetryConfig {
        max_attempts: 3,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(100),
        backoff_multiplier: 2.0,
        jitter: false,
    };

    let spec = model_a_spec(&mock_server.uri(), 1000);
    let path = acquirer.ensure_ready_with_retry(&spec, &retry).await.unwrap();
    assert_eq!(std::fs::metadata(&path).unwrap().len(), 1000);
    assert_eq!(acquirer.current_phase("model-a"), Phase::Ready);
}

#[tokio::test]
async fn test_reset_after_failure_allows_new_cycle() {
    let (acquirer, _temp_dir) = create_test_acquirer().await;
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/model-a.bin"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let spec = model_a_spec(&mock_server.uri(), 1000);
    acquirer.ensure_ready(&spec).await.unwrap_err();
    assert_eq!(acquirer.current_phase("model-a"), Phase::Failed);

    assert!(acquirer.reset("model-a"));
    assert_eq!(acquirer.current_phase("model-a"), Phase::Idle);
    assert!(acquirer.status("model-a").unwrap().last_error.is_none());

    // Resetting an idle artifact is a no-op
    assert!(!acquirer.reset("model-a"));
    assert!(!acquirer.reset("never-requested"));
}
