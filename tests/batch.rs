//! Batch semantics end to end: ordering, partial failure, file output,
//! session lifecycle.

use mockito::Matcher;

use yarntts::{BatchMode, Error, RetryConfig, SpeechRequest, YarnTts};

/// Route client traces through the test harness; `RUST_LOG=yarntts=debug`
/// shows the batch dispatch while debugging a failure.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fast_retry(max_retries: u32) -> RetryConfig {
    RetryConfig::new()
        .max_retries(max_retries)
        .backoff_factor(1.0)
        .max_backoff_secs(0.001)
        .jitter(false)
}

fn client_for(server: &mockito::ServerGuard, retry: RetryConfig) -> YarnTts {
    init_tracing();
    YarnTts::builder()
        .api_key("test-key")
        .base_url(server.url())
        .retry_config(retry)
        .build()
        .expect("client should build")
}

#[tokio::test]
async fn concurrent_batch_results_are_in_submission_order() {
    let mut server = mockito::Server::new_async().await;
    let mut mocks = Vec::new();
    for i in 0..10 {
        let mock = server
            .mock("POST", "/tts")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "text": format!("item {}", i)
            })))
            .with_status(200)
            .with_body(format!("audio-{}", i))
            .expect(1)
            .create_async()
            .await;
        mocks.push(mock);
    }

    let client = client_for(&server, fast_retry(0));
    let requests: Vec<SpeechRequest> = (0..10)
        .map(|i| SpeechRequest::new(format!("item {}", i)))
        .collect();

    let result = client
        .synthesize_batch(&requests, BatchMode::Concurrent { max_concurrency: 10 })
        .await;

    assert_eq!(result.len(), 10);
    assert!(result.all_succeeded());
    for (i, item) in result.iter().enumerate() {
        assert_eq!(item.index, i);
        let audio = item.outcome.as_ref().expect("item should succeed");
        assert_eq!(audio.data, format!("audio-{}", i).into_bytes());
    }
    for mock in mocks {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn sequential_batch_matches_concurrent_semantics() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/tts")
        .with_status(200)
        .with_body("audio")
        .expect(3)
        .create_async()
        .await;

    let client = client_for(&server, fast_retry(0));
    let requests: Vec<SpeechRequest> =
        (0..3).map(|i| SpeechRequest::new(format!("s{}", i))).collect();

    let result = client
        .synthesize_batch(&requests, BatchMode::Sequential)
        .await;

    assert_eq!(result.len(), 3);
    assert!(result.all_succeeded());
    mock.assert_async().await;
}

#[tokio::test]
async fn invalid_items_fail_locally_without_aborting_siblings() {
    let mut server = mockito::Server::new_async().await;
    // Only the three valid items may produce traffic, with no retries.
    let mock = server
        .mock("POST", "/tts")
        .with_status(200)
        .with_body("audio")
        .expect(3)
        .create_async()
        .await;

    let client = client_for(&server, fast_retry(3));
    let requests = vec![
        SpeechRequest::new("first"),
        SpeechRequest::new("second"),
        SpeechRequest::new(""),                // invalid: empty
        SpeechRequest::new("fourth"),
        SpeechRequest::new("a".repeat(2001)), // invalid: oversized
    ];

    let result = client
        .synthesize_batch(&requests, BatchMode::concurrent())
        .await;

    assert_eq!(result.len(), 5);
    assert_eq!(result.success_count(), 3);
    assert_eq!(result.failure_count(), 2);
    for index in [0usize, 1, 3] {
        assert!(result.get(index).unwrap().is_ok(), "item {} should succeed", index);
    }
    for index in [2usize, 4] {
        assert!(
            matches!(result.get(index), Some(Err(Error::Validation { .. }))),
            "item {} should be a validation failure",
            index
        );
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn failing_item_keeps_its_own_slot_only() {
    let mut server = mockito::Server::new_async().await;
    let _ok = server
        .mock("POST", "/tts")
        .match_body(Matcher::PartialJson(serde_json::json!({"text": "good"})))
        .with_status(200)
        .with_body("audio")
        .expect(2)
        .create_async()
        .await;
    let _denied = server
        .mock("POST", "/tts")
        .match_body(Matcher::PartialJson(serde_json::json!({"text": "denied"})))
        .with_status(402)
        .with_body(r#"{"error": "payment required"}"#)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server, fast_retry(2));
    let requests = vec![
        SpeechRequest::new("good"),
        SpeechRequest::new("denied"),
        SpeechRequest::new("good"),
    ];

    let result = client
        .synthesize_batch(&requests, BatchMode::Sequential)
        .await;

    assert_eq!(result.len(), 3);
    assert!(result.get(0).unwrap().is_ok());
    assert!(matches!(
        result.get(1),
        Some(Err(Error::PaymentRequired { .. }))
    ));
    assert!(result.get(2).unwrap().is_ok());
}

#[tokio::test]
async fn batch_to_files_writes_one_file_per_item() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/tts")
        .with_status(200)
        .with_body("bytes")
        .expect(3)
        .create_async()
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let client = client_for(&server, fast_retry(0));
    let requests: Vec<SpeechRequest> =
        (0..3).map(|i| SpeechRequest::new(format!("f{}", i))).collect();

    let result = client
        .synthesize_batch_to_files(&requests, dir.path(), "audio", BatchMode::concurrent())
        .await
        .expect("output directory should be writable");

    assert!(result.all_succeeded());
    for i in 0..3 {
        let path = dir.path().join(format!("audio_{}.mp3", i));
        assert!(path.is_file(), "{} should exist", path.display());
        assert_eq!(std::fs::read(&path).unwrap(), b"bytes");
    }
}

#[tokio::test]
async fn synthesize_to_file_creates_parent_directories() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/tts")
        .with_status(200)
        .with_body("bytes")
        .create_async()
        .await;

    let dir = tempfile::tempdir().expect("tempdir");
    let target = dir.path().join("nested/deeper/out.mp3");
    let client = client_for(&server, fast_retry(0));

    let written = client
        .synthesize_to_file(&SpeechRequest::new("hello"), &target)
        .await
        .expect("file synthesis failed");

    assert_eq!(written, target);
    assert_eq!(std::fs::read(&target).unwrap(), b"bytes");
}

#[tokio::test]
async fn close_is_idempotent() {
    let server = mockito::Server::new_async().await;
    let client = client_for(&server, fast_retry(0));
    assert!(!client.is_closed());
    client.close();
    client.close();
    assert!(client.is_closed());
}

#[tokio::test]
#[should_panic(expected = "used after close")]
async fn use_after_close_fails_fast() {
    let server = mockito::Server::new_async().await;
    let client = client_for(&server, fast_retry(0));
    client.close();
    let _ = client.synthesize(&SpeechRequest::new("hi")).await;
}

#[tokio::test]
async fn cancelled_batch_preserves_completed_items() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/tts")
        .with_status(200)
        .with_body("audio")
        .create_async()
        .await;

    let client = client_for(&server, fast_retry(0));
    let requests: Vec<SpeechRequest> =
        (0..3).map(|i| SpeechRequest::new(format!("c{}", i))).collect();

    // Cancel before dispatch: every slot still gets a result.
    let handle = yarntts::CancelHandle::new();
    handle.cancel();
    let result = client
        .synthesize_batch_cancellable(&requests, BatchMode::Sequential, &handle)
        .await;

    assert_eq!(result.len(), 3);
    for item in result.iter() {
        assert!(matches!(item.outcome, Err(Error::Cancelled)));
    }
}
