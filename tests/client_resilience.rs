//! Resilient client against real sockets.

use serde_json::{json, Value};
use std::time::{Duration, Instant};

use booking_guard::client::{AttemptFailure, ClientError, RequestOptions, TransportError};

mod common;

#[tokio::test]
async fn test_retries_503_then_succeeds() {
    let (addr, recorder) = common::start_programmable_backend(|index| async move {
        if index < 2 {
            (503, "Service Unavailable".to_string(), Vec::new())
        } else {
            (200, r#"{"success":true,"data":{"slots":[9,10]}}"#.to_string(), Vec::new())
        }
    })
    .await;

    let config = common::client_config(addr);
    let client = common::client(&config);

    let envelope = client.get::<Value>("availability").await.unwrap();
    assert!(envelope.success);
    assert_eq!(envelope.data, Some(json!({"slots": [9, 10]})));

    let requests = recorder.lock().unwrap();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.path == "/api/v1/availability"));

    // fresh request id per attempt
    let mut ids: Vec<&str> = requests.iter().filter_map(|r| r.header("x-request-id")).collect();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn test_business_failure_is_returned_once() {
    let (addr, recorder) = common::start_fixed_backend(
        400,
        r#"{"success":false,"error":{"code":"SLOT_TAKEN","message":"Chair already booked"}}"#,
    )
    .await;

    let config = common::client_config(addr);
    let client = common::client(&config);

    let envelope = client
        .execute::<Value>("appointments", RequestOptions::post(json!({"slot": 9})).skip_auth())
        .await
        .unwrap();
    assert!(!envelope.success);
    assert_eq!(envelope.error_code(), Some("SLOT_TAKEN"));
    assert_eq!(recorder.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_contract_violation_is_not_retried() {
    let (addr, recorder) = common::start_fixed_backend(200, r#"{"ok":true}"#).await;

    let config = common::client_config(addr);
    let client = common::client(&config);

    let err = client.get::<Value>("barbers").await.unwrap_err();
    assert!(err.is_contract_violation(), "got {err:?}");
    assert_eq!(recorder.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_exhausted_retries_report_last_failure() {
    let (addr, recorder) = common::start_fixed_backend(502, "<html>Bad Gateway</html>").await;

    let config = common::client_config(addr);
    let client = common::client(&config);

    let err = client.get::<Value>("barbers").await.unwrap_err();
    match err {
        ClientError::Network { attempts, last } => {
            assert_eq!(attempts, 3);
            assert_eq!(last, AttemptFailure::Status { status: 502 });
        }
        other => panic!("expected network error, got {other:?}"),
    }
    assert_eq!(recorder.lock().unwrap().len(), 3);
}

#[tokio::test]
async fn test_hanging_backend_times_out_each_attempt() {
    let (addr, recorder) = common::start_hanging_backend().await;

    let mut config = common::client_config(addr);
    config.client.timeout_ms = 100;
    config.client.max_attempts = 2;
    let client = common::client(&config);

    let started = Instant::now();
    let err = client.get::<Value>("barbers").await.unwrap_err();
    let elapsed = started.elapsed();

    match err {
        ClientError::Network { attempts, last } => {
            assert_eq!(attempts, 2);
            assert_eq!(
                last,
                AttemptFailure::Transport(TransportError::Timeout(Duration::from_millis(100)))
            );
        }
        other => panic!("expected network error, got {other:?}"),
    }
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_secs(5));
    assert_eq!(recorder.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    // Bind then drop to get a port nobody listens on.
    let addr = {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let mut config = common::client_config(addr);
    config.client.max_attempts = 2;
    let client = common::client(&config);

    let err = client.get::<Value>("barbers").await.unwrap_err();
    assert!(err.is_network(), "got {err:?}");
}

#[tokio::test]
async fn test_429_maps_to_rate_limited_without_retry() {
    let (addr, recorder) = common::start_programmable_backend(|_| async {
        (
            429,
            r#"{"success":false,"error":{"code":"RATE_LIMITED","message":"slow down"},"retryAfter":7,"remaining":0}"#
                .to_string(),
            vec![("Retry-After".to_string(), "7".to_string())],
        )
    })
    .await;

    let config = common::client_config(addr);
    let client = common::client(&config);

    let err = client.get::<Value>("barbers").await.unwrap_err();
    match err {
        ClientError::RateLimited { retry_after_secs, remaining } => {
            assert_eq!(retry_after_secs, 7);
            assert_eq!(remaining, 0);
        }
        other => panic!("expected rate limited, got {other:?}"),
    }
    assert_eq!(recorder.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_client_headers_on_state_changing_call() {
    let (addr, recorder) = common::start_fixed_backend(200, r#"{"success":true,"data":null}"#).await;

    let config = common::client_config(addr);
    let client = common::client(&config);
    client.set_session(booking_guard::client::CsrfSession {
        header_token: "h".repeat(64),
        cookie_token: "c".repeat(64),
    });

    let envelope = client.post::<Value>("appointments", json!({"slot": 1})).await.unwrap();
    assert!(envelope.success);
    assert!(envelope.data.is_none());

    let requests = recorder.lock().unwrap();
    let request = &requests[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.header("x-csrf-token"), Some("h".repeat(64).as_str()));
    assert_eq!(request.header("cookie"), Some(format!("csrf_token={}", "c".repeat(64)).as_str()));
    assert_eq!(request.header("x-requested-with"), Some("XMLHttpRequest"));
    assert!(request.header("x-client-version").is_some());
    assert!(request.header("x-client-timestamp").is_some());
    assert_eq!(serde_json::from_slice::<Value>(&request.body).unwrap(), json!({"slot": 1}));
}
