//! Tests for the caller-side retry policy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use devicegrant::error::{DeviceFlowError, ServerFailure};
use devicegrant::util::retry::RetryPolicy;

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(100),
        max_backoff: Duration::from_millis(100),
        multiplier: 2.0,
    }
}

#[tokio::test(start_paused = true)]
async fn retry_policy_retries_transport_errors_until_success() {
    let policy = fast_policy(4);
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_for_task = attempts.clone();

    let task = tokio::spawn(async move {
        policy
            .execute(|| {
                let attempts = attempts_for_task.clone();
                async move {
                    let attempt = attempts.fetch_add(1, Ordering::SeqCst);
                    if attempt < 2 {
                        Err(DeviceFlowError::Transport("connection refused".to_string()))
                    } else {
                        Ok::<_, DeviceFlowError>("ok")
                    }
                }
            })
            .await
    });

    tokio::task::yield_now().await;
    tokio::time::advance(Duration::from_secs(1)).await;
    let result = task.await.unwrap();

    assert_eq!(result.unwrap(), "ok");
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn retry_policy_stops_immediately_for_authoritative_failures() {
    let policy = fast_policy(5);
    let attempts = Arc::new(AtomicUsize::new(0));

    let result = policy
        .execute(|| {
            let attempts = attempts.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(DeviceFlowError::Server(ServerFailure::status(400, "bad client")))
            }
        })
        .await;

    match result {
        Err(DeviceFlowError::Server(failure)) => assert_eq!(failure.status, 400),
        other => panic!("expected server error, got {other:?}"),
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn retry_policy_returns_last_error_when_attempts_are_exhausted() {
    let policy = fast_policy(3);
    let attempts = Arc::new(AtomicUsize::new(0));
    let attempts_for_task = attempts.clone();

    let task = tokio::spawn(async move {
        policy
            .execute(|| {
                let attempts = attempts_for_task.clone();
                async move {
                    let n = attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(DeviceFlowError::Server(ServerFailure::status(
                        503,
                        format!("unavailable {n}"),
                    )))
                }
            })
            .await
    });

    tokio::task::yield_now().await;
    tokio::time::advance(Duration::from_secs(1)).await;
    let result = task.await.unwrap();

    match result {
        Err(DeviceFlowError::Server(failure)) => assert_eq!(failure.body, "unavailable 2"),
        other => panic!("expected server error, got {other:?}"),
    }
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn retry_policy_none_runs_operation_once() {
    let attempts = Arc::new(AtomicUsize::new(0));

    let result = RetryPolicy::none()
        .execute(|| {
            let attempts = attempts.clone();
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(DeviceFlowError::Transport("timeout".to_string()))
            }
        })
        .await;

    assert!(matches!(result, Err(DeviceFlowError::Transport(_))));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}
