//! Integration tests for the avatar retry policy against a real local
//! HTTP server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ripple::avatar::{AvatarFetcher, RetryPolicy};
use ripple::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn test_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        base_delay: Duration::from_millis(5),
    }
}

/// Serve HTTP on a random port, answering 500 for the first `fail_first`
/// requests and 200 afterwards. Returns the port and a request counter.
async fn start_flaky_server(fail_first: usize) -> (u16, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await;
            let response = if n <= fail_first {
                "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
            } else {
                "HTTP/1.1 200 OK\r\ncontent-length: 4\r\nconnection: close\r\n\r\nok!!"
            };
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (port, hits)
}

#[tokio::test]
async fn succeeds_within_retry_budget() {
    let (port, hits) = start_flaky_server(2).await;
    let fetcher = AvatarFetcher::with_policy(test_policy());

    let bytes = fetcher
        .fetch(&format!("http://127.0.0.1:{port}/avatar.jpg"))
        .await
        .unwrap();
    assert_eq!(bytes, b"ok!!");
    assert_eq!(hits.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn first_attempt_success_does_not_retry() {
    let (port, hits) = start_flaky_server(0).await;
    let fetcher = AvatarFetcher::with_policy(test_policy());

    fetcher
        .fetch(&format!("http://127.0.0.1:{port}/avatar.jpg"))
        .await
        .unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn reports_last_failure_after_exhausting_attempts() {
    let (port, hits) = start_flaky_server(usize::MAX).await;
    let fetcher = AvatarFetcher::with_policy(test_policy());

    let err = fetcher
        .fetch(&format!("http://127.0.0.1:{port}/avatar.jpg"))
        .await
        .unwrap_err();
    assert_eq!(hits.load(Ordering::SeqCst), 3);
    match err {
        Error::ImageFetch(reason) => assert!(reason.contains("500"), "reason: {reason}"),
        other => panic!("expected ImageFetch, got {other:?}"),
    }
}

#[tokio::test]
async fn retry_delays_grow_linearly() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let instants = Arc::new(Mutex::new(Vec::new()));
    let recorder = Arc::clone(&instants);

    // Always fail, recording when each request arrives
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            recorder.lock().unwrap().push(Instant::now());
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await;
            let _ = stream
                .write_all(
                    b"HTTP/1.1 500 Internal Server Error\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                )
                .await;
            let _ = stream.shutdown().await;
        }
    });

    let base = Duration::from_millis(100);
    let fetcher = AvatarFetcher::with_policy(RetryPolicy {
        max_attempts: 3,
        base_delay: base,
    });
    let _ = fetcher
        .fetch(&format!("http://127.0.0.1:{port}/avatar.jpg"))
        .await;

    let instants = instants.lock().unwrap();
    assert_eq!(instants.len(), 3);
    let second_gap = instants[1] - instants[0];
    let third_gap = instants[2] - instants[1];
    // 1 × base before the second attempt, 2 × base before the third
    assert!(second_gap >= base, "second gap {second_gap:?}");
    assert!(third_gap >= base * 2, "third gap {third_gap:?}");
}

#[tokio::test]
async fn connection_errors_are_retried_then_reported() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let fetcher = AvatarFetcher::with_policy(test_policy());
    let err = fetcher
        .fetch(&format!("http://127.0.0.1:{port}/avatar.jpg"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ImageFetch(_)));
}
