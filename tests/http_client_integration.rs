//! Integration tests for the HTTP fetch client.
//!
//! These tests verify the fetch flow against mock HTTP servers.

use std::time::Duration;

use media_backup::backup::{DownloadError, Fetch, HttpClient};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create a mock server with a file endpoint.
async fn setup_mock_file(path_str: &str, status: u16, content: &[u8]) -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(path_str))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(content.to_vec()))
        .mount(&mock_server)
        .await;

    mock_server
}

#[tokio::test]
async fn test_fetch_writes_body_unchanged() {
    let content = b"\x89PNG\r\n\x1a\n not really a png, not validated";
    let server = setup_mock_file("/img/photo.png", 200, content).await;
    let dir = TempDir::new().expect("failed to create temp dir");
    let dest = dir.path().join("photo.png");

    let client = HttpClient::new().expect("client");
    let url = format!("{}/img/photo.png", server.uri());
    let written = client.fetch_to_file(&url, &dest).await.expect("fetch");

    assert_eq!(written, content.len() as u64);
    assert_eq!(std::fs::read(&dest).expect("read"), content);
}

#[tokio::test]
async fn test_fetch_non_200_is_status_error_and_leaves_no_file() {
    let server = setup_mock_file("/gone.png", 404, b"not found").await;
    let dir = TempDir::new().expect("failed to create temp dir");
    let dest = dir.path().join("gone.png");

    let client = HttpClient::new().expect("client");
    let err = client
        .fetch_to_file(&format!("{}/gone.png", server.uri()), &dest)
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(404));
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_fetch_other_2xx_is_not_success() {
    let server = setup_mock_file("/empty.png", 204, b"").await;
    let dir = TempDir::new().expect("failed to create temp dir");

    let client = HttpClient::new().expect("client");
    let err = client
        .fetch_to_file(
            &format!("{}/empty.png", server.uri()),
            &dir.path().join("empty.png"),
        )
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(204));
}

#[tokio::test]
async fn test_fetch_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.mp4"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"late".to_vec())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    let dir = TempDir::new().expect("failed to create temp dir");
    let dest = dir.path().join("slow.mp4");

    let client = HttpClient::with_timeout(Duration::from_millis(200)).expect("client");
    let err = client
        .fetch_to_file(&format!("{}/slow.mp4", server.uri()), &dest)
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::Timeout { .. }), "got {err:?}");
    assert!(!dest.exists());
}

/// Serves one response whose body arrives a byte at a time, `gap` apart.
async fn serve_trickled_body(body: &'static [u8], gap: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 1024];
        let _ = socket.read(&mut request).await.unwrap();
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        for byte in body {
            tokio::time::sleep(gap).await;
            // The client may have hung up already.
            if socket.write_all(&[*byte]).await.is_err() {
                return;
            }
        }
    });
    format!("http://{addr}/movie.mp4")
}

#[tokio::test]
async fn test_slow_but_live_body_outlasts_timeout() {
    let url = serve_trickled_body(b"frames", Duration::from_millis(400)).await;
    let dir = TempDir::new().expect("failed to create temp dir");
    let dest = dir.path().join("movie.mp4");

    // Total transfer takes ~2.4s; no single read waits longer than 400ms.
    let client = HttpClient::with_timeout(Duration::from_secs(1)).expect("client");
    let written = client.fetch_to_file(&url, &dest).await.expect("fetch");

    assert_eq!(written, 6);
    assert_eq!(std::fs::read(&dest).expect("read"), b"frames");
}

#[tokio::test]
async fn test_stalled_body_times_out() {
    let url = serve_trickled_body(b"ab", Duration::from_secs(3)).await;
    let dir = TempDir::new().expect("failed to create temp dir");
    let dest = dir.path().join("movie.mp4");

    let client = HttpClient::with_timeout(Duration::from_millis(300)).expect("client");
    let err = client.fetch_to_file(&url, &dest).await.unwrap_err();

    assert!(matches!(err, DownloadError::Timeout { .. }), "got {err:?}");
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_fetch_size_cap_removes_partial_file() {
    let server = setup_mock_file("/big.pdf", 200, &[7u8; 4096]).await;
    let dir = TempDir::new().expect("failed to create temp dir");
    let dest = dir.path().join("big.pdf");

    let client = HttpClient::new()
        .expect("client")
        .with_max_bytes(Some(1024));
    let err = client
        .fetch_to_file(&format!("{}/big.pdf", server.uri()), &dest)
        .await
        .unwrap_err();

    assert!(matches!(err, DownloadError::TooLarge { limit: 1024, .. }));
    assert!(!dest.exists());
}

#[tokio::test]
async fn test_fetch_rejects_non_http_urls() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let client = HttpClient::new().expect("client");

    for url in ["ftp://host/a.png", "not a url", "mailto:someone@host.png"] {
        let err = client
            .fetch_to_file(url, &dir.path().join("a.png"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, DownloadError::InvalidUrl { .. }),
            "{url}: {err:?}"
        );
    }
}

#[tokio::test]
async fn test_fetch_connection_refused_is_network_error() {
    let dir = TempDir::new().expect("failed to create temp dir");
    let client = HttpClient::with_timeout(Duration::from_secs(2)).expect("client");
    // Port 9 (discard) is essentially never listening on test hosts.
    let err = client
        .fetch_to_file("http://127.0.0.1:9/a.png", &dir.path().join("a.png"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DownloadError::Network { .. } | DownloadError::Timeout { .. }
    ));
}
