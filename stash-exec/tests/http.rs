use std::collections::BTreeMap;
use std::time::Duration;

use stash_exec::executor::{HttpClient, HttpError, HttpRequestParts, ReqwestHttpClient};
use stash_exec::RunnerConfig;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serves exactly one connection with a canned response and hands back the
/// raw request it read.
async fn one_shot_server(reply: Option<String>) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            raw.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&raw).to_string();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let len = text[..head_end]
                    .lines()
                    .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(|v| v.trim().parse::<usize>().unwrap()))
                    .unwrap_or(0);
                if raw.len() >= head_end + 4 + len {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }
        let _ = tx.send(String::from_utf8_lossy(&raw).to_string());
        match reply {
            Some(reply) => {
                socket.write_all(reply.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
            None => tokio::time::sleep(Duration::from_secs(5)).await,
        }
    });
    (format!("http://{addr}"), rx)
}

fn request(method: &str, url: &str, body: Option<&str>) -> HttpRequestParts {
    let mut headers = BTreeMap::new();
    headers.insert("X-Trace".to_string(), "abc".to_string());
    HttpRequestParts {
        method: method.to_string(),
        url: url::Url::parse(url).unwrap(),
        headers,
        body: body.map(|b| b.as_bytes().to_vec()),
        insecure_tls: false,
    }
}

fn client() -> ReqwestHttpClient {
    ReqwestHttpClient::new(&RunnerConfig::default()).unwrap()
}

#[tokio::test]
async fn sends_request_and_reads_response() {
    let (base, seen) = one_shot_server(Some(
        "HTTP/1.1 201 Created\r\nContent-Type: application/json\r\nContent-Length: 11\r\n\r\n{\"id\":\"7\"}\n".into(),
    ))
    .await;

    let resp = client()
        .send(request("POST", &format!("{base}/items"), Some("{\"a\":1}")), Some(Duration::from_secs(5)), 1024)
        .await
        .unwrap();
    assert_eq!(resp.status, 201);
    assert_eq!(resp.content_type(), Some("application/json"));
    assert_eq!(resp.body, b"{\"id\":\"7\"}\n");

    let raw = seen.await.unwrap();
    assert!(raw.starts_with("POST /items HTTP/1.1\r\n"), "{raw}");
    assert!(raw.to_ascii_lowercase().contains("x-trace: abc"));
    assert!(raw.ends_with("{\"a\":1}"));
}

#[tokio::test]
async fn redirects_are_returned_not_followed() {
    let (base, _) = one_shot_server(Some(
        "HTTP/1.1 302 Found\r\nLocation: /elsewhere\r\nContent-Length: 0\r\n\r\n".into(),
    ))
    .await;
    let resp = client()
        .send(request("GET", &format!("{base}/old"), None), None, 1024)
        .await
        .unwrap();
    assert_eq!(resp.status, 302);
    assert_eq!(resp.header("location"), Some("/elsewhere"));
}

#[tokio::test]
async fn slow_server_times_out() {
    let (base, _) = one_shot_server(None).await;
    let err = client()
        .send(request("GET", &base, None), Some(Duration::from_millis(100)), 1024)
        .await
        .unwrap_err();
    assert_eq!(err, HttpError::Timeout);
}

#[tokio::test]
async fn refused_connection_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = client()
        .send(request("GET", &format!("http://{addr}/"), None), Some(Duration::from_secs(5)), 1024)
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Network(_)), "{err:?}");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let body = "x".repeat(2048);
    let (base, _) = one_shot_server(Some(format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    )))
    .await;
    let err = client()
        .send(request("GET", &base, None), None, 1024)
        .await
        .unwrap_err();
    assert_eq!(err, HttpError::ResponseTooLarge { max_bytes: 1024 });
}

#[tokio::test]
async fn invalid_method_is_not_sent() {
    let err = client()
        .send(request("GE T", "http://127.0.0.1:9/", None), None, 1024)
        .await
        .unwrap_err();
    assert!(matches!(err, HttpError::Other(_)));
}
