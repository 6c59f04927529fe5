//! HTTP source against a one-shot local responder.

use std::time::Duration;

use langsync::i18n::{DictionarySource, HttpDictionarySource, Language};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// What: Answer exactly one request with `status` and `body`.
///
/// Output:
/// - Base URL of the responder and a handle yielding the raw request text
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local listener");
    let addr = listener.local_addr().expect("listener address");
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("accept connection");
        let mut buf = vec![0_u8; 4096];
        let mut request = Vec::new();
        loop {
            let n = socket.read(&mut buf).await.expect("read request");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        let response = format!(
            concat!(
                "HTTP/1.1 {}\r\n",
                "Content-Type: application/json\r\n",
                "Content-Length: {}\r\n",
                "Connection: close\r\n\r\n{}",
            ),
            status,
            body.len(),
            body
        );
        socket
            .write_all(response.as_bytes())
            .await
            .expect("write response");
        let _ = socket.shutdown().await;
        String::from_utf8_lossy(&request).into_owned()
    });
    (format!("http://{addr}"), handle)
}

fn source(base_url: &str) -> HttpDictionarySource {
    HttpDictionarySource::new(
        base_url,
        "translation",
        Duration::from_secs(2),
        Duration::from_secs(5),
    )
    .expect("client builds")
}

#[tokio::test]
async fn ok_response_is_decoded_from_expected_endpoint() {
    let (base, server) = serve_once(
        "200 OK",
        r#"{"footer":{"address":"Hanoi, Vietnam"},"nav":{"home":"Home"}}"#,
    )
    .await;
    let dictionary = source(&base)
        .fetch_dictionary(Language::En)
        .await
        .expect("fetch succeeds");
    assert_eq!(
        dictionary.lookup("footer.address"),
        Some("Hanoi, Vietnam".to_string())
    );
    assert_eq!(dictionary.len(), 2);

    let request = server.await.expect("server joins");
    assert!(request.starts_with("GET /api/language-contents/en/translation HTTP/1.1"));
    assert!(request.to_ascii_lowercase().contains("accept: application/json"));
}

#[tokio::test]
async fn error_status_is_a_network_error() {
    let (base, server) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
    let err = source(&base)
        .fetch_dictionary(Language::Vi)
        .await
        .expect_err("5xx must fail");
    assert_eq!(err.kind(), "network");
    assert!(err.to_string().contains("500"));
    let _ = server.await;
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let (base, server) = serve_once("200 OK", "not json").await;
    let err = source(&base)
        .fetch_dictionary(Language::Vi)
        .await
        .expect_err("malformed body must fail");
    assert_eq!(err.kind(), "decode");
    let _ = server.await;
}

#[tokio::test]
async fn non_object_body_is_a_decode_error() {
    let (base, server) = serve_once("200 OK", r#"["a","b"]"#).await;
    let err = source(&base)
        .fetch_dictionary(Language::En)
        .await
        .expect_err("array body must fail");
    assert_eq!(err.kind(), "decode");
    let _ = server.await;
}

#[tokio::test]
async fn refused_connection_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind local listener");
    let addr = listener.local_addr().expect("listener address");
    drop(listener);

    let err = source(&format!("http://{addr}"))
        .fetch_dictionary(Language::En)
        .await
        .expect_err("closed port must fail");
    assert_eq!(err.kind(), "network");
}
