//! Request executor against a mock backend: success parsing, rejection
//! messages, transport failure translation.

mod common;

use std::time::Duration;

use common::{client_for, closed_port, http_response, mock_listener, serve};
use mwlocal_client::dispatch::StaticHost;
use mwlocal_client::dispatch::http::{
    BackendClient, ErrorTranslations, TransportFailure, UNKNOWN_BACKEND_ERROR,
};
use mwlocal_client::error::ClientError;
use reqwest::Method;
use serde_json::json;
use tokio::io::AsyncReadExt;

// ---------------------------------------------------------------------------
// Successful responses
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ok_response_resolves_with_json() {
    let (listener, port) = mock_listener().await;
    let server = serve(listener, vec![http_response(200, "OK", r#"{"foo": 1}"#)]);

    let value = client_for(port).get("corr/tasks/abc/").await.unwrap();
    assert_eq!(value, json!({"foo": 1}));

    let seen = server.await.unwrap();
    assert_eq!(seen[0].request_line, "GET /corr/tasks/abc/ HTTP/1.1");
    assert_eq!(seen[0].header("content-type"), Some("application/json"));
    assert!(seen[0].body.is_empty());
}

#[tokio::test]
async fn empty_success_body_resolves_with_empty_object() {
    let (listener, port) = mock_listener().await;
    let server = serve(listener, vec![http_response(200, "OK", "")]);

    let value = client_for(port).post("corr/all/proj/", None).await.unwrap();
    assert_eq!(value, json!({}));
    server.await.unwrap();
}

#[tokio::test]
async fn non_json_success_body_resolves_with_empty_object() {
    let (listener, port) = mock_listener().await;
    let server = serve(listener, vec![http_response(200, "OK", "All done")]);

    let value = client_for(port).get("other/").await.unwrap();
    assert_eq!(value, json!({}));
    server.await.unwrap();
}

#[tokio::test]
async fn body_is_sent_as_json() {
    let (listener, port) = mock_listener().await;
    let server = serve(
        listener,
        vec![http_response(200, "OK", r#"{"message": "All done!"}"#)],
    );

    let body = json!({"options": {"dpi": 600}});
    let value = client_for(port)
        .call("corr/slides/in/out/", Method::POST, Some(&body))
        .await
        .unwrap();
    assert_eq!(value["message"], "All done!");

    let seen = server.await.unwrap();
    assert!(seen[0].request_line.starts_with("POST /corr/slides/in/out/ "));
    assert_eq!(seen[0].header("content-type"), Some("application/json"));
    let sent: serde_json::Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(sent, body);
}

#[tokio::test]
async fn sanitized_endpoint_reaches_backend_encoded() {
    use mwlocal_client::endpoints::{MediaType, correct_folder};

    let (listener, port) = mock_listener().await;
    let server = serve(listener, vec![http_response(200, "OK", "{}")]);

    let endpoint = correct_folder(MediaType::Prints, r"D:\scans #1", "/out");
    client_for(port).post(&endpoint, None).await.unwrap();

    let seen = server.await.unwrap();
    assert!(
        seen[0]
            .request_line
            .contains("/corr/prints/D:%5Cscans%20%231/%2Fout/"),
        "{}",
        seen[0].request_line
    );
}

// ---------------------------------------------------------------------------
// Rejections (non-2xx)
// ---------------------------------------------------------------------------

#[tokio::test]
async fn not_found_rejects_with_backend_message() {
    let (listener, port) = mock_listener().await;
    let server = serve(
        listener,
        vec![http_response(404, "Not Found", r#"{"message": "not found"}"#)],
    );

    let err = client_for(port).get("fc/client_info/x/").await.unwrap_err();
    assert!(matches!(err, ClientError::BackendRejected { status: 404, .. }));
    assert_eq!(err.to_string(), "not found");
    server.await.unwrap();
}

#[tokio::test]
async fn unparsable_error_body_rejects_with_generic_message() {
    let (listener, port) = mock_listener().await;
    let server = serve(
        listener,
        vec![http_response(500, "Internal Server Error", "<h1>Server Error</h1>")],
    );

    let err = client_for(port).get("corr/all/p/").await.unwrap_err();
    assert_eq!(err.to_string(), UNKNOWN_BACKEND_ERROR);
    assert_eq!(err.status(), Some(500));
    server.await.unwrap();
}

#[tokio::test]
async fn error_body_without_message_rejects_with_generic_message() {
    let (listener, port) = mock_listener().await;
    let server = serve(
        listener,
        vec![http_response(422, "Unprocessable Entity", r#"{"detail": "x"}"#)],
    );

    let err = client_for(port).get("fc/photo_row/a/b/").await.unwrap_err();
    assert_eq!(err.to_string(), "Unknown backend error!");
    server.await.unwrap();
}

// ---------------------------------------------------------------------------
// Transport failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn connection_refused_names_backend_address() {
    let port = closed_port().await;
    let client = client_for(port);

    let err = client.get("corr/tasks/abc/").await.unwrap_err();
    let expected = format!("http://127.0.0.1:{port}");
    assert_eq!(err.kind(), "BackendUnreachable");
    assert_eq!(err.address(), Some(expected.as_str()));
    assert!(err.to_string().contains(&expected), "{err}");
    assert!(err.to_string().contains("Could not reach backend server"));
}

#[tokio::test]
async fn untranslated_failure_keeps_transport_message() {
    let port = closed_port().await;
    let client = client_for(port).with_translations(ErrorTranslations::empty());

    let err = client.get("x/").await.unwrap_err();
    assert!(matches!(err, ClientError::BackendUnreachable { .. }));
    assert!(!err.to_string().contains("Could not reach backend server"));
    assert!(!err.to_string().is_empty());
}

#[tokio::test]
async fn custom_translation_is_used() {
    let port = closed_port().await;
    let mut table = ErrorTranslations::default();
    table.insert(TransportFailure::Connect, "backend {address} is down");
    let client = client_for(port).with_translations(table);

    let err = client.get("x/").await.unwrap_err();
    assert_eq!(err.to_string(), format!("backend http://127.0.0.1:{port} is down"));
}

#[tokio::test]
async fn invalid_host_is_unknown_error() {
    let client = BackendClient::new(StaticHost::new("bad host name")).with_port(8000);

    let err = client.get("x/").await.unwrap_err();
    assert!(matches!(err, ClientError::Unknown(_)), "{err:?}");
    assert!(err.to_string().starts_with("Unknown error occurred: "));
}

#[tokio::test]
async fn configured_timeout_is_translated() {
    let (listener, port) = mock_listener().await;
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 4096];
        let _ = socket.read(&mut buf).await;
        // Never answer.
        tokio::time::sleep(Duration::from_secs(10)).await;
    });

    let client = client_for(port).with_timeout(Duration::from_millis(200));
    let err = client.get("slow/").await.unwrap_err();
    assert!(err.to_string().contains("did not respond in time"), "{err}");
    assert!(err.to_string().contains(&format!("127.0.0.1:{port}")));

    server.abort();
}

// ---------------------------------------------------------------------------
// Address is resolved per call
// ---------------------------------------------------------------------------

#[tokio::test]
async fn host_change_is_seen_by_next_call() {
    use std::sync::{Arc, Mutex};

    let (listener, port) = mock_listener().await;
    let server = serve(listener, vec![http_response(200, "OK", r#"{"ok": true}"#)]);

    let host = Arc::new(Mutex::new("bad host name".to_string()));
    let shared = Arc::clone(&host);
    let client = BackendClient::new(move || shared.lock().unwrap().clone()).with_port(port);

    assert!(client.get("ping/").await.is_err());

    *host.lock().unwrap() = "127.0.0.1".to_string();
    assert_eq!(client.address().as_str(), format!("http://127.0.0.1:{port}"));
    assert_eq!(client.get("ping/").await.unwrap(), json!({"ok": true}));
    server.await.unwrap();
}
