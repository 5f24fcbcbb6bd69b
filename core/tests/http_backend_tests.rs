/// HttpBackend wire tests against a local hyper stub server
extern crate cipherchat_core;

use bytes::Bytes;
use cipherchat_core::api::SendRequest;
use cipherchat_core::backend::{Backend, HttpBackend};
use cipherchat_core::clipboard::MemoryClipboard;
use cipherchat_core::controller::ChatController;
use cipherchat_core::model::{Author, Sender};
use cipherchat_core::view::ChatView;
use cipherchat_core::ChatError;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::CONTENT_TYPE;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    content_type: Option<String>,
    body: String,
}

type Routes = Vec<(&'static str, StatusCode, &'static str)>;

/// Serve canned answers by path and record every request
async fn spawn_stub(routes: Routes) -> (String, Arc<Mutex<Vec<Recorded>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let routes = Arc::new(routes);

    let server_log = log.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let io = TokioIo::new(stream);
            let log = server_log.clone();
            let routes = routes.clone();
            tokio::spawn(async move {
                let svc = service_fn(move |req: Request<Incoming>| {
                    let log = log.clone();
                    let routes = routes.clone();
                    async move {
                        let method = req.method().to_string();
                        let path = req.uri().path().to_string();
                        let content_type = req
                            .headers()
                            .get(CONTENT_TYPE)
                            .and_then(|v| v.to_str().ok())
                            .map(String::from);
                        let body = req
                            .into_body()
                            .collect()
                            .await
                            .map(|b| b.to_bytes())
                            .unwrap_or_default();
                        log.lock().unwrap().push(Recorded {
                            method,
                            path: path.clone(),
                            content_type,
                            body: String::from_utf8_lossy(&body).into_owned(),
                        });

                        let (status, text) = routes
                            .iter()
                            .find(|(p, _, _)| *p == path)
                            .map(|(_, s, t)| (*s, *t))
                            .unwrap_or((StatusCode::NOT_FOUND, "Not found"));
                        Ok::<_, Infallible>(
                            Response::builder()
                                .status(status)
                                .body(Full::new(Bytes::from(text)))
                                .unwrap(),
                        )
                    }
                });
                let _ = http1::Builder::new().serve_connection(io, svc).await;
            });
        }
    });

    (format!("http://{}", addr), log)
}

#[tokio::test]
async fn test_send_posts_json_payload() {
    let (url, log) = spawn_stub(vec![(
        "/api/send",
        StatusCode::OK,
        r#"{"bundle":"XYZ","decrypted":"hi there","from":"alice"}"#,
    )])
    .await;
    let backend = HttpBackend::new(url);

    let response = backend
        .send(&SendRequest {
            sender: Sender::Alice,
            plaintext: "hello".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(response.bundle.as_deref(), Some("XYZ"));
    assert_eq!(response.decrypted.as_deref(), Some("hi there"));

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log[0].method, "POST");
    assert_eq!(log[0].path, "/api/send");
    assert_eq!(log[0].content_type.as_deref(), Some("application/json"));
    let body: serde_json::Value = serde_json::from_str(&log[0].body).unwrap();
    assert_eq!(body, serde_json::json!({"sender": "alice", "plaintext": "hello"}));
}

#[tokio::test]
async fn test_non_success_status_returns_raw_body() {
    let (url, _log) = spawn_stub(vec![(
        "/api/send",
        StatusCode::TOO_MANY_REQUESTS,
        "rate limited",
    )])
    .await;
    let backend = HttpBackend::new(url);

    let err = backend
        .send(&SendRequest {
            sender: Sender::Bob,
            plaintext: "hello".to_string(),
        })
        .await
        .unwrap_err();

    match err {
        ChatError::Backend(body) => assert_eq!(body, "rate limited"),
        other => panic!("expected backend error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_regenerate_keys_posts_without_body() {
    let (url, log) = spawn_stub(vec![(
        "/api/regenerate-keys",
        StatusCode::OK,
        r#"{"status":"keys regenerated"}"#,
    )])
    .await;
    let backend = HttpBackend::new(format!("{}/", url));

    backend.regenerate_keys().await.unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log[0].method, "POST");
    assert_eq!(log[0].path, "/api/regenerate-keys");
    assert!(log[0].body.is_empty());
    assert!(log[0].content_type.is_none());
}

#[tokio::test]
async fn test_keys_fetch_parses_partial_body() {
    let (url, log) = spawn_stub(vec![(
        "/api/keys",
        StatusCode::OK,
        r#"{"alice_pub":"AP","bob_priv":"BK"}"#,
    )])
    .await;
    let backend = HttpBackend::new(url);

    let keys = backend.keys().await.unwrap();

    assert_eq!(keys.alice_pub.as_deref(), Some("AP"));
    assert_eq!(keys.alice_priv, None);
    assert_eq!(keys.bob_priv.as_deref(), Some("BK"));
    assert_eq!(log.lock().unwrap()[0].method, "GET");
}

#[tokio::test]
async fn test_invalid_json_is_serialization_error() {
    let (url, _log) = spawn_stub(vec![("/api/keys", StatusCode::OK, "<html>oops</html>")]).await;
    let backend = HttpBackend::new(url);

    let err = backend.keys().await.unwrap_err();
    assert!(matches!(err, ChatError::Serialization(_)));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Grab a free port, then close it again
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = HttpBackend::new(format!("http://{}", addr));
    let err = backend.regenerate_keys().await.unwrap_err();

    assert!(matches!(err, ChatError::Transport(_)));
    assert!(!err.to_string().is_empty());
}

#[tokio::test]
async fn test_controller_round_trip_over_http() {
    let (url, log) = spawn_stub(vec![(
        "/api/send",
        StatusCode::OK,
        r#"{"bundle":"{\"ciphertext\":\"abc\"}","decrypted":"hello"}"#,
    )])
    .await;
    let backend = HttpBackend::new(url);
    let mut chat = ChatController::new(ChatView::new(Sender::Bob), MemoryClipboard::new());

    chat.view_mut().input.set("hello");
    let request = chat.submit();
    chat.drive(request, &backend).await;

    let view = chat.view();
    assert_eq!(view.messages.len(), 2);
    let reply = view.messages.last().unwrap();
    assert_eq!(reply.author, Author::Them);
    assert_eq!(reply.text, "hello");
    assert_eq!(reply.sidecar, r#"{"ciphertext":"abc"}"#);
    assert!(view.send_button.enabled);

    let body: serde_json::Value = serde_json::from_str(&log.lock().unwrap()[0].body).unwrap();
    assert_eq!(body["sender"], "bob");
}

#[tokio::test]
async fn test_unknown_path_surfaces_not_found_body() {
    let (url, _log) = spawn_stub(Vec::new()).await;
    let backend = HttpBackend::new(url);
    let mut chat = ChatController::new(ChatView::default(), MemoryClipboard::new());

    let request = chat.show_keys();
    chat.drive(request, &backend).await;

    assert_eq!(chat.view().keys_view, "Error: Not found");
}
