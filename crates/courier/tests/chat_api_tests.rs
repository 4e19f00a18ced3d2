//! Integration tests for the HTTP surface
//!
//! Drives the full router via tower's oneshot with a wiremock downstream,
//! covering the response envelope, auth gating, and the UI routes.

use axum::{
    body::Body,
    http::{Request, StatusCode, header},
};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

use courier_server::auth::AuthFlow;
use courier_server::config::{AuthConfig, Config, PayloadFormat, RelayConfig, RelayMode};
use courier_server::relay::WebhookRelay;
use courier_server::web::{AppState, Dispatcher, create_router};

// =============================================================================
// Test Fixtures
// =============================================================================

const BOUNDARY: &str = "test-boundary-7MA4YWxkTrZu0gW";

fn webhook_router(server: &MockServer, auth_enabled: bool) -> axum::Router {
    let relay_config = RelayConfig {
        mode: RelayMode::Webhook,
        webhook_url: format!("{}/webhook/chat", server.uri()),
        payload: PayloadFormat::Multipart,
        timeout_secs: Some(5),
    };
    let config = Config {
        relay: relay_config.clone(),
        auth: AuthConfig {
            enabled: auth_enabled,
            ..AuthConfig::default()
        },
        ..Config::default()
    };

    let auth = auth_enabled.then(|| AuthFlow::new(config.auth.clone()));
    let state = Arc::new(AppState {
        config,
        auth,
        dispatcher: Dispatcher::Webhook(WebhookRelay::new(relay_config).unwrap()),
    });
    create_router(state)
}

/// Handcraft a multipart body with a message field and an optional file part
fn multipart_body(message: &str, file: Option<(&str, &[u8], &str)>) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"message\"\r\n\r\n{message}\r\n"
        )
        .as_bytes(),
    );
    if let Some((filename, bytes, mime)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
                 filename=\"{filename}\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn chat_request(message: &str, file: Option<(&str, &[u8], &str)>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/chat")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(message, file)))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// =============================================================================
// Chat Endpoint
// =============================================================================

#[tokio::test]
async fn test_status_check_scenario() {
    // message="status check", no file, downstream replies {"reply":"ok"}
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/webhook/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"reply": "ok"})))
        .mount(&server)
        .await;
    let app = webhook_router(&server, false);

    let response = app.oneshot(chat_request("status check", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(
        body,
        serde_json::json!({
            "status": "success",
            "message": "Message and file (if any) sent to n8n.",
            "response_from_n8n": {"reply": "ok"}
        })
    );
}

#[tokio::test]
async fn test_downstream_error_preserves_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("workflow offline"))
        .mount(&server)
        .await;
    let app = webhook_router(&server, false);

    let response = app.oneshot(chat_request("hello", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(
        body["message"],
        "Failed to send data to n8n. Status code: 503"
    );
    assert_eq!(body["n8n_response"], "workflow offline");
}

#[tokio::test]
async fn test_transport_failure_is_generic_500() {
    let server = MockServer::start().await;
    let app = webhook_router(&server, false);
    drop(server);

    let response = app.oneshot(chat_request("hello", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "An internal server error occurred.");
    // specific failure reason must not leak
    assert!(body.get("n8n_response").is_none());
}

#[tokio::test]
async fn test_file_upload_forwarded_with_mime() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("got it"))
        .mount(&server)
        .await;
    let app = webhook_router(&server, false);

    let response = app
        .oneshot(chat_request(
            "see attached",
            Some(("notes.txt", b"line one", "text/plain")),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["response_from_n8n"], "got it");

    let requests = server.received_requests().await.unwrap();
    let outbound = &requests[0].body;
    let contains = |needle: &[u8]| outbound.windows(needle.len()).any(|w| w == needle);
    assert!(contains(b"filename=\"notes.txt\""));
    assert!(contains(b"Content-Type: text/plain"));
    assert!(contains(b"line one"));
}

#[tokio::test]
async fn test_empty_message_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(matchers::method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;
    let app = webhook_router(&server, false);

    let response = app.oneshot(chat_request("", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// =============================================================================
// Auth Gating
// =============================================================================

#[tokio::test]
async fn test_chat_requires_auth_when_enabled() {
    let server = MockServer::start().await;
    let app = webhook_router(&server, true);

    let response = app.oneshot(chat_request("hello", None)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["status"], "error");
    assert_eq!(body["message"], "User not authenticated");
    // nothing may reach the webhook
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_home_redirects_to_login_when_auth_enabled() {
    let server = MockServer::start().await;
    let app = webhook_router(&server, true);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/login"
    );
}

#[tokio::test]
async fn test_home_serves_ui_when_auth_disabled() {
    let server = MockServer::start().await;
    let app = webhook_router(&server, false);

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert!(String::from_utf8_lossy(&bytes).contains("<title>Courier</title>"));
}

#[tokio::test]
async fn test_login_routes_absent_when_auth_disabled() {
    let server = MockServer::start().await;
    let app = webhook_router(&server, false);

    let response = app
        .oneshot(Request::builder().uri("/login").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_auth_route_redirects_to_provider() {
    let server = MockServer::start().await;
    let app = webhook_router(&server, true);

    let response = app
        .oneshot(Request::builder().uri("/auth").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(location.contains("response_type=code"));
    assert!(location.contains("state="));
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = MockServer::start().await;
    let app = webhook_router(&server, false);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
}
