//! HTTP gateway tests using wiremock.
//!
//! These tests mock the assistant backend to verify authorization, error
//! classification, and request shapes.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use wolfchat::auth::{AuthSession, MemoryCredentialStore, StoredCredentials};
use wolfchat::config::ApiConfig;
use wolfchat::gateway::{
    AuthApi, ChatApi, HttpGateway, PdfDocument, SourceScope, SpeechApi, User,
};
use wolfchat::recording::AudioBlob;
use wolfchat::ChatError;

fn logged_in_session() -> AuthSession {
    let store = MemoryCredentialStore::with_credentials(StoredCredentials {
        token: "token-123".into(),
        user: User {
            name: "Ada".into(),
            email: "ada@example.com".into(),
        },
    });
    let session = AuthSession::new(Arc::new(store));
    session.restore().unwrap();
    session
}

fn gateway(uri: &str, session: &AuthSession) -> HttpGateway {
    let config = ApiConfig {
        base_url: uri.to_string(),
        timeout_secs: 5,
    };
    HttpGateway::new(&config, Arc::new(session.clone())).unwrap()
}

/// Test that chat requests carry the bearer token and parse the reply.
#[tokio::test]
async fn test_chat_sends_bearer_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(header("authorization", "Bearer token-123"))
        .and(body_json(json!({"message": "Hello", "session_id": "session-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "response": "Hi!",
            "timestamp": "2024-05-01T12:00:00.123456",
            "loaded_sources": ["PDF Catalog"]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = logged_in_session();
    let gateway = gateway(&mock_server.uri(), &session);

    let reply = gateway.send_message("Hello", "session-1").await.unwrap();

    assert!(reply.success);
    assert_eq!(reply.response, "Hi!");
    assert_eq!(reply.loaded_sources, vec!["PDF Catalog".to_string()]);
}

/// Test that requests without a session go out unauthenticated.
#[tokio::test]
async fn test_login_without_session_has_no_authorization() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Login successful",
            "user": {"name": "Ada", "email": "ada@example.com"},
            "token": "token-new"
        })))
        .mount(&mock_server)
        .await;

    let session = AuthSession::new(Arc::new(MemoryCredentialStore::new()));
    let gateway = gateway(&mock_server.uri(), &session);

    let response = gateway.login("ada@example.com", "pw").await.unwrap();
    assert_eq!(response.token, "token-new");
    assert_eq!(response.user.name, "Ada");

    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

/// Test that a 401 invalidates the session and surfaces the detail.
#[tokio::test]
async fn test_unauthorized_invalidates_session() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid token"})))
        .mount(&mock_server)
        .await;

    let session = logged_in_session();
    let mut state = session.subscribe();
    let gateway = gateway(&mock_server.uri(), &session);

    let err = gateway.get_status().await.unwrap_err();

    assert_eq!(err, ChatError::AuthExpired("Invalid token".into()));
    assert!(!session.is_authenticated());
    assert!(state.has_changed().unwrap());
    assert!(!state.borrow_and_update().is_authenticated());
}

/// Test that server errors carry the backend's detail string.
#[tokio::test]
async fn test_server_error_detail() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "Chat error: model offline"})),
        )
        .mount(&mock_server)
        .await;

    let session = logged_in_session();
    let gateway = gateway(&mock_server.uri(), &session);

    let err = gateway.send_message("Hello", "s").await.unwrap_err();

    assert_eq!(
        err,
        ChatError::ServerError {
            status: 500,
            detail: "Chat error: model offline".into()
        }
    );
    assert_eq!(err.reason(), "Chat error: model offline");
    assert!(session.is_authenticated(), "only 401 ends the session");
}

/// Test validation errors and bodies without a detail.
#[tokio::test]
async fn test_error_without_detail_uses_fallback() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/signup"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [
                {"loc": ["body", "email"], "msg": "value is not a valid email address"}
            ]
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad gateway</html>"))
        .mount(&mock_server)
        .await;

    let session = AuthSession::new(Arc::new(MemoryCredentialStore::new()));
    let gateway = gateway(&mock_server.uri(), &session);

    let err = gateway.signup("Ada", "nope", "pw").await.unwrap_err();
    assert_eq!(err.reason(), "value is not a valid email address");

    let err = gateway.login("ada@example.com", "pw").await.unwrap_err();
    assert_eq!(err.reason(), "Login failed");
}

/// Test that an unreachable backend becomes a transport failure.
#[tokio::test]
async fn test_unreachable_backend() {
    let session = logged_in_session();
    let gateway = gateway("http://127.0.0.1:9", &session);

    let err = gateway.send_message("Hello", "s").await.unwrap_err();

    assert_eq!(err, ChatError::TransportFailure("Failed to send message".into()));
}

/// Test that a slow backend is reported as a timeout.
#[tokio::test]
async fn test_timeout_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&mock_server)
        .await;

    let session = logged_in_session();
    let config = ApiConfig {
        base_url: mock_server.uri(),
        timeout_secs: 1,
    };
    let gateway = HttpGateway::new(&config, Arc::new(session.clone())).unwrap();

    let err = gateway.send_message("Hello", "s").await.unwrap_err();

    assert_eq!(err, ChatError::TransportFailure("timeout".into()));
}

/// Test the status snapshot shape.
#[tokio::test]
async fn test_status_parses() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "running",
            "uptime": "Active",
            "sources": {"pdf": true, "website": true},
            "conversations": 4,
            "total_sources_loaded": 2
        })))
        .mount(&mock_server)
        .await;

    let session = logged_in_session();
    let gateway = gateway(&mock_server.uri(), &session);

    let status = gateway.get_status().await.unwrap();

    assert!(status.is_running());
    assert!(status.pdf_loaded());
    assert!(status.website_loaded());
    assert_eq!(status.active_session_count(), 4);
    assert_eq!(status.total_sources_loaded(), 2);
}

/// Test the clear-source request body.
#[tokio::test]
async fn test_clear_source_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/clear_source"))
        .and(body_json(json!({"source_type": "website"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Cleared website sources"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = logged_in_session();
    let gateway = gateway(&mock_server.uri(), &session);

    let ack = gateway.clear_source(SourceScope::Website).await.unwrap();
    assert!(ack.success);
    assert_eq!(ack.message.as_deref(), Some("Cleared website sources"));
}

/// Test that PDFs go up as a multipart `pdf` field.
#[tokio::test]
async fn test_pdf_upload_is_multipart() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/load_pdf"))
        .and(header("authorization", "Bearer token-123"))
        .and(body_string_contains("name=\"pdf\""))
        .and(body_string_contains("filename=\"catalog.pdf\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "PDF loaded successfully",
            "filename": "catalog.pdf",
            "word_count": 1234
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = logged_in_session();
    let gateway = gateway(&mock_server.uri(), &session);
    let document = PdfDocument::new("catalog.pdf", b"%PDF-1.4 test".to_vec()).unwrap();

    let loaded = gateway.upload_pdf(document).await.unwrap();

    assert!(loaded.success);
    assert_eq!(loaded.word_count, 1234);
}

/// Test that recordings go up as a multipart `audio` field.
#[tokio::test]
async fn test_speech_to_text_upload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/speech-to-text"))
        .and(body_string_contains("name=\"audio\""))
        .and(body_string_contains("filename=\"recording.wav\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "text": " show me the catalog ",
            "message": "Speech converted to text successfully"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let session = logged_in_session();
    let gateway = gateway(&mock_server.uri(), &session);
    let blob = AudioBlob {
        bytes: b"RIFF-fake-wave-data".to_vec(),
        mime_type: "audio/wav".into(),
        file_name: "recording.wav".into(),
    };

    let transcription = gateway.speech_to_text(blob).await.unwrap();

    assert_eq!(transcription.into_text().unwrap(), "show me the catalog");
}

/// Test that the text-to-speech endpoint echo is decoded.
#[tokio::test]
async fn test_text_to_speech_echo() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/text-to-speech"))
        .and(body_json(json!({"text": "Hi!"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Use browser speech synthesis",
            "text": "Hi!"
        })))
        .mount(&mock_server)
        .await;

    let session = logged_in_session();
    let gateway = gateway(&mock_server.uri(), &session);

    let synthesis = gateway.text_to_speech("Hi!").await.unwrap();
    assert_eq!(synthesis.text, "Hi!");
}
