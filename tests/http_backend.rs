//! HttpBackend against a mock chat server

use aidoc::backend::{ChatBackend, ChatRequest, HttpBackend};
use aidoc::conversation::{HistoryEntry, Role};
use aidoc::{ChatError, Config, HealthStatus};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(url: &str) -> Config {
    let mut config = Config::default();
    config.set_api_base_url(url);
    config
}

fn request(message: &str) -> ChatRequest {
    ChatRequest {
        message: message.into(),
        session_id: "session_1700000000000_abcdef123".into(),
        conversation_history: vec![],
    }
}

#[tokio::test]
async fn chat_posts_wire_body_and_reads_reply() {
    let server = MockServer::start().await;
    let history = vec![
        HistoryEntry {
            role: Role::User,
            content: "I have a headache".into(),
        },
        HistoryEntry {
            role: Role::Assistant,
            content: "How long has it lasted?".into(),
        },
    ];

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_json(json!({
            "message": "Two days",
            "session_id": "session_1700000000000_abcdef123",
            "conversation_history": [
                {"role": "user", "content": "I have a headache"},
                {"role": "assistant", "content": "How long has it lasted?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "reply": "**Tension headache** is common.",
            "context_used": ["Tension headache", "Migraine"],
            "session_id": "session_1700000000000_abcdef123",
            "timestamp": "2024-11-30T10:00:00"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config_for(&server.uri())).unwrap();
    let mut req = request("Two days");
    req.conversation_history = history;

    let reply = backend.chat(&req).await.unwrap();
    assert_eq!(reply.reply, "**Tension headache** is common.");
    assert_eq!(
        reply.context_used,
        Some(vec!["Tension headache".to_string(), "Migraine".to_string()])
    );
}

#[tokio::test]
async fn chat_reply_without_context_is_accepted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": "Drink water."})))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config_for(&server.uri())).unwrap();
    let reply = backend.chat(&request("I feel dizzy")).await.unwrap();
    assert_eq!(reply.reply, "Drink water.");
    assert_eq!(reply.context_used, None);
}

#[tokio::test]
async fn server_error_carries_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"detail": "Error processing chat request: index missing"})),
        )
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config_for(&server.uri())).unwrap();
    let err = backend.chat(&request("I have a fever")).await.unwrap_err();
    assert_eq!(
        err,
        ChatError::Server {
            status: 500,
            detail: Some("Error processing chat request: index missing".into()),
        }
    );
}

#[tokio::test]
async fn server_error_without_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config_for(&server.uri())).unwrap();
    let err = backend.chat(&request("I have a fever")).await.unwrap_err();
    assert_eq!(
        err,
        ChatError::Server {
            status: 503,
            detail: None
        }
    );
    assert_eq!(err.diagnostic(backend.location()), "Server error: Unknown error");
}

#[tokio::test]
async fn malformed_success_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "missing reply field"})))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config_for(&server.uri())).unwrap();
    let err = backend.chat(&request("I have a fever")).await.unwrap_err();
    assert!(matches!(err, ChatError::Malformed(_)), "got {err:?}");
}

#[tokio::test]
async fn refused_connection_is_unreachable() {
    // Grab a free port, then close it so nothing is listening
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = format!("http://{addr}");
    let backend = HttpBackend::new(&config_for(&url)).unwrap();
    let err = backend.chat(&request("I have a fever")).await.unwrap_err();

    assert!(matches!(err, ChatError::Unreachable(_)), "got {err:?}");
    assert_eq!(
        err.diagnostic(backend.location()),
        format!("Sorry, I encountered an error. Please make sure the backend server is running on {url}")
    );
}

#[tokio::test]
async fn slow_chat_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"reply": "too late"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = config_for(&server.uri());
    config.chat_timeout_secs = 1;
    let backend = HttpBackend::new(&config).unwrap();

    let err = backend.chat(&request("I have a fever")).await.unwrap_err();
    assert_eq!(err, ChatError::Timeout);
}

#[tokio::test]
async fn health_report_maps_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "healthy",
            "total_documents": 42,
            "embeddings_loaded": true,
            "version": "1.0.0"
        })))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config_for(&server.uri())).unwrap();
    let report = backend.health().await.unwrap();
    assert_eq!(
        report.health_status(),
        HealthStatus::Healthy {
            total_documents: Some(42)
        }
    );
    assert_eq!(report.health_status().label(), "Online (42 conditions)");
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_ignored() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "degraded"})))
        .expect(1)
        .mount(&server)
        .await;

    let backend = HttpBackend::new(&config_for(&format!("{}/", server.uri()))).unwrap();
    let report = backend.health().await.unwrap();
    assert_eq!(report.health_status(), HealthStatus::Degraded);
}
