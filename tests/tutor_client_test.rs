mod common;
use common::FakeHttpServer;
use tokio_test::{assert_err, assert_ok};
use tutortalk::config::Config;
use tutortalk::conversation::ApiTurn;
use tutortalk::core::{ChatCompletionsClient, TutorBackend};
use tutortalk::error::TutorError;

const REPLY: &str = r#"{"id":"gen-1","model":"meta-llama/llama-3-8b-instruct","choices":[{"index":0,"message":{"role":"assistant","content":"Gravity is a force..."},"finish_reason":"stop"}]}"#;

fn client_for(base_url: &str) -> ChatCompletionsClient {
    let config = Config {
        api_base_url: base_url.to_string(),
        api_key: "sk-test".to_string(),
        ..Config::default()
    };
    ChatCompletionsClient::new(&config).expect("client")
}

#[tokio::test]
async fn test_successful_reply_is_parsed() {
    let server = FakeHttpServer::start(200, REPLY).await;
    let client = client_for(&server.base_url);

    let history = [ApiTurn::user("What is an atom?"), ApiTurn::assistant("A tiny particle.")];
    let reply = assert_ok!(client.ask("What is gravity?", &history).await);
    assert_eq!(reply, "Gravity is a force...");

    let received = server.received();
    assert_eq!(received.len(), 1);
    let body: serde_json::Value = serde_json::from_str(&received[0]).expect("json body");
    assert_eq!(body["model"], "meta-llama/llama-3-8b-instruct");
    let messages = body["messages"].as_array().expect("messages");
    assert_eq!(messages.last().unwrap()["content"], "What is gravity?");
    assert_eq!(messages[messages.len() - 2]["role"], "assistant");
}

#[tokio::test]
async fn test_server_error_is_upstream() {
    let server = FakeHttpServer::start(500, r#"{"error":{"message":"boom"}}"#).await;
    let client = client_for(&server.base_url);

    let err = assert_err!(client.ask("What is gravity?", &[]).await);
    match err {
        TutorError::Upstream(detail) => assert!(detail.contains("500")),
        other => panic!("expected upstream error, got {other:?}"),
    }
    // Failures are not retried
    assert_eq!(server.received().len(), 1);
}

#[tokio::test]
async fn test_unparseable_body_is_upstream() {
    let server = FakeHttpServer::start(200, r#"{"choices":[]}"#).await;
    let client = client_for(&server.base_url);
    let err = assert_err!(client.ask("What is gravity?", &[]).await);
    assert!(matches!(err, TutorError::Upstream(_)));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_transport() {
    // Grab a free port, then close it so the connection is refused
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{addr}/api/v1"));
    let err = assert_err!(client.ask("What is gravity?", &[]).await);
    assert!(matches!(err, TutorError::Transport(_)));
    assert!(!client.health_check().await);
}

#[tokio::test]
async fn test_health_check_against_live_endpoint() {
    let server = FakeHttpServer::start(200, r#"{"data":[]}"#).await;
    let client = client_for(&server.base_url);
    assert!(client.health_check().await);
}
