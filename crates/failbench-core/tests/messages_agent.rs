//! Messages API agent against a mock server.

use failbench_core::agent::messages::McpServer;
use failbench_core::{AgentError, AgentRunner, MessagesApiAgent, TaskDescriptor, SYSTEM_PROMPT};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn task() -> TaskDescriptor {
    TaskDescriptor::new(
        "task_1",
        "Send an email to sanat@example.com with subject 'Important' and body 'Please review urgently'.",
        "r",
        "e",
    )
}

#[tokio::test]
async fn test_posts_task_and_joins_text_blocks() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(header("anthropic-beta", "mcp-client-2025-04-04"))
        .and(body_partial_json(json!({
            "model": "test-model",
            "system": SYSTEM_PROMPT,
            "messages": [{"role": "user", "content": task().instruction}],
            "mcp_servers": [{"type": "url", "url": "https://tools.test/mcp", "name": "workspace"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [
                {"type": "text", "text": "I'll send that now."},
                {"type": "mcp_tool_use", "id": "tu_1", "name": "send_email", "server_name": "workspace", "input": {}},
                {"type": "mcp_tool_result", "tool_use_id": "tu_1", "is_error": false, "content": [{"type": "text", "text": "sent"}]},
                {"type": "text", "text": "The email was sent."}
            ],
            "stop_reason": "end_turn"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let agent = MessagesApiAgent::new(Some("sk-test".to_string()), "test-model")
        .with_base_url(format!("{}/v1/", server.uri()))
        .with_mcp_server(McpServer {
            name: "workspace".to_string(),
            url: "https://tools.test/mcp".to_string(),
            authorization_token: None,
        });

    let transcript = agent.run(&task()).await.unwrap();
    assert_eq!(transcript, "I'll send that now.\nThe email was sent.");
}

#[tokio::test]
async fn test_error_status_carries_api_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "type": "error",
            "error": {"type": "authentication_error", "message": "invalid x-api-key"}
        })))
        .mount(&server)
        .await;

    let agent = MessagesApiAgent::new(Some("bad".to_string()), "test-model")
        .with_base_url(format!("{}/v1", server.uri()));

    match agent.run(&task()).await.unwrap_err() {
        AgentError::Api { status, body } => {
            assert_eq!(status, 401);
            assert_eq!(body, "invalid x-api-key");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unreachable_endpoint_is_http_error() {
    let agent = MessagesApiAgent::new(Some("k".to_string()), "m").with_base_url("http://127.0.0.1:1");
    let err = agent.run(&task()).await.unwrap_err();
    assert!(matches!(err, AgentError::Http(_)));
}
