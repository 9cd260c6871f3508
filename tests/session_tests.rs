//! MCP session handling shared by the stdio and SSE transports.

use std::sync::Arc;

use fire_config_mcp::protocol::RpcId;
use fire_config_mcp::registry::EnvironmentRegistry;
use fire_config_mcp::remote_config::InMemoryClient;
use fire_config_mcp::server::{McpSession, MAX_MESSAGE_BYTES};
use serde_json::{json, Value};

fn registry() -> EnvironmentRegistry {
    EnvironmentRegistry::new(vec!["dev".into()])
        .with_environment("dev", Arc::new(InMemoryClient::with_conditions(&[])))
}

fn message(value: Value) -> Vec<u8> {
    serde_json::to_vec(&value).unwrap()
}

fn initialize(id: i64) -> Vec<u8> {
    message(json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "initialize",
        "params": {
            "protocolVersion": "2024-11-05",
            "clientInfo": { "name": "test-client", "version": "1.0" }
        }
    }))
}

#[tokio::test]
async fn requests_before_initialize_are_rejected() {
    let session = McpSession::new("s1");
    let registry = registry();

    let resp = session
        .handle_message(
            &message(json!({ "jsonrpc": "2.0", "id": 1, "method": "tools/list" })),
            &registry,
        )
        .await
        .unwrap();

    let err = resp.error.unwrap();
    assert_eq!(err.code, -32600);
    assert_eq!(err.message, "Server not initialized");
    assert!(!session.is_initialized());
}

#[tokio::test]
async fn notifications_before_initialize_are_dropped() {
    let session = McpSession::new("s1");
    let resp = session
        .handle_message(
            &message(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" })),
            &registry(),
        )
        .await;
    assert!(resp.is_none());
}

#[tokio::test]
async fn initialize_opens_the_session() {
    let session = McpSession::new("s1");
    let registry = registry();

    let resp = session.handle_message(&initialize(1), &registry).await.unwrap();
    assert_eq!(resp.id, Some(RpcId::Number(1)));
    let result = resp.result.unwrap();
    assert_eq!(result["serverInfo"]["name"], "fire-config-mcp");
    assert_eq!(result["capabilities"], json!({ "tools": {} }));
    assert!(session.is_initialized());

    let notification = session
        .handle_message(
            &message(json!({ "jsonrpc": "2.0", "method": "notifications/initialized" })),
            &registry,
        )
        .await;
    assert!(notification.is_none());

    let resp = session
        .handle_message(
            &message(json!({ "jsonrpc": "2.0", "id": "p", "method": "ping" })),
            &registry,
        )
        .await
        .unwrap();
    assert_eq!(resp.id, Some(RpcId::Str("p".into())));
    assert_eq!(resp.result.unwrap(), json!({}));
}

#[tokio::test]
async fn malformed_messages_get_protocol_errors() {
    let session = McpSession::new("s1");
    let registry = registry();
    session.handle_message(&initialize(1), &registry).await;

    let parse = session.handle_message(b"{not json", &registry).await.unwrap();
    assert_eq!(parse.error.unwrap().code, -32700);

    let utf8 = session.handle_message(&[0xffu8, 0xfe], &registry).await.unwrap();
    assert_eq!(utf8.error.unwrap().code, -32700);

    let version = session
        .handle_message(
            &message(json!({ "jsonrpc": "1.0", "id": 2, "method": "ping" })),
            &registry,
        )
        .await
        .unwrap();
    assert_eq!(version.error.unwrap().code, -32600);

    let unknown = session
        .handle_message(
            &message(json!({ "jsonrpc": "2.0", "id": 3, "method": "resources/list" })),
            &registry,
        )
        .await
        .unwrap();
    assert_eq!(unknown.error.unwrap().code, -32601);

    let oversized = vec![b' '; MAX_MESSAGE_BYTES + 1];
    let too_large = session.handle_message(&oversized, &registry).await.unwrap();
    assert_eq!(too_large.error.unwrap().code, -32700);

    assert!(session.handle_message(b"  \n", &registry).await.is_none());
}

#[tokio::test]
async fn tools_call_without_params_is_invalid_params() {
    let session = McpSession::new("s1");
    let registry = registry();
    session.handle_message(&initialize(1), &registry).await;

    let resp = session
        .handle_message(
            &message(json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/call" })),
            &registry,
        )
        .await
        .unwrap();
    let err = resp.error.unwrap();
    assert_eq!(err.code, -32602);
    assert_eq!(err.message, "Invalid arguments for tools/call: missing params");
    assert_eq!(err.data.unwrap()["error"]["code"], "invalid_arguments");
}

#[tokio::test]
async fn malformed_tools_call_params_carry_structured_error() {
    let session = McpSession::new("s1");
    let registry = registry();
    session.handle_message(&initialize(1), &registry).await;

    let resp = session
        .handle_message(
            &message(json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": { "arguments": {} }
            })),
            &registry,
        )
        .await
        .unwrap();
    let err = resp.error.unwrap();
    assert_eq!(err.code, -32602);
    assert!(err.message.starts_with("Invalid arguments for tools/call:"));
    let data = err.data.unwrap();
    assert_eq!(data["error"]["code"], "invalid_arguments");
    assert_eq!(data["error"]["message"], err.message.as_str());
}
