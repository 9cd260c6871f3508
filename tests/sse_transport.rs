//! End-to-end tests for the HTTP server-sent-events transport.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use fire_config_mcp::registry::EnvironmentRegistry;
use fire_config_mcp::remote_config::InMemoryClient;
use fire_config_mcp::transport;
use futures::StreamExt;
use serde_json::{json, Value};

async fn spawn_server(client: Arc<InMemoryClient>) -> SocketAddr {
    let registry = EnvironmentRegistry::new(vec!["dev".into()]).with_environment("dev", client);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, transport::router(Arc::new(registry)))
            .await
            .unwrap();
    });
    addr
}

/// Reads server-sent events off a streaming response body.
struct EventReader<S> {
    stream: S,
    buffer: String,
}

impl<S> EventReader<S>
where
    S: futures::Stream<Item = reqwest::Result<axum::body::Bytes>> + Unpin,
{
    fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: String::new(),
        }
    }

    /// Next `(event, data)` pair, skipping keep-alive comments.
    async fn next_event(&mut self) -> (String, String) {
        loop {
            if let Some(end) = self.buffer.find("\n\n") {
                let block: String = self.buffer.drain(..end + 2).collect();
                let mut event = String::new();
                let mut data = String::new();
                for line in block.lines() {
                    if let Some(v) = line.strip_prefix("event:") {
                        event = v.trim().to_string();
                    } else if let Some(v) = line.strip_prefix("data:") {
                        data.push_str(v.trim_start());
                    }
                }
                if !event.is_empty() || !data.is_empty() {
                    return (event, data);
                }
                continue;
            }

            let chunk = tokio::time::timeout(Duration::from_secs(5), self.stream.next())
                .await
                .expect("timed out waiting for event")
                .expect("stream ended")
                .expect("stream error");
            self.buffer.push_str(&String::from_utf8_lossy(&chunk));
        }
    }
}

#[tokio::test]
async fn post_without_session_is_server_error() {
    let addr = spawn_server(Arc::new(InMemoryClient::with_conditions(&[]))).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/message"))
        .json(&json!({ "jsonrpc": "2.0", "id": 1, "method": "ping" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "error": "No transport" }));
}

#[tokio::test]
async fn session_round_trip_over_sse() {
    let client = Arc::new(InMemoryClient::with_conditions(&["ios"]));
    let addr = spawn_server(client.clone()).await;
    let http = reqwest::Client::new();

    let sse = http.get(format!("http://{addr}/mcp")).send().await.unwrap();
    assert!(sse.status().is_success());
    let mut events = EventReader::new(Box::pin(sse.bytes_stream()));

    let (event, endpoint) = events.next_event().await;
    assert_eq!(event, "endpoint");
    assert!(endpoint.starts_with("/message?sessionId="));
    let post_url = format!("http://{addr}{endpoint}");

    let resp = http
        .post(&post_url)
        .json(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": { "protocolVersion": "2024-11-05" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::ACCEPTED);

    let (event, data) = events.next_event().await;
    assert_eq!(event, "message");
    let init: Value = serde_json::from_str(&data).unwrap();
    assert_eq!(init["id"], 1);
    assert_eq!(init["result"]["serverInfo"]["name"], "fire-config-mcp");

    let resp = http
        .post(&post_url)
        .json(&json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": {
                "name": "upsertRemoteConfig",
                "arguments": { "key": "flag", "value": "on" }
            }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::ACCEPTED);

    let (_, data) = events.next_event().await;
    let call: Value = serde_json::from_str(&data).unwrap();
    assert_eq!(call["id"], 2);
    assert_eq!(
        call["result"]["content"][0]["text"],
        "Updated default \"flag\" to \"on\" (v2)."
    );
    assert_eq!(client.publish_count(), 1);
}

#[tokio::test]
async fn message_for_stale_session_is_not_found() {
    let addr = spawn_server(Arc::new(InMemoryClient::with_conditions(&[]))).await;
    let http = reqwest::Client::new();

    let sse = http.get(format!("http://{addr}/mcp")).send().await.unwrap();
    let mut events = EventReader::new(Box::pin(sse.bytes_stream()));
    let (_, endpoint) = events.next_event().await;
    assert!(endpoint.contains("sessionId="));

    let resp = http
        .post(format!("http://{addr}/message?sessionId=not-the-session"))
        .json(&json!({ "jsonrpc": "2.0", "id": 1, "method": "ping" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);
}
