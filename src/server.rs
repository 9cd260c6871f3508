use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::handlers;
use crate::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse};
use crate::registry::EnvironmentRegistry;

/// Maximum bytes per JSON-RPC message (1 MiB).
pub const MAX_MESSAGE_BYTES: usize = 1024 * 1024;

/// One MCP client session, shared by every transport.
///
/// Holds the initialization gate: until `initialize` has been answered,
/// every other request is rejected and notifications are dropped.
#[derive(Debug)]
pub struct McpSession {
    id: String,
    initialized: AtomicBool,
}

impl McpSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Process one raw JSON-RPC message and produce the response to send,
    /// if any.
    pub async fn handle_message(
        &self,
        raw: &[u8],
        registry: &EnvironmentRegistry,
    ) -> Option<JsonRpcResponse> {
        if raw.len() > MAX_MESSAGE_BYTES {
            tracing::warn!(
                session_id = %self.id,
                "Message too large: {} bytes (limit {MAX_MESSAGE_BYTES})",
                raw.len()
            );
            return Some(JsonRpcResponse::error(None, JsonRpcError::parse_error()));
        }

        let trimmed = match std::str::from_utf8(raw) {
            Ok(s) => s.trim(),
            Err(_) => return Some(JsonRpcResponse::error(None, JsonRpcError::parse_error())),
        };

        if trimmed.is_empty() {
            return None;
        }

        let req: JsonRpcRequest = match serde_json::from_str(trimmed) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(session_id = %self.id, "Parse error: {e}");
                return Some(JsonRpcResponse::error(None, JsonRpcError::parse_error()));
            }
        };

        // Validate jsonrpc version
        if req.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(
                req.id.clone(),
                JsonRpcError::invalid_request(),
            ));
        }

        // Initialization gate: only `initialize` is allowed before handshake completes
        if !self.is_initialized() && req.method != "initialize" {
            if req.id.is_none() {
                return None;
            }
            return Some(JsonRpcResponse::error(
                req.id.clone(),
                JsonRpcError::invalid_request_with("Server not initialized"),
            ));
        }

        let resp = handlers::dispatch(&req, registry).await;

        if req.method == "initialize" {
            self.initialized.store(true, Ordering::Release);
        }

        resp
    }
}

/// Serve a single session over stdin/stdout until stdin closes.
pub async fn run_stdio(registry: Arc<EnvironmentRegistry>) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut reader = BufReader::new(stdin);
    let mut raw = Vec::new();
    let session = McpSession::new("stdio");

    tracing::info!("serving MCP over stdio");

    loop {
        raw.clear();
        let n = reader.read_until(b'\n', &mut raw).await?;
        if n == 0 {
            break;
        }

        if let Some(resp) = session.handle_message(&raw, &registry).await {
            write_response(&mut stdout, &resp).await?;
        }
    }

    Ok(())
}

async fn write_response(
    stdout: &mut tokio::io::Stdout,
    resp: &JsonRpcResponse,
) -> Result<(), Box<dyn std::error::Error>> {
    let out = serde_json::to_string(resp)?;
    stdout.write_all(out.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}
