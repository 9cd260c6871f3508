pub mod get_remote_config;
pub mod remove_remote_config;
pub mod upsert_remote_config;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::protocol::{
    InitializeParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpErrorCode,
    McpErrorResponse, ToolCallParams, ToolResult,
};
use crate::registry::{Environment, EnvironmentRegistry};
use crate::remote_config::RemoteConfigError;
use crate::schema::{self, GET_REMOTE_CONFIG, REMOVE_REMOTE_CONFIG, UPSERT_REMOTE_CONFIG};

/// Dispatch a JSON-RPC request to the appropriate handler.
///
/// Returns `None` for notifications (no response required).
pub async fn dispatch(
    req: &JsonRpcRequest,
    registry: &EnvironmentRegistry,
) -> Option<JsonRpcResponse> {
    match req.method.as_str() {
        "initialize" => {
            if let Some(params) = req
                .params
                .clone()
                .and_then(|v| serde_json::from_value::<InitializeParams>(v).ok())
            {
                let client = params.client_info.and_then(|c| c.name);
                tracing::info!(
                    client = client.as_deref().unwrap_or("unknown"),
                    protocol_version = params.protocol_version.as_deref().unwrap_or("unspecified"),
                    "client initializing"
                );
            }

            let result = serde_json::json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {}
                },
                "serverInfo": {
                    "name": "fire-config-mcp",
                    "version": env!("CARGO_PKG_VERSION")
                }
            });
            Some(JsonRpcResponse::success(req.id.clone(), result))
        }

        method if method.starts_with("notifications/") => None,

        "ping" => Some(JsonRpcResponse::success(req.id.clone(), serde_json::json!({}))),

        "tools/list" => Some(JsonRpcResponse::success(
            req.id.clone(),
            schema::tool_definitions(),
        )),

        "tools/call" => {
            let params: ToolCallParams = match &req.params {
                Some(v) => match serde_json::from_value(v.clone()) {
                    Ok(p) => p,
                    Err(e) => {
                        return Some(JsonRpcResponse::error(
                            req.id.clone(),
                            McpErrorResponse::invalid_arguments("tools/call", e).into(),
                        ));
                    }
                },
                None => {
                    return Some(JsonRpcResponse::error(
                        req.id.clone(),
                        McpErrorResponse::invalid_arguments("tools/call", "missing params").into(),
                    ));
                }
            };

            let tool_result = dispatch_tool_call(&params, registry).await;
            let result_json = serde_json::to_value(&tool_result).expect("ToolResult must serialize to JSON Value");
            Some(JsonRpcResponse::success(req.id.clone(), result_json))
        }

        _ => Some(JsonRpcResponse::error(
            req.id.clone(),
            JsonRpcError::method_not_found(&req.method),
        )),
    }
}

async fn dispatch_tool_call(params: &ToolCallParams, registry: &EnvironmentRegistry) -> ToolResult {
    tracing::debug!(tool = %params.name, "tool call");

    match params.name.as_str() {
        GET_REMOTE_CONFIG => match parse_arguments(GET_REMOTE_CONFIG, params.arguments.as_ref()) {
            Ok(args) => get_remote_config::handle(args, registry).await,
            Err(err) => err.into(),
        },

        UPSERT_REMOTE_CONFIG => {
            match parse_arguments(UPSERT_REMOTE_CONFIG, params.arguments.as_ref()) {
                Ok(args) => upsert_remote_config::handle(args, registry).await,
                Err(err) => err.into(),
            }
        }

        REMOVE_REMOTE_CONFIG => {
            match parse_arguments(REMOVE_REMOTE_CONFIG, params.arguments.as_ref()) {
                Ok(args) => remove_remote_config::handle(args, registry).await,
                Err(err) => err.into(),
            }
        }

        _ => ToolResult::error(format!("Unknown tool: {}", params.name)),
    }
}

/// Check `arguments` against the tool's input schema, then decode them.
///
/// Missing arguments are treated as an empty object so the schema can
/// report which required fields are absent.
fn parse_arguments<T: DeserializeOwned>(
    tool: &str,
    arguments: Option<&serde_json::Value>,
) -> Result<T, McpErrorResponse> {
    let arguments = arguments
        .cloned()
        .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

    if let Some(input_schema) = schema::input_schema(tool) {
        schema::validate_value(&input_schema, &arguments)
            .map_err(|e| McpErrorResponse::invalid_arguments(tool, e))?;
    }

    serde_json::from_value(arguments).map_err(|e| McpErrorResponse::invalid_arguments(tool, e))
}

/// Look up the environment a call should run against.
///
/// An explicitly requested environment that is not registered is an error
/// rather than a silent fallback to the default.
pub(crate) fn resolve_environment<'a>(
    registry: &'a EnvironmentRegistry,
    requested: Option<&str>,
) -> Result<&'a Environment, McpErrorResponse> {
    if let Some(name) = requested.filter(|name| !registry.contains(name)) {
        return Err(McpErrorResponse::unknown_environment(name));
    }

    let name = registry.resolve(requested);
    registry
        .get(&name)
        .ok_or_else(|| McpErrorResponse::unknown_environment(&name))
}

/// Turn a Remote Config failure into a tool error result.
pub(crate) fn remote_failure(env: &str, action: &str, err: &RemoteConfigError) -> ToolResult {
    tracing::error!(env = %env, error = %err, "failed to {action} template");
    McpErrorResponse::new(
        McpErrorCode::RemoteError,
        format!("Failed to {action} Remote Config template for env {env}: {err}"),
    )
    .into()
}

pub(crate) fn json_result<T: Serialize>(payload: &T) -> ToolResult {
    match serde_json::to_string(payload) {
        Ok(json) => ToolResult::text(json),
        Err(e) => {
            tracing::error!(error = %e, "serialization failed");
            McpErrorResponse::internal().into()
        }
    }
}
