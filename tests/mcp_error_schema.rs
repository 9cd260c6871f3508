use jsonschema::validator_for;
use serde_json::Value;

use fire_config_mcp::protocol::{JsonRpcError, McpErrorCode, McpErrorResponse, ToolResult};

const ERROR_SCHEMA: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "MCP Error Response",
  "type": "object",
  "required": ["error"],
  "additionalProperties": false,
  "properties": {
    "error": {
      "type": "object",
      "required": ["code", "message"],
      "additionalProperties": false,
      "properties": {
        "code": {
          "type": "string",
          "enum": [
            "unknown_environment",
            "condition_missing",
            "invalid_arguments",
            "remote_error",
            "internal_error"
          ]
        },
        "message": {
          "type": "string",
          "minLength": 1
        }
      }
    }
  }
}"#;

#[test]
fn golden_mcp_error_schema_validation() {
    // 1. Build a canonical error response
    let response = McpErrorResponse::condition_missing("beta_users");

    let json_str = serde_json::to_string_pretty(&response).unwrap();
    let json_value: Value = serde_json::from_str(&json_str).unwrap();

    // 2. Validate against schema
    let schema_json: Value = serde_json::from_str(ERROR_SCHEMA).unwrap();
    let validator = validator_for(&schema_json).unwrap();
    assert!(validator.is_valid(&json_value), "MCP error JSON must satisfy schema");

    // 3. Golden snapshot (byte-identical, stable)
    let expected = r#"{
  "error": {
    "code": "condition_missing",
    "message": "Condition \"beta_users\" doesn't exist in the template. Update aborted."
  }
}"#;

    assert_eq!(json_str.trim(), expected.trim(), "MCP error JSON snapshot mismatch");
}

#[test]
fn every_error_code_satisfies_schema() {
    let schema_json: Value = serde_json::from_str(ERROR_SCHEMA).unwrap();
    let validator = validator_for(&schema_json).unwrap();

    let responses = vec![
        McpErrorResponse::unknown_environment("prod"),
        McpErrorResponse::condition_missing("ios"),
        McpErrorResponse::invalid_arguments("upsertRemoteConfig", "key is required"),
        McpErrorResponse::new(McpErrorCode::RemoteError, "remote config service returned 503"),
        McpErrorResponse::internal(),
    ];

    for response in responses {
        let value = serde_json::to_value(&response).unwrap();
        assert!(validator.is_valid(&value), "{value} must satisfy schema");
    }
}

#[test]
fn error_maps_to_tool_result_and_json_rpc_error() {
    let tool: ToolResult = McpErrorResponse::unknown_environment("prod").into();
    assert!(tool.is_error);
    assert_eq!(
        tool.content[0].text,
        r#"{"error":{"code":"unknown_environment","message":"Unknown env: prod"}}"#
    );

    let rpc: JsonRpcError = McpErrorResponse::unknown_environment("prod").into();
    assert_eq!(rpc.code, -32602);
    assert_eq!(rpc.message, "Unknown env: prod");

    let rpc: JsonRpcError = McpErrorResponse::internal().into();
    assert_eq!(rpc.code, -32603);
    assert_eq!(rpc.data.unwrap()["error"]["code"], "internal_error");
}
