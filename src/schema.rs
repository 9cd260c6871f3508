use jsonschema::validator_for;
use serde_json::{json, Value};

pub const GET_REMOTE_CONFIG: &str = "remoteConfig";
pub const UPSERT_REMOTE_CONFIG: &str = "upsertRemoteConfig";
pub const REMOVE_REMOTE_CONFIG: &str = "removeRemoteConfig";

#[derive(Debug, thiserror::Error)]
pub enum SchemaValidationError {
    #[error("Schema parse error: {0}")]
    SchemaParse(#[from] serde_json::Error),
    #[error("Schema compile error: {0}")]
    SchemaCompile(String),
    #[error("{0}")]
    ValidationFailed(String),
}

/// Validate a JSON instance against a JSON Schema (draft 2020-12).
/// Returns Ok(()) if valid, Err otherwise.
pub fn validate_json(schema_str: &str, instance_str: &str) -> Result<(), SchemaValidationError> {
    let schema_json: Value = serde_json::from_str(schema_str)?;
    let instance_json: Value = serde_json::from_str(instance_str)?;
    validate_value(&schema_json, &instance_json)
}

/// Validate an already-parsed instance; the error lists every violation.
pub fn validate_value(schema: &Value, instance: &Value) -> Result<(), SchemaValidationError> {
    let validator =
        validator_for(schema).map_err(|e| SchemaValidationError::SchemaCompile(e.to_string()))?;

    let violations: Vec<String> = validator
        .iter_errors(instance)
        .map(|e| e.to_string())
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(SchemaValidationError::ValidationFailed(violations.join("; ")))
    }
}

/// `inputSchema` for one of the advertised tools.
pub fn input_schema(tool: &str) -> Option<Value> {
    let env = json!({
        "type": "string",
        "description": "Environment to target; defaults to the first environment loaded at startup"
    });

    let schema = match tool {
        GET_REMOTE_CONFIG => json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "key": {
                    "type": "string",
                    "description": "Parameter key; omit to fetch the whole template"
                },
                "env": env
            }
        }),
        UPSERT_REMOTE_CONFIG => json!({
            "type": "object",
            "required": ["key", "value"],
            "additionalProperties": false,
            "properties": {
                "key": {
                    "type": "string",
                    "minLength": 1,
                    "description": "Parameter key to create or update"
                },
                "value": {
                    "type": "string",
                    "description": "New value"
                },
                "conditionName": {
                    "type": "string",
                    "description": "Existing condition to override; omit to set the default value"
                },
                "env": env
            }
        }),
        REMOVE_REMOTE_CONFIG => json!({
            "type": "object",
            "required": ["key"],
            "additionalProperties": false,
            "properties": {
                "key": {
                    "type": "string",
                    "minLength": 1,
                    "description": "Parameter key to remove"
                },
                "conditionName": {
                    "type": "string",
                    "description": "Remove only the override for this condition"
                },
                "env": env
            }
        }),
        _ => return None,
    };

    Some(schema)
}

/// Tool descriptors returned from `tools/list`.
pub fn tool_definitions() -> Value {
    let tools: Vec<Value> = [
        (
            GET_REMOTE_CONFIG,
            "Fetches the active Firebase Remote Config template or a single parameter",
        ),
        (
            UPSERT_REMOTE_CONFIG,
            "Update an existing Remote Config key; optionally override an EXISTING condition.",
        ),
        (
            REMOVE_REMOTE_CONFIG,
            "Delete a Remote Config key, or a specific conditional value on that key.",
        ),
    ]
    .into_iter()
    .filter_map(|(name, description)| {
        input_schema(name).map(|schema| {
            json!({
                "name": name,
                "description": description,
                "inputSchema": schema
            })
        })
    })
    .collect();

    json!({ "tools": tools })
}
