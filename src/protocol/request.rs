use serde::{Deserialize, Serialize};

/// JSON-RPC 2.0 ID — may be a number or string per spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(i64),
    Str(String),
}

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<RpcId>,
    pub method: String,
    pub params: Option<serde_json::Value>,
}

/// Arguments for the `remoteConfig` tool.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GetRemoteConfigArgs {
    pub key: Option<String>,
    pub env: Option<String>,
}

/// Arguments for the `upsertRemoteConfig` tool.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpsertRemoteConfigArgs {
    pub key: String,
    pub value: String,
    /// Must name a condition already defined in the template.
    pub condition_name: Option<String>,
    pub env: Option<String>,
}

/// Arguments for the `removeRemoteConfig` tool.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RemoveRemoteConfigArgs {
    pub key: String,
    /// When absent the whole parameter is removed.
    pub condition_name: Option<String>,
    pub env: Option<String>,
}

/// Empty strings count as "not given".
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn require_key(key: &str) -> Result<(), String> {
    if key.is_empty() {
        Err("key is required".into())
    } else {
        Ok(())
    }
}

impl GetRemoteConfigArgs {
    pub fn key(&self) -> Option<&str> {
        present(&self.key)
    }

    pub fn env(&self) -> Option<&str> {
        present(&self.env)
    }
}

impl UpsertRemoteConfigArgs {
    pub fn validate(&self) -> Result<(), String> {
        require_key(&self.key)
    }

    pub fn condition(&self) -> Option<&str> {
        present(&self.condition_name)
    }

    pub fn env(&self) -> Option<&str> {
        present(&self.env)
    }
}

impl RemoveRemoteConfigArgs {
    pub fn validate(&self) -> Result<(), String> {
        require_key(&self.key)
    }

    pub fn condition(&self) -> Option<&str> {
        present(&self.condition_name)
    }

    pub fn env(&self) -> Option<&str> {
        present(&self.env)
    }
}

/// MCP `initialize` params.
#[derive(Debug, Clone, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: Option<String>,
    #[serde(rename = "clientInfo")]
    pub client_info: Option<ClientInfo>,
}

/// Client information sent during `initialize`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    pub name: Option<String>,
    pub version: Option<String>,
}

/// Parameters for `tools/call`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    pub arguments: Option<serde_json::Value>,
}
