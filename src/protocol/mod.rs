pub mod request;
pub mod response;

pub use request::{
    GetRemoteConfigArgs, InitializeParams, JsonRpcRequest, RemoveRemoteConfigArgs, RpcId,
    ToolCallParams, UpsertRemoteConfigArgs,
};
pub use response::{
    JsonRpcError, JsonRpcResponse, McpError, McpErrorCode, McpErrorResponse, ToolResult,
    ToolResultContent,
};
