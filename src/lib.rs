//! MCP server for Firebase Remote Config.
//!
//! Exposes `remoteConfig`, `upsertRemoteConfig`, and `removeRemoteConfig`
//! tools over JSON-RPC 2.0, served either on an HTTP server-sent-events
//! transport or on stdio. Each call targets one of the environments loaded
//! at startup, each backed by its own service-account credentials.

pub mod config;
pub mod handlers;
pub mod logging;
pub mod protocol;
pub mod registry;
pub mod remote_config;
pub mod server;
pub mod transport;

pub mod schema;
