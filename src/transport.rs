//! HTTP server-sent-events transport.
//!
//! `GET /mcp` opens the session and streams responses back as `message`
//! events; `POST /message` delivers requests to that session. Only one
//! session is live per process: a new `GET /mcp` replaces the previous one.

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use futures::stream::Stream;
use serde::Deserialize;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::protocol::JsonRpcResponse;
use crate::registry::EnvironmentRegistry;
use crate::server::McpSession;

pub const SSE_PATH: &str = "/mcp";
pub const MESSAGE_PATH: &str = "/message";

/// Responses queued per session before `POST /message` starts waiting.
const SESSION_BUFFER: usize = 32;

/// State shared by the two routes.
pub struct SseState {
    registry: Arc<EnvironmentRegistry>,
    active: RwLock<Option<ActiveSession>>,
}

struct ActiveSession {
    session: Arc<McpSession>,
    sender: mpsc::Sender<JsonRpcResponse>,
}

#[derive(Debug, Deserialize)]
struct MessageQuery {
    #[serde(rename = "sessionId")]
    session_id: Option<String>,
}

pub fn router(registry: Arc<EnvironmentRegistry>) -> Router {
    let state = Arc::new(SseState {
        registry,
        active: RwLock::new(None),
    });

    Router::new()
        .route(SSE_PATH, get(open_session))
        .route(MESSAGE_PATH, post(post_message))
        .with_state(state)
}

/// Bind `config.bind_addr()` and serve until Ctrl-C or SIGTERM.
pub async fn serve(
    config: &ServerConfig,
    registry: Arc<EnvironmentRegistry>,
) -> Result<(), std::io::Error> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("listening on {}", addr);

    axum::serve(listener, router(registry))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

async fn open_session(
    State(state): State<Arc<SseState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let id = Uuid::new_v4().to_string();
    let (sender, mut receiver) = mpsc::channel(SESSION_BUFFER);
    let session = Arc::new(McpSession::new(id.clone()));

    let previous = state
        .active
        .write()
        .await
        .replace(ActiveSession { session, sender });
    if let Some(previous) = previous {
        tracing::info!(session_id = %previous.session.id(), "replacing active session");
    }
    tracing::info!(session_id = %id, "connecting to transport");

    let endpoint = format!("{MESSAGE_PATH}?sessionId={id}");
    let stream = async_stream::stream! {
        yield Ok(Event::default().event("endpoint").data(endpoint));

        while let Some(resp) = receiver.recv().await {
            match serde_json::to_string(&resp) {
                Ok(json) => yield Ok(Event::default().event("message").data(json)),
                Err(e) => tracing::error!("failed to encode response: {}", e),
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn post_message(
    State(state): State<Arc<SseState>>,
    Query(query): Query<MessageQuery>,
    body: Bytes,
) -> Response {
    let active = state
        .active
        .read()
        .await
        .as_ref()
        .map(|a| (Arc::clone(&a.session), a.sender.clone()));

    let Some((session, sender)) = active else {
        tracing::warn!("no transport available");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, "No transport");
    };

    if let Some(requested) = query.session_id.as_deref() {
        if requested != session.id() {
            tracing::warn!(session_id = %requested, "message for unknown session");
            return error_response(StatusCode::NOT_FOUND, "Unknown session");
        }
    }

    tracing::debug!(session_id = %session.id(), "posting message to transport");

    if let Some(resp) = session.handle_message(&body, &state.registry).await {
        if sender.send(resp).await.is_err() {
            tracing::warn!(session_id = %session.id(), "session stream closed");
            return error_response(StatusCode::GONE, "Session closed");
        }
    }

    StatusCode::ACCEPTED.into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}
