/// Failures talking to the Remote Config service.
#[derive(Debug, thiserror::Error)]
pub enum RemoteConfigError {
    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote config service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid template payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("remote config response carried no ETag header")]
    MissingEtag,

    #[error("template etag {expected} is stale (live etag is {actual})")]
    Conflict { expected: String, actual: String },
}
