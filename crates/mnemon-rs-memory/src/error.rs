//! Error types for memory engine calls.

/// Errors returned by memory clients.
#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    /// Transport-level HTTP failure (connect, timeout, body read).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// Engine answered with a non-success status.
    #[error("engine returned {status}: {body}")]
    Status { status: u16, body: String },
    /// Serialization error.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// External command exited unsuccessfully.
    #[error("command failed (status={status:?}): {stderr}")]
    Command { status: Option<i32>, stderr: String },
    /// Client is not usable in this environment.
    #[error("memory engine unavailable: {0}")]
    Unavailable(String),
    /// Engine-reported failure that does not fit another variant.
    #[error("engine error: {0}")]
    Engine(String),
}
