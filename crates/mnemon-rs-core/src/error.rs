//! Error types for the middleware crate.

use mnemon_rs_config::ConfigError;
use mnemon_rs_memory::MemoryError;
use thiserror::Error;

/// Errors returned by the memory middleware.
#[derive(Debug, Error)]
pub enum MiddlewareError {
    /// The bank resolver produced an empty or blank bank id.
    #[error("bank resolver returned an empty bank id (thread={thread_id})")]
    InvalidBankId { thread_id: String },
    /// The wrapped handler failed; its error is carried unchanged.
    #[error(transparent)]
    Handler(anyhow::Error),
    /// Configuration could not be turned into a middleware.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// The configured memory client could not be built.
    #[error("memory client error: {0}")]
    Client(#[from] MemoryError),
}
