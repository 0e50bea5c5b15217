//! Recall/retain middleware around chat message handlers.
//!
//! The middleware resolves a memory bank per message, optionally retains the
//! inbound text, recalls relevant memories, and hands the handler a
//! [`MemoryContext`] bound to the bank.

pub mod bank;
pub mod context;
pub mod error;
pub mod middleware;
pub mod options;

pub use bank::BankResolver;
pub use context::MemoryContext;
pub use error::MiddlewareError;
/// Middleware facade and handler contract.
pub use middleware::{MemoryHandler, MemoryMiddleware, MessageHandler};
/// Runtime settings and config mapping.
pub use options::{
    MiddlewareOptions, RecallSettings, RetainSettings, bank_from_config, build_client,
};
