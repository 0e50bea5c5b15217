//! Memory engine client interface.

use crate::error::MemoryError;
use async_trait::async_trait;
use mnemon_rs_protocol::{
    RecallOptions, RecallResponse, ReflectOptions, ReflectResponse, RetainOptions, RetainResponse,
};

#[async_trait]
/// Retain/recall/reflect boundary of an external memory engine.
///
/// One instance is shared by every concurrent invocation of the middleware,
/// so implementations must be safe for concurrent use. Timeouts are the
/// implementation's responsibility.
pub trait MemoryClient: Send + Sync {
    /// Store new content in a bank.
    async fn retain(
        &self,
        bank_id: &str,
        content: &str,
        options: RetainOptions,
    ) -> Result<RetainResponse, MemoryError>;

    /// Query a bank for memories relevant to `query`, best ranked first.
    async fn recall(
        &self,
        bank_id: &str,
        query: &str,
        options: RecallOptions,
    ) -> Result<RecallResponse, MemoryError>;

    /// Ask the engine to reason over a bank's memories.
    async fn reflect(
        &self,
        bank_id: &str,
        query: &str,
        options: ReflectOptions,
    ) -> Result<ReflectResponse, MemoryError>;
}
