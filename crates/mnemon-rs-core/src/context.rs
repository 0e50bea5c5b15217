//! Per-invocation memory context handed to message handlers.

use mnemon_rs_memory::{
    MemoryClient, MemoryError, PromptOptions, format_memories_as_system_prompt,
    format_memories_compact,
};
use mnemon_rs_protocol::{
    BankId, EntityState, MemoryRecord, RecallOptions, RecallResponse, ReflectOptions,
    ReflectResponse, RetainOptions, RetainResponse, TurnId,
};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Memories recalled for one message plus bank-bound client calls.
///
/// Calls made through the context are not error-isolated: failures are
/// returned to the handler.
#[derive(Clone)]
pub struct MemoryContext {
    turn_id: TurnId,
    bank_id: BankId,
    memories: Vec<MemoryRecord>,
    entities: Option<BTreeMap<String, EntityState>>,
    prompt_defaults: PromptOptions,
    client: Arc<dyn MemoryClient>,
}

impl MemoryContext {
    pub fn new(
        turn_id: TurnId,
        bank_id: BankId,
        memories: Vec<MemoryRecord>,
        entities: Option<BTreeMap<String, EntityState>>,
        prompt_defaults: PromptOptions,
        client: Arc<dyn MemoryClient>,
    ) -> Self {
        Self {
            turn_id,
            bank_id,
            memories,
            entities,
            prompt_defaults,
            client,
        }
    }

    /// Correlation id of the invocation that built this context.
    pub fn turn_id(&self) -> TurnId {
        self.turn_id
    }

    pub fn bank_id(&self) -> &str {
        &self.bank_id
    }

    /// Recalled memories, best first. Empty when recall was skipped or failed.
    pub fn memories(&self) -> &[MemoryRecord] {
        &self.memories
    }

    /// Entity states from recall; `None` when not requested or recall failed.
    pub fn entities(&self) -> Option<&BTreeMap<String, EntityState>> {
        self.entities.as_ref()
    }

    /// System-prompt section using the configured prompt options.
    pub fn format_system_prompt(&self) -> String {
        self.format_system_prompt_with(&self.prompt_defaults)
    }

    /// System-prompt section using explicit options.
    pub fn format_system_prompt_with(&self, options: &PromptOptions) -> String {
        format_memories_as_system_prompt(&self.memories, self.entities.as_ref(), options)
    }

    /// Compact `[label, when] text` lines for the recalled memories.
    pub fn compact_memories(&self) -> String {
        format_memories_compact(&self.memories)
    }

    /// Retain content in this context's bank.
    pub async fn retain(
        &self,
        content: &str,
        options: RetainOptions,
    ) -> Result<RetainResponse, MemoryError> {
        self.client.retain(&self.bank_id, content, options).await
    }

    /// Recall from this context's bank.
    pub async fn recall(
        &self,
        query: &str,
        options: RecallOptions,
    ) -> Result<RecallResponse, MemoryError> {
        self.client.recall(&self.bank_id, query, options).await
    }

    /// Reflect over this context's bank.
    pub async fn reflect(
        &self,
        query: &str,
        options: ReflectOptions,
    ) -> Result<ReflectResponse, MemoryError> {
        self.client.reflect(&self.bank_id, query, options).await
    }
}

impl fmt::Debug for MemoryContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryContext")
            .field("turn_id", &self.turn_id)
            .field("bank_id", &self.bank_id)
            .field("memories", &self.memories.len())
            .field("entities", &self.entities.as_ref().map(BTreeMap::len))
            .finish_non_exhaustive()
    }
}
