//! Recall/retain orchestration around a message handler.

use crate::bank::BankResolver;
use crate::context::MemoryContext;
use crate::error::MiddlewareError;
use crate::options::{MiddlewareOptions, bank_from_config, build_client};
use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use mnemon_rs_config::{ConfigError, MnemonConfig};
use mnemon_rs_memory::{MemoryClient, deduplicate_by_jaccard};
use mnemon_rs_protocol::{
    ChatMessage, ChatThread, EntityState, MemoryRecord, RecallOptions, RetainOptions, TurnId,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

/// Host message handler wrapped by the middleware.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Handle one inbound message with the memory context built for it.
    async fn handle(
        &self,
        thread: &dyn ChatThread,
        message: &ChatMessage,
        context: MemoryContext,
    ) -> anyhow::Result<()>;
}

/// Memory middleware: resolve bank, auto-retain, auto-recall, then call the handler.
///
/// Holds no mutable state, so one instance serves concurrent invocations.
#[derive(Clone)]
pub struct MemoryMiddleware {
    client: Arc<dyn MemoryClient>,
    bank: BankResolver,
    options: MiddlewareOptions,
}

impl MemoryMiddleware {
    /// Create a middleware with default options.
    pub fn new(client: Arc<dyn MemoryClient>, bank: impl Into<BankResolver>) -> Self {
        Self::with_options(client, bank, MiddlewareOptions::default())
    }

    pub fn with_options(
        client: Arc<dyn MemoryClient>,
        bank: impl Into<BankResolver>,
        options: MiddlewareOptions,
    ) -> Self {
        Self {
            client,
            bank: bank.into(),
            options,
        }
    }

    /// Build client, bank and options from a loaded config.
    ///
    /// `bank` overrides `memory.bank_id`; one of the two is required.
    pub fn from_config(
        config: &MnemonConfig,
        bank: Option<BankResolver>,
    ) -> Result<Self, MiddlewareError> {
        let bank = bank.or_else(|| bank_from_config(config)).ok_or_else(|| {
            ConfigError::Invalid("memory.bank_id is required without a bank resolver".to_string())
        })?;
        let client = build_client(&config.client)?;
        info!(
            "memory middleware configured (provider={:?}, recall={}, retain={})",
            config.client.provider, config.memory.recall.enabled, config.memory.retain.enabled
        );
        Ok(Self::with_options(
            client,
            bank,
            MiddlewareOptions::from_config(config),
        ))
    }

    pub fn options(&self) -> &MiddlewareOptions {
        &self.options
    }

    /// Bind a handler, producing a handler that runs through this middleware.
    pub fn wrap<H: MessageHandler>(self, handler: H) -> MemoryHandler<H> {
        MemoryHandler {
            middleware: self,
            handler,
        }
    }

    /// Run one invocation for `message` and await the handler.
    ///
    /// Ordering: synchronous retain, then recall, then the handler. Memory
    /// failures only degrade the context; handler errors propagate unchanged.
    pub async fn handle_message(
        &self,
        thread: &dyn ChatThread,
        message: &ChatMessage,
        handler: &dyn MessageHandler,
    ) -> Result<(), MiddlewareError> {
        let turn_id = Uuid::new_v4();
        let bank_id = self.bank.resolve(message);
        if bank_id.trim().is_empty() {
            return Err(MiddlewareError::InvalidBankId {
                thread_id: message.thread_id.clone(),
            });
        }
        debug!(
            "memory turn started (turn_id={}, bank={}, thread={})",
            turn_id, bank_id, message.thread_id
        );

        if self.should_retain(message) {
            self.auto_retain(turn_id, &bank_id, message).await;
        }

        let (memories, entities) = if self.options.recall.enabled && !message.is_blank() {
            self.auto_recall(turn_id, &bank_id, &message.text).await
        } else {
            (Vec::new(), None)
        };

        let context = MemoryContext::new(
            turn_id,
            bank_id,
            memories,
            entities,
            self.options.prompt.clone(),
            self.client.clone(),
        );
        handler
            .handle(thread, message, context)
            .await
            .map_err(MiddlewareError::Handler)
    }

    fn should_retain(&self, message: &ChatMessage) -> bool {
        self.options.retain.enabled && !message.is_blank() && !message.is_from_self()
    }

    fn retain_options(&self, message: &ChatMessage) -> RetainOptions {
        let settings = &self.options.retain;
        let mut metadata = settings.metadata.clone();
        metadata.insert("thread_id".to_string(), message.thread_id.clone());
        metadata.insert("user_id".to_string(), message.author.user_id.clone());
        RetainOptions {
            timestamp: Some(Utc::now()),
            context: settings.context.clone(),
            metadata: Some(metadata),
            document_id: None,
            tags: (!settings.tags.is_empty()).then(|| settings.tags.clone()),
            is_async: settings.detached,
        }
    }

    /// Store the inbound text; failures are logged and never surface.
    async fn auto_retain(&self, turn_id: TurnId, bank_id: &str, message: &ChatMessage) {
        let options = self.retain_options(message);
        if self.options.retain.detached {
            let client = self.client.clone();
            let bank_id = bank_id.to_string();
            let content = message.text.clone();
            debug!("auto-retain detached (turn_id={}, bank={})", turn_id, bank_id);
            tokio::spawn(async move {
                if let Err(err) = client.retain(&bank_id, &content, options).await {
                    warn!(
                        "auto-retain failed (turn_id={}, bank={}, err={})",
                        turn_id, bank_id, err
                    );
                }
            });
            return;
        }
        match self.client.retain(bank_id, &message.text, options).await {
            Ok(response) => debug!(
                "auto-retain stored (turn_id={}, bank={}, items={})",
                turn_id, bank_id, response.items_count
            ),
            Err(err) => warn!(
                "auto-retain failed (turn_id={}, bank={}, err={})",
                turn_id, bank_id, err
            ),
        }
    }

    /// Recall memories for `query`; any failure degrades to no memories.
    async fn auto_recall(
        &self,
        turn_id: TurnId,
        bank_id: &str,
        query: &str,
    ) -> (Vec<MemoryRecord>, Option<BTreeMap<String, EntityState>>) {
        let settings = &self.options.recall;
        let options = RecallOptions {
            types: settings.types.clone(),
            max_tokens: settings.max_tokens,
            budget: Some(settings.budget),
            include_entities: settings.include_entities,
            max_entity_tokens: settings.max_entity_tokens,
            ..RecallOptions::default()
        };
        match self.client.recall(bank_id, query, options).await {
            Ok(response) => {
                let recalled = response.results.len();
                let memories = match settings.dedup_threshold {
                    Some(threshold) => deduplicate_by_jaccard(response.results, threshold),
                    None => response.results,
                };
                debug!(
                    "auto-recall done (turn_id={}, bank={}, recalled={}, kept={})",
                    turn_id,
                    bank_id,
                    recalled,
                    memories.len()
                );
                (memories, response.entities)
            }
            Err(err) => {
                warn!(
                    "auto-recall failed (turn_id={}, bank={}, err={})",
                    turn_id, bank_id, err
                );
                (Vec::new(), None)
            }
        }
    }
}

/// A handler bound to a middleware instance.
pub struct MemoryHandler<H> {
    middleware: MemoryMiddleware,
    handler: H,
}

impl<H: MessageHandler> MemoryHandler<H> {
    /// Handle `message` through the middleware.
    pub async fn handle(
        &self,
        thread: &dyn ChatThread,
        message: &ChatMessage,
    ) -> Result<(), MiddlewareError> {
        self.middleware
            .handle_message(thread, message, &self.handler)
            .await
    }

    pub fn middleware(&self) -> &MemoryMiddleware {
        &self.middleware
    }

    pub fn inner(&self) -> &H {
        &self.handler
    }
}
