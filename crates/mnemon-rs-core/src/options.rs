//! Runtime middleware settings and their mapping from config.

use crate::bank::BankResolver;
use crate::error::MiddlewareError;
use mnemon_rs_config::{ClientConfig, ClientProvider, ConfigError, MnemonConfig};
use mnemon_rs_memory::{
    CliMemoryClient, DEFAULT_JACCARD_THRESHOLD, HttpMemoryClient, MemoryClient, PromptOptions,
};
use mnemon_rs_protocol::{Budget, MemoryType};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Auto-recall behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RecallSettings {
    pub enabled: bool,
    pub budget: Budget,
    pub max_tokens: Option<usize>,
    pub types: Option<Vec<MemoryType>>,
    pub include_entities: bool,
    pub max_entity_tokens: Option<usize>,
    /// Near-duplicate threshold; `None` keeps every recalled memory.
    pub dedup_threshold: Option<f64>,
}

impl Default for RecallSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            budget: Budget::Mid,
            max_tokens: None,
            types: None,
            include_entities: true,
            max_entity_tokens: None,
            dedup_threshold: Some(DEFAULT_JACCARD_THRESHOLD),
        }
    }
}

/// Auto-retain behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RetainSettings {
    pub enabled: bool,
    /// Run the retain call as a detached task instead of awaiting it.
    pub detached: bool,
    pub context: Option<String>,
    pub tags: Vec<String>,
    pub metadata: BTreeMap<String, String>,
}

impl Default for RetainSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            detached: true,
            context: None,
            tags: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }
}

/// Everything the middleware needs besides the client and bank resolver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MiddlewareOptions {
    pub recall: RecallSettings,
    pub retain: RetainSettings,
    /// Defaults for [`crate::MemoryContext::format_system_prompt`].
    pub prompt: PromptOptions,
}

impl MiddlewareOptions {
    /// Translate a loaded config into runtime options.
    pub fn from_config(config: &MnemonConfig) -> Self {
        let recall = &config.memory.recall;
        let retain = &config.memory.retain;
        let prompt = &config.prompt;
        Self {
            recall: RecallSettings {
                enabled: recall.enabled,
                budget: recall.budget,
                max_tokens: recall.max_tokens,
                types: recall.types.clone(),
                include_entities: recall.include_entities,
                max_entity_tokens: recall.max_entity_tokens,
                dedup_threshold: recall.dedup_threshold,
            },
            retain: RetainSettings {
                enabled: retain.enabled,
                detached: retain.is_async,
                context: retain.context.clone(),
                tags: retain.tags.clone(),
                metadata: retain.metadata.clone(),
            },
            prompt: PromptOptions {
                preamble: prompt.preamble.clone(),
                max_memories: prompt.max_memories,
                include_types: prompt.include_types.clone(),
                include_entities: prompt.include_entities,
            },
        }
    }
}

/// Constant bank resolver from `memory.bank_id`, if configured.
pub fn bank_from_config(config: &MnemonConfig) -> Option<BankResolver> {
    config
        .memory
        .bank_id
        .as_ref()
        .map(|bank_id| BankResolver::constant(bank_id.clone()))
}

/// Build the memory client selected by `client.provider`.
pub fn build_client(config: &ClientConfig) -> Result<Arc<dyn MemoryClient>, MiddlewareError> {
    match config.provider {
        ClientProvider::Http => {
            let api_key = match &config.api_key_env {
                Some(name) => Some(std::env::var(name).map_err(|_| {
                    ConfigError::Invalid(format!(
                        "client.api_key_env names an unset variable: {name}"
                    ))
                })?),
                None => None,
            };
            let client = HttpMemoryClient::with_options(
                &config.base_url,
                api_key,
                Duration::from_secs(config.timeout_secs),
            )?;
            Ok(Arc::new(client))
        }
        ClientProvider::Cli => {
            let client =
                CliMemoryClient::with_inline_limit(&config.cli.program, config.cli.inline_limit)?;
            Ok(Arc::new(client))
        }
    }
}
