//! Configuration schema for mnemon.

use mnemon_rs_protocol::{Budget, MemoryType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root config for the memory middleware.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MnemonConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

/// Bank selection plus auto-recall and auto-retain behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MemoryConfig {
    /// Constant bank used for every message; hosts may supply a resolver instead.
    #[serde(default)]
    pub bank_id: Option<String>,
    #[serde(default)]
    pub recall: RecallConfig,
    #[serde(default)]
    pub retain: RetainConfig,
}

/// Auto-recall settings applied before the handler runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecallConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub budget: Budget,
    #[serde(default)]
    pub max_tokens: Option<usize>,
    #[serde(default)]
    pub types: Option<Vec<MemoryType>>,
    #[serde(default = "default_true")]
    pub include_entities: bool,
    #[serde(default)]
    pub max_entity_tokens: Option<usize>,
    /// Jaccard threshold for dropping near-duplicate memories; `null` disables.
    #[serde(default = "default_dedup_threshold")]
    pub dedup_threshold: Option<f64>,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            budget: Budget::default(),
            max_tokens: None,
            types: None,
            include_entities: true,
            max_entity_tokens: None,
            dedup_threshold: default_dedup_threshold(),
        }
    }
}

/// Auto-retain settings for inbound messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetainConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Detach the retain call instead of awaiting it.
    #[serde(default = "default_true", rename = "async")]
    pub is_async: bool,
    /// Context label stored with each retained message.
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Extra metadata merged under the thread and user ids.
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Default for RetainConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            is_async: true,
            context: None,
            tags: Vec::new(),
            metadata: BTreeMap::new(),
        }
    }
}

/// System-prompt rendering defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptConfig {
    #[serde(default)]
    pub preamble: Option<String>,
    #[serde(default)]
    pub max_memories: Option<usize>,
    #[serde(default)]
    pub include_types: Option<Vec<MemoryType>>,
    #[serde(default = "default_true")]
    pub include_entities: bool,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            preamble: None,
            max_memories: None,
            include_types: None,
            include_entities: true,
        }
    }
}

/// Which memory client implementation to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClientProvider {
    #[default]
    Http,
    Cli,
}

/// Memory engine client settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub provider: ClientProvider,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable holding the engine API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub cli: CliClientConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            provider: ClientProvider::default(),
            base_url: default_base_url(),
            api_key_env: None,
            timeout_secs: default_timeout_secs(),
            cli: CliClientConfig::default(),
        }
    }
}

/// Settings for the shell-backed client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CliClientConfig {
    /// Program command line, split with shell word rules.
    #[serde(default = "default_cli_program")]
    pub program: String,
    /// Payloads above this many bytes are passed through a temp file.
    #[serde(default = "default_inline_limit")]
    pub inline_limit: usize,
}

impl Default for CliClientConfig {
    fn default() -> Self {
        Self {
            program: default_cli_program(),
            inline_limit: default_inline_limit(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_dedup_threshold() -> Option<f64> {
    Some(0.65)
}

fn default_base_url() -> String {
    "http://localhost:8888".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_cli_program() -> String {
    "hindsight".to_string()
}

fn default_inline_limit() -> usize {
    64 * 1024
}
