//! Memory engine clients and the text pipeline that turns recalled memories
//! into prompt material.

pub mod cli;
pub mod client;
pub mod dedup;
pub mod error;
pub mod format;
pub mod http;
pub mod markdown;
pub mod prompt;

/// Shell-backed engine client.
pub use cli::{CliMemoryClient, DEFAULT_INLINE_LIMIT, PayloadTransport, quote_single};
/// Memory engine client interface.
pub use client::MemoryClient;
/// Near-duplicate elimination.
pub use dedup::{DEFAULT_JACCARD_THRESHOLD, deduplicate_by_jaccard, jaccard_similarity};
/// Memory error type.
pub use error::MemoryError;
/// Compact single-line rendering.
pub use format::{format_memories_compact, format_memories_compact_at};
/// HTTP engine client.
pub use http::HttpMemoryClient;
/// Markdown normalization.
pub use markdown::strip_markdown;
/// System-prompt rendering.
pub use prompt::{DEFAULT_PREAMBLE, PromptOptions, format_memories_as_system_prompt};
