//! Memory client that shells out to a local engine CLI.

use crate::client::MemoryClient;
use crate::error::MemoryError;
use async_trait::async_trait;
use log::debug;
use mnemon_rs_protocol::{
    RecallOptions, RecallResponse, ReflectOptions, ReflectResponse, RetainOptions, RetainResponse,
};
use serde::de::DeserializeOwned;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tokio::process::Command;

/// Largest quoted `sh -c` script passed inline.
///
/// The script is one argv entry and Linux caps that at 128 KiB.
pub const DEFAULT_INLINE_LIMIT: usize = 64 * 1024;

/// Wrap `value` in single quotes for `sh`, escaping embedded quotes as `'\''`.
pub fn quote_single(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

/// How a payload reaches the external process.
#[derive(Debug)]
pub enum PayloadTransport {
    /// Passed directly as a positional argument.
    Inline(String),
    /// Written to a temporary file passed with `--file`; removed on drop.
    TempFile(NamedTempFile),
}

impl PayloadTransport {
    /// Pick a transport for `payload` given the inline byte limit.
    ///
    /// The limit applies to the payload after shell quoting, since each `'`
    /// grows to four bytes.
    pub fn for_payload(payload: &str, inline_limit: usize) -> Result<Self, MemoryError> {
        if quote_single(payload).len() <= inline_limit {
            return Ok(Self::Inline(payload.to_string()));
        }
        Self::to_file(payload)
    }

    /// Write `payload` to a temporary file.
    pub fn to_file(payload: &str) -> Result<Self, MemoryError> {
        let mut file = NamedTempFile::new()?;
        file.write_all(payload.as_bytes())?;
        file.flush()?;
        Ok(Self::TempFile(file))
    }

    /// Command-line words carrying the payload.
    pub fn args(&self) -> Vec<String> {
        match self {
            Self::Inline(payload) => vec![payload.clone()],
            Self::TempFile(file) => vec![
                "--file".to_string(),
                file.path().to_string_lossy().into_owned(),
            ],
        }
    }
}

/// Memory client running `<program> <subcommand> <bank> <payload> [flags] --output json`.
#[derive(Debug, Clone)]
pub struct CliMemoryClient {
    program: Vec<String>,
    inline_limit: usize,
}

impl CliMemoryClient {
    /// Create a client for a program command line such as `"hindsight"`.
    pub fn new(program: &str) -> Result<Self, MemoryError> {
        Self::with_inline_limit(program, DEFAULT_INLINE_LIMIT)
    }

    /// Create a client with a custom inline payload limit in bytes.
    pub fn with_inline_limit(program: &str, inline_limit: usize) -> Result<Self, MemoryError> {
        let mut words =
            shell_words::split(program).map_err(|err| MemoryError::Unavailable(err.to_string()))?;
        let Some(executable) = words.first() else {
            return Err(MemoryError::Unavailable(
                "memory cli program cannot be empty".to_string(),
            ));
        };
        let resolved: PathBuf = which::which(executable).map_err(|_| {
            MemoryError::Unavailable(format!("memory cli not found on PATH: {executable}"))
        })?;
        words[0] = resolved.to_string_lossy().into_owned();
        Ok(Self {
            program: words,
            inline_limit,
        })
    }

    /// Resolved program words.
    pub fn program(&self) -> &[String] {
        &self.program
    }

    /// Build the `sh -c` script for a subcommand; every word is single-quoted.
    pub fn script(
        &self,
        subcommand: &str,
        bank_id: &str,
        payload: &PayloadTransport,
        flags: &[String],
    ) -> String {
        let mut words: Vec<String> = self.program.clone();
        words.push(subcommand.to_string());
        words.push(bank_id.to_string());
        words.extend(payload.args());
        words.extend(flags.iter().cloned());
        words.push("--output".to_string());
        words.push("json".to_string());
        words
            .iter()
            .map(|word| quote_single(word))
            .collect::<Vec<_>>()
            .join(" ")
    }

    async fn run<T: DeserializeOwned>(
        &self,
        subcommand: &str,
        bank_id: &str,
        payload: &str,
        flags: Vec<String>,
    ) -> Result<T, MemoryError> {
        let mut transport = PayloadTransport::for_payload(payload, self.inline_limit)?;
        let mut script = self.script(subcommand, bank_id, &transport, &flags);
        if script.len() > self.inline_limit && matches!(transport, PayloadTransport::Inline(_)) {
            transport = PayloadTransport::to_file(payload)?;
            script = self.script(subcommand, bank_id, &transport, &flags);
        }
        debug!(
            "running memory cli (subcommand={}, bank={}, via_file={})",
            subcommand,
            bank_id,
            matches!(transport, PayloadTransport::TempFile(_))
        );
        let output = Command::new("sh")
            .arg("-c")
            .arg(&script)
            .kill_on_drop(true)
            .output()
            .await?;
        drop(transport);
        if !output.status.success() {
            return Err(MemoryError::Command {
                status: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(serde_json::from_slice(&output.stdout)?)
    }
}

fn push_flag(flags: &mut Vec<String>, name: &str, value: Option<String>) {
    if let Some(value) = value {
        flags.push(name.to_string());
        flags.push(value);
    }
}

fn push_switch(flags: &mut Vec<String>, name: &str, on: bool) {
    if on {
        flags.push(name.to_string());
    }
}

/// Flags for `retain`.
pub fn retain_flags(options: &RetainOptions) -> Vec<String> {
    let mut flags = Vec::new();
    push_flag(&mut flags, "--context", options.context.clone());
    push_flag(
        &mut flags,
        "--timestamp",
        options.timestamp.map(|at| at.to_rfc3339()),
    );
    push_flag(&mut flags, "--document-id", options.document_id.clone());
    for tag in options.tags.iter().flatten() {
        push_flag(&mut flags, "--tag", Some(tag.clone()));
    }
    for (key, value) in options.metadata.iter().flatten() {
        push_flag(&mut flags, "--metadata", Some(format!("{key}={value}")));
    }
    push_switch(&mut flags, "--async", options.is_async);
    flags
}

/// Flags for `recall`.
pub fn recall_flags(options: &RecallOptions) -> Vec<String> {
    let mut flags = Vec::new();
    for kind in options.types.iter().flatten() {
        push_flag(&mut flags, "--type", Some(kind.to_string()));
    }
    push_flag(
        &mut flags,
        "--max-tokens",
        options.max_tokens.map(|n| n.to_string()),
    );
    push_flag(
        &mut flags,
        "--budget",
        options.budget.map(|b| b.as_str().to_string()),
    );
    push_switch(&mut flags, "--trace", options.trace);
    push_flag(
        &mut flags,
        "--query-timestamp",
        options.query_timestamp.map(|at| at.to_rfc3339()),
    );
    push_switch(&mut flags, "--include-entities", options.include_entities);
    push_flag(
        &mut flags,
        "--max-entity-tokens",
        options.max_entity_tokens.map(|n| n.to_string()),
    );
    push_switch(&mut flags, "--include-chunks", options.include_chunks);
    push_flag(
        &mut flags,
        "--max-chunk-tokens",
        options.max_chunk_tokens.map(|n| n.to_string()),
    );
    flags
}

/// Flags for `reflect`.
pub fn reflect_flags(options: &ReflectOptions) -> Vec<String> {
    let mut flags = Vec::new();
    push_flag(&mut flags, "--context", options.context.clone());
    push_flag(
        &mut flags,
        "--budget",
        options.budget.map(|b| b.as_str().to_string()),
    );
    push_flag(
        &mut flags,
        "--max-tokens",
        options.max_tokens.map(|n| n.to_string()),
    );
    flags
}

#[async_trait]
impl MemoryClient for CliMemoryClient {
    async fn retain(
        &self,
        bank_id: &str,
        content: &str,
        options: RetainOptions,
    ) -> Result<RetainResponse, MemoryError> {
        self.run("retain", bank_id, content, retain_flags(&options))
            .await
    }

    async fn recall(
        &self,
        bank_id: &str,
        query: &str,
        options: RecallOptions,
    ) -> Result<RecallResponse, MemoryError> {
        self.run("recall", bank_id, query, recall_flags(&options))
            .await
    }

    async fn reflect(
        &self,
        bank_id: &str,
        query: &str,
        options: ReflectOptions,
    ) -> Result<ReflectResponse, MemoryError> {
        self.run("reflect", bank_id, query, reflect_flags(&options))
            .await
    }
}
