//! HTTP client for a remote memory engine.

use crate::client::MemoryClient;
use crate::error::MemoryError;
use async_trait::async_trait;
use log::debug;
use mnemon_rs_protocol::{
    RecallOptions, RecallResponse, ReflectOptions, ReflectResponse, RetainOptions, RetainResponse,
};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::time::Duration;

/// Default engine endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8888";
/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Memory client speaking the engine's JSON-over-HTTP API.
#[derive(Debug, Clone)]
pub struct HttpMemoryClient {
    base_url: Url,
    api_key: Option<String>,
    http_client: reqwest::Client,
}

impl HttpMemoryClient {
    /// Create a client for `base_url` with the default timeout and no API key.
    pub fn new(base_url: &str) -> Result<Self, MemoryError> {
        Self::with_options(base_url, None, DEFAULT_TIMEOUT)
    }

    /// Create a client with an optional bearer key and a request timeout.
    pub fn with_options(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, MemoryError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| MemoryError::Unavailable(format!("invalid base url {base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(MemoryError::Unavailable(format!(
                "base url cannot carry a path: {base_url}"
            )));
        }
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url,
            api_key,
            http_client,
        })
    }

    /// Engine base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// URL for a bank-scoped endpoint, e.g. `["memories", "recall"]`.
    pub fn bank_url(&self, bank_id: &str, tail: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["v1", "default", "banks", bank_id])
                .extend(tail);
        }
        url
    }

    async fn post<T: DeserializeOwned>(&self, url: Url, body: &Value) -> Result<T, MemoryError> {
        debug!("memory engine request (url={})", url);
        let mut request = self.http_client.post(url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MemoryError::Status {
                status: status.as_u16(),
                body,
            });
        }
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl MemoryClient for HttpMemoryClient {
    async fn retain(
        &self,
        bank_id: &str,
        content: &str,
        options: RetainOptions,
    ) -> Result<RetainResponse, MemoryError> {
        let url = self.bank_url(bank_id, &["memories"]);
        self.post(url, &retain_body(content, &options)).await
    }

    async fn recall(
        &self,
        bank_id: &str,
        query: &str,
        options: RecallOptions,
    ) -> Result<RecallResponse, MemoryError> {
        let url = self.bank_url(bank_id, &["memories", "recall"]);
        self.post(url, &recall_body(query, &options)).await
    }

    async fn reflect(
        &self,
        bank_id: &str,
        query: &str,
        options: ReflectOptions,
    ) -> Result<ReflectResponse, MemoryError> {
        let url = self.bank_url(bank_id, &["reflect"]);
        self.post(url, &reflect_body(query, &options)).await
    }
}

fn insert_some<T: serde::Serialize>(map: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value {
        map.insert(key.to_string(), json!(value));
    }
}

/// Request body for a retain call: a single item plus the async flag.
pub fn retain_body(content: &str, options: &RetainOptions) -> Value {
    let mut item = Map::new();
    item.insert("content".to_string(), json!(content));
    insert_some(&mut item, "timestamp", options.timestamp);
    insert_some(&mut item, "context", options.context.as_ref());
    insert_some(&mut item, "metadata", options.metadata.as_ref());
    insert_some(&mut item, "document_id", options.document_id.as_ref());
    insert_some(&mut item, "tags", options.tags.as_ref());
    json!({
        "items": [Value::Object(item)],
        "async": options.is_async,
    })
}

/// Request body for a recall call.
pub fn recall_body(query: &str, options: &RecallOptions) -> Value {
    let mut body = Map::new();
    body.insert("query".to_string(), json!(query));
    insert_some(&mut body, "types", options.types.as_ref());
    insert_some(&mut body, "budget", options.budget);
    insert_some(&mut body, "max_tokens", options.max_tokens);
    body.insert("trace".to_string(), json!(options.trace));
    insert_some(&mut body, "query_timestamp", options.query_timestamp);

    let mut include = Map::new();
    if options.include_entities {
        let mut entities = Map::new();
        insert_some(&mut entities, "max_tokens", options.max_entity_tokens);
        include.insert("entities".to_string(), Value::Object(entities));
    }
    if options.include_chunks {
        let mut chunks = Map::new();
        insert_some(&mut chunks, "max_tokens", options.max_chunk_tokens);
        include.insert("chunks".to_string(), Value::Object(chunks));
    }
    if !include.is_empty() {
        body.insert("include".to_string(), Value::Object(include));
    }
    Value::Object(body)
}

/// Request body for a reflect call.
pub fn reflect_body(query: &str, options: &ReflectOptions) -> Value {
    let mut body = Map::new();
    body.insert("query".to_string(), json!(query));
    insert_some(&mut body, "budget", options.budget);
    insert_some(&mut body, "context", options.context.as_ref());
    insert_some(&mut body, "max_tokens", options.max_tokens);
    Value::Object(body)
}
