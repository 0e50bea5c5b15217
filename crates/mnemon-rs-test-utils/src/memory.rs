use async_trait::async_trait;
use mnemon_rs_memory::{MemoryClient, MemoryError};
use mnemon_rs_protocol::{
    MemoryRecord, RecallOptions, RecallResponse, ReflectOptions, ReflectResponse, RetainOptions,
    RetainResponse,
};
use parking_lot::Mutex;
use tokio::sync::Notify;

/// A call observed by a fake memory client.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCall {
    Retain {
        bank_id: String,
        content: String,
        options: RetainOptions,
    },
    Recall {
        bank_id: String,
        query: String,
        options: RecallOptions,
    },
    Reflect {
        bank_id: String,
        query: String,
        options: ReflectOptions,
    },
}

fn retained(bank_id: &str, is_async: bool) -> RetainResponse {
    RetainResponse {
        success: true,
        bank_id: bank_id.to_string(),
        items_count: 1,
        is_async,
    }
}

/// Recording client returning canned recall and reflect answers.
#[derive(Debug, Default)]
pub struct StubMemoryClient {
    recall_response: RecallResponse,
    reflect_text: String,
    calls: Mutex<Vec<ClientCall>>,
}

impl StubMemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recall(results: Vec<MemoryRecord>) -> Self {
        Self::with_response(RecallResponse {
            results,
            ..RecallResponse::default()
        })
    }

    pub fn with_response(recall_response: RecallResponse) -> Self {
        Self {
            recall_response,
            ..Self::default()
        }
    }

    pub fn with_reflect_text(mut self, text: impl Into<String>) -> Self {
        self.reflect_text = text.into();
        self
    }

    pub fn calls(&self) -> Vec<ClientCall> {
        self.calls.lock().clone()
    }

    pub fn retain_calls(&self) -> Vec<ClientCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, ClientCall::Retain { .. }))
            .collect()
    }

    pub fn recall_calls(&self) -> Vec<ClientCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, ClientCall::Recall { .. }))
            .collect()
    }
}

#[async_trait]
impl MemoryClient for StubMemoryClient {
    async fn retain(
        &self,
        bank_id: &str,
        content: &str,
        options: RetainOptions,
    ) -> Result<RetainResponse, MemoryError> {
        let is_async = options.is_async;
        self.calls.lock().push(ClientCall::Retain {
            bank_id: bank_id.to_string(),
            content: content.to_string(),
            options,
        });
        Ok(retained(bank_id, is_async))
    }

    async fn recall(
        &self,
        bank_id: &str,
        query: &str,
        options: RecallOptions,
    ) -> Result<RecallResponse, MemoryError> {
        self.calls.lock().push(ClientCall::Recall {
            bank_id: bank_id.to_string(),
            query: query.to_string(),
            options,
        });
        Ok(self.recall_response.clone())
    }

    async fn reflect(
        &self,
        bank_id: &str,
        query: &str,
        options: ReflectOptions,
    ) -> Result<ReflectResponse, MemoryError> {
        self.calls.lock().push(ClientCall::Reflect {
            bank_id: bank_id.to_string(),
            query: query.to_string(),
            options,
        });
        Ok(ReflectResponse {
            text: self.reflect_text.clone(),
            based_on: None,
        })
    }
}

/// Client whose every call fails, counting attempts.
#[derive(Debug, Default)]
pub struct FailingMemoryClient {
    attempts: Mutex<usize>,
}

impl FailingMemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempts(&self) -> usize {
        *self.attempts.lock()
    }

    fn fail(&self, operation: &str) -> MemoryError {
        *self.attempts.lock() += 1;
        MemoryError::Unavailable(format!("{operation} is down"))
    }
}

#[async_trait]
impl MemoryClient for FailingMemoryClient {
    async fn retain(
        &self,
        _bank_id: &str,
        _content: &str,
        _options: RetainOptions,
    ) -> Result<RetainResponse, MemoryError> {
        Err(self.fail("retain"))
    }

    async fn recall(
        &self,
        _bank_id: &str,
        _query: &str,
        _options: RecallOptions,
    ) -> Result<RecallResponse, MemoryError> {
        Err(self.fail("recall"))
    }

    async fn reflect(
        &self,
        _bank_id: &str,
        _query: &str,
        _options: ReflectOptions,
    ) -> Result<ReflectResponse, MemoryError> {
        Err(self.fail("reflect"))
    }
}

/// Client whose retain blocks until the gate opens, logging events in order.
///
/// Events are `retain:start`, `retain:done`, `recall`, plus anything pushed
/// with [`GatedMemoryClient::push_event`].
#[derive(Debug)]
pub struct GatedMemoryClient {
    gate: Notify,
    gate_open: Mutex<bool>,
    retained: Notify,
    events: Mutex<Vec<String>>,
}

impl GatedMemoryClient {
    /// Retain waits for [`GatedMemoryClient::open_gate`].
    pub fn closed() -> Self {
        Self {
            gate: Notify::new(),
            gate_open: Mutex::new(false),
            retained: Notify::new(),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Retain completes immediately.
    pub fn open() -> Self {
        let client = Self::closed();
        *client.gate_open.lock() = true;
        client
    }

    pub fn open_gate(&self) {
        *self.gate_open.lock() = true;
        self.gate.notify_one();
    }

    /// Wait until a retain call has completed.
    pub async fn wait_for_retain(&self) {
        self.retained.notified().await;
    }

    pub fn push_event(&self, event: impl Into<String>) {
        self.events.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl MemoryClient for GatedMemoryClient {
    async fn retain(
        &self,
        bank_id: &str,
        _content: &str,
        options: RetainOptions,
    ) -> Result<RetainResponse, MemoryError> {
        self.push_event("retain:start");
        let is_open = *self.gate_open.lock();
        if !is_open {
            self.gate.notified().await;
        }
        self.push_event("retain:done");
        self.retained.notify_one();
        Ok(retained(bank_id, options.is_async))
    }

    async fn recall(
        &self,
        _bank_id: &str,
        _query: &str,
        _options: RecallOptions,
    ) -> Result<RecallResponse, MemoryError> {
        self.push_event("recall");
        Ok(RecallResponse::default())
    }

    async fn reflect(
        &self,
        _bank_id: &str,
        _query: &str,
        _options: ReflectOptions,
    ) -> Result<ReflectResponse, MemoryError> {
        Ok(ReflectResponse::default())
    }
}
