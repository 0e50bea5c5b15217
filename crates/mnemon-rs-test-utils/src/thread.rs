use async_trait::async_trait;
use mnemon_rs_protocol::{ChatThread, ThreadError};
use parking_lot::Mutex;

/// In-memory thread that records posted replies.
#[derive(Debug, Default)]
pub struct RecordingThread {
    id: String,
    posts: Mutex<Vec<String>>,
    subscribed: Mutex<bool>,
}

impl RecordingThread {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn posts(&self) -> Vec<String> {
        self.posts.lock().clone()
    }
}

#[async_trait]
impl ChatThread for RecordingThread {
    fn id(&self) -> &str {
        &self.id
    }

    async fn post(&self, text: &str) -> Result<(), ThreadError> {
        self.posts.lock().push(text.to_string());
        Ok(())
    }

    async fn subscribe(&self) -> Result<(), ThreadError> {
        *self.subscribed.lock() = true;
        Ok(())
    }

    async fn unsubscribe(&self) -> Result<(), ThreadError> {
        *self.subscribed.lock() = false;
        Ok(())
    }

    async fn is_subscribed(&self) -> Result<bool, ThreadError> {
        Ok(*self.subscribed.lock())
    }

    async fn state(&self) -> Result<Option<serde_json::Value>, ThreadError> {
        Ok(None)
    }
}
