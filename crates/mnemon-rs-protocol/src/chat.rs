//! Host chat framework contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Errors surfaced by a host thread implementation.
#[derive(Debug, thiserror::Error)]
pub enum ThreadError {
    /// Posting a message failed.
    #[error("post failed: {0}")]
    PostFailed(String),
    /// Subscription change failed.
    #[error("subscription failed: {0}")]
    Subscription(String),
    /// Thread state could not be read.
    #[error("state unavailable: {0}")]
    State(String),
}

/// Author of an inbound chat message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatAuthor {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    /// Set when the message was written by the bot itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_me: Option<bool>,
}

/// Inbound chat message as seen by the middleware.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub thread_id: String,
    pub text: String,
    pub author: ChatAuthor,
}

impl ChatMessage {
    /// Build a message from a user in a thread.
    pub fn new(
        thread_id: impl Into<String>,
        user_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            thread_id: thread_id.into(),
            text: text.into(),
            author: ChatAuthor {
                user_id: user_id.into(),
                ..ChatAuthor::default()
            },
        }
    }

    /// True when the bot authored this message.
    pub fn is_from_self(&self) -> bool {
        self.author.is_me.unwrap_or(false)
    }

    /// True when the message carries no text worth remembering or querying.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Conversation thread exposed by the host framework.
#[async_trait]
pub trait ChatThread: Send + Sync {
    /// Thread identifier.
    fn id(&self) -> &str;

    /// Post a reply into the thread.
    async fn post(&self, text: &str) -> Result<(), ThreadError>;

    /// Subscribe the bot to follow-up messages in the thread.
    async fn subscribe(&self) -> Result<(), ThreadError>;

    /// Stop following the thread.
    async fn unsubscribe(&self) -> Result<(), ThreadError>;

    /// Whether the bot currently follows the thread.
    async fn is_subscribed(&self) -> Result<bool, ThreadError>;

    /// Host-owned thread state, if any.
    async fn state(&self) -> Result<Option<serde_json::Value>, ThreadError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn self_authored_and_blank_messages_are_detected() {
        let mut message = ChatMessage::new("t1", "u1", "   \n");
        assert_eq!(message.is_blank(), true);
        assert_eq!(message.is_from_self(), false);

        message.text = "hello".to_string();
        message.author.is_me = Some(true);
        assert_eq!(message.is_blank(), false);
        assert_eq!(message.is_from_self(), true);
    }
}
