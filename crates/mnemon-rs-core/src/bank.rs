//! Memory bank selection per inbound message.

use mnemon_rs_protocol::{BankId, ChatMessage};
use std::fmt;
use std::sync::Arc;

/// Resolver function signature.
pub type BankFn = dyn Fn(&ChatMessage) -> BankId + Send + Sync;

/// Chooses the memory bank an invocation is scoped to.
#[derive(Clone)]
pub enum BankResolver {
    /// Every message uses the same bank.
    Constant(BankId),
    /// Bank derived from the message; must be total and non-blocking.
    Function(Arc<BankFn>),
}

impl BankResolver {
    /// Use one bank for every message.
    pub fn constant(bank_id: impl Into<BankId>) -> Self {
        Self::Constant(bank_id.into())
    }

    /// Derive the bank from each message.
    pub fn from_fn<F>(resolve: F) -> Self
    where
        F: Fn(&ChatMessage) -> BankId + Send + Sync + 'static,
    {
        Self::Function(Arc::new(resolve))
    }

    /// One bank per message author.
    pub fn per_user() -> Self {
        Self::from_fn(|message| message.author.user_id.clone())
    }

    /// Resolve the bank for `message`. Panics in a resolver function propagate.
    pub fn resolve(&self, message: &ChatMessage) -> BankId {
        match self {
            Self::Constant(bank_id) => bank_id.clone(),
            Self::Function(resolve) => resolve(message),
        }
    }
}

impl fmt::Debug for BankResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(bank_id) => f.debug_tuple("Constant").field(bank_id).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

impl From<&str> for BankResolver {
    fn from(bank_id: &str) -> Self {
        Self::constant(bank_id)
    }
}

impl From<String> for BankResolver {
    fn from(bank_id: String) -> Self {
        Self::Constant(bank_id)
    }
}
