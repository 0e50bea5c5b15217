//! Wire types shared between the middleware, memory clients, and host chat frameworks.

mod chat;
mod memory;

pub use chat::{ChatAuthor, ChatMessage, ChatThread, ThreadError};
pub use memory::{
    Budget, EntityObservation, EntityState, Fact, MemoryRecord, MemoryType, RecallOptions,
    RecallResponse, ReflectOptions, ReflectResponse, RetainOptions, RetainResponse,
};

use uuid::Uuid;

/// Unique identifier for a single middleware invocation.
pub type TurnId = Uuid;
/// Identifier of an isolated memory namespace.
pub type BankId = String;
