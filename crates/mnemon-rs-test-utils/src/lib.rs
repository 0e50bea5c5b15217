//! Test helpers shared across mnemon crates.

pub mod memory;
pub mod thread;

pub use memory::{ClientCall, FailingMemoryClient, GatedMemoryClient, StubMemoryClient};
pub use thread::RecordingThread;
