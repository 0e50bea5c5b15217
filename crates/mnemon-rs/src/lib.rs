//! Long-term memory middleware for chat bots.
//!
//! This crate re-exports the building blocks and provides helpers to keep
//! consumer setup consistent.

/// Re-export for convenience.
pub use mnemon_rs_config as config;
pub use mnemon_rs_core as core;
/// Re-export for convenience.
pub use mnemon_rs_memory as memory;
/// Re-export for convenience.
pub use mnemon_rs_protocol as protocol;

pub use mnemon_rs_core::{
    BankResolver, MemoryContext, MemoryHandler, MemoryMiddleware, MessageHandler, MiddlewareError,
    MiddlewareOptions,
};

use log::info;
use mnemon_rs_config::MnemonConfig;
use std::path::Path;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op without the feature.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}

/// Load the layered `mnemon.json5` stack for `cwd` and build a middleware.
///
/// `bank` overrides `memory.bank_id` from config.
pub fn middleware_from_cwd(
    cwd: impl AsRef<Path>,
    bank: Option<BankResolver>,
) -> Result<MemoryMiddleware, MiddlewareError> {
    let layered = MnemonConfig::load_layered(cwd)?;
    info!(
        "building memory middleware (layers={})",
        layered.layers.len()
    );
    MemoryMiddleware::from_config(&layered.config, bank)
}
