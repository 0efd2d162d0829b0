//! Side-effecting adapters: storage, configuration, cache invalidation.

pub mod config;
pub mod invalidator;
pub mod kv;
pub mod process;
