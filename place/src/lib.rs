//! Collaborative pixel board backed by a persistent key-value store.
//!
//! The board is a fixed square grid of palette colors plus one selected-color
//! cursor. The crate keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (palette, coordinates, key shapes,
//!   invalidation targets). No I/O.
//! - **[`io`]**: Side-effecting adapters (SQLite/in-memory store, config file,
//!   cache invalidators, child processes).
//!
//! [`board`] ties the two together into validated paint/select operations.

pub mod board;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
