//! Stable exit codes for `place` CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Runtime failure: unreadable config, storage error, corrupt value, board not
/// initialized.
pub const FAILURE: i32 = 1;
/// The request was rejected by validation (unknown color, coordinate off the
/// board); nothing was written.
pub const INVALID_INPUT: i32 = 2;
