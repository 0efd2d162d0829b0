//! Deterministic, pure logic for the pixel board.
//!
//! Core modules must be free of I/O side effects. They describe the board's
//! vocabulary (palette, coordinates, persisted key shapes, cache resources)
//! and the validation rules applied before anything is written.

pub mod coord;
pub mod keys;
pub mod palette;
pub mod resource;
pub mod validation;
