//! Deterministic, pure logic shared by the engine.
//!
//! Core modules must be free of I/O and shared state. They operate on
//! in-memory values and return deterministic outputs suitable for tests.

pub mod classify;
pub mod path;
