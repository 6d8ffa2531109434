//! End-to-end tests of the emulator against a local origin.
#![expect(clippy::unwrap_used, reason = "test assertions")]

mod common;
mod emulation;
