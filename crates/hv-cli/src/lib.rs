//! hv-cli
//!
//! Library half of the `heliofits` binary: settings resolution and the
//! per-date command handlers, kept out of `main.rs` so they can be driven
//! against a mock API in tests.

pub mod commands;
pub mod settings;
