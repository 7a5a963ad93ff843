//! Binary-local application orchestration.
//!
//! `main.rs` only parses arguments and installs logging; everything else
//! (wiring, command handlers, rendering) lives here.

pub(crate) mod commands;
pub(crate) mod context;
pub(crate) mod entry;
pub(crate) mod render;
#[cfg(test)]
pub(crate) mod testsupport;
pub(crate) mod watch;
