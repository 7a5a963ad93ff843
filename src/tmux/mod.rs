//! Tmux client: command-line builders, output parsers, and typed operations.

mod client;
mod commands;
mod parse;

pub use client::{SessionPreview, TmuxClient, DEFAULT_PREVIEW_LINES};
pub use commands::{pane_target, window_target, SplitDirection};
