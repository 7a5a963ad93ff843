//! muxbar — a tmux session mirror with favorites, groups, and templates.
//!
//! The crate keeps an in-memory copy of the sessions, windows, and panes of a
//! local tmux server, refreshed on a timer and after every mutation. User
//! preferences (favorites, groups, preferred terminal) and session templates
//! are persisted as JSON next to the config file.
//!
//! # Quick start
//!
//! ```no_run
//! use std::sync::Arc;
//! use muxbar::config::load_config;
//! use muxbar::preferences::{Preferences, PreferencesStore};
//! use muxbar::process::ShellRunner;
//! use muxbar::reconciler::spawn_reconciler;
//! use muxbar::tmux::TmuxClient;
//!
//! # async fn example() {
//! let config = load_config(None).unwrap().config;
//! let runner = Arc::new(ShellRunner::new(&config.tmux.shell, &config.tmux.extra_paths));
//! let client = TmuxClient::new(runner, &config.tmux.binary);
//! let prefs = PreferencesStore::open(
//!     &config.storage.preferences_path,
//!     Preferences::with_refresh_interval(config.monitor.refresh_interval_secs),
//! )
//! .unwrap();
//! let (handle, _events) = spawn_reconciler(client, prefs);
//! let count = handle.refresh().await.unwrap();
//! println!("{count} sessions");
//! # }
//! ```

pub mod attach;
pub mod build_info;
pub mod config;
pub mod error;
pub mod model;
pub mod persist;
pub mod preferences;
pub mod process;
pub mod reconciler;
pub mod template;
#[cfg(test)]
pub mod testsupport;
pub mod tmux;
