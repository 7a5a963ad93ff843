//! Configuration loading from TOML files and environment variables.
//!
//! Config is loaded in this order of precedence (highest wins):
//! 1. Environment variables (`MUXBAR_TMUX`, `MUXBAR_REFRESH_INTERVAL`)
//! 2. TOML file specified via `--config`
//! 3. `./muxbar.toml` in the current directory
//! 4. `$XDG_CONFIG_HOME/muxbar/muxbar.toml` (or `~/.config/muxbar/muxbar.toml`)
//! 5. Built-in defaults

use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::preferences::{checked_refresh_interval, refresh_interval_error};

mod defaults;
mod env;
mod loader;
mod types;

use defaults::{APP_DIR_NAME, LOCAL_STATE_DIR, PREFERENCES_FILE_NAME, TEMPLATES_FILE_NAME};
pub use loader::load_config;
pub use types::{Config, LoadedConfig, MonitorConfig, PreviewConfig, StorageConfig, TmuxConfig};
use types::{FileConfig, FileStorageConfig};

impl Default for Config {
    fn default() -> Self {
        let state = state_dir(config_root_dir().as_deref());
        Self {
            tmux: TmuxConfig::default(),
            monitor: MonitorConfig::default(),
            preview: PreviewConfig::default(),
            storage: default_storage(&state),
        }
    }
}

/// Root directory for per-user configuration (`$XDG_CONFIG_HOME` or `~/.config`).
pub fn config_root_dir() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("XDG_CONFIG_HOME") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".config"))
        .or_else(dirs::config_dir)
}

/// Directory holding preferences and templates.
fn state_dir(config_root: Option<&Path>) -> PathBuf {
    match config_root {
        Some(root) => root.join(APP_DIR_NAME),
        None => PathBuf::from(LOCAL_STATE_DIR),
    }
}

fn default_storage(state_dir: &Path) -> StorageConfig {
    StorageConfig {
        preferences_path: state_dir.join(PREFERENCES_FILE_NAME),
        templates_path: state_dir.join(TEMPLATES_FILE_NAME),
    }
}

/// Validate parsed file values and resolve storage paths.
fn resolve_file_config(file: FileConfig, state_dir: &Path) -> Result<Config, ConfigError> {
    if file.tmux.binary.trim().is_empty() {
        return Err(ConfigError::Invalid("tmux.binary must not be empty".into()));
    }
    if file.tmux.shell.trim().is_empty() {
        return Err(ConfigError::Invalid("tmux.shell must not be empty".into()));
    }
    let interval = file.monitor.refresh_interval_secs;
    if checked_refresh_interval(interval).is_none() {
        return Err(ConfigError::Invalid(format!(
            "monitor.refresh_interval_secs: {}",
            refresh_interval_error(interval)
        )));
    }
    if file.preview.lines == 0 {
        return Err(ConfigError::Invalid("preview.lines must be at least 1".into()));
    }

    let FileStorageConfig {
        preferences_path,
        templates_path,
    } = file.storage;
    let defaults = default_storage(state_dir);
    Ok(Config {
        tmux: file.tmux,
        monitor: file.monitor,
        preview: file.preview,
        storage: StorageConfig {
            preferences_path: preferences_path
                .map(|p| expand_home(&p))
                .unwrap_or(defaults.preferences_path),
            templates_path: templates_path
                .map(|p| expand_home(&p))
                .unwrap_or(defaults.templates_path),
        },
    })
}

/// Expand a leading `~/` to the home directory.
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}
