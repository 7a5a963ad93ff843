//! Configuration data model.
//!
//! `FileConfig` mirrors `muxbar.toml` exactly and rejects unknown keys;
//! `Config` is the resolved form handed to the rest of the program.

use serde::Deserialize;
use std::path::PathBuf;

use super::defaults::{
    DEFAULT_EXTRA_PATHS, DEFAULT_PREVIEW_LINES, DEFAULT_REFRESH_INTERVAL_SECS, DEFAULT_SHELL,
    DEFAULT_TMUX_BINARY,
};

/// Top-level runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub tmux: TmuxConfig,
    pub monitor: MonitorConfig,
    pub preview: PreviewConfig,
    pub storage: StorageConfig,
}

/// How tmux is located and invoked.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TmuxConfig {
    /// tmux executable name or path.
    pub binary: String,
    /// Directories prepended to the inherited `PATH`.
    pub extra_paths: Vec<String>,
    /// Shell used to run command lines (`<shell> -c`).
    pub shell: String,
}

impl Default for TmuxConfig {
    fn default() -> Self {
        Self {
            binary: DEFAULT_TMUX_BINARY.to_string(),
            extra_paths: DEFAULT_EXTRA_PATHS.iter().map(|p| p.to_string()).collect(),
            shell: DEFAULT_SHELL.to_string(),
        }
    }
}

/// Refresh loop settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
    /// Used when the preferences file does not set an interval.
    pub refresh_interval_secs: f64,
    /// Also list panes for every window on each refresh.
    pub include_panes: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            include_panes: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    /// Scroll-back lines captured by `muxbar preview`.
    pub lines: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            lines: DEFAULT_PREVIEW_LINES,
        }
    }
}

/// Resolved locations of persisted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub preferences_path: PathBuf,
    pub templates_path: PathBuf,
}

/// `[storage]` as written in the file; unset paths resolve under the
/// config root.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(super) struct FileStorageConfig {
    pub preferences_path: Option<String>,
    pub templates_path: Option<String>,
}

/// On-disk shape of `muxbar.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(super) struct FileConfig {
    pub tmux: TmuxConfig,
    pub monitor: MonitorConfig,
    pub preview: PreviewConfig,
    pub storage: FileStorageConfig,
}

/// Config plus where it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: Config,
    /// File the config was read from; `None` when built-in defaults were used.
    pub source: Option<PathBuf>,
}
