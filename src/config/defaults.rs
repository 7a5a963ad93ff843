//! Default configuration values.

/// Config file name searched locally and under the config root.
pub(super) const CONFIG_FILE_NAME: &str = "muxbar.toml";
/// Subdirectory of the config root holding muxbar's files.
pub(super) const APP_DIR_NAME: &str = "muxbar";
/// Fallback state directory when no config root can be determined.
pub(super) const LOCAL_STATE_DIR: &str = ".muxbar";

pub(super) const DEFAULT_TMUX_BINARY: &str = "tmux";
pub(super) const DEFAULT_SHELL: &str = "sh";
/// Directories prepended to `PATH` so Homebrew and `/usr/local` installs
/// resolve from minimal launch environments.
pub(super) const DEFAULT_EXTRA_PATHS: [&str; 4] =
    ["/opt/homebrew/bin", "/usr/local/bin", "/usr/bin", "/bin"];

pub(super) const DEFAULT_REFRESH_INTERVAL_SECS: f64 =
    crate::preferences::DEFAULT_REFRESH_INTERVAL_SECS;
pub(super) const DEFAULT_PREVIEW_LINES: usize = crate::tmux::DEFAULT_PREVIEW_LINES;

pub(super) const PREFERENCES_FILE_NAME: &str = "preferences.json";
pub(super) const TEMPLATES_FILE_NAME: &str = "templates.json";
