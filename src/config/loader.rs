//! Config-file discovery and the top-level loading pipeline.
//!
//! Source order: explicit path > local `./muxbar.toml` > global
//! `<config root>/muxbar/muxbar.toml` > built-in defaults. Environment
//! overrides are applied last.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::ConfigError;

use super::defaults::{APP_DIR_NAME, CONFIG_FILE_NAME};
use super::env::apply_env_overrides;
use super::types::FileConfig;
use super::{config_root_dir, resolve_file_config, state_dir, LoadedConfig};

/// Load configuration from disk and environment.
///
/// `path_override` is an explicit config file path (from `--config`); unlike
/// the implicit locations, a missing explicit file is an error.
pub fn load_config(path_override: Option<&str>) -> Result<LoadedConfig, ConfigError> {
    load_config_from_sources(
        path_override,
        |path| std::fs::read_to_string(path),
        |name| std::env::var(name).ok(),
        config_root_dir,
    )
}

pub(super) fn load_config_from_sources<FRead, FEnv, FRoot>(
    path_override: Option<&str>,
    read_file: FRead,
    env_lookup: FEnv,
    config_root: FRoot,
) -> Result<LoadedConfig, ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
    FEnv: Fn(&str) -> Option<String>,
    FRoot: Fn() -> Option<PathBuf>,
{
    let root = config_root();
    let (text, source) = read_config_text(path_override, &read_file, root.as_deref())?;
    let parsed: FileConfig = toml::from_str(&text)?;
    let mut config = resolve_file_config(parsed, &state_dir(root.as_deref()))?;
    apply_env_overrides(&mut config, &env_lookup)?;
    debug!(source = ?source, "configuration loaded");
    Ok(LoadedConfig { config, source })
}

/// Read config text from the highest-precedence available source.
fn read_config_text<FRead>(
    path_override: Option<&str>,
    read_file: &FRead,
    config_root: Option<&Path>,
) -> Result<(String, Option<PathBuf>), ConfigError>
where
    FRead: Fn(&Path) -> Result<String, std::io::Error>,
{
    if let Some(p) = path_override {
        let path = PathBuf::from(p);
        let text = read_file(&path)?;
        return Ok((text, Some(path)));
    }

    let local = PathBuf::from(CONFIG_FILE_NAME);
    if let Ok(text) = read_file(&local) {
        return Ok((text, Some(local)));
    }
    if let Some(dir) = config_root {
        let global = dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME);
        if let Ok(text) = read_file(&global) {
            return Ok((text, Some(global)));
        }
    }

    // Empty text parses into all defaults.
    Ok((String::new(), None))
}
