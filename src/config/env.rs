//! Environment variable overrides.
//!
//! `MUXBAR_*` variables win over every config file.

use crate::error::ConfigError;
use crate::preferences::{
    checked_refresh_interval, MAX_REFRESH_INTERVAL_SECS, MIN_REFRESH_INTERVAL_SECS,
};

use super::Config;

pub(super) const ENV_TMUX_BINARY: &str = "MUXBAR_TMUX";
pub(super) const ENV_REFRESH_INTERVAL: &str = "MUXBAR_REFRESH_INTERVAL";

pub(super) fn apply_env_overrides<FEnv>(
    config: &mut Config,
    env_lookup: &FEnv,
) -> Result<(), ConfigError>
where
    FEnv: Fn(&str) -> Option<String>,
{
    if let Some(binary) = non_empty(env_lookup(ENV_TMUX_BINARY)) {
        config.tmux.binary = binary;
    }
    if let Some(raw) = non_empty(env_lookup(ENV_REFRESH_INTERVAL)) {
        let secs = raw
            .parse::<f64>()
            .ok()
            .filter(|secs| checked_refresh_interval(*secs).is_some())
            .ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "invalid {ENV_REFRESH_INTERVAL} value `{raw}`: expected seconds between \
                     {MIN_REFRESH_INTERVAL_SECS} and {MAX_REFRESH_INTERVAL_SECS}"
                ))
            })?;
        config.monitor.refresh_interval_secs = secs;
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
