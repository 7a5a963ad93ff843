//! Version, commit, and build time baked in by `build.rs`.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Short commit hash, or "unknown" outside a git checkout.
pub const GIT_COMMIT: &str = env!("MUXBAR_BUILD_GIT_HASH");

/// UTC build time (`unix:<secs>` when `date` was unavailable).
pub const BUILD_TIMESTAMP: &str = env!("MUXBAR_BUILD_TIMESTAMP");

/// Appended to `muxbar --help`.
pub const HELP_BUILD_METADATA: &str = concat!(
    "Build metadata:\n  commit: ",
    env!("MUXBAR_BUILD_GIT_HASH"),
    "\n  built: ",
    env!("MUXBAR_BUILD_TIMESTAMP")
);

/// Banner line for `muxbar watch`.
pub fn startup_metadata_line() -> String {
    format!("muxbar v{VERSION} ({GIT_COMMIT}, built {BUILD_TIMESTAMP})")
}

/// Body of `muxbar --version`.
pub fn cli_version_text() -> String {
    format!("muxbar {VERSION}\ncommit: {GIT_COMMIT}\nbuilt: {BUILD_TIMESTAMP}")
}
