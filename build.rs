//! Stamps the binary with its commit and build time.
//!
//! `MUXBAR_BUILD_GIT_HASH` and `MUXBAR_BUILD_TIMESTAMP` may be preset by a
//! packager; otherwise they are probed from git and date, then "unknown".

use std::env;
use std::fs;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

const GIT_HASH_VAR: &str = "MUXBAR_BUILD_GIT_HASH";
const TIMESTAMP_VAR: &str = "MUXBAR_BUILD_TIMESTAMP";

fn main() {
    watch_git_head();
    stamp(GIT_HASH_VAR, commit_hash);
    stamp(TIMESTAMP_VAR, utc_timestamp);
}

/// Export `var` to rustc, preferring a preset value over `probe`.
fn stamp(var: &str, probe: fn() -> String) {
    println!("cargo:rerun-if-env-changed={var}");
    let value = env::var(var)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(probe);
    println!("cargo:rustc-env={var}={value}");
}

fn watch_git_head() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    let branch_ref = fs::read_to_string(".git/HEAD")
        .ok()
        .and_then(|head| head.trim().strip_prefix("ref: ").map(str::to_string));
    if let Some(branch_ref) = branch_ref {
        println!("cargo:rerun-if-changed=.git/{branch_ref}");
    }
}

fn commit_hash() -> String {
    capture("git", &["rev-parse", "--short=12", "HEAD"]).unwrap_or_else(|| "unknown".into())
}

fn utc_timestamp() -> String {
    capture("date", &["-u", "+%Y-%m-%dT%H:%M:%SZ"]).unwrap_or_else(|| {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |since| since.as_secs());
        format!("unix:{secs}")
    })
}

/// Trimmed stdout of a successful, non-empty command run.
fn capture(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    Some(text.trim().to_string()).filter(|t| !t.is_empty())
}
