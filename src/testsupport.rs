//! Shared test fixtures for tmux, template, and reconciler test modules.

use crate::error::ExecError;
use crate::process::CommandRunner;
use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temporary directory fixture with best-effort cleanup.
#[derive(Debug)]
pub struct TestTempDir {
    path: PathBuf,
}

impl TestTempDir {
    /// Create a unique temporary directory with a readable prefix.
    pub fn new(prefix: &str) -> Self {
        let suffix = TEST_DIR_COUNTER.fetch_add(1, Ordering::Relaxed);
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let dir = std::env::temp_dir().join(format!(
            "muxbar-{prefix}-{}-{millis}-{suffix}",
            std::process::id()
        ));
        fs::create_dir_all(&dir).expect("failed to create temporary fixture directory");
        Self { path: dir }
    }

    /// Root directory path for this fixture.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Build a child path under the fixture root.
    pub fn child(&self, relative: &str) -> PathBuf {
        self.path.join(relative)
    }

    /// Write UTF-8 text to a child path, creating parent directories as needed.
    pub fn write_text(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.child(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create parent directories for fixture");
        }
        fs::write(&path, content).expect("failed to write fixture file");
        path
    }
}

impl Drop for TestTempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

/// Fake runner that records command lines and replies from a script.
///
/// A rule matches when the command line contains its pattern. The most
/// recently added matching rule wins, so tests can override earlier replies
/// mid-scenario. Unmatched commands succeed with empty output.
#[derive(Default)]
pub struct ScriptedRunner {
    rules: Mutex<Vec<(String, Result<String, ExecError>)>>,
    calls: Mutex<Vec<String>>,
    detached: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `output` to commands containing `pattern`.
    pub fn respond(&self, pattern: &str, output: &str) {
        self.push_rule(pattern, Ok(output.to_string()));
    }

    /// Fail commands containing `pattern` with `message`.
    pub fn fail(&self, pattern: &str, message: &str) {
        self.push_rule(pattern, Err(ExecError::Failed(message.to_string())));
    }

    fn push_rule(&self, pattern: &str, reply: Result<String, ExecError>) {
        self.rules
            .lock()
            .expect("rules lock")
            .push((pattern.to_string(), reply));
    }

    /// Command lines run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }

    /// Command lines passed to `spawn_detached`, in order.
    pub fn detached(&self) -> Vec<String> {
        self.detached.lock().expect("detached lock").clone()
    }

    /// Count recorded calls containing `pattern`.
    pub fn count(&self, pattern: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.contains(pattern))
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().expect("calls lock").clear();
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command_line: &str) -> Result<String, ExecError> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(command_line.to_string());
        let rules = self.rules.lock().expect("rules lock");
        rules
            .iter()
            .rev()
            .find(|(pattern, _)| command_line.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Ok(String::new()))
    }

    async fn spawn_detached(&self, command_line: &str) -> Result<(), ExecError> {
        self.detached
            .lock()
            .expect("detached lock")
            .push(command_line.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_dir_fixture_writes_and_resolves_paths() {
        let fixture = TestTempDir::new("fixture");
        let file = fixture.write_text("nested/file.txt", "hello");
        assert_eq!(fs::read_to_string(file).unwrap(), "hello");
    }

    #[tokio::test]
    async fn scripted_runner_prefers_latest_matching_rule() {
        let runner = ScriptedRunner::new();
        runner.respond("list-sessions", "$0:a:1:0");
        assert_eq!(runner.run("tmux list-sessions").await.unwrap(), "$0:a:1:0");
        runner.fail("list-sessions", "boom");
        assert!(runner.run("tmux list-sessions").await.is_err());
        assert_eq!(runner.run("tmux other").await.unwrap(), "");
        assert_eq!(runner.count("list-sessions"), 2);
    }
}
