//! Process runner used by every tmux call.
//!
//! Commands are full shell command lines executed through `<shell> -c` with an
//! augmented `PATH`, so tmux installed under Homebrew or `/usr/local` resolves
//! even when muxbar is launched from a minimal environment.

use crate::error::ExecError;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Stderr fragments that tmux emits when there is simply nothing to list.
const BENIGN_EMPTY_MARKERS: [&str; 2] = ["no server running", "no sessions"];

/// Raw process output before benign-empty interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

/// Seam between the tmux client and actual subprocess execution.
///
/// Tests substitute a scripted implementation; production code uses
/// [`ShellRunner`].
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run one command line to completion and return trimmed stdout.
    async fn run(&self, command_line: &str) -> Result<String, ExecError>;
    /// Start one command line without waiting for it to finish.
    async fn spawn_detached(&self, command_line: &str) -> Result<(), ExecError>;
}

/// Runs command lines through a local shell.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
    search_path: String,
}

impl ShellRunner {
    /// Build a runner whose `PATH` is `extra_paths` prepended to the inherited one.
    pub fn new(shell: impl Into<String>, extra_paths: &[String]) -> Self {
        let inherited = std::env::var("PATH").ok();
        Self {
            shell: shell.into(),
            search_path: augmented_path(extra_paths, inherited.as_deref()),
        }
    }

    /// Effective `PATH` handed to child processes.
    pub fn search_path(&self) -> &str {
        &self.search_path
    }

    fn command(&self, command_line: &str) -> Command {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c")
            .arg(command_line)
            .env("PATH", &self.search_path);
        cmd
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command_line: &str) -> Result<String, ExecError> {
        debug!(command = command_line, "running command");
        let mut cmd = self.command(command_line);
        // The owning future may be dropped on shutdown; take the child with it.
        cmd.kill_on_drop(true);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = cmd
            .output()
            .await
            .map_err(|e| ExecError::Spawn(format!("{}: {e}", self.shell)))?;

        interpret_output(ExecOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }

    async fn spawn_detached(&self, command_line: &str) -> Result<(), ExecError> {
        debug!(command = command_line, "spawning detached command");
        let mut cmd = self.command(command_line);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        let mut child = cmd
            .spawn()
            .map_err(|e| ExecError::Spawn(format!("{}: {e}", self.shell)))?;
        // Reap in the background so the child never lingers as a zombie.
        tokio::spawn(async move {
            let _ = child.wait().await;
        });
        Ok(())
    }
}

/// Prepend `extra` directories to an inherited `PATH` value.
pub fn augmented_path(extra: &[String], inherited: Option<&str>) -> String {
    let mut parts: Vec<&str> = extra
        .iter()
        .map(String::as_str)
        .filter(|p| !p.is_empty())
        .collect();
    if let Some(current) = inherited.filter(|p| !p.is_empty()) {
        parts.push(current);
    }
    parts.join(":")
}

/// Convert raw output into the runner contract.
///
/// Zero exit returns trimmed stdout. Non-zero exit caused by an absent server
/// or an empty session list is an empty success; anything else fails with the
/// trimmed stderr text, or a generic message when stderr is empty.
pub fn interpret_output(output: ExecOutput) -> Result<String, ExecError> {
    let stdout = output.stdout.trim().to_string();
    if output.exit_code == 0 {
        return Ok(stdout);
    }

    let stderr = output.stderr.trim();
    if BENIGN_EMPTY_MARKERS
        .iter()
        .any(|marker| stderr.contains(marker))
    {
        return Ok(String::new());
    }
    if stderr.is_empty() {
        return Err(ExecError::Failed(format!(
            "command failed with exit code {}",
            output.exit_code
        )));
    }
    Err(ExecError::Failed(stderr.to_string()))
}

/// Resolve a binary through the runner's search path.
pub async fn which(runner: &dyn CommandRunner, binary: &str) -> Option<String> {
    match runner.run(&format!("command -v {}", shell_quote(binary))).await {
        Ok(path) if !path.is_empty() => Some(path),
        _ => None,
    }
}

/// Shell-safe single-quote escaping.
pub fn shell_quote(s: &str) -> String {
    if s.is_empty() {
        "''".into()
    } else {
        format!("'{}'", s.replace('\'', "'\\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(exit_code: i32, stdout: &str, stderr: &str) -> ExecOutput {
        ExecOutput {
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
        }
    }

    #[test]
    fn quote_empty() {
        assert_eq!(shell_quote(""), "''");
    }

    #[test]
    fn quote_with_single_quote() {
        assert_eq!(shell_quote("a'b"), "'a'\\''b'");
    }

    #[test]
    fn augmented_path_prepends_extra_dirs() {
        let extra = vec!["/opt/homebrew/bin".to_string(), "/usr/local/bin".to_string()];
        assert_eq!(
            augmented_path(&extra, Some("/usr/bin:/bin")),
            "/opt/homebrew/bin:/usr/local/bin:/usr/bin:/bin"
        );
        assert_eq!(augmented_path(&extra, None), "/opt/homebrew/bin:/usr/local/bin");
        assert_eq!(augmented_path(&[], Some("/bin")), "/bin");
    }

    #[test]
    fn success_output_is_trimmed() {
        assert_eq!(
            interpret_output(output(0, "  $0:work:2:1\n\n", "")).unwrap(),
            "$0:work:2:1"
        );
    }

    #[test]
    fn no_server_running_is_empty_success() {
        let out = output(1, "", "no server running on /tmp/tmux-501/default\n");
        assert_eq!(interpret_output(out).unwrap(), "");
        let out = output(1, "", "no sessions");
        assert_eq!(interpret_output(out).unwrap(), "");
    }

    #[test]
    fn other_failures_carry_stderr() {
        let out = output(1, "", "can't find session: nope\n");
        assert_eq!(
            interpret_output(out),
            Err(ExecError::Failed("can't find session: nope".into()))
        );
    }

    #[test]
    fn empty_stderr_failure_uses_generic_message() {
        let out = output(2, "partial", "  ");
        assert_eq!(
            interpret_output(out),
            Err(ExecError::Failed("command failed with exit code 2".into()))
        );
    }

    #[tokio::test]
    async fn shell_runner_runs_and_reports_failures() {
        let runner = ShellRunner::new("sh", &[]);
        assert_eq!(runner.run("printf ' hi \\n'").await.unwrap(), "hi");
        let err = runner.run("echo boom >&2; exit 3").await.unwrap_err();
        assert_eq!(err, ExecError::Failed("boom".into()));
    }

    #[tokio::test]
    async fn which_resolves_shell_builtins_and_misses() {
        let runner = ShellRunner::new("sh", &[]);
        assert!(which(&runner, "sh").await.is_some());
        assert!(which(&runner, "definitely-not-a-real-binary-xyz").await.is_none());
    }
}
