//! Typed tmux operations over a [`CommandRunner`].

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ExecError;
use crate::model::{Pane, Session, Window};
use crate::process::{which, CommandRunner};

use super::commands::{pane_target, window_target, CommandBuilder, SplitDirection};
use super::parse::{parse_lines, parse_pane_line, parse_session_line, parse_window_line};

/// Default scroll-back lines captured for previews.
pub const DEFAULT_PREVIEW_LINES: usize = 30;

/// Best-effort snapshot of a session's first pane.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionPreview {
    pub content: String,
    pub current_command: String,
    pub current_path: String,
}

/// Translation layer between structured calls and tmux command lines.
#[derive(Clone)]
pub struct TmuxClient {
    runner: Arc<dyn CommandRunner>,
    binary: String,
    commands: CommandBuilder,
    include_panes: bool,
}

impl TmuxClient {
    pub fn new(runner: Arc<dyn CommandRunner>, binary: impl Into<String>) -> Self {
        let binary = binary.into();
        Self {
            runner,
            commands: CommandBuilder::new(&binary),
            binary,
            include_panes: false,
        }
    }

    /// Also populate each window's pane list during [`Self::list_sessions`].
    pub fn with_panes(mut self, include_panes: bool) -> Self {
        self.include_panes = include_panes;
        self
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Runner used for non-tmux commands (terminal attach launches).
    pub fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }

    async fn exec(&self, command: String) -> Result<String, ExecError> {
        self.runner.run(&command).await
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// List all sessions with their windows populated.
    ///
    /// A failed nested window listing leaves that session's window list empty
    /// rather than failing the whole batch.
    pub async fn list_sessions(&self) -> Result<Vec<Session>, ExecError> {
        let output = self.exec(self.commands.list_sessions()).await?;
        let mut sessions = parse_lines(&output, parse_session_line);
        for session in &mut sessions {
            match self.list_windows(&session.name).await {
                Ok(windows) => session.windows = windows,
                Err(err) => warn!(session = %session.name, "failed to list windows: {err}"),
            }
            if self.include_panes {
                for window in &mut session.windows {
                    match self.list_panes(&session.name, &window.id).await {
                        Ok(panes) => window.panes = panes,
                        Err(err) => warn!(
                            session = %session.name,
                            window = %window.id,
                            "failed to list panes: {err}"
                        ),
                    }
                }
            }
        }
        debug!(count = sessions.len(), "listed tmux sessions");
        Ok(sessions)
    }

    pub async fn create_session(
        &self,
        name: &str,
        directory: Option<&str>,
    ) -> Result<(), ExecError> {
        self.exec(self.commands.new_session(name, directory)).await?;
        Ok(())
    }

    pub async fn kill_session(&self, name: &str) -> Result<(), ExecError> {
        self.exec(self.commands.kill_session(name)).await?;
        Ok(())
    }

    pub async fn rename_session(&self, old_name: &str, new_name: &str) -> Result<(), ExecError> {
        self.exec(self.commands.rename_session(old_name, new_name))
            .await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Windows
    // -----------------------------------------------------------------------

    pub async fn list_windows(&self, session: &str) -> Result<Vec<Window>, ExecError> {
        let output = self.exec(self.commands.list_windows(session)).await?;
        Ok(parse_lines(&output, parse_window_line))
    }

    pub async fn create_window(&self, session: &str, name: Option<&str>) -> Result<(), ExecError> {
        self.exec(self.commands.new_window(session, name)).await?;
        Ok(())
    }

    /// Rename `window` (index or `@id`) inside `session`.
    pub async fn rename_window(
        &self,
        session: &str,
        window: &str,
        new_name: &str,
    ) -> Result<(), ExecError> {
        let target = window_target(session, Some(window));
        self.exec(self.commands.rename_window(&target, new_name))
            .await?;
        Ok(())
    }

    pub async fn kill_window(&self, session: &str, window: &str) -> Result<(), ExecError> {
        let target = window_target(session, Some(window));
        self.exec(self.commands.kill_window(&target)).await?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Panes
    // -----------------------------------------------------------------------

    pub async fn list_panes(&self, session: &str, window_id: &str) -> Result<Vec<Pane>, ExecError> {
        let output = self.exec(self.commands.list_panes(session, window_id)).await?;
        Ok(parse_lines(&output, parse_pane_line))
    }

    /// Split the active pane of `window` (or the session's current window).
    pub async fn split_horizontal(
        &self,
        session: &str,
        window: Option<&str>,
    ) -> Result<(), ExecError> {
        self.split(session, window, SplitDirection::Horizontal).await
    }

    pub async fn split_vertical(
        &self,
        session: &str,
        window: Option<&str>,
    ) -> Result<(), ExecError> {
        self.split(session, window, SplitDirection::Vertical).await
    }

    /// Split the active pane of `window` in the given direction.
    pub async fn split(
        &self,
        session: &str,
        window: Option<&str>,
        direction: SplitDirection,
    ) -> Result<(), ExecError> {
        let target = window_target(session, window);
        self.exec(self.commands.split_window(&target, direction))
            .await?;
        Ok(())
    }

    pub async fn select_pane(&self, target: &str) -> Result<(), ExecError> {
        self.exec(self.commands.select_pane(target)).await?;
        Ok(())
    }

    pub async fn resize_pane_width(&self, target: &str, columns: u16) -> Result<(), ExecError> {
        self.exec(self.commands.resize_pane_width(target, columns))
            .await?;
        Ok(())
    }

    /// Type `keys` into the pane and press Enter.
    pub async fn send_keys(&self, target: &str, keys: &str) -> Result<(), ExecError> {
        self.exec(self.commands.send_keys(target, keys)).await?;
        Ok(())
    }

    /// Tail of a pane's scroll-back; empty on any failure.
    pub async fn capture_pane(
        &self,
        session: &str,
        window_index: usize,
        pane_index: usize,
        line_count: usize,
    ) -> String {
        let target = pane_target(session, window_index, pane_index);
        self.exec(self.commands.capture_pane(&target, line_count))
            .await
            .unwrap_or_else(|err| {
                warn!(target = %target, "failed to capture pane: {err}");
                String::new()
            })
    }

    /// Foreground command of a pane; empty on any failure.
    pub async fn current_command(
        &self,
        session: &str,
        window_index: usize,
        pane_index: usize,
    ) -> String {
        self.display(session, window_index, pane_index, "#{pane_current_command}")
            .await
    }

    /// Working directory of a pane; empty on any failure.
    pub async fn current_path(
        &self,
        session: &str,
        window_index: usize,
        pane_index: usize,
    ) -> String {
        self.display(session, window_index, pane_index, "#{pane_current_path}")
            .await
    }

    async fn display(
        &self,
        session: &str,
        window_index: usize,
        pane_index: usize,
        format: &str,
    ) -> String {
        let target = pane_target(session, window_index, pane_index);
        self.exec(self.commands.display_message(&target, format))
            .await
            .unwrap_or_default()
    }

    /// Content, command, and path of pane `0.0` in `session`.
    pub async fn preview(&self, session: &str, line_count: usize) -> SessionPreview {
        SessionPreview {
            content: self.capture_pane(session, 0, 0, line_count).await,
            current_command: self.current_command(session, 0, 0).await,
            current_path: self.current_path(session, 0, 0).await,
        }
    }

    // -----------------------------------------------------------------------
    // Server
    // -----------------------------------------------------------------------

    /// Whether the tmux binary resolves on the runner's search path.
    pub async fn is_installed(&self) -> bool {
        which(self.runner.as_ref(), &self.binary).await.is_some()
    }

    pub async fn is_server_running(&self) -> bool {
        self.exec(self.commands.has_server()).await.is_ok()
    }

    pub async fn start_server(&self) -> Result<(), ExecError> {
        self.exec(self.commands.start_server()).await?;
        Ok(())
    }

    pub async fn kill_server(&self) -> Result<(), ExecError> {
        self.exec(self.commands.kill_server()).await?;
        Ok(())
    }
}
