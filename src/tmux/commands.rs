//! Exact tmux command lines for every client operation.
//!
//! Builders are pure so command text can be asserted in tests without a tmux
//! server. Every user-supplied fragment goes through `shell_quote`.

use crate::process::shell_quote;

/// Separator tmux places between fields of the list formats below.
pub(crate) const FIELD_DELIMITER: char = ':';

/// `{id, name, window_count, attached_flag}`
pub(crate) const SESSION_FORMAT: &str =
    "#{session_id}:#{session_name}:#{session_windows}:#{session_attached}";
/// `{id, name, active_flag, pane_count}`
pub(crate) const WINDOW_FORMAT: &str =
    "#{window_id}:#{window_name}:#{window_active}:#{window_panes}";
/// `{id, active_flag, width, height, current_command}`
pub(crate) const PANE_FORMAT: &str =
    "#{pane_id}:#{pane_active}:#{pane_width}:#{pane_height}:#{pane_current_command}";

/// Direction flag for `split-window`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitDirection {
    /// Side-by-side panes (`-h`).
    Horizontal,
    /// Stacked panes (`-v`).
    Vertical,
}

impl SplitDirection {
    fn flag(self) -> &'static str {
        match self {
            Self::Horizontal => "-h",
            Self::Vertical => "-v",
        }
    }
}

/// `session` or `session:window`.
pub fn window_target(session: &str, window: Option<&str>) -> String {
    match window {
        Some(window) => format!("{session}:{window}"),
        None => session.to_string(),
    }
}

/// `session:window.pane` with numeric indexes.
pub fn pane_target(session: &str, window_index: usize, pane_index: usize) -> String {
    format!("{session}:{window_index}.{pane_index}")
}

/// Builds tmux command lines against one tmux binary.
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    tmux: String,
}

impl CommandBuilder {
    pub fn new(binary: &str) -> Self {
        Self {
            tmux: shell_quote(binary),
        }
    }

    fn cmd(&self, rest: &str) -> String {
        format!("{} {rest}", self.tmux)
    }

    pub fn list_sessions(&self) -> String {
        self.cmd(&format!("list-sessions -F {}", shell_quote(SESSION_FORMAT)))
    }

    pub fn list_windows(&self, session: &str) -> String {
        self.cmd(&format!(
            "list-windows -t {} -F {}",
            shell_quote(session),
            shell_quote(WINDOW_FORMAT)
        ))
    }

    pub fn list_panes(&self, session: &str, window_id: &str) -> String {
        self.cmd(&format!(
            "list-panes -t {} -F {}",
            shell_quote(&window_target(session, Some(window_id))),
            shell_quote(PANE_FORMAT)
        ))
    }

    pub fn new_session(&self, name: &str, directory: Option<&str>) -> String {
        let mut cmd = self.cmd(&format!("new-session -d -s {}", shell_quote(name)));
        if let Some(dir) = directory {
            cmd.push_str(" -c ");
            cmd.push_str(&shell_quote(dir));
        }
        cmd
    }

    pub fn kill_session(&self, name: &str) -> String {
        self.cmd(&format!("kill-session -t {}", shell_quote(name)))
    }

    pub fn rename_session(&self, old_name: &str, new_name: &str) -> String {
        self.cmd(&format!(
            "rename-session -t {} {}",
            shell_quote(old_name),
            shell_quote(new_name)
        ))
    }

    pub fn new_window(&self, session: &str, name: Option<&str>) -> String {
        let mut cmd = self.cmd(&format!("new-window -t {}", shell_quote(session)));
        if let Some(name) = name {
            cmd.push_str(" -n ");
            cmd.push_str(&shell_quote(name));
        }
        cmd
    }

    pub fn rename_window(&self, target: &str, new_name: &str) -> String {
        self.cmd(&format!(
            "rename-window -t {} {}",
            shell_quote(target),
            shell_quote(new_name)
        ))
    }

    pub fn kill_window(&self, target: &str) -> String {
        self.cmd(&format!("kill-window -t {}", shell_quote(target)))
    }

    pub fn split_window(&self, target: &str, direction: SplitDirection) -> String {
        self.cmd(&format!(
            "split-window {} -t {}",
            direction.flag(),
            shell_quote(target)
        ))
    }

    pub fn select_pane(&self, target: &str) -> String {
        self.cmd(&format!("select-pane -t {}", shell_quote(target)))
    }

    pub fn resize_pane_width(&self, target: &str, columns: u16) -> String {
        self.cmd(&format!("resize-pane -t {} -x {columns}", shell_quote(target)))
    }

    /// Type `keys` literally into the pane, then press Enter.
    pub fn send_keys(&self, target: &str, keys: &str) -> String {
        self.cmd(&format!(
            "send-keys -t {} {} Enter",
            shell_quote(target),
            shell_quote(keys)
        ))
    }

    pub fn capture_pane(&self, target: &str, line_count: usize) -> String {
        self.cmd(&format!(
            "capture-pane -t {} -p -S -{line_count}",
            shell_quote(target)
        ))
    }

    pub fn display_message(&self, target: &str, format: &str) -> String {
        self.cmd(&format!(
            "display-message -t {} -p {}",
            shell_quote(target),
            shell_quote(format)
        ))
    }

    /// Probe used to detect a live server; fails when none is running.
    ///
    /// Stderr is discarded so the runner's "no server running" leniency
    /// cannot turn a missing server into success.
    pub fn has_server(&self) -> String {
        self.cmd("has-session 2>/dev/null")
    }

    pub fn start_server(&self) -> String {
        self.cmd("start-server")
    }

    pub fn kill_server(&self) -> String {
        self.cmd("kill-server")
    }
}
