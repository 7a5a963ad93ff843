//! Live tmux entities mirrored from the server on every refresh.
//!
//! These records are transient: each refresh rebuilds them from scratch. Two
//! records compare equal when their tmux-assigned ids match, regardless of
//! name or counters.

use serde::Serialize;
use std::hash::{Hash, Hasher};

/// One tmux session (`$N` id).
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub window_count: usize,
    pub is_attached: bool,
    pub windows: Vec<Window>,
}

impl Session {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        window_count: usize,
        is_attached: bool,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            window_count,
            is_attached,
            windows: Vec::new(),
        }
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Session {}

impl Hash for Session {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// One window inside a session (`@N` id).
#[derive(Debug, Clone, Serialize)]
pub struct Window {
    pub id: String,
    pub name: String,
    pub is_active: bool,
    pub pane_count: usize,
    pub panes: Vec<Pane>,
}

impl Window {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        is_active: bool,
        pane_count: usize,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            is_active,
            pane_count,
            panes: Vec::new(),
        }
    }
}

impl PartialEq for Window {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Window {}

impl Hash for Window {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// One pane inside a window (`%N` id).
#[derive(Debug, Clone, Serialize)]
pub struct Pane {
    pub id: String,
    pub is_active: bool,
    pub width: u16,
    pub height: u16,
    /// Foreground command, when tmux reports one.
    pub current_command: Option<String>,
}

impl PartialEq for Pane {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Pane {}

impl Hash for Pane {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn session_identity_ignores_name_and_counters() {
        let before = Session::new("$1", "work", 1, false);
        let mut after = Session::new("$1", "work2", 3, true);
        after.windows.push(Window::new("@1", "editor", true, 1));
        assert_eq!(before, after);
        assert_ne!(before, Session::new("$2", "work", 1, false));

        let set: HashSet<Session> = [before, after].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn window_and_pane_identity_follow_ids() {
        assert_eq!(
            Window::new("@3", "a", true, 1),
            Window::new("@3", "b", false, 4)
        );
        let pane = |id: &str, cmd: Option<&str>| Pane {
            id: id.to_string(),
            is_active: false,
            width: 80,
            height: 24,
            current_command: cmd.map(str::to_string),
        };
        assert_eq!(pane("%0", Some("zsh")), pane("%0", None));
        assert_ne!(pane("%0", None), pane("%1", None));
    }
}
