//! Opening a terminal emulator attached to a tmux session.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ExecError;
use crate::process::{shell_quote, which, CommandRunner};

/// Terminal emulators muxbar knows how to launch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminalApp {
    #[default]
    Terminal,
    ITerm2,
    Alacritty,
    Warp,
    Kitty,
}

/// Delay before Warp receives the typed attach command.
const WARP_TYPING_DELAY_SECS: &str = "0.5";

impl TerminalApp {
    pub const ALL: [TerminalApp; 5] = [
        TerminalApp::Terminal,
        TerminalApp::ITerm2,
        TerminalApp::Alacritty,
        TerminalApp::Warp,
        TerminalApp::Kitty,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Terminal => "Terminal",
            Self::ITerm2 => "iTerm2",
            Self::Alacritty => "Alacritty",
            Self::Warp => "Warp",
            Self::Kitty => "Kitty",
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Self::Terminal => "terminal",
            Self::ITerm2 => "iterm2",
            Self::Alacritty => "alacritty",
            Self::Warp => "warp",
            Self::Kitty => "kitty",
        }
    }

    /// Whether the emulator appears to be available on this machine.
    pub async fn is_installed(self, runner: &dyn CommandRunner) -> bool {
        match self {
            Self::Terminal => true,
            Self::ITerm2 => Path::new("/Applications/iTerm.app").exists(),
            Self::Warp => Path::new("/Applications/Warp.app").exists(),
            Self::Alacritty => which(runner, "alacritty").await.is_some(),
            Self::Kitty => which(runner, "kitty").await.is_some(),
        }
    }

    /// Shell command line that opens this emulator attached to `session`.
    pub fn attach_command_line(self, tmux_binary: &str, session: &str) -> String {
        let attach = format!(
            "{} attach -t {}",
            shell_quote(tmux_binary),
            shell_quote(session)
        );
        match self {
            Self::Terminal => osascript(&[
                "tell application \"Terminal\"",
                "activate",
                &format!("do script {}", applescript_string(&attach)),
                "end tell",
            ]),
            Self::ITerm2 => osascript(&[
                "tell application \"iTerm2\"",
                "activate",
                &format!(
                    "create window with default profile command {}",
                    applescript_string(&attach)
                ),
                "end tell",
            ]),
            Self::Alacritty => format!("alacritty -e {attach}"),
            Self::Kitty => format!("kitty {attach}"),
            Self::Warp => {
                // Warp has no attach flag; focus it, then type the command.
                let activate = osascript(&["tell application \"Warp\" to activate"]);
                let typing = osascript(&[
                    "tell application \"System Events\"",
                    "tell process \"Warp\"",
                    &format!("keystroke {}", applescript_string(&attach)),
                    "keystroke return",
                    "end tell",
                    "end tell",
                ]);
                format!("{activate} && sleep {WARP_TYPING_DELAY_SECS} && {typing}")
            }
        }
    }
}

impl fmt::Display for TerminalApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for TerminalApp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|app| app.tag() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown terminal '{s}' (expected terminal, iterm2, alacritty, warp, kitty)"
                )
            })
    }
}

/// Launch `app` attached to `session` without waiting for it.
pub async fn attach_session(
    runner: &dyn CommandRunner,
    app: TerminalApp,
    tmux_binary: &str,
    session: &str,
) -> Result<(), ExecError> {
    info!(session, terminal = %app, "attaching to session");
    runner
        .spawn_detached(&app.attach_command_line(tmux_binary, session))
        .await
}

fn osascript(lines: &[&str]) -> String {
    let mut command = String::from("osascript");
    for line in lines {
        command.push_str(" -e ");
        command.push_str(&shell_quote(line));
    }
    command
}

fn applescript_string(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
