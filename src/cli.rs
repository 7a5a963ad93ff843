//! CLI argument parsing via clap.

use clap::{Args as ClapArgs, Parser, Subcommand};
use muxbar::attach::TerminalApp;
use muxbar::build_info::HELP_BUILD_METADATA;
use muxbar::template::PaneLayout;

/// Mirror, organize, and drive local tmux sessions.
#[derive(Debug, Parser)]
#[command(
    name = "muxbar",
    disable_version_flag = true,
    after_help = HELP_BUILD_METADATA
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to config file (default: ./muxbar.toml or ~/.config/muxbar/muxbar.toml).
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<String>,

    /// Enable debug logging (RUST_LOG takes precedence).
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Print machine-readable JSON on stdout.
    #[arg(long = "json", global = true)]
    pub json: bool,

    /// Disable color output.
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Print version and build metadata.
    #[arg(short = 'V', long = "version")]
    pub version: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List sessions, grouped the way the menu shows them (default).
    List {
        /// Also show each session's windows.
        #[arg(short = 'w', long = "windows")]
        windows: bool,
    },
    /// Create a detached session.
    New {
        name: String,
        /// Starting directory for the session.
        #[arg(short = 'd', long = "directory")]
        directory: Option<String>,
    },
    /// Kill a session.
    Kill { name: String },
    /// Rename a session, carrying its favorite and group membership along.
    Rename { old_name: String, new_name: String },
    /// Add a window to a session.
    NewWindow {
        session: String,
        #[arg(short = 'n', long = "name")]
        name: Option<String>,
    },
    /// Split the active pane of a session's window.
    Split(SplitArgs),
    /// Show the first pane's recent output, command, and directory.
    Preview {
        session: String,
        /// Scroll-back lines to capture (default from config).
        #[arg(short = 'l', long = "lines")]
        lines: Option<usize>,
    },
    /// Open the preferred terminal attached to a session.
    Attach { session: String },
    /// Toggle a session's favorite flag.
    Favorite { session: String },
    /// Manage session groups.
    Group {
        #[command(subcommand)]
        action: GroupCommand,
    },
    /// Manage and apply session templates.
    Template {
        #[command(subcommand)]
        action: TemplateCommand,
    },
    /// Show or change preferences.
    Prefs {
        #[command(subcommand)]
        action: Option<PrefsCommand>,
    },
    /// Keep the session list fresh and print every change until Ctrl-C.
    Watch {
        /// Refresh interval in seconds for this run (saved to preferences).
        #[arg(short = 'i', long = "interval")]
        interval: Option<f64>,
    },
}

#[derive(Debug, ClapArgs)]
pub struct SplitArgs {
    pub session: String,
    /// Side-by-side panes.
    #[arg(
        long = "horizontal",
        conflicts_with = "vertical",
        required_unless_present = "vertical"
    )]
    pub horizontal: bool,
    /// Stacked panes.
    #[arg(long = "vertical")]
    pub vertical: bool,
    /// Window index or id (default: the session's active window).
    #[arg(short = 'w', long = "window")]
    pub window: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum GroupCommand {
    /// Add a session to a group, creating the group if needed.
    Add { group: String, session: String },
    /// Remove a session from a group; empty groups disappear.
    Remove { group: String, session: String },
    /// Create or replace a group with exactly these sessions.
    Set { group: String, sessions: Vec<String> },
}

#[derive(Debug, Subcommand)]
pub enum TemplateCommand {
    /// List built-in and custom templates.
    List,
    /// Show one template's windows, layouts, and commands.
    Show { template: String },
    /// Create a new session from a template.
    Apply {
        /// Template id or name.
        template: String,
        /// Name of the session to create.
        session: String,
    },
    /// Save a single-window custom template.
    Create {
        name: String,
        #[arg(short = 'd', long = "description")]
        description: Option<String>,
        /// Directory new sessions start in.
        #[arg(long = "directory")]
        directory: Option<String>,
        /// Pane layout of the window.
        #[arg(
            short = 'l',
            long = "layout",
            default_value = "single",
            value_parser = parse_layout
        )]
        layout: PaneLayout,
        /// Startup command for the next pane (repeatable).
        #[arg(short = 'e', long = "command")]
        commands: Vec<String>,
    },
    /// Print custom templates as JSON.
    Export,
    /// Import templates from a JSON file (`-` reads stdin).
    Import { path: String },
    /// Delete a custom template.
    Delete { template: String },
    /// Copy a template into a new custom template.
    Duplicate { template: String },
}

#[derive(Debug, Subcommand)]
pub enum PrefsCommand {
    /// Print current preferences.
    Show,
    /// Set the refresh interval in seconds.
    Interval { seconds: f64 },
    /// Set the terminal used by `attach`.
    Terminal { app: TerminalApp },
}

/// Parse a layout by its file-format tag (`four-pane`, `main-with-sidebar`, ...).
fn parse_layout(value: &str) -> Result<PaneLayout, String> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_ascii_lowercase()))
        .map_err(|_| {
            let known: Vec<String> = PaneLayout::ALL
                .iter()
                .filter_map(|layout| serde_json::to_value(layout).ok())
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect();
            format!("unknown layout '{value}' (expected one of: {})", known.join(", "))
        })
}
