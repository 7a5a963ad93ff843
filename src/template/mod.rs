//! Declarative session templates: named windows, pane layouts, and startup
//! commands, plus the engine that materializes them and the custom-template
//! store.

mod engine;
mod store;

pub use engine::{materialize, MaterializeReport};
pub use store::{generate_template_id, TemplateStore};

use serde::{Deserialize, Serialize};

use crate::tmux::SplitDirection;

/// Column width given to the sidebar pane of [`PaneLayout::MainWithSidebar`].
pub const SIDEBAR_WIDTH: u16 = 40;

/// Fixed pane arrangements a window template can request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaneLayout {
    #[default]
    Single,
    HorizontalSplit,
    VerticalSplit,
    FourPane,
    MainWithSidebar,
}

/// One step of a layout's split recipe, applied to the window being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitStep {
    Split(SplitDirection),
    SelectPane(usize),
    ResizeWidth { pane: usize, columns: u16 },
}

const SINGLE_RECIPE: &[SplitStep] = &[];
const HORIZONTAL_RECIPE: &[SplitStep] = &[SplitStep::Split(SplitDirection::Horizontal)];
const VERTICAL_RECIPE: &[SplitStep] = &[SplitStep::Split(SplitDirection::Vertical)];
const FOUR_PANE_RECIPE: &[SplitStep] = &[
    SplitStep::Split(SplitDirection::Horizontal),
    SplitStep::Split(SplitDirection::Vertical),
    SplitStep::SelectPane(0),
    SplitStep::Split(SplitDirection::Vertical),
];
const MAIN_WITH_SIDEBAR_RECIPE: &[SplitStep] = &[
    SplitStep::Split(SplitDirection::Horizontal),
    SplitStep::ResizeWidth {
        pane: 1,
        columns: SIDEBAR_WIDTH,
    },
];

impl PaneLayout {
    pub const ALL: [PaneLayout; 5] = [
        PaneLayout::Single,
        PaneLayout::HorizontalSplit,
        PaneLayout::VerticalSplit,
        PaneLayout::FourPane,
        PaneLayout::MainWithSidebar,
    ];

    /// Number of panes the recipe leaves in the window.
    pub fn pane_count(self) -> usize {
        match self {
            Self::Single => 1,
            Self::HorizontalSplit | Self::VerticalSplit | Self::MainWithSidebar => 2,
            Self::FourPane => 4,
        }
    }

    /// Ordered tmux steps that build this layout from a single pane.
    ///
    /// tmux numbers panes by creation order, so the order here decides which
    /// command slot lands in which screen position.
    pub fn split_recipe(self) -> &'static [SplitStep] {
        match self {
            Self::Single => SINGLE_RECIPE,
            Self::HorizontalSplit => HORIZONTAL_RECIPE,
            Self::VerticalSplit => VERTICAL_RECIPE,
            Self::FourPane => FOUR_PANE_RECIPE,
            Self::MainWithSidebar => MAIN_WITH_SIDEBAR_RECIPE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Single => "Single",
            Self::HorizontalSplit => "Horizontal Split",
            Self::VerticalSplit => "Vertical Split",
            Self::FourPane => "Four Panes",
            Self::MainWithSidebar => "Main + Sidebar",
        }
    }
}

/// One window of a template. `commands` always holds at least one entry per
/// pane of `layout`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WindowTemplateRecord")]
pub struct WindowTemplate {
    pub name: String,
    pub layout: PaneLayout,
    pub commands: Vec<String>,
}

impl WindowTemplate {
    /// Build a window template, padding `commands` with empty strings up to
    /// the layout's pane count. Extra commands are kept.
    pub fn new(name: impl Into<String>, layout: PaneLayout, commands: Vec<String>) -> Self {
        let mut commands = commands;
        if commands.len() < layout.pane_count() {
            commands.resize(layout.pane_count(), String::new());
        }
        Self {
            name: name.into(),
            layout,
            commands,
        }
    }
}

/// Wire shape for window templates; normalized on the way in.
#[derive(Deserialize)]
struct WindowTemplateRecord {
    name: String,
    #[serde(default)]
    layout: PaneLayout,
    #[serde(default)]
    commands: Vec<String>,
}

impl From<WindowTemplateRecord> for WindowTemplate {
    fn from(record: WindowTemplateRecord) -> Self {
        WindowTemplate::new(record.name, record.layout, record.commands)
    }
}

/// A named recipe for building a whole session in one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,
    pub windows: Vec<WindowTemplate>,
    #[serde(default)]
    pub built_in: bool,
}

fn default_icon() -> String {
    "terminal".to_string()
}

fn window(name: &str, layout: PaneLayout, commands: &[&str]) -> WindowTemplate {
    WindowTemplate::new(
        name,
        layout,
        commands.iter().map(|c| (*c).to_string()).collect(),
    )
}

fn built_in(
    id: &str,
    name: &str,
    description: &str,
    icon: &str,
    windows: Vec<WindowTemplate>,
) -> SessionTemplate {
    SessionTemplate {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
        working_directory: None,
        windows,
        built_in: true,
    }
}

/// Templates shipped with muxbar. Never persisted, never mutated.
pub fn built_in_templates() -> Vec<SessionTemplate> {
    use PaneLayout::{FourPane, HorizontalSplit, Single, VerticalSplit};
    vec![
        built_in(
            "builtin-development",
            "Development",
            "Editor + Terminal + Git status",
            "hammer",
            vec![
                window("editor", Single, &["nvim ."]),
                window("terminal", HorizontalSplit, &["", "git status"]),
            ],
        ),
        built_in(
            "builtin-web-development",
            "Web Development",
            "Server + Client + Logs",
            "globe",
            vec![
                window("server", Single, &["npm run dev"]),
                window("client", Single, &["npm run client"]),
                window(
                    "logs",
                    VerticalSplit,
                    &["tail -f logs/app.log", "tail -f logs/error.log"],
                ),
            ],
        ),
        built_in(
            "builtin-monitoring",
            "System Monitoring",
            "htop + logs + network",
            "chart.line.uptrend.xyaxis",
            vec![window(
                "monitor",
                FourPane,
                &[
                    "htop",
                    "watch -n 1 df -h",
                    "tail -f /var/log/system.log",
                    "netstat -an | head -20",
                ],
            )],
        ),
        built_in(
            "builtin-ssh",
            "SSH Session",
            "Multi-server management",
            "network",
            vec![
                window("server1", Single, &[""]),
                window("server2", Single, &[""]),
                window("local", Single, &[""]),
            ],
        ),
        built_in(
            "builtin-docker",
            "Docker Management",
            "Containers + Logs + Shell",
            "shippingbox",
            vec![
                window("containers", Single, &["docker ps -a"]),
                window("logs", Single, &["docker-compose logs -f"]),
                window("shell", Single, &[""]),
            ],
        ),
    ]
}
