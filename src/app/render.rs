//! Terminal rendering for command results and watch events.
//!
//! Confirmations, warnings, and errors go to stderr. Data the user asked for
//! (session lists with their section headers, previews, exports) goes to
//! stdout so it can be piped.

use crossterm::style::{Color, Stylize};
use muxbar::model::Session;
use muxbar::reconciler::{ReconcilerEvent, ReconcilerEventEnvelope};

const GLYPH_SECTION: &str = "•";
const GLYPH_ATTACHED: &str = "●";
const GLYPH_FAVORITE: &str = "★";
const LABEL_WARNING: &str = "warning:";
const LABEL_ERROR: &str = "error:";
const INDENT: &str = "  ";

/// Injectable rendering interface used by command handlers.
pub(crate) trait RenderSink: Send + Sync {
    /// Section header on stdout.
    fn section(&self, title: &str);
    /// One session row on stdout.
    fn session(&self, session: &Session, style: SessionStyle);
    /// Key/value row on stdout.
    fn field(&self, key: &str, value: &str);
    /// Raw data line on stdout.
    fn line(&self, text: &str);
    /// Lifecycle or confirmation line on stderr.
    fn activity(&self, text: &str);
    fn warn(&self, msg: &str);
    fn error(&self, msg: &str);
}

/// Which session decorations to draw.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct SessionStyle {
    pub favorite: bool,
    pub show_window_count: bool,
    pub show_attached: bool,
    pub show_windows: bool,
}

/// Default terminal renderer.
pub(crate) struct Renderer {
    color: bool,
}

impl Renderer {
    pub(crate) fn new(color: bool) -> Self {
        Self { color }
    }
}

impl RenderSink for Renderer {
    fn section(&self, title: &str) {
        if self.color {
            println!(
                "{} {}",
                GLYPH_SECTION.with(Color::DarkGrey),
                title.with(Color::White).bold()
            );
        } else {
            println!("{title}:");
        }
    }

    fn session(&self, session: &Session, style: SessionStyle) {
        if !self.color {
            println!("{INDENT}{}", session_line(session, style));
        } else {
            let marker = if style.favorite { GLYPH_FAVORITE } else { " " };
            let mut line = format!(
                "{INDENT}{} {}",
                marker.with(Color::Yellow),
                session.name.as_str().with(Color::White).bold()
            );
            if style.show_attached && session.is_attached {
                line.push_str(&format!(" {}", GLYPH_ATTACHED.with(Color::Green)));
            }
            if style.show_window_count {
                line.push_str(&format!(
                    "  {}",
                    window_count_label(session.window_count).with(Color::DarkGrey)
                ));
            }
            println!("{line}");
        }
        if style.show_windows {
            for window in &session.windows {
                let active = if window.is_active { "*" } else { "" };
                let text = format!("{}{active} ({} panes)", window.name, window.pane_count);
                if self.color {
                    println!("{INDENT}{INDENT}  {}", text.with(Color::DarkGrey));
                } else {
                    println!("{INDENT}{INDENT}  {text}");
                }
            }
        }
    }

    fn field(&self, key: &str, value: &str) {
        if self.color {
            println!(
                "{INDENT}{} {}",
                format!("{key}:").with(Color::DarkGrey),
                value.with(Color::White)
            );
        } else {
            println!("{INDENT}{key}: {value}");
        }
    }

    fn line(&self, text: &str) {
        println!("{text}");
    }

    fn activity(&self, text: &str) {
        if self.color {
            eprintln!(
                "{} {}",
                GLYPH_SECTION.with(Color::DarkGrey),
                text.with(Color::Grey).bold()
            );
        } else {
            eprintln!("{text}");
        }
    }

    fn warn(&self, msg: &str) {
        if self.color {
            eprintln!("{} {msg}", LABEL_WARNING.with(Color::Yellow).bold());
        } else {
            eprintln!("{LABEL_WARNING} {msg}");
        }
    }

    fn error(&self, msg: &str) {
        if self.color {
            eprintln!("{} {msg}", LABEL_ERROR.with(Color::Red).bold());
        } else {
            eprintln!("{LABEL_ERROR} {msg}");
        }
    }
}

/// "1 window" / "N windows".
pub(crate) fn window_count_label(count: usize) -> String {
    if count == 1 {
        "1 window".to_string()
    } else {
        format!("{count} windows")
    }
}

/// Plain-text session row used when color is off.
pub(crate) fn session_line(session: &Session, style: SessionStyle) -> String {
    let marker = if style.favorite { GLYPH_FAVORITE } else { " " };
    let mut line = format!("{marker} {}", session.name);
    if style.show_attached && session.is_attached {
        line.push(' ');
        line.push_str(GLYPH_ATTACHED);
    }
    if style.show_window_count {
        line.push_str("  ");
        line.push_str(&window_count_label(session.window_count));
    }
    line
}

/// Human-readable rendering of one watch event; `None` for events not worth
/// printing.
pub(crate) fn describe_event(envelope: &ReconcilerEventEnvelope) -> Option<String> {
    let text = match &envelope.event {
        ReconcilerEvent::Started | ReconcilerEvent::RefreshStarted => return None,
        ReconcilerEvent::Stopped => "stopped".to_string(),
        ReconcilerEvent::MonitoringStarted { interval_ms } => {
            format!("monitoring every {:.1}s", *interval_ms as f64 / 1000.0)
        }
        ReconcilerEvent::MonitoringStopped => "monitoring stopped".to_string(),
        ReconcilerEvent::SessionsReplaced { count } => match count {
            1 => "1 session".to_string(),
            n => format!("{n} sessions"),
        },
        ReconcilerEvent::RefreshFailed { message } => format!("refresh failed: {message}"),
        ReconcilerEvent::OperationFailed { message } => message.clone(),
        ReconcilerEvent::PreferencesChanged => "preferences updated".to_string(),
        ReconcilerEvent::TemplateApplied { session, ok } => {
            if *ok {
                format!("template applied to '{session}'")
            } else {
                format!("template failed for '{session}'")
            }
        }
    };
    Some(text)
}
