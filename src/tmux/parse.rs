//! Line parsers for tmux list output.
//!
//! Each line is one entity. Lines with too few fields are dropped so a single
//! malformed record never aborts the rest of the batch.

use crate::model::{Pane, Session, Window};
use tracing::debug;

use super::commands::FIELD_DELIMITER;

/// Parse every line of `output` with `parse_line`, skipping rejects.
pub(crate) fn parse_lines<T>(output: &str, parse_line: impl Fn(&str) -> Option<T>) -> Vec<T> {
    output
        .lines()
        .filter_map(|line| {
            let parsed = parse_line(line.trim_end_matches('\r'));
            if parsed.is_none() && !line.trim().is_empty() {
                debug!(line, "dropping malformed tmux record");
            }
            parsed
        })
        .collect()
}

/// Parse `{id}:{name}:{session_windows}:{session_attached}`.
pub(crate) fn parse_session_line(line: &str) -> Option<Session> {
    let (id, name, windows, attached) = split_named_record(line)?;
    Some(Session::new(id, name, parse_count(windows), parse_flag(attached)))
}

/// Parse `{id}:{name}:{window_active}:{window_panes}`.
pub(crate) fn parse_window_line(line: &str) -> Option<Window> {
    let (id, name, active, panes) = split_named_record(line)?;
    Some(Window::new(id, name, parse_flag(active), parse_count(panes)))
}

/// Parse `{id}:{active}:{width}:{height}:{current_command}`.
///
/// The command is the trailing field, so it may itself contain the delimiter.
pub(crate) fn parse_pane_line(line: &str) -> Option<Pane> {
    let mut fields = line.splitn(5, FIELD_DELIMITER);
    let id = fields.next()?;
    let active = fields.next()?;
    let width = fields.next()?;
    let height = fields.next()?;
    let command = fields.next()?;
    let command = command.trim();
    Some(Pane {
        id: id.to_string(),
        is_active: parse_flag(active),
        width: width.trim().parse().unwrap_or(0),
        height: height.trim().parse().unwrap_or(0),
        current_command: (!command.is_empty()).then(|| command.to_string()),
    })
}

/// Split a four-field record whose second field is a free-form name.
///
/// The id never contains the delimiter and the last two fields are numeric,
/// so the name is whatever lies between the first and the last two
/// delimiters.
fn split_named_record(line: &str) -> Option<(&str, &str, &str, &str)> {
    let (id, rest) = line.split_once(FIELD_DELIMITER)?;
    let mut tail = rest.rsplitn(3, FIELD_DELIMITER);
    let fourth = tail.next()?;
    let third = tail.next()?;
    let name = tail.next()?;
    Some((id, name, third, fourth))
}

fn parse_flag(raw: &str) -> bool {
    raw.trim() == "1"
}

fn parse_count(raw: &str) -> usize {
    raw.trim().parse().unwrap_or(0)
}
