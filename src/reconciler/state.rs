//! Canonical session list and the partitions derived from it.

use std::collections::BTreeMap;

use crate::error::ExecError;
use crate::model::Session;
use crate::preferences::Preferences;

use super::schema::ReconcilerSnapshot;

/// State owned exclusively by the reconciler actor.
#[derive(Debug, Default)]
pub(super) struct SessionState {
    sessions: Vec<Session>,
    refreshes_in_flight: usize,
    last_error: Option<String>,
}

impl SessionState {
    pub(super) fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub(super) fn is_loading(&self) -> bool {
        self.refreshes_in_flight > 0
    }

    pub(super) fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(super) fn begin_refresh(&mut self) {
        self.refreshes_in_flight += 1;
    }

    /// Replace the canonical list wholesale with one listing result.
    ///
    /// A failed listing empties the list rather than leaving it stale.
    pub(super) fn apply_refresh(
        &mut self,
        result: Result<Vec<Session>, ExecError>,
    ) -> Result<usize, String> {
        self.refreshes_in_flight = self.refreshes_in_flight.saturating_sub(1);
        match result {
            Ok(sessions) => {
                self.sessions = sessions;
                self.last_error = None;
                Ok(self.sessions.len())
            }
            Err(err) => {
                let message = format!("Failed to list sessions: {err}");
                self.sessions.clear();
                self.last_error = Some(message.clone());
                Err(message)
            }
        }
    }

    pub(super) fn record_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub(super) fn snapshot(&self, prefs: &Preferences, monitoring: bool) -> ReconcilerSnapshot {
        let ungrouped = ungrouped_sessions(&self.sessions, prefs);
        let others = ungrouped
            .iter()
            .filter(|session| !prefs.is_favorite(&session.name))
            .cloned()
            .collect();
        ReconcilerSnapshot {
            sessions: self.sessions.clone(),
            is_loading: self.is_loading(),
            last_error: self.last_error.clone(),
            monitoring,
            favorites: favorite_sessions(&self.sessions, prefs),
            groups: grouped_sessions(&self.sessions, prefs),
            ungrouped,
            others,
        }
    }
}

fn sorted_by_name(mut sessions: Vec<Session>) -> Vec<Session> {
    sessions.sort_by(|a, b| a.name.cmp(&b.name));
    sessions
}

/// Sessions whose name is a favorite, sorted by name.
pub fn favorite_sessions(sessions: &[Session], prefs: &Preferences) -> Vec<Session> {
    sorted_by_name(
        sessions
            .iter()
            .filter(|session| prefs.is_favorite(&session.name))
            .cloned()
            .collect(),
    )
}

/// Group name to its live members, sorted by name. Groups with no live
/// member are omitted.
pub fn grouped_sessions(
    sessions: &[Session],
    prefs: &Preferences,
) -> BTreeMap<String, Vec<Session>> {
    prefs
        .groups
        .iter()
        .filter_map(|(group, members)| {
            let live: Vec<Session> = sessions
                .iter()
                .filter(|session| members.contains(&session.name))
                .cloned()
                .collect();
            (!live.is_empty()).then(|| (group.clone(), sorted_by_name(live)))
        })
        .collect()
}

/// Sessions that belong to no group, sorted by name.
pub fn ungrouped_sessions(sessions: &[Session], prefs: &Preferences) -> Vec<Session> {
    sorted_by_name(
        sessions
            .iter()
            .filter(|session| !prefs.is_grouped(&session.name))
            .cloned()
            .collect(),
    )
}
