//! User preferences: favorites, groups, terminal choice, and refresh cadence.
//!
//! Favorites and groups are keyed by session **name**. tmux session ids are
//! not stable across server restarts, so names are the only handle a user
//! recognizes, and renames must migrate membership explicitly.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::attach::TerminalApp;
use crate::error::StoreError;
use crate::persist::{read_json, write_json_atomic};

/// Refresh interval used when nothing else supplies one.
pub const DEFAULT_REFRESH_INTERVAL_SECS: f64 = 3.0;
/// Shortest refresh interval accepted from any source.
pub const MIN_REFRESH_INTERVAL_SECS: f64 = 0.1;
/// Longest refresh interval accepted from any source (one day).
pub const MAX_REFRESH_INTERVAL_SECS: f64 = 86_400.0;

/// `secs` as a refresh period, or `None` when it falls outside
/// [`MIN_REFRESH_INTERVAL_SECS`, `MAX_REFRESH_INTERVAL_SECS`] or is NaN.
pub fn checked_refresh_interval(secs: f64) -> Option<Duration> {
    if !(MIN_REFRESH_INTERVAL_SECS..=MAX_REFRESH_INTERVAL_SECS).contains(&secs) {
        return None;
    }
    Duration::try_from_secs_f64(secs).ok()
}

pub fn refresh_interval_error(secs: f64) -> String {
    format!(
        "refresh interval must be between {MIN_REFRESH_INTERVAL_SECS} and \
         {MAX_REFRESH_INTERVAL_SECS} seconds, got {secs}"
    )
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preferences {
    pub terminal_app: TerminalApp,
    pub refresh_interval_secs: f64,
    pub favorites: BTreeSet<String>,
    pub groups: BTreeMap<String, Vec<String>>,
    pub show_window_count: bool,
    pub show_attached_indicator: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self::with_refresh_interval(DEFAULT_REFRESH_INTERVAL_SECS)
    }
}

impl Preferences {
    /// Defaults, but with `secs` as the refresh interval when it is valid.
    pub fn with_refresh_interval(secs: f64) -> Self {
        Self {
            terminal_app: TerminalApp::default(),
            refresh_interval_secs: valid_interval(secs).unwrap_or(DEFAULT_REFRESH_INTERVAL_SECS),
            favorites: BTreeSet::new(),
            groups: BTreeMap::new(),
            show_window_count: true,
            show_attached_indicator: true,
        }
    }

    /// The stored interval, or the default when the field holds something out of range.
    pub fn refresh_interval(&self) -> Duration {
        checked_refresh_interval(self.refresh_interval_secs)
            .unwrap_or_else(|| Duration::from_secs_f64(DEFAULT_REFRESH_INTERVAL_SECS))
    }

    /// Set the refresh interval. Returns false when it is out of range.
    pub fn set_refresh_interval(&mut self, interval: Duration) -> bool {
        match valid_interval(interval.as_secs_f64()) {
            Some(secs) => {
                self.refresh_interval_secs = secs;
                true
            }
            None => false,
        }
    }

    pub fn add_favorite(&mut self, session: &str) {
        self.favorites.insert(session.to_string());
    }

    pub fn remove_favorite(&mut self, session: &str) {
        self.favorites.remove(session);
    }

    pub fn is_favorite(&self, session: &str) -> bool {
        self.favorites.contains(session)
    }

    /// Flip favorite membership; returns the new state.
    pub fn toggle_favorite(&mut self, session: &str) -> bool {
        if self.favorites.remove(session) {
            false
        } else {
            self.favorites.insert(session.to_string());
            true
        }
    }

    /// Create or overwrite a group.
    pub fn update_group(&mut self, group: &str, sessions: Vec<String>) {
        self.groups.insert(group.to_string(), sessions);
    }

    pub fn remove_group(&mut self, group: &str) {
        self.groups.remove(group);
    }

    /// Move a group's members under a new name. Unknown groups are ignored.
    pub fn rename_group(&mut self, old_name: &str, new_name: &str) -> bool {
        match self.groups.remove(old_name) {
            Some(sessions) => {
                self.groups.insert(new_name.to_string(), sessions);
                true
            }
            None => false,
        }
    }

    /// Append `session` to `group`, creating the group if needed.
    pub fn add_to_group(&mut self, group: &str, session: &str) {
        let members = self.groups.entry(group.to_string()).or_default();
        if !members.iter().any(|name| name == session) {
            members.push(session.to_string());
        }
    }

    /// Drop `session` from `group`; a group left empty is deleted.
    pub fn remove_from_group(&mut self, group: &str, session: &str) {
        let Some(members) = self.groups.get_mut(group) else {
            return;
        };
        members.retain(|name| name != session);
        if members.is_empty() {
            self.groups.remove(group);
        }
    }

    /// Whether `session` belongs to any group.
    pub fn is_grouped(&self, session: &str) -> bool {
        self.groups
            .values()
            .any(|members| members.iter().any(|name| name == session))
    }

    /// Carry favorite and group membership from `old_name` to `new_name`.
    ///
    /// Group members keep their group but move to the end of its list.
    /// Returns whether anything changed.
    pub fn migrate_session_name(&mut self, old_name: &str, new_name: &str) -> bool {
        if old_name == new_name {
            return false;
        }
        let mut changed = false;
        if self.favorites.remove(old_name) {
            self.favorites.insert(new_name.to_string());
            changed = true;
        }
        for members in self.groups.values_mut() {
            if members.iter().any(|name| name == old_name) {
                members.retain(|name| name != old_name && name != new_name);
                members.push(new_name.to_string());
                changed = true;
            }
        }
        changed
    }

    pub fn reset_to_defaults(&mut self) {
        *self = Self::default();
    }
}

fn valid_interval(secs: f64) -> Option<f64> {
    checked_refresh_interval(secs).map(|_| secs)
}

/// Wire shape of `preferences.json`; every field is optional so older or
/// hand-edited files load with defaults filled in.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PreferencesFile {
    terminal_app: Option<TerminalApp>,
    refresh_interval_secs: Option<f64>,
    favorites: Option<BTreeSet<String>>,
    groups: Option<BTreeMap<String, Vec<String>>>,
    show_window_count: Option<bool>,
    show_attached_indicator: Option<bool>,
}

impl PreferencesFile {
    fn into_preferences(self, defaults: Preferences) -> Preferences {
        Preferences {
            terminal_app: self.terminal_app.unwrap_or(defaults.terminal_app),
            refresh_interval_secs: self
                .refresh_interval_secs
                .and_then(valid_interval)
                .unwrap_or(defaults.refresh_interval_secs),
            favorites: self.favorites.unwrap_or(defaults.favorites),
            groups: self.groups.unwrap_or(defaults.groups),
            show_window_count: self.show_window_count.unwrap_or(defaults.show_window_count),
            show_attached_indicator: self
                .show_attached_indicator
                .unwrap_or(defaults.show_attached_indicator),
        }
    }
}

/// Preferences plus the file they persist to.
#[derive(Debug, Clone)]
pub struct PreferencesStore {
    path: Option<PathBuf>,
    prefs: Preferences,
}

impl PreferencesStore {
    /// Load preferences from `path`, filling gaps from `defaults`.
    pub fn open(path: impl AsRef<Path>, defaults: Preferences) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let prefs = match read_json::<PreferencesFile>(&path)? {
            Some(file) => file.into_preferences(defaults),
            None => defaults,
        };
        debug!(path = %path.display(), "loaded preferences");
        Ok(Self {
            path: Some(path),
            prefs,
        })
    }

    /// A store that never touches the filesystem.
    pub fn in_memory(prefs: Preferences) -> Self {
        Self { path: None, prefs }
    }

    pub fn get(&self) -> &Preferences {
        &self.prefs
    }

    /// Apply `change` and persist the result.
    ///
    /// Persistence failures are logged and otherwise ignored; the in-memory
    /// preferences stay authoritative for this process.
    pub fn update<R>(&mut self, change: impl FnOnce(&mut Preferences) -> R) -> R {
        let result = change(&mut self.prefs);
        if let Err(err) = self.save() {
            warn!("failed to save preferences: {err}");
        }
        result
    }

    pub fn save(&self) -> Result<(), StoreError> {
        match &self.path {
            Some(path) => write_json_atomic(path, &self.prefs),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testsupport::TestTempDir;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_match_the_documented_values() {
        let prefs = Preferences::default();
        assert_eq!(prefs.terminal_app, TerminalApp::Terminal);
        assert_eq!(prefs.refresh_interval(), Duration::from_secs(3));
        assert!(prefs.show_window_count);
        assert!(prefs.show_attached_indicator);
        assert!(prefs.favorites.is_empty() && prefs.groups.is_empty());
    }

    #[test]
    fn renaming_a_favorite_migrates_membership() {
        let mut prefs = Preferences::default();
        prefs.add_favorite("work");
        assert!(prefs.migrate_session_name("work", "work2"));
        assert!(prefs.is_favorite("work2"));
        assert!(!prefs.is_favorite("work"));
    }

    #[test]
    fn renaming_a_grouped_session_moves_it_to_the_end() {
        let mut prefs = Preferences::default();
        prefs.update_group("clients", names(&["a", "work", "b"]));
        prefs.migrate_session_name("work", "work2");
        assert_eq!(prefs.groups["clients"], names(&["a", "b", "work2"]));
    }

    #[test]
    fn migrating_an_unknown_name_changes_nothing() {
        let mut prefs = Preferences::default();
        prefs.add_favorite("x");
        assert!(!prefs.migrate_session_name("y", "z"));
        assert!(!prefs.migrate_session_name("x", "x"));
    }

    #[test]
    fn group_membership_helpers() {
        let mut prefs = Preferences::default();
        prefs.add_to_group("ops", "db");
        prefs.add_to_group("ops", "db");
        assert_eq!(prefs.groups["ops"], names(&["db"]));
        assert!(prefs.is_grouped("db"));

        prefs.remove_from_group("ops", "db");
        assert!(!prefs.groups.contains_key("ops"));
        prefs.remove_from_group("missing", "db");
    }

    #[test]
    fn rename_group_keeps_members() {
        let mut prefs = Preferences::default();
        prefs.update_group("old", names(&["s"]));
        assert!(prefs.rename_group("old", "new"));
        assert_eq!(prefs.groups["new"], names(&["s"]));
        assert!(!prefs.rename_group("old", "newer"));
    }

    #[test]
    fn toggle_favorite_flips_state() {
        let mut prefs = Preferences::default();
        assert!(prefs.toggle_favorite("w"));
        assert!(!prefs.toggle_favorite("w"));
        assert!(!prefs.is_favorite("w"));
    }

    #[test]
    fn unrepresentable_intervals_are_rejected() {
        let mut prefs = Preferences::default();
        assert!(!prefs.set_refresh_interval(Duration::from_nanos(1)));
        assert!(!prefs.set_refresh_interval(Duration::from_secs(u64::MAX)));
        assert_eq!(prefs.refresh_interval_secs, 3.0);
        assert_eq!(Preferences::with_refresh_interval(1e20).refresh_interval_secs, 3.0);
        assert_eq!(Preferences::with_refresh_interval(1e-12).refresh_interval_secs, 3.0);
        assert_eq!(Preferences::with_refresh_interval(f64::NAN).refresh_interval_secs, 3.0);

        assert!(prefs.set_refresh_interval(Duration::from_millis(100)));
        assert!(prefs.set_refresh_interval(Duration::from_secs(86_400)));

        prefs.refresh_interval_secs = 1e20;
        assert_eq!(prefs.refresh_interval(), Duration::from_secs(3));
    }

    #[test]
    fn non_positive_intervals_are_rejected() {
        let mut prefs = Preferences::default();
        assert!(!prefs.set_refresh_interval(Duration::ZERO));
        assert!(prefs.set_refresh_interval(Duration::from_millis(500)));
        assert_eq!(prefs.refresh_interval_secs, 0.5);
        assert_eq!(Preferences::with_refresh_interval(-1.0).refresh_interval_secs, 3.0);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut prefs = Preferences::default();
        prefs.add_favorite("w");
        prefs.terminal_app = TerminalApp::Kitty;
        prefs.reset_to_defaults();
        assert_eq!(prefs, Preferences::default());
    }

    #[test]
    fn store_round_trips_and_fills_gaps() {
        let dir = TestTempDir::new("prefs");
        let path = dir.child("preferences.json");
        {
            let mut store = PreferencesStore::open(&path, Preferences::default()).unwrap();
            store.update(|p| {
                p.add_favorite("work");
                p.terminal_app = TerminalApp::Alacritty;
            });
        }
        let store = PreferencesStore::open(&path, Preferences::default()).unwrap();
        assert!(store.get().is_favorite("work"));
        assert_eq!(store.get().terminal_app, TerminalApp::Alacritty);

        let partial = dir.write_text("partial.json", r#"{"refresh_interval_secs": 0}"#);
        let store =
            PreferencesStore::open(partial, Preferences::with_refresh_interval(5.0)).unwrap();
        assert_eq!(store.get().refresh_interval_secs, 5.0);
        assert!(store.get().show_window_count);
    }

    #[test]
    fn out_of_range_file_intervals_fall_back_to_defaults() {
        let dir = TestTempDir::new("prefs-range");
        for raw in ["1e20", "1e-12"] {
            let path = dir.write_text(
                "preferences.json",
                &format!(r#"{{"refresh_interval_secs": {raw}}}"#),
            );
            let store =
                PreferencesStore::open(path, Preferences::with_refresh_interval(4.0)).unwrap();
            assert_eq!(store.get().refresh_interval_secs, 4.0, "{raw}");
            assert_eq!(store.get().refresh_interval(), Duration::from_secs(4));
        }
    }

    #[test]
    fn missing_file_yields_supplied_defaults() {
        let dir = TestTempDir::new("prefs-missing");
        let store = PreferencesStore::open(
            dir.child("none.json"),
            Preferences::with_refresh_interval(10.0),
        )
        .unwrap();
        assert_eq!(store.get().refresh_interval(), Duration::from_secs(10));
    }
}
