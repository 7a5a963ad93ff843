//! Reconciler command/event schema.
//!
//! Commands are the control plane sent by frontends; events are the change
//! notifications the actor publishes after each state transition.

use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tokio::sync::oneshot;

use crate::attach::TerminalApp;
use crate::model::Session;
use crate::preferences::Preferences;
use crate::template::{MaterializeReport, SessionTemplate};
use crate::tmux::SplitDirection;

/// Reply channel for operations that either succeed or surface one error string.
pub type OpReply = oneshot::Sender<Result<(), String>>;

/// Control-plane commands for the reconciler actor.
#[derive(Debug)]
pub enum ReconcilerCommand {
    /// Refresh once now, then on every interval tick.
    StartMonitoring,
    StopMonitoring,
    /// Refresh once. The reply, if any, carries the new session count.
    Refresh {
        reply: Option<oneshot::Sender<Result<usize, String>>>,
    },
    SetRefreshInterval {
        interval: Duration,
        reply: OpReply,
    },
    CreateSession {
        name: String,
        directory: Option<String>,
        reply: OpReply,
    },
    KillSession {
        name: String,
        reply: OpReply,
    },
    RenameSession {
        old_name: String,
        new_name: String,
        reply: OpReply,
    },
    CreateWindow {
        session: String,
        name: Option<String>,
        reply: OpReply,
    },
    SplitPane {
        session: String,
        window: Option<String>,
        direction: SplitDirection,
        reply: OpReply,
    },
    AttachSession {
        name: String,
        reply: OpReply,
    },
    ApplyTemplate {
        template: SessionTemplate,
        session_name: String,
        reply: oneshot::Sender<Result<MaterializeReport, String>>,
    },
    ToggleFavorite {
        name: String,
        reply: oneshot::Sender<bool>,
    },
    IsFavorite {
        name: String,
        reply: oneshot::Sender<bool>,
    },
    AddToGroup {
        group: String,
        session: String,
        reply: oneshot::Sender<()>,
    },
    RemoveFromGroup {
        group: String,
        session: String,
        reply: oneshot::Sender<()>,
    },
    CreateGroup {
        group: String,
        sessions: Vec<String>,
        reply: oneshot::Sender<()>,
    },
    SetTerminalApp {
        app: TerminalApp,
        reply: oneshot::Sender<()>,
    },
    Snapshot {
        reply: oneshot::Sender<ReconcilerSnapshot>,
    },
    Preferences {
        reply: oneshot::Sender<Preferences>,
    },
    Shutdown,
}

/// Monotonic envelope for reconciler events.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReconcilerEventEnvelope {
    pub seq: u64,
    pub ts_unix_ms: u64,
    pub event: ReconcilerEvent,
}

impl ReconcilerEventEnvelope {
    pub fn new(seq: u64, event: ReconcilerEvent) -> Self {
        Self {
            seq,
            ts_unix_ms: now_unix_millis(),
            event,
        }
    }
}

/// Change notifications published by the actor.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReconcilerEvent {
    Started,
    Stopped,
    MonitoringStarted { interval_ms: u64 },
    MonitoringStopped,
    RefreshStarted,
    /// The canonical list was replaced by a fresh listing.
    SessionsReplaced { count: usize },
    /// The listing failed; the canonical list is now empty.
    RefreshFailed { message: String },
    OperationFailed { message: String },
    PreferencesChanged,
    TemplateApplied { session: String, ok: bool },
}

/// Read-only view of the canonical list plus its derived partitions.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ReconcilerSnapshot {
    pub sessions: Vec<Session>,
    pub is_loading: bool,
    pub last_error: Option<String>,
    pub monitoring: bool,
    pub favorites: Vec<Session>,
    pub groups: BTreeMap<String, Vec<Session>>,
    pub ungrouped: Vec<Session>,
    /// Ungrouped sessions that are not favorites either.
    pub others: Vec<Session>,
}

fn now_unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
