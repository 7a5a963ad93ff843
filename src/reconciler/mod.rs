//! Session reconciler actor.
//!
//! One task owns the canonical session list. It refreshes that list from tmux
//! on a timer and after every successful mutation, and it is the only place
//! the list or the preferences are modified. Frontends talk to it through a
//! [`ReconcilerHandle`] and observe it through the event stream.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::attach::{attach_session, TerminalApp};
use crate::error::ExecError;
use crate::preferences::{refresh_interval_error, Preferences, PreferencesStore};
use crate::template::{MaterializeReport, SessionTemplate};
use crate::tmux::{SplitDirection, TmuxClient};

mod scheduler;
mod schema;
mod state;
mod tasks;

pub use schema::*;
pub use state::{favorite_sessions, grouped_sessions, ungrouped_sessions};

use scheduler::RefreshScheduler;
use state::SessionState;
use tasks::{spawn_refresh_task, spawn_template_task, TaskDone};

const CHANNEL_CLOSED: &str = "reconciler is not running";

/// Handle for sending commands to a spawned reconciler.
#[derive(Clone)]
pub struct ReconcilerHandle {
    pub commands: mpsc::Sender<ReconcilerCommand>,
}

/// Event stream receiver returned by [`spawn_reconciler`].
pub type ReconcilerEventStream = mpsc::UnboundedReceiver<ReconcilerEventEnvelope>;

impl ReconcilerHandle {
    /// Send one command without waiting for its effect.
    pub async fn send(&self, command: ReconcilerCommand) -> Result<(), String> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CHANNEL_CLOSED.to_string())
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> ReconcilerCommand,
    ) -> Result<T, String> {
        let (reply, rx) = oneshot::channel();
        self.send(build(reply)).await?;
        rx.await.map_err(|_| CHANNEL_CLOSED.to_string())
    }

    pub async fn start_monitoring(&self) -> Result<(), String> {
        self.send(ReconcilerCommand::StartMonitoring).await
    }

    pub async fn stop_monitoring(&self) -> Result<(), String> {
        self.send(ReconcilerCommand::StopMonitoring).await
    }

    /// Refresh now and wait for the result to be merged.
    pub async fn refresh(&self) -> Result<usize, String> {
        self.request(|reply| ReconcilerCommand::Refresh { reply: Some(reply) })
            .await?
    }

    pub async fn set_refresh_interval(&self, interval: Duration) -> Result<(), String> {
        self.request(|reply| ReconcilerCommand::SetRefreshInterval { interval, reply })
            .await?
    }

    pub async fn create_session(
        &self,
        name: &str,
        directory: Option<&str>,
    ) -> Result<(), String> {
        self.request(|reply| ReconcilerCommand::CreateSession {
            name: name.to_string(),
            directory: directory.map(str::to_string),
            reply,
        })
        .await?
    }

    pub async fn kill_session(&self, name: &str) -> Result<(), String> {
        self.request(|reply| ReconcilerCommand::KillSession {
            name: name.to_string(),
            reply,
        })
        .await?
    }

    pub async fn rename_session(&self, old_name: &str, new_name: &str) -> Result<(), String> {
        self.request(|reply| ReconcilerCommand::RenameSession {
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
            reply,
        })
        .await?
    }

    pub async fn create_window(&self, session: &str, name: Option<&str>) -> Result<(), String> {
        self.request(|reply| ReconcilerCommand::CreateWindow {
            session: session.to_string(),
            name: name.map(str::to_string),
            reply,
        })
        .await?
    }

    pub async fn split_horizontal(
        &self,
        session: &str,
        window: Option<&str>,
    ) -> Result<(), String> {
        self.split(session, window, SplitDirection::Horizontal)
            .await
    }

    pub async fn split_vertical(
        &self,
        session: &str,
        window: Option<&str>,
    ) -> Result<(), String> {
        self.split(session, window, SplitDirection::Vertical).await
    }

    async fn split(
        &self,
        session: &str,
        window: Option<&str>,
        direction: SplitDirection,
    ) -> Result<(), String> {
        self.request(|reply| ReconcilerCommand::SplitPane {
            session: session.to_string(),
            window: window.map(str::to_string),
            direction,
            reply,
        })
        .await?
    }

    /// Open the preferred terminal attached to `name`.
    pub async fn attach_session(&self, name: &str) -> Result<(), String> {
        self.request(|reply| ReconcilerCommand::AttachSession {
            name: name.to_string(),
            reply,
        })
        .await?
    }

    /// Materialize `template` as `session_name`, then refresh.
    pub async fn apply_template(
        &self,
        template: SessionTemplate,
        session_name: &str,
    ) -> Result<MaterializeReport, String> {
        self.request(|reply| ReconcilerCommand::ApplyTemplate {
            template,
            session_name: session_name.to_string(),
            reply,
        })
        .await?
    }

    /// Flip favorite membership; returns whether `name` is now a favorite.
    pub async fn toggle_favorite(&self, name: &str) -> Result<bool, String> {
        self.request(|reply| ReconcilerCommand::ToggleFavorite {
            name: name.to_string(),
            reply,
        })
        .await
    }

    pub async fn is_favorite(&self, name: &str) -> Result<bool, String> {
        self.request(|reply| ReconcilerCommand::IsFavorite {
            name: name.to_string(),
            reply,
        })
        .await
    }

    pub async fn add_to_group(&self, group: &str, session: &str) -> Result<(), String> {
        self.request(|reply| ReconcilerCommand::AddToGroup {
            group: group.to_string(),
            session: session.to_string(),
            reply,
        })
        .await
    }

    pub async fn remove_from_group(&self, group: &str, session: &str) -> Result<(), String> {
        self.request(|reply| ReconcilerCommand::RemoveFromGroup {
            group: group.to_string(),
            session: session.to_string(),
            reply,
        })
        .await
    }

    pub async fn create_group(&self, group: &str, sessions: Vec<String>) -> Result<(), String> {
        self.request(|reply| ReconcilerCommand::CreateGroup {
            group: group.to_string(),
            sessions,
            reply,
        })
        .await
    }

    /// Choose the terminal used by [`Self::attach_session`].
    pub async fn set_terminal_app(&self, app: TerminalApp) -> Result<(), String> {
        self.request(|reply| ReconcilerCommand::SetTerminalApp { app, reply })
            .await
    }

    pub async fn snapshot(&self) -> Result<ReconcilerSnapshot, String> {
        self.request(|reply| ReconcilerCommand::Snapshot { reply })
            .await
    }

    pub async fn preferences(&self) -> Result<Preferences, String> {
        self.request(|reply| ReconcilerCommand::Preferences { reply })
            .await
    }

    pub async fn shutdown(&self) -> Result<(), String> {
        self.send(ReconcilerCommand::Shutdown).await
    }
}

/// Spawn a reconciler actor over `client`, reading and persisting `preferences`.
pub fn spawn_reconciler(
    client: TmuxClient,
    preferences: PreferencesStore,
) -> (ReconcilerHandle, ReconcilerEventStream) {
    let (command_tx, mut command_rx) = mpsc::channel::<ReconcilerCommand>(64);
    let (event_tx, event_rx) = mpsc::unbounded_channel::<ReconcilerEventEnvelope>();

    tokio::spawn(async move {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<TaskDone>();
        let (tick_tx, mut tick_rx) = mpsc::unbounded_channel::<()>();
        let mut actor = Reconciler {
            client,
            preferences,
            state: SessionState::default(),
            scheduler: RefreshScheduler::default(),
            event_tx,
            seq: 0,
            done_tx,
            tick_tx,
        };
        actor.emit(ReconcilerEvent::Started);

        loop {
            tokio::select! {
                command = command_rx.recv() => {
                    let Some(command) = command else { break };
                    if actor.handle_command(command).await {
                        break;
                    }
                }
                Some(done) = done_rx.recv() => actor.handle_done(done),
                Some(()) = tick_rx.recv() => {
                    debug!("refresh timer fired");
                    actor.start_refresh(None);
                }
            }
        }

        actor.scheduler.cancel();
        actor.emit(ReconcilerEvent::Stopped);
    });

    (
        ReconcilerHandle {
            commands: command_tx,
        },
        event_rx,
    )
}

struct Reconciler {
    client: TmuxClient,
    preferences: PreferencesStore,
    state: SessionState,
    scheduler: RefreshScheduler,
    event_tx: mpsc::UnboundedSender<ReconcilerEventEnvelope>,
    seq: u64,
    done_tx: mpsc::UnboundedSender<TaskDone>,
    tick_tx: mpsc::UnboundedSender<()>,
}

impl Reconciler {
    fn emit(&mut self, event: ReconcilerEvent) {
        let _ = self
            .event_tx
            .send(ReconcilerEventEnvelope::new(self.seq, event));
        self.seq = self.seq.saturating_add(1);
    }

    /// Handle one command. Returns true when the actor should stop.
    async fn handle_command(&mut self, command: ReconcilerCommand) -> bool {
        match command {
            ReconcilerCommand::StartMonitoring => {
                self.start_refresh(None);
                self.arm_scheduler();
            }
            ReconcilerCommand::StopMonitoring => {
                if self.scheduler.is_armed() {
                    self.scheduler.cancel();
                    self.emit(ReconcilerEvent::MonitoringStopped);
                }
            }
            ReconcilerCommand::Refresh { reply } => self.start_refresh(reply),
            ReconcilerCommand::SetRefreshInterval { interval, reply } => {
                let accepted = self
                    .preferences
                    .update(|prefs| prefs.set_refresh_interval(interval));
                if !accepted {
                    let _ = reply.send(Err(refresh_interval_error(interval.as_secs_f64())));
                    return false;
                }
                self.emit(ReconcilerEvent::PreferencesChanged);
                if self.scheduler.is_armed() {
                    self.arm_scheduler();
                }
                let _ = reply.send(Ok(()));
            }
            ReconcilerCommand::CreateSession {
                name,
                directory,
                reply,
            } => {
                let result = self
                    .client
                    .create_session(&name, directory.as_deref())
                    .await;
                let outcome =
                    self.finish_mutation(result, format!("Failed to create session '{name}'"));
                let _ = reply.send(outcome);
            }
            ReconcilerCommand::KillSession { name, reply } => {
                let result = self.client.kill_session(&name).await;
                let outcome =
                    self.finish_mutation(result, format!("Failed to kill session '{name}'"));
                let _ = reply.send(outcome);
            }
            ReconcilerCommand::RenameSession {
                old_name,
                new_name,
                reply,
            } => {
                // Membership moves before tmux is asked. If the rename then
                // fails, preferences already point at `new_name`.
                if self
                    .preferences
                    .update(|prefs| prefs.migrate_session_name(&old_name, &new_name))
                {
                    self.emit(ReconcilerEvent::PreferencesChanged);
                }
                let result = self.client.rename_session(&old_name, &new_name).await;
                let outcome =
                    self.finish_mutation(result, "Failed to rename session".to_string());
                let _ = reply.send(outcome);
            }
            ReconcilerCommand::CreateWindow {
                session,
                name,
                reply,
            } => {
                let result = self.client.create_window(&session, name.as_deref()).await;
                let outcome = self.finish_mutation(result, "Failed to create window".to_string());
                let _ = reply.send(outcome);
            }
            ReconcilerCommand::SplitPane {
                session,
                window,
                direction,
                reply,
            } => {
                let result = self
                    .client
                    .split(&session, window.as_deref(), direction)
                    .await;
                let outcome = self.finish_mutation(result, "Failed to split pane".to_string());
                let _ = reply.send(outcome);
            }
            ReconcilerCommand::AttachSession { name, reply } => {
                let terminal = self.preferences.get().terminal_app;
                let result = attach_session(
                    self.client.runner().as_ref(),
                    terminal,
                    self.client.binary(),
                    &name,
                )
                .await;
                let outcome = match result {
                    Ok(()) => Ok(()),
                    Err(err) => Err(self.record_failure(
                        format!("Failed to open {terminal} for session '{name}'"),
                        &err,
                    )),
                };
                let _ = reply.send(outcome);
            }
            ReconcilerCommand::ApplyTemplate {
                template,
                session_name,
                reply,
            } => {
                info!(template = %template.name, session = %session_name, "queueing template");
                spawn_template_task(
                    self.client.clone(),
                    template,
                    session_name,
                    reply,
                    self.done_tx.clone(),
                );
            }
            ReconcilerCommand::ToggleFavorite { name, reply } => {
                let now_favorite = self
                    .preferences
                    .update(|prefs| prefs.toggle_favorite(&name));
                self.emit(ReconcilerEvent::PreferencesChanged);
                let _ = reply.send(now_favorite);
            }
            ReconcilerCommand::IsFavorite { name, reply } => {
                let _ = reply.send(self.preferences.get().is_favorite(&name));
            }
            ReconcilerCommand::AddToGroup {
                group,
                session,
                reply,
            } => {
                self.preferences
                    .update(|prefs| prefs.add_to_group(&group, &session));
                self.emit(ReconcilerEvent::PreferencesChanged);
                let _ = reply.send(());
            }
            ReconcilerCommand::RemoveFromGroup {
                group,
                session,
                reply,
            } => {
                self.preferences
                    .update(|prefs| prefs.remove_from_group(&group, &session));
                self.emit(ReconcilerEvent::PreferencesChanged);
                let _ = reply.send(());
            }
            ReconcilerCommand::CreateGroup {
                group,
                sessions,
                reply,
            } => {
                self.preferences
                    .update(|prefs| prefs.update_group(&group, sessions));
                self.emit(ReconcilerEvent::PreferencesChanged);
                let _ = reply.send(());
            }
            ReconcilerCommand::SetTerminalApp { app, reply } => {
                self.preferences.update(|prefs| prefs.terminal_app = app);
                self.emit(ReconcilerEvent::PreferencesChanged);
                let _ = reply.send(());
            }
            ReconcilerCommand::Snapshot { reply } => {
                let snapshot = self
                    .state
                    .snapshot(self.preferences.get(), self.scheduler.is_armed());
                let _ = reply.send(snapshot);
            }
            ReconcilerCommand::Preferences { reply } => {
                let _ = reply.send(self.preferences.get().clone());
            }
            ReconcilerCommand::Shutdown => return true,
        }
        false
    }

    fn handle_done(&mut self, done: TaskDone) {
        match done {
            TaskDone::Refresh { result, reply } => {
                let outcome = self.state.apply_refresh(result);
                match &outcome {
                    Ok(count) => {
                        debug!(count, "session list replaced");
                        self.emit(ReconcilerEvent::SessionsReplaced { count: *count });
                    }
                    Err(message) => {
                        warn!("{message}");
                        self.emit(ReconcilerEvent::RefreshFailed {
                            message: message.clone(),
                        });
                    }
                }
                if let Some(reply) = reply {
                    let _ = reply.send(outcome);
                }
            }
            TaskDone::Template {
                session,
                result,
                reply,
            } => {
                let outcome = match result {
                    Ok(report) => {
                        if !report.is_complete() {
                            warn!(
                                session = %session,
                                failed = report.failed_steps.len(),
                                "template applied with skipped steps"
                            );
                        }
                        self.start_refresh(None);
                        Ok(report)
                    }
                    Err(err) => Err(self.record_failure(
                        format!("Failed to create session '{session}'"),
                        &err,
                    )),
                };
                self.emit(ReconcilerEvent::TemplateApplied {
                    session,
                    ok: outcome.is_ok(),
                });
                let _ = reply.send(outcome);
            }
        }
    }

    fn start_refresh(&mut self, reply: Option<oneshot::Sender<Result<usize, String>>>) {
        self.state.begin_refresh();
        self.emit(ReconcilerEvent::RefreshStarted);
        spawn_refresh_task(self.client.clone(), reply, self.done_tx.clone());
    }

    fn arm_scheduler(&mut self) {
        let interval = self.preferences.get().refresh_interval();
        let interval_ms = interval.as_millis() as u64;
        self.scheduler.arm(interval, self.tick_tx.clone());
        info!(interval_ms, "monitoring sessions");
        self.emit(ReconcilerEvent::MonitoringStarted { interval_ms });
    }

    /// Refresh after a successful mutation; otherwise record `message`.
    fn finish_mutation(
        &mut self,
        result: Result<(), ExecError>,
        message: String,
    ) -> Result<(), String> {
        match result {
            Ok(()) => {
                self.start_refresh(None);
                Ok(())
            }
            Err(err) => Err(self.record_failure(message, &err)),
        }
    }

    fn record_failure(&mut self, message: String, cause: &ExecError) -> String {
        warn!("{message}: {cause}");
        self.state.record_error(message.clone());
        self.emit(ReconcilerEvent::OperationFailed {
            message: message.clone(),
        });
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::built_in_templates;
    use crate::testsupport::{ScriptedRunner, TestTempDir};
    use std::sync::Arc;
    use tokio::time::timeout;

    async fn recv_event(rx: &mut ReconcilerEventStream) -> ReconcilerEvent {
        timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("event timeout")
            .expect("event channel closed")
            .event
    }

    /// Drain events until one matches `wanted`.
    async fn wait_for(
        rx: &mut ReconcilerEventStream,
        wanted: impl Fn(&ReconcilerEvent) -> bool,
    ) -> ReconcilerEvent {
        loop {
            let event = recv_event(rx).await;
            if wanted(&event) {
                return event;
            }
        }
    }

    fn spawn_with(
        runner: &Arc<ScriptedRunner>,
        prefs: Preferences,
    ) -> (ReconcilerHandle, ReconcilerEventStream) {
        let client = TmuxClient::new(runner.clone(), "tmux");
        spawn_reconciler(client, PreferencesStore::in_memory(prefs))
    }

    fn scripted(sessions: &str) -> Arc<ScriptedRunner> {
        let runner = Arc::new(ScriptedRunner::new());
        runner.respond("list-sessions", sessions);
        runner
    }

    #[tokio::test]
    async fn actor_emits_started_and_stopped() {
        let runner = scripted("");
        let (handle, mut events) = spawn_with(&runner, Preferences::default());
        assert_eq!(recv_event(&mut events).await, ReconcilerEvent::Started);
        handle.shutdown().await.unwrap();
        assert_eq!(recv_event(&mut events).await, ReconcilerEvent::Stopped);
        assert!(handle.snapshot().await.is_err());
    }

    #[tokio::test]
    async fn refresh_replaces_list_and_failure_clears_it() {
        let runner = scripted("$0:work:1:1\n$1:play:2:0");
        let (handle, _events) = spawn_with(&runner, Preferences::default());

        assert_eq!(handle.refresh().await, Ok(2));
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.sessions.len(), 2);
        assert!(snapshot.last_error.is_none());
        assert!(!snapshot.is_loading);

        runner.fail("list-sessions", "lost server");
        assert!(handle.refresh().await.is_err());
        let snapshot = handle.snapshot().await.unwrap();
        assert!(snapshot.sessions.is_empty());
        assert!(snapshot.last_error.unwrap().contains("lost server"));

        runner.respond("list-sessions", "$2:back:1:0");
        assert_eq!(handle.refresh().await, Ok(1));
        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.sessions[0].name, "back");
        assert!(snapshot.last_error.is_none());
    }

    #[tokio::test]
    async fn successful_mutation_triggers_refresh() {
        let runner = scripted("$0:api:1:0");
        let (handle, mut events) = spawn_with(&runner, Preferences::default());

        handle.create_session("api", Some("/srv")).await.unwrap();
        let event = wait_for(&mut events, |e| {
            matches!(e, ReconcilerEvent::SessionsReplaced { .. })
        })
        .await;
        assert_eq!(event, ReconcilerEvent::SessionsReplaced { count: 1 });
        assert_eq!(runner.count("new-session -d -s 'api' -c '/srv'"), 1);
    }

    #[tokio::test]
    async fn failed_mutation_records_error_and_keeps_list() {
        let runner = scripted("$0:api:1:0");
        let (handle, mut events) = spawn_with(&runner, Preferences::default());
        handle.refresh().await.unwrap();
        runner.clear_calls();

        runner.fail("kill-session", "can't find session: api");
        let err = handle.kill_session("api").await.unwrap_err();
        assert_eq!(err, "Failed to kill session 'api'");
        wait_for(&mut events, |e| {
            matches!(e, ReconcilerEvent::OperationFailed { .. })
        })
        .await;

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.sessions.len(), 1);
        assert_eq!(snapshot.last_error.as_deref(), Some("Failed to kill session 'api'"));
        assert_eq!(runner.count("list-sessions"), 0);
    }

    #[tokio::test]
    async fn mutation_error_messages() {
        let runner = scripted("");
        runner.fail("new-session", "x");
        runner.fail("new-window", "x");
        runner.fail("split-window", "x");
        let (handle, _events) = spawn_with(&runner, Preferences::default());

        assert_eq!(
            handle.create_session("a", None).await,
            Err("Failed to create session 'a'".to_string())
        );
        assert_eq!(
            handle.create_window("a", Some("w")).await,
            Err("Failed to create window".to_string())
        );
        assert_eq!(
            handle.split_horizontal("a", None).await,
            Err("Failed to split pane".to_string())
        );
        assert_eq!(
            handle.split_vertical("a", Some("1")).await,
            Err("Failed to split pane".to_string())
        );
    }

    #[tokio::test]
    async fn rename_migrates_preferences_before_the_rename_call() {
        let runner = scripted("$0:work2:1:0");
        let mut prefs = Preferences::default();
        prefs.add_favorite("work");
        prefs.add_to_group("clients", "work");
        let (handle, _events) = spawn_with(&runner, prefs);

        handle.rename_session("work", "work2").await.unwrap();
        assert!(handle.is_favorite("work2").await.unwrap());
        assert!(!handle.is_favorite("work").await.unwrap());
        let prefs = handle.preferences().await.unwrap();
        assert_eq!(prefs.groups["clients"], vec!["work2".to_string()]);
    }

    #[tokio::test]
    async fn failed_rename_still_moves_membership() {
        let runner = scripted("");
        runner.fail("rename-session", "duplicate session: b");
        let mut prefs = Preferences::default();
        prefs.add_favorite("a");
        let (handle, _events) = spawn_with(&runner, prefs);

        assert_eq!(
            handle.rename_session("a", "b").await,
            Err("Failed to rename session".to_string())
        );
        assert!(handle.is_favorite("b").await.unwrap());
    }

    #[tokio::test]
    async fn favorites_and_groups_drive_snapshot_partitions() {
        let runner = scripted("$0:work:1:0\n$1:misc:1:0\n$2:db:1:0");
        let (handle, _events) = spawn_with(&runner, Preferences::default());
        handle.refresh().await.unwrap();

        assert!(handle.toggle_favorite("work").await.unwrap());
        handle.add_to_group("infra", "work").await.unwrap();
        handle.create_group("empty", Vec::new()).await.unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.favorites[0].name, "work");
        assert_eq!(snapshot.groups.len(), 1);
        assert_eq!(snapshot.groups["infra"][0].name, "work");
        let ungrouped: Vec<&str> = snapshot.ungrouped.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(ungrouped, vec!["db", "misc"]);

        handle.remove_from_group("infra", "work").await.unwrap();
        let prefs = handle.preferences().await.unwrap();
        assert!(!prefs.groups.contains_key("infra"));
    }

    #[tokio::test]
    async fn apply_template_reports_and_refreshes() {
        let runner = scripted("$0:dev:2:0");
        let (handle, mut events) = spawn_with(&runner, Preferences::default());
        let template = built_in_templates().remove(0);

        let report = handle.apply_template(template, "dev").await.unwrap();
        assert!(report.is_complete());
        wait_for(&mut events, |e| {
            matches!(e, ReconcilerEvent::TemplateApplied { ok: true, .. })
        })
        .await;
        wait_for(&mut events, |e| {
            matches!(e, ReconcilerEvent::SessionsReplaced { count: 1 })
        })
        .await;
    }

    #[tokio::test]
    async fn apply_template_fails_when_session_cannot_be_created() {
        let runner = scripted("");
        runner.fail("new-session", "duplicate session: dev");
        let (handle, _events) = spawn_with(&runner, Preferences::default());
        let template = built_in_templates().remove(0);

        let err = handle.apply_template(template, "dev").await.unwrap_err();
        assert_eq!(err, "Failed to create session 'dev'");
        assert_eq!(runner.count("rename-window"), 0);
    }

    #[tokio::test]
    async fn attach_uses_preferred_terminal() {
        let runner = scripted("");
        let mut prefs = Preferences::default();
        prefs.terminal_app = TerminalApp::Kitty;
        let (handle, _events) = spawn_with(&runner, prefs);

        handle.attach_session("work").await.unwrap();
        assert_eq!(runner.detached(), vec!["kitty 'tmux' attach -t 'work'"]);
    }

    #[tokio::test]
    async fn terminal_choice_applies_to_later_attaches() {
        let runner = scripted("");
        let (handle, _events) = spawn_with(&runner, Preferences::default());

        handle.set_terminal_app(TerminalApp::Alacritty).await.unwrap();
        assert_eq!(
            handle.preferences().await.unwrap().terminal_app,
            TerminalApp::Alacritty
        );
        handle.attach_session("work").await.unwrap();
        assert_eq!(
            runner.detached(),
            vec!["alacritty -e 'tmux' attach -t 'work'"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn monitoring_refreshes_on_each_tick_until_stopped() {
        let runner = scripted("$0:a:1:0");
        let mut prefs = Preferences::default();
        prefs.set_refresh_interval(Duration::from_secs(2));
        let (handle, mut events) = spawn_with(&runner, prefs);

        handle.start_monitoring().await.unwrap();
        let started = wait_for(&mut events, |e| {
            matches!(e, ReconcilerEvent::MonitoringStarted { .. })
        })
        .await;
        assert_eq!(started, ReconcilerEvent::MonitoringStarted { interval_ms: 2000 });
        for _ in 0..3 {
            wait_for(&mut events, |e| {
                matches!(e, ReconcilerEvent::SessionsReplaced { .. })
            })
            .await;
        }
        assert!(runner.count("list-sessions") >= 3);
        assert!(handle.snapshot().await.unwrap().monitoring);

        handle.stop_monitoring().await.unwrap();
        wait_for(&mut events, |e| *e == ReconcilerEvent::MonitoringStopped).await;
        let before = runner.count("list-sessions");
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(runner.count("list-sessions"), before);
        assert!(!handle.snapshot().await.unwrap().monitoring);
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_range_stored_intervals_still_tick_at_default() {
        let dir = TestTempDir::new("reconciler-interval");
        for raw in ["1e20", "1e-12"] {
            let path = dir.write_text(
                "preferences.json",
                &format!(r#"{{"refresh_interval_secs": {raw}}}"#),
            );
            let runner = scripted("$0:a:1:0");
            let client = TmuxClient::new(runner.clone(), "tmux");
            let store = PreferencesStore::open(path, Preferences::default()).unwrap();
            let (handle, mut events) = spawn_reconciler(client, store);

            handle.start_monitoring().await.unwrap();
            let started = wait_for(&mut events, |e| {
                matches!(e, ReconcilerEvent::MonitoringStarted { .. })
            })
            .await;
            assert_eq!(started, ReconcilerEvent::MonitoringStarted { interval_ms: 3000 });
            tokio::time::sleep(Duration::from_secs(7)).await;
            assert!(runner.count("list-sessions") >= 3, "{raw}");
            assert!(handle.snapshot().await.unwrap().monitoring);
            handle.shutdown().await.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn corrupt_interval_field_does_not_stop_actor() {
        let runner = scripted("$0:a:1:0");
        let mut prefs = Preferences::default();
        prefs.refresh_interval_secs = 1e20;
        let (handle, mut events) = spawn_with(&runner, prefs);

        handle.start_monitoring().await.unwrap();
        let started = wait_for(&mut events, |e| {
            matches!(e, ReconcilerEvent::MonitoringStarted { .. })
        })
        .await;
        assert_eq!(started, ReconcilerEvent::MonitoringStarted { interval_ms: 3000 });

        let err = handle
            .set_refresh_interval(Duration::from_nanos(1))
            .await
            .unwrap_err();
        assert!(err.contains("refresh interval must be between"));
        assert!(handle
            .set_refresh_interval(Duration::from_secs(u64::MAX))
            .await
            .is_err());
        assert!(handle.snapshot().await.unwrap().monitoring);
    }

    #[tokio::test(start_paused = true)]
    async fn interval_change_rearms_running_timer() {
        let runner = scripted("");
        let (handle, mut events) = spawn_with(&runner, Preferences::default());
        handle.start_monitoring().await.unwrap();
        wait_for(&mut events, |e| {
            matches!(e, ReconcilerEvent::MonitoringStarted { .. })
        })
        .await;

        assert!(handle.set_refresh_interval(Duration::ZERO).await.is_err());
        handle
            .set_refresh_interval(Duration::from_millis(500))
            .await
            .unwrap();
        let rearmed = wait_for(&mut events, |e| {
            matches!(e, ReconcilerEvent::MonitoringStarted { .. })
        })
        .await;
        assert_eq!(rearmed, ReconcilerEvent::MonitoringStarted { interval_ms: 500 });
        assert_eq!(
            handle.preferences().await.unwrap().refresh_interval(),
            Duration::from_millis(500)
        );
    }
}
