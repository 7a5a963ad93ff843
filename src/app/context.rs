//! Wiring of runner, client, stores, and reconciler from loaded config.

use std::sync::Arc;

use muxbar::config::Config;
use muxbar::preferences::{Preferences, PreferencesStore};
use muxbar::process::{CommandRunner, ShellRunner};
use muxbar::reconciler::{spawn_reconciler, ReconcilerEventStream, ReconcilerHandle};
use muxbar::template::TemplateStore;
use muxbar::tmux::TmuxClient;
use tracing::debug;

/// Everything a command handler needs.
pub(crate) struct AppContext {
    pub config: Config,
    pub client: TmuxClient,
    pub reconciler: ReconcilerHandle,
    pub events: ReconcilerEventStream,
    pub templates: TemplateStore,
}

impl AppContext {
    /// Build the production context: shell runner plus on-disk stores.
    pub(crate) fn from_config(config: Config) -> Result<Self, String> {
        let runner: Arc<dyn CommandRunner> = Arc::new(ShellRunner::new(
            &config.tmux.shell,
            &config.tmux.extra_paths,
        ));
        let defaults = Preferences::with_refresh_interval(config.monitor.refresh_interval_secs);
        let preferences = PreferencesStore::open(&config.storage.preferences_path, defaults)
            .map_err(|err| {
                format!(
                    "failed to load preferences from {}: {err}",
                    config.storage.preferences_path.display()
                )
            })?;
        let templates = TemplateStore::open(&config.storage.templates_path).map_err(|err| {
            format!(
                "failed to load templates from {}: {err}",
                config.storage.templates_path.display()
            )
        })?;
        Ok(Self::new(config, runner, preferences, templates))
    }

    pub(crate) fn new(
        config: Config,
        runner: Arc<dyn CommandRunner>,
        preferences: PreferencesStore,
        templates: TemplateStore,
    ) -> Self {
        let client = TmuxClient::new(runner, &config.tmux.binary)
            .with_panes(config.monitor.include_panes);
        let (reconciler, events) = spawn_reconciler(client.clone(), preferences);
        debug!(binary = %config.tmux.binary, "reconciler started");
        Self {
            config,
            client,
            reconciler,
            events,
            templates,
        }
    }

    /// Stop the reconciler; safe to call more than once.
    pub(crate) async fn shutdown(&self) {
        let _ = self.reconciler.shutdown().await;
    }
}
