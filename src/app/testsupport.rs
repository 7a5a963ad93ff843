//! Test fixtures for command handlers.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use muxbar::config::Config;
use muxbar::error::ExecError;
use muxbar::preferences::{Preferences, PreferencesStore};
use muxbar::process::CommandRunner;
use muxbar::template::TemplateStore;

use crate::app::context::AppContext;

/// Records command lines; replies from `contains` rules, latest rule first.
#[derive(Default)]
pub(crate) struct FakeRunner {
    rules: Mutex<Vec<(String, Result<String, ExecError>)>>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(&self, pattern: &str, output: &str) {
        self.rules
            .lock()
            .unwrap()
            .push((pattern.to_string(), Ok(output.to_string())));
    }

    pub(crate) fn fail(&self, pattern: &str, message: &str) {
        self.rules.lock().unwrap().push((
            pattern.to_string(),
            Err(ExecError::Failed(message.to_string())),
        ));
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, command_line: &str) -> Result<String, ExecError> {
        self.calls.lock().unwrap().push(command_line.to_string());
        self.rules
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(pattern, _)| command_line.contains(pattern.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| Ok(String::new()))
    }

    async fn spawn_detached(&self, command_line: &str) -> Result<(), ExecError> {
        self.calls.lock().unwrap().push(command_line.to_string());
        Ok(())
    }
}

/// Context over `runner` with in-memory preference and template stores.
pub(crate) fn context_with(runner: &Arc<FakeRunner>, prefs: Preferences) -> AppContext {
    AppContext::new(
        Config::default(),
        runner.clone(),
        PreferencesStore::in_memory(prefs),
        TemplateStore::in_memory(),
    )
}
