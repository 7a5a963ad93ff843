//! Materializes a [`SessionTemplate`] against a live tmux server.
//!
//! tmux offers no transactions, so application is best-effort: only the base
//! session creation is fatal. Every later step that fails is logged, recorded
//! in the report, and skipped; nothing already applied is rolled back.

use tracing::{info, warn};

use crate::error::ExecError;
use crate::tmux::{pane_target, TmuxClient};

use super::{SessionTemplate, SplitStep, WindowTemplate};

/// Steps that failed during an otherwise successful materialization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaterializeReport {
    pub failed_steps: Vec<String>,
}

impl MaterializeReport {
    pub fn is_complete(&self) -> bool {
        self.failed_steps.is_empty()
    }

    fn record(&mut self, step: String, err: ExecError) {
        warn!(step = %step, "template step failed: {err}");
        self.failed_steps.push(format!("{step}: {err}"));
    }
}

/// Create `session_name` and lay it out according to `template`.
///
/// Returns `Err` only when the session itself could not be created.
pub async fn materialize(
    client: &TmuxClient,
    template: &SessionTemplate,
    session_name: &str,
) -> Result<MaterializeReport, ExecError> {
    client
        .create_session(session_name, template.working_directory.as_deref())
        .await?;
    info!(
        session = session_name,
        template = %template.name,
        "applying session template"
    );

    let mut report = MaterializeReport::default();
    for (index, window) in template.windows.iter().enumerate() {
        apply_window(client, session_name, index, window, &mut report).await;
    }
    Ok(report)
}

async fn apply_window(
    client: &TmuxClient,
    session: &str,
    index: usize,
    window: &WindowTemplate,
    report: &mut MaterializeReport,
) {
    let window_index = index.to_string();
    // A fresh session starts with exactly one window at index 0.
    let created = if index == 0 {
        client.rename_window(session, "0", &window.name).await
    } else {
        client.create_window(session, Some(&window.name)).await
    };
    if let Err(err) = created {
        report.record(format!("window {index} ({})", window.name), err);
    }

    for step in window.layout.split_recipe() {
        let result = match *step {
            SplitStep::Split(direction) => {
                client.split(session, Some(&window_index), direction).await
            }
            SplitStep::SelectPane(pane) => {
                client.select_pane(&pane_target(session, index, pane)).await
            }
            SplitStep::ResizeWidth { pane, columns } => {
                client
                    .resize_pane_width(&pane_target(session, index, pane), columns)
                    .await
            }
        };
        if let Err(err) = result {
            let aborts_recipe = matches!(step, SplitStep::SelectPane(_));
            report.record(format!("window {index} layout step {step:?}"), err);
            // Later splits would land on whichever pane happens to be active.
            if aborts_recipe {
                break;
            }
        }
    }

    for (pane, command) in window.commands.iter().enumerate() {
        if command.is_empty() {
            continue;
        }
        let target = pane_target(session, index, pane);
        if let Err(err) = client.send_keys(&target, command).await {
            report.record(format!("command for pane {target}"), err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{built_in_templates, PaneLayout};
    use crate::testsupport::ScriptedRunner;
    use std::sync::Arc;

    fn template(windows: Vec<WindowTemplate>) -> SessionTemplate {
        SessionTemplate {
            id: "t1".into(),
            name: "test".into(),
            description: String::new(),
            icon: "terminal".into(),
            working_directory: Some("/work".into()),
            windows,
            built_in: false,
        }
    }

    fn client(runner: &Arc<ScriptedRunner>) -> TmuxClient {
        TmuxClient::new(runner.clone(), "tmux")
    }

    #[tokio::test]
    async fn four_pane_recipe_is_reproduced_exactly() {
        let runner = Arc::new(ScriptedRunner::new());
        let tpl = template(vec![WindowTemplate::new(
            "monitor",
            PaneLayout::FourPane,
            vec!["htop".into(), "df -h".into(), "".into(), "uptime".into()],
        )]);

        let report = materialize(&client(&runner), &tpl, "mon").await.unwrap();
        assert!(report.is_complete());
        assert_eq!(
            runner.calls(),
            vec![
                "'tmux' new-session -d -s 'mon' -c '/work'",
                "'tmux' rename-window -t 'mon:0' 'monitor'",
                "'tmux' split-window -h -t 'mon:0'",
                "'tmux' split-window -v -t 'mon:0'",
                "'tmux' select-pane -t 'mon:0.0'",
                "'tmux' split-window -v -t 'mon:0'",
                "'tmux' send-keys -t 'mon:0.0' 'htop' Enter",
                "'tmux' send-keys -t 'mon:0.1' 'df -h' Enter",
                "'tmux' send-keys -t 'mon:0.3' 'uptime' Enter",
            ]
        );
    }

    #[tokio::test]
    async fn later_windows_are_created_and_sidebar_resized() {
        let runner = Arc::new(ScriptedRunner::new());
        let tpl = template(vec![
            WindowTemplate::new("editor", PaneLayout::Single, vec![]),
            WindowTemplate::new(
                "side",
                PaneLayout::MainWithSidebar,
                vec!["".into(), "tail -f log".into()],
            ),
        ]);

        materialize(&client(&runner), &tpl, "dev").await.unwrap();
        assert_eq!(
            runner.calls()[1..],
            [
                "'tmux' rename-window -t 'dev:0' 'editor'",
                "'tmux' new-window -t 'dev' -n 'side'",
                "'tmux' split-window -h -t 'dev:1'",
                "'tmux' resize-pane -t 'dev:1.1' -x 40",
                "'tmux' send-keys -t 'dev:1.1' 'tail -f log' Enter",
            ]
        );
    }

    #[tokio::test]
    async fn session_creation_failure_aborts_everything() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.fail("new-session", "duplicate session: dev");
        let tpl = built_in_templates().remove(0);
        let err = materialize(&client(&runner), &tpl, "dev").await.unwrap_err();
        assert_eq!(err, ExecError::Failed("duplicate session: dev".into()));
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn step_failures_are_logged_and_skipped() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.fail("new-window", "index in use");
        runner.fail("send-keys -t 'dev:0.0'", "pane gone");
        let tpl = built_in_templates().remove(0);

        let report = materialize(&client(&runner), &tpl, "dev").await.unwrap();
        assert_eq!(report.failed_steps.len(), 2);
        // The second window's split and command were still attempted.
        assert_eq!(runner.count("split-window -h -t 'dev:1'"), 1);
        assert_eq!(runner.count("send-keys -t 'dev:1.1' 'git status' Enter"), 1);
    }

    #[tokio::test]
    async fn failed_pane_selection_skips_rest_of_recipe() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.fail("select-pane", "can't find pane");
        let tpl = template(vec![WindowTemplate::new("m", PaneLayout::FourPane, vec![])]);

        let report = materialize(&client(&runner), &tpl, "s").await.unwrap();
        assert_eq!(report.failed_steps.len(), 1);
        assert_eq!(runner.count("split-window"), 2);
    }
}
