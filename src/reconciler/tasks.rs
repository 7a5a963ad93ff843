//! Background work spawned by the reconciler actor.
//!
//! Listing and template materialization run off the actor so commands stay
//! responsive; results come back through the completion channel and are
//! merged by the actor alone.

use tokio::sync::{mpsc, oneshot};

use crate::error::ExecError;
use crate::model::Session;
use crate::template::{materialize, MaterializeReport, SessionTemplate};
use crate::tmux::TmuxClient;

/// Completion notification sent from a background task back to the actor.
pub(super) enum TaskDone {
    Refresh {
        result: Result<Vec<Session>, ExecError>,
        reply: Option<oneshot::Sender<Result<usize, String>>>,
    },
    Template {
        session: String,
        result: Result<MaterializeReport, ExecError>,
        reply: oneshot::Sender<Result<MaterializeReport, String>>,
    },
}

pub(super) fn spawn_refresh_task(
    client: TmuxClient,
    reply: Option<oneshot::Sender<Result<usize, String>>>,
    done_tx: mpsc::UnboundedSender<TaskDone>,
) {
    tokio::spawn(async move {
        let result = client.list_sessions().await;
        let _ = done_tx.send(TaskDone::Refresh { result, reply });
    });
}

pub(super) fn spawn_template_task(
    client: TmuxClient,
    template: SessionTemplate,
    session: String,
    reply: oneshot::Sender<Result<MaterializeReport, String>>,
    done_tx: mpsc::UnboundedSender<TaskDone>,
) {
    tokio::spawn(async move {
        let result = materialize(&client, &template, &session).await;
        let _ = done_tx.send(TaskDone::Template {
            session,
            result,
            reply,
        });
    });
}
