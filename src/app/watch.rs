//! `muxbar watch`: monitor sessions and print changes until interrupted.

use std::future::Future;

use muxbar::build_info::startup_metadata_line;
use muxbar::reconciler::{ReconcilerEvent, ReconcilerEventEnvelope};

use crate::app::commands::{parse_interval, render_snapshot};
use crate::app::context::AppContext;
use crate::app::render::{describe_event, session_line, RenderSink, SessionStyle};

/// Watch until Ctrl-C.
pub(crate) async fn run_watch(
    ctx: &mut AppContext,
    out: &dyn RenderSink,
    json: bool,
    interval: Option<f64>,
) -> Result<(), String> {
    watch_until(ctx, out, json, interval, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

/// Start monitoring, render events as they arrive, and stop once `stop`
/// resolves or the reconciler goes away.
pub(crate) async fn watch_until(
    ctx: &mut AppContext,
    out: &dyn RenderSink,
    json: bool,
    interval: Option<f64>,
    stop: impl Future<Output = ()>,
) -> Result<(), String> {
    if let Some(seconds) = interval {
        ctx.reconciler
            .set_refresh_interval(parse_interval(seconds)?)
            .await?;
    }
    if !json {
        out.activity(&startup_metadata_line());
    }
    ctx.reconciler.start_monitoring().await?;

    let mut last_listing: Option<Vec<String>> = None;
    tokio::pin!(stop);
    loop {
        tokio::select! {
            _ = &mut stop => break,
            envelope = ctx.events.recv() => {
                let Some(envelope) = envelope else { break };
                render_event(ctx, out, json, &envelope, &mut last_listing).await?;
            }
        }
    }

    let _ = ctx.reconciler.stop_monitoring().await;
    Ok(())
}

async fn render_event(
    ctx: &AppContext,
    out: &dyn RenderSink,
    json: bool,
    envelope: &ReconcilerEventEnvelope,
    last_listing: &mut Option<Vec<String>>,
) -> Result<(), String> {
    if json {
        let line = serde_json::to_string(envelope)
            .map_err(|err| format!("failed to encode event: {err}"))?;
        out.line(&line);
        return Ok(());
    }

    match &envelope.event {
        ReconcilerEvent::SessionsReplaced { .. } => {
            let snapshot = ctx.reconciler.snapshot().await?;
            let prefs = ctx.reconciler.preferences().await?;
            // Only reprint when something visible changed.
            let listing: Vec<String> = snapshot
                .sessions
                .iter()
                .map(|session| {
                    session_line(
                        session,
                        SessionStyle {
                            favorite: prefs.is_favorite(&session.name),
                            show_window_count: true,
                            show_attached: true,
                            show_windows: false,
                        },
                    )
                })
                .collect();
            if last_listing.as_ref() != Some(&listing) {
                render_snapshot(out, &snapshot, &prefs, false);
                *last_listing = Some(listing);
            }
        }
        ReconcilerEvent::RefreshFailed { message } => {
            out.warn(message);
            *last_listing = None;
        }
        ReconcilerEvent::OperationFailed { message } => out.warn(message),
        _ => {
            if let Some(text) = describe_event(envelope) {
                out.activity(&text);
            }
        }
    }
    Ok(())
}
