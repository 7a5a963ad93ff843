//! One handler per subcommand.
//!
//! Handlers talk to tmux only through the reconciler (mutations, listings)
//! or the client (previews), and to templates through the store. Every
//! failure comes back as the short user-facing message.

use std::time::Duration;

use muxbar::preferences::{checked_refresh_interval, refresh_interval_error, Preferences};
use muxbar::reconciler::ReconcilerSnapshot;
use muxbar::template::{PaneLayout, SessionTemplate, WindowTemplate};
use serde::Serialize;
use serde_json::json;

use crate::app::context::AppContext;
use crate::app::render::{RenderSink, SessionStyle};
use crate::cli::{Command, GroupCommand, PrefsCommand, SplitArgs, TemplateCommand};

/// Run every subcommand except `watch`.
pub(crate) async fn dispatch(
    ctx: &mut AppContext,
    command: Command,
    out: &dyn RenderSink,
    json: bool,
) -> Result<(), String> {
    match command {
        Command::List { windows } => list(ctx, out, json, windows).await,
        Command::New { name, directory } => {
            ctx.reconciler
                .create_session(&name, directory.as_deref())
                .await?;
            confirm(out, json, &format!("created session '{name}'"))
        }
        Command::Kill { name } => {
            ctx.reconciler.kill_session(&name).await?;
            confirm(out, json, &format!("killed session '{name}'"))
        }
        Command::Rename { old_name, new_name } => {
            ctx.reconciler.rename_session(&old_name, &new_name).await?;
            confirm(out, json, &format!("renamed '{old_name}' to '{new_name}'"))
        }
        Command::NewWindow { session, name } => {
            ctx.reconciler
                .create_window(&session, name.as_deref())
                .await?;
            confirm(out, json, &format!("created window in '{session}'"))
        }
        Command::Split(args) => split(ctx, out, json, args).await,
        Command::Preview { session, lines } => {
            let lines = lines.unwrap_or(ctx.config.preview.lines).max(1);
            let preview = ctx.client.preview(&session, lines).await;
            if json {
                return print_json(out, &preview);
            }
            out.section(&session);
            out.field("command", &preview.current_command);
            out.field("path", &preview.current_path);
            if !preview.content.is_empty() {
                out.line("");
                out.line(&preview.content);
            }
            Ok(())
        }
        Command::Attach { session } => {
            ctx.reconciler.attach_session(&session).await?;
            confirm(out, json, &format!("attaching to '{session}'"))
        }
        Command::Favorite { session } => {
            let now_favorite = ctx.reconciler.toggle_favorite(&session).await?;
            let message = if now_favorite {
                format!("added '{session}' to favorites")
            } else {
                format!("removed '{session}' from favorites")
            };
            confirm(out, json, &message)
        }
        Command::Group { action } => group(ctx, out, json, action).await,
        Command::Template { action } => template(ctx, out, json, action).await,
        Command::Prefs { action } => prefs(ctx, out, json, action).await,
        Command::Watch { .. } => Err("watch is handled by the event loop".to_string()),
    }
}

async fn list(
    ctx: &AppContext,
    out: &dyn RenderSink,
    json: bool,
    show_windows: bool,
) -> Result<(), String> {
    ctx.reconciler.refresh().await?;
    let snapshot = ctx.reconciler.snapshot().await?;
    if json {
        return print_json(out, &snapshot);
    }
    let prefs = ctx.reconciler.preferences().await?;
    render_snapshot(out, &snapshot, &prefs, show_windows);
    Ok(())
}

/// Favorites, then each group, then everything else.
pub(crate) fn render_snapshot(
    out: &dyn RenderSink,
    snapshot: &ReconcilerSnapshot,
    prefs: &Preferences,
    show_windows: bool,
) {
    if snapshot.sessions.is_empty() {
        out.activity("No tmux sessions");
        out.activity("Create one with `muxbar new <name>` or `muxbar template apply`");
        return;
    }
    let style = |name: &str| SessionStyle {
        favorite: prefs.is_favorite(name),
        show_window_count: prefs.show_window_count,
        show_attached: prefs.show_attached_indicator,
        show_windows,
    };

    if !snapshot.favorites.is_empty() {
        out.section("Favorites");
        for session in &snapshot.favorites {
            out.session(session, style(&session.name));
        }
    }
    for (group, sessions) in &snapshot.groups {
        out.section(group);
        for session in sessions {
            out.session(session, style(&session.name));
        }
    }
    if !snapshot.others.is_empty() {
        out.section("Sessions");
        for session in &snapshot.others {
            out.session(session, style(&session.name));
        }
    }
}

async fn split(
    ctx: &AppContext,
    out: &dyn RenderSink,
    json: bool,
    args: SplitArgs,
) -> Result<(), String> {
    let window = args.window.as_deref();
    if args.horizontal {
        ctx.reconciler
            .split_horizontal(&args.session, window)
            .await?;
    } else {
        ctx.reconciler.split_vertical(&args.session, window).await?;
    }
    confirm(out, json, &format!("split pane in '{}'", args.session))
}

async fn group(
    ctx: &AppContext,
    out: &dyn RenderSink,
    json: bool,
    action: GroupCommand,
) -> Result<(), String> {
    let message = match action {
        GroupCommand::Add { group, session } => {
            ctx.reconciler.add_to_group(&group, &session).await?;
            format!("added '{session}' to group '{group}'")
        }
        GroupCommand::Remove { group, session } => {
            ctx.reconciler.remove_from_group(&group, &session).await?;
            format!("removed '{session}' from group '{group}'")
        }
        GroupCommand::Set { group, sessions } => {
            let count = sessions.len();
            ctx.reconciler.create_group(&group, sessions).await?;
            format!("group '{group}' now has {count} session(s)")
        }
    };
    confirm(out, json, &message)
}

async fn template(
    ctx: &mut AppContext,
    out: &dyn RenderSink,
    json: bool,
    action: TemplateCommand,
) -> Result<(), String> {
    match action {
        TemplateCommand::List => {
            let templates = ctx.templates.all();
            if json {
                return print_json(out, &templates);
            }
            let (built_ins, custom): (Vec<_>, Vec<_>) =
                templates.iter().partition(|template| template.built_in);
            out.section("Built-in");
            for template in built_ins {
                out.field(&template.name, &template_summary(template));
            }
            if !custom.is_empty() {
                out.section("Custom");
                for template in custom {
                    out.field(&template.name, &template_summary(template));
                }
            }
            Ok(())
        }
        TemplateCommand::Show { template } => {
            let template = find_template(ctx, &template)?;
            if json {
                return print_json(out, &template);
            }
            render_template(out, &template);
            Ok(())
        }
        TemplateCommand::Apply { template, session } => {
            let template = find_template(ctx, &template)?;
            let name = template.name.clone();
            let report = ctx.reconciler.apply_template(template, &session).await?;
            if json {
                return print_json(
                    out,
                    &json!({
                        "ok": true,
                        "session": session,
                        "failed_steps": report.failed_steps,
                    }),
                );
            }
            for step in &report.failed_steps {
                out.warn(&format!("skipped: {step}"));
            }
            out.activity(&format!("created session '{session}' from '{name}'"));
            Ok(())
        }
        TemplateCommand::Create {
            name,
            description,
            directory,
            layout,
            commands,
        } => {
            let saved = ctx
                .templates
                .add(single_window_template(name, description, directory, layout, commands))
                .map_err(|err| format!("failed to save template: {err}"))?;
            confirm(
                out,
                json,
                &format!("saved template '{}' ({})", saved.name, saved.id),
            )
        }
        TemplateCommand::Export => {
            let exported = ctx
                .templates
                .export()
                .map_err(|err| format!("failed to export templates: {err}"))?;
            out.line(&exported);
            Ok(())
        }
        TemplateCommand::Import { path } => {
            let text = read_import_source(&path).await?;
            let imported = ctx
                .templates
                .import(&text)
                .map_err(|err| format!("failed to import templates: {err}"))?;
            confirm(out, json, &format!("imported {} template(s)", imported.len()))
        }
        TemplateCommand::Delete { template } => {
            let id = find_template(ctx, &template)?.id;
            let removed = ctx.templates.delete(&id).map_err(|err| err.to_string())?;
            confirm(out, json, &format!("deleted template '{}'", removed.name))
        }
        TemplateCommand::Duplicate { template } => {
            let id = find_template(ctx, &template)?.id;
            let copy = ctx
                .templates
                .duplicate(&id)
                .map_err(|err| err.to_string())?;
            confirm(
                out,
                json,
                &format!("saved template '{}' ({})", copy.name, copy.id),
            )
        }
    }
}

fn find_template(ctx: &AppContext, id_or_name: &str) -> Result<SessionTemplate, String> {
    ctx.templates
        .find(id_or_name)
        .cloned()
        .ok_or_else(|| format!("unknown template '{id_or_name}'"))
}

fn template_summary(template: &SessionTemplate) -> String {
    let windows = template.windows.len();
    let noun = if windows == 1 { "window" } else { "windows" };
    if template.description.is_empty() {
        format!("{windows} {noun} [{}]", template.id)
    } else {
        format!("{} ({windows} {noun}) [{}]", template.description, template.id)
    }
}

fn render_template(out: &dyn RenderSink, template: &SessionTemplate) {
    out.section(&template.name);
    out.field("id", &template.id);
    if !template.description.is_empty() {
        out.field("description", &template.description);
    }
    if let Some(dir) = &template.working_directory {
        out.field("directory", dir);
    }
    for (index, window) in template.windows.iter().enumerate() {
        out.field(
            &format!("window {index}"),
            &format!("{} ({})", window.name, window.layout.label()),
        );
        for (pane, command) in window.commands.iter().enumerate() {
            if !command.is_empty() {
                out.field(&format!("  pane {pane}"), command);
            }
        }
    }
}

fn single_window_template(
    name: String,
    description: Option<String>,
    directory: Option<String>,
    layout: PaneLayout,
    commands: Vec<String>,
) -> SessionTemplate {
    SessionTemplate {
        id: String::new(),
        name,
        description: description.unwrap_or_default(),
        icon: "terminal".to_string(),
        working_directory: directory,
        windows: vec![WindowTemplate::new("main", layout, commands)],
        built_in: false,
    }
}

async fn read_import_source(path: &str) -> Result<String, String> {
    if path == "-" {
        let mut text = String::new();
        tokio::io::AsyncReadExt::read_to_string(&mut tokio::io::stdin(), &mut text)
            .await
            .map_err(|err| format!("failed to read stdin: {err}"))?;
        return Ok(text);
    }
    tokio::fs::read_to_string(path)
        .await
        .map_err(|err| format!("failed to read {path}: {err}"))
}

async fn prefs(
    ctx: &AppContext,
    out: &dyn RenderSink,
    json: bool,
    action: Option<PrefsCommand>,
) -> Result<(), String> {
    match action.unwrap_or(PrefsCommand::Show) {
        PrefsCommand::Show => {
            let prefs = ctx.reconciler.preferences().await?;
            if json {
                return print_json(out, &prefs);
            }
            render_preferences(out, &prefs);
            Ok(())
        }
        PrefsCommand::Interval { seconds } => {
            let interval = parse_interval(seconds)?;
            ctx.reconciler.set_refresh_interval(interval).await?;
            confirm(out, json, &format!("refresh interval set to {seconds}s"))
        }
        PrefsCommand::Terminal { app } => {
            if !app.is_installed(ctx.client.runner().as_ref()).await {
                out.warn(&format!("{app} does not appear to be installed"));
            }
            ctx.reconciler.set_terminal_app(app).await?;
            confirm(out, json, &format!("attach will open {app}"))
        }
    }
}

fn render_preferences(out: &dyn RenderSink, prefs: &Preferences) {
    out.section("Preferences");
    out.field("terminal", prefs.terminal_app.display_name());
    out.field(
        "refresh interval",
        &format!("{}s", prefs.refresh_interval_secs),
    );
    out.field("show window count", &prefs.show_window_count.to_string());
    out.field(
        "show attached indicator",
        &prefs.show_attached_indicator.to_string(),
    );
    let favorites: Vec<&str> = prefs.favorites.iter().map(String::as_str).collect();
    out.field("favorites", &favorites.join(", "));
    for (group, sessions) in &prefs.groups {
        out.field(&format!("group {group}"), &sessions.join(", "));
    }
}

/// Seconds from the command line as a positive interval.
pub(crate) fn parse_interval(seconds: f64) -> Result<Duration, String> {
    checked_refresh_interval(seconds).ok_or_else(|| refresh_interval_error(seconds))
}

fn confirm(out: &dyn RenderSink, json: bool, message: &str) -> Result<(), String> {
    if json {
        return print_json(out, &json!({ "ok": true, "message": message }));
    }
    out.activity(message);
    Ok(())
}

pub(crate) fn print_json<T: Serialize>(out: &dyn RenderSink, value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| format!("failed to encode JSON: {err}"))?;
    out.line(&text);
    Ok(())
}
