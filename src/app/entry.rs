//! Application entry orchestration for the muxbar CLI.

use muxbar::build_info::cli_version_text;
use muxbar::config::load_config;
use tracing::debug;

use crate::app::commands::dispatch;
use crate::app::context::AppContext;
use crate::app::render::{RenderSink, Renderer};
use crate::app::watch::run_watch;
use crate::cli::{Args, Command, TemplateCommand};

/// Top-level CLI entrypoint. Returns the process exit code.
pub(crate) async fn run(args: Args) -> i32 {
    let renderer = Renderer::new(!args.no_color);
    if args.version {
        println!("{}", cli_version_text());
        return 0;
    }

    let loaded = match load_config(args.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(err) => {
            renderer.error(&format!("failed to load config: {err}"));
            return 1;
        }
    };
    debug!(source = ?loaded.source, "using configuration");

    let mut ctx = match AppContext::from_config(loaded.config) {
        Ok(ctx) => ctx,
        Err(msg) => {
            renderer.error(&msg);
            return 1;
        }
    };

    let command = args.command.unwrap_or(Command::List { windows: false });
    if needs_tmux(&command) && !ctx.client.is_installed().await {
        renderer.error(&format!(
            "tmux not found (looked for '{}'); install it or set tmux.binary in muxbar.toml",
            ctx.config.tmux.binary
        ));
        ctx.shutdown().await;
        return 1;
    }

    let result = match command {
        Command::Watch { interval } => run_watch(&mut ctx, &renderer, args.json, interval).await,
        other => dispatch(&mut ctx, other, &renderer, args.json).await,
    };
    ctx.shutdown().await;

    match result {
        Ok(()) => 0,
        Err(msg) => {
            renderer.error(&msg);
            1
        }
    }
}

/// Commands that only touch local files can run without tmux.
fn needs_tmux(command: &Command) -> bool {
    match command {
        Command::Template { action } => matches!(action, TemplateCommand::Apply { .. }),
        Command::Favorite { .. } | Command::Group { .. } | Command::Prefs { .. } => false,
        _ => true,
    }
}
