use std::any::Any;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

use chrono::Utc;
use clap::error::ErrorKind;
use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;

use ctxhud::app::App;
use ctxhud::config::HudConfig;
use ctxhud::render::StatusBlock;
use ctxhud::snapshot::Snapshot;

#[derive(Parser, Debug)]
#[command(
    name = "ctxhud",
    version,
    about = "Status line for Claude Code: context usage, duration, agents, todos"
)]
struct Cli {
    /// Config file (defaults to ~/.config/ctxhud/config.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read the session snapshot from a file instead of stdin.
    #[arg(long)]
    input: Option<PathBuf>,

    /// Emit plain text without terminal colors (also honors NO_COLOR).
    #[arg(long)]
    no_color: bool,

    /// List recently completed agents under the running ones.
    #[arg(long)]
    show_completed: bool,

    /// Show the cumulative session cost.
    #[arg(long)]
    show_cost: bool,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            tracing::error!("invalid arguments: {e}");
            let message = e.to_string();
            let message = message.strip_prefix("error: ").unwrap_or(&message);
            return emit(&StatusBlock::error(message).to_text(false));
        }
    };

    // The status line must never go blank: any failure becomes one line.
    let text = match panic::catch_unwind(AssertUnwindSafe(|| run(&cli))) {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            tracing::error!("{e:?}");
            StatusBlock::error(&format!("{e:#}")).to_text(false)
        }
        Err(payload) => StatusBlock::error(panic_message(payload.as_ref())).to_text(false),
    };
    emit(&text)
}

fn emit(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .wrap_err("Failed to write status line")?;
    stdout.flush().wrap_err("Failed to flush stdout")?;
    Ok(())
}

fn run(cli: &Cli) -> Result<String> {
    let mut config = match &cli.config {
        Some(path) => HudConfig::load_from(path)?,
        None => HudConfig::load_default(),
    };
    if cli.no_color || std::env::var_os("NO_COLOR").is_some() {
        config.layout.color = false;
    }
    if cli.show_completed {
        config.layout.show_completed = true;
    }
    if cli.show_cost {
        config.layout.show_cost = true;
    }

    let snapshot = match &cli.input {
        Some(path) => Snapshot::from_file(path),
        None => Snapshot::from_stdin(),
    };
    if snapshot.is_none() {
        tracing::debug!("no session snapshot, rendering placeholder");
    }

    let app = App::new(config);
    Ok(app.refresh_text(snapshot.as_ref(), Utc::now()))
}

/// Diagnostics go to stderr; stdout belongs to the status line.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("CTXHUD_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "panic"
    }
}
