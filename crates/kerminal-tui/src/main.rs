//! `kerminal` — terminal dashboard for Kerbal Space Program.
//!
//! Talks to a Telemachus server over its WebSocket datalink through
//! `kerminal-core`'s [`Session`](kerminal_core::Session). The screen shows
//! a header, a main panel (telemetry or text), a status bar and a command
//! line; type `help` for the commands.
//!
//! Logs go to a file (default `kerminal.log` in the temp directory) so
//! they never corrupt the terminal.

mod action;
mod app;
mod command_line;
mod commands;
mod component;
mod event;
mod live;
mod screens;
mod status;
mod theme;
mod tui;
mod widgets;

use std::path::{Path, PathBuf};

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use kerminal_config::Config;
use kerminal_core::Session;

use crate::app::App;

/// Terminal dashboard for Kerbal Space Program over the Telemachus datalink.
#[derive(Parser, Debug)]
#[command(name = "kerminal", version, about)]
struct Cli {
    /// Telemachus server host (overrides the config file)
    #[arg(long, env = "KERMINAL_HOST")]
    host: Option<String>,

    /// Telemachus server port (overrides the config file)
    #[arg(short, long, env = "KERMINAL_PORT")]
    port: Option<u16>,

    /// Connect to the configured server at startup
    #[arg(short, long)]
    connect: bool,

    /// Config file to use instead of the platform default
    #[arg(long, env = "KERMINAL_CONFIG")]
    config: Option<PathBuf>,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    write_config: bool,

    /// Log file path
    #[arg(long, default_value_os_t = std::env::temp_dir().join("kerminal.log"))]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-only tracing; stdout and stderr belong to the terminal UI. The
/// returned guard must live until exit so buffered lines are flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // Prefix match: covers the kerminal_* library crates too
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("kerminal={log_level}")));

    let log_dir = cli.log_file.parent().unwrap_or(Path::new("."));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("kerminal.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_names(true),
        )
        .init();

    guard
}

/// Config file, then environment, then command-line flags.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => kerminal_config::load_config_from(path)?,
        None => kerminal_config::load_config()?,
    };
    if let Some(host) = &cli.host {
        config.host.clone_from(host);
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    Ok(config)
}

fn write_config(cli: &Cli, config: &Config) -> Result<PathBuf> {
    Ok(match &cli.config {
        Some(path) => {
            kerminal_config::save_config_to(config, path)?;
            path.clone()
        }
        None => kerminal_config::save_config(config)?,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if cli.write_config {
        let path = write_config(&cli, &config)?;
        println!("Wrote {}", path.display());
        return Ok(());
    }

    // Hooks first so a panic during startup still restores the terminal
    tui::install_hooks()?;
    let _log_guard = setup_tracing(&cli);

    info!(
        host = %config.host,
        port = config.port,
        connect = cli.connect,
        "starting kerminal"
    );

    let session = Session::start(config.session_config()?)?;
    let connect_to = cli.connect.then(|| (config.host.clone(), config.port));

    let mut app = App::new(session.clone(), config.poll_interval());
    let result = app.run(connect_to).await;

    // Joins the network thread
    tokio::task::block_in_place(|| session.shutdown());
    info!("kerminal stopped");
    result
}
