mod action;
mod app;
mod board;
mod config;
mod error;
mod event;
mod jira;
mod logging;
mod scheduler;
mod tui;
mod types;
mod ui;

use std::panic;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use crate::config::{Cli, Config};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(path) = cli.log_file.clone().or_else(logging::default_log_path) {
        if let Err(err) = logging::init(&path) {
            eprintln!("warning: logging disabled, cannot open {}: {}", path.display(), err);
        }
    }

    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            error!(%err, "invalid configuration");
            eprintln!("canoa: {err}");
            return ExitCode::FAILURE;
        }
    };

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    app::run(config).await.into()
}
