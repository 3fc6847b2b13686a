// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod orchestrator;
pub mod paths;
pub mod pipeline;
pub mod server;
pub mod types;
pub mod watch;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::cli::{CliArgs, Command};
use crate::config::load_or_builtin;
use crate::orchestrator::Orchestrator;

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the configuration, then hands the selected command
/// to the [`Orchestrator`]. Long-lived commands (`watch`, `serve`, `dev`)
/// return once Ctrl-C is received.
pub async fn run(args: CliArgs) -> Result<ExitCode> {
    let cfg = load_or_builtin(args.config.as_deref().map(Path::new), args.css)?;
    let orchestrator = Orchestrator::new(Arc::new(cfg))?;

    let command = args.command.unwrap_or(Command::Dev);
    debug!(?command, "dispatching command");

    let code = match command {
        Command::Build => orchestrator.build().await,
        shortcut @ (Command::Styles
        | Command::Scripts
        | Command::Images
        | Command::Fonts
        | Command::Html) => {
            let units: Vec<String> = shortcut.unit_name().into_iter().map(String::from).collect();
            orchestrator.run_units(&units).await
        }
        Command::Run { units } => orchestrator.run_units(&units).await,
        Command::Clean => match orchestrator.clean() {
            Ok(_) => ExitCode::SUCCESS,
            Err(err) => {
                tracing::error!("{err}");
                ExitCode::FAILURE
            }
        },
        Command::Plan => {
            print!("{}", orchestrator.describe());
            ExitCode::SUCCESS
        }
        Command::Watch => {
            orchestrator.watch().await?;
            ExitCode::SUCCESS
        }
        Command::Serve => {
            orchestrator.serve().await?;
            ExitCode::SUCCESS
        }
        Command::Dev => {
            orchestrator.dev().await?;
            ExitCode::SUCCESS
        }
    };
    Ok(code)
}
