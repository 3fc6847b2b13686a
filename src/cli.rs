// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::CssPolicy;

/// Command-line arguments for `assetdag`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetdag",
    version,
    about = "Build, watch and serve front-end assets from a declarative task graph.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// When omitted, `Assetdag.toml` in the current directory is used if it
    /// exists, otherwise the built-in `src/` -> `dist/` pipeline.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<String>,

    /// Stylesheet policy for the built-in pipeline (ignored with a config file).
    #[arg(long, value_enum, value_name = "POLICY", global = true)]
    pub css: Option<CssPolicy>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETDAG_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    /// What to run. Defaults to `dev` (clean, build, then watch and serve).
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Clean the output root, then run every build unit.
    Build,
    /// Compile stylesheets.
    Styles,
    /// Concatenate and minify scripts.
    Scripts,
    /// Compress images.
    Images,
    /// Copy fonts.
    Fonts,
    /// Expand HTML includes.
    Html,
    /// Run the named units (and nothing else).
    Run {
        #[arg(value_name = "UNIT", required = true)]
        units: Vec<String>,
    },
    /// Remove everything under the output root.
    Clean,
    /// Watch sources and rebuild affected units on change.
    Watch,
    /// Serve the output root with live reload.
    Serve,
    /// Clean, build, then watch and serve until interrupted.
    Dev,
    /// Print resolved paths and the execution plan without running anything.
    Plan,
}

impl Command {
    /// Unit name for the single-unit shortcuts (`styles`, `scripts`, ...).
    pub fn unit_name(&self) -> Option<&'static str> {
        match self {
            Command::Styles => Some("styles"),
            Command::Scripts => Some("scripts"),
            Command::Images => Some("images"),
            Command::Fonts => Some("fonts"),
            Command::Html => Some("html"),
            _ => None,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_dev_loop() {
        let args = CliArgs::try_parse_from(["assetdag"]).unwrap();
        assert!(args.command.is_none());
    }

    #[test]
    fn shortcut_commands_map_to_units() {
        let args = CliArgs::try_parse_from(["assetdag", "styles", "--log-level", "debug"]).unwrap();
        let cmd = args.command.unwrap();
        assert_eq!(cmd.unit_name(), Some("styles"));
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    }

    #[test]
    fn run_requires_unit_names() {
        assert!(CliArgs::try_parse_from(["assetdag", "run"]).is_err());
        let args = CliArgs::try_parse_from(["assetdag", "run", "a", "b"]).unwrap();
        match args.command {
            Some(Command::Run { units }) => assert_eq!(units, vec!["a", "b"]),
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
