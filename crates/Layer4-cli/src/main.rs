//! TwirTee CLI - Main entry point

mod headless;
mod logging;
mod tui;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use twirtee_foundation::PanelConfig;

/// TwirTee - run feature plugins as supervised tasks from the terminal
#[derive(Parser, Debug)]
#[command(name = "twirtee")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to a config file (default: ./twirtee.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the interactive panel (default)
    Tui,
    /// List available features with their default options
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Run one feature headless and wait for it to finish
    Run {
        /// Feature name, e.g. "Slow Task"
        feature: String,

        /// Override an option (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,

        /// Request a stop after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },
}

/// Load the configuration and apply `--debug`
///
/// A failure here is fatal. No subscriber exists yet, so one is installed
/// on stderr to record it.
fn load_config(args: &Args) -> anyhow::Result<PanelConfig> {
    match PanelConfig::load(args.config.as_deref()) {
        Ok(mut config) => {
            config.debug |= args.debug;
            Ok(config)
        }
        Err(e) => {
            logging::init_stderr(args.debug);
            tracing::error!("Cannot load configuration: {}", e);
            Err(e.into())
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    let config = load_config(&args)?;

    match args.command.unwrap_or(Command::Tui) {
        Command::Tui => {
            tui::run(config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::List { json } => {
            logging::init_stderr(config.debug);
            headless::list(&config, json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Run {
            feature,
            set,
            timeout,
        } => {
            logging::init_stderr(config.debug);
            let timeout = timeout.map(Duration::from_secs);
            match headless::run(&config, &feature, &set, timeout).await {
                Ok(code) => Ok(ExitCode::from(code)),
                Err(e) => {
                    tracing::error!("{:#}", e);
                    Err(e)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run() {
        let args = Args::parse_from([
            "twirtee",
            "run",
            "Slow Task",
            "--set",
            "iterations=3",
            "--set",
            "delay=0",
            "--timeout",
            "5",
            "-d",
        ]);
        assert!(args.debug);
        match args.command {
            Some(Command::Run {
                feature,
                set,
                timeout,
            }) => {
                assert_eq!(feature, "Slow Task");
                assert_eq!(set, vec!["iterations=3", "delay=0"]);
                assert_eq!(timeout, Some(5));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_missing_config_is_fatal() {
        let args = Args::parse_from(["twirtee", "--config", "/nonexistent/twirtee.toml", "list"]);
        let err = load_config(&args).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/twirtee.toml"));
    }

    #[test]
    fn test_debug_flag_reaches_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel.toml");
        std::fs::write(&path, "debug = false\n").unwrap();

        let args = Args::parse_from(["twirtee", "-d", "--config", path.to_str().unwrap()]);
        assert!(load_config(&args).unwrap().debug);
    }

    #[test]
    fn test_default_is_tui() {
        let args = Args::parse_from(["twirtee", "--config", "panel.toml"]);
        assert!(args.command.is_none());
        assert_eq!(args.config, Some(PathBuf::from("panel.toml")));
    }
}
