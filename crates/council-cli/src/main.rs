mod capture;
mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use council::ViewConfig;
use tracing::debug;

use commands::ReplayArgs;

#[derive(Parser, Debug)]
#[command(
    name = "council-view",
    version,
    about = "Replay council streams, export reports and chart model stats"
)]
struct Cli {
    /// Path to a TOML view config (defaults to $COUNCIL_VIEW_CONFIG, then built-ins)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fold a captured event stream into a turn and summarize it
    Replay {
        /// Capture file, or `-` for stdin
        capture: PathBuf,

        /// Question recorded as the user message
        #[arg(long, default_value = "Replayed turn")]
        question: String,

        /// Title to start from (a `title_complete` event replaces it)
        #[arg(long)]
        title: Option<String>,

        /// Write the markdown report into this directory
        #[arg(long)]
        export: Option<PathBuf>,

        /// Print the final view state as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Render the rank vs. time/cost chart for a captured turn
    Chart {
        /// Capture file, or `-` for stdin
        capture: PathBuf,

        /// Output file; `.png` or `.svg`
        #[arg(long)]
        out: PathBuf,
    },

    /// Per-model statistics across a directory of saved conversations
    Stats {
        /// Directory of conversation JSON files
        dir: PathBuf,

        /// Also render the percentile chart to this `.png` or `.svg`
        #[arg(long)]
        chart: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config =
        ViewConfig::resolve(cli.config.as_deref()).context("Failed to load view config")?;
    debug!(?config, "View config resolved");

    match cli.command {
        Command::Replay {
            capture,
            question,
            title,
            export,
            json,
        } => {
            commands::run_replay(
                ReplayArgs {
                    source: &capture,
                    question: &question,
                    title: title.as_deref(),
                    export_dir: export.as_deref(),
                    json,
                },
                &config,
            )
            .await
        }
        Command::Chart { capture, out } => commands::run_chart(&capture, &out, &config).await,
        Command::Stats { dir, chart } => commands::run_stats(&dir, chart.as_deref(), &config),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::parse_from([
            "council-view",
            "stats",
            "conversations",
            "--config",
            "view.toml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("view.toml")));
        assert!(matches!(cli.command, Command::Stats { chart: None, .. }));
    }

    #[test]
    fn test_replay_defaults() {
        let cli = Cli::parse_from(["council-view", "replay", "-"]);
        match cli.command {
            Command::Replay {
                capture,
                question,
                json,
                ..
            } => {
                assert_eq!(capture, PathBuf::from("-"));
                assert_eq!(question, "Replayed turn");
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
