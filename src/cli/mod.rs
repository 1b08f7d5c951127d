//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for cwl-export using clap.

pub mod commands;

use clap::{Parser, Subcommand};
use tokio::sync::watch;

/// cwl-export - CloudWatch Logs to S3 exporter
#[derive(Parser, Debug)]
#[command(name = "cwl-export")]
#[command(version, about, long_about = None)]
#[command(author = "cwl-export Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        default_value = "cwl-export.toml",
        env = "CWL_EXPORT_CONFIG",
        global = true
    )]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "CWL_EXPORT_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export every tagged log group up to now
    Run(commands::run::RunArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Show the watermark and latest progress of a log group
    Status(commands::status::StatusArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

impl Cli {
    /// Execute the selected command and return the process exit code
    pub async fn execute(&self, shutdown_signal: watch::Receiver<bool>) -> anyhow::Result<i32> {
        match &self.command {
            Commands::Run(args) => args.execute(&self.config, shutdown_signal).await,
            Commands::ValidateConfig(args) => args.execute(&self.config).await,
            Commands::Status(args) => args.execute(&self.config).await,
            Commands::Init(args) => args.execute().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["cwl-export", "run"]);
        assert_eq!(cli.config, "cwl-export.toml");
        assert!(matches!(cli.command, Commands::Run(_)));
    }

    #[test]
    fn test_cli_parse_run_options() {
        let cli = Cli::parse_from([
            "cwl-export",
            "run",
            "--event",
            "event.json",
            "--timeout-secs",
            "840",
            "--dry-run",
        ]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.event.as_deref(), Some("event.json"));
                assert_eq!(args.timeout_secs, Some(840));
                assert!(args.dry_run);
            }
            other => panic!("Expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["cwl-export", "--config", "custom.toml", "run"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_global_config_after_subcommand() {
        let cli = Cli::parse_from(["cwl-export", "validate-config", "--config", "other.toml"]);
        assert_eq!(cli.config, "other.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["cwl-export", "--log-level", "debug", "run"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_status_requires_log_group() {
        assert!(Cli::try_parse_from(["cwl-export", "status"]).is_err());

        let cli = Cli::parse_from(["cwl-export", "status", "--log-group", "/aws/lambda/orders"]);
        assert!(matches!(cli.command, Commands::Status(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["cwl-export", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
