//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for svod-sync using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// svod-sync - Agency alarm synchronization engine
#[derive(Parser, Debug)]
#[command(name = "svod-sync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "svod-sync.toml", env = "SVOD_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SVOD_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the background sync loop until interrupted
    Run(commands::run::RunArgs),

    /// Run one event sync cycle and print the report
    SyncEvents(commands::sync::SyncEventsArgs),

    /// Run one facility object reconciliation cycle and print the report
    SyncObjects(commands::sync::SyncObjectsArgs),

    /// Show persisted sync cursors
    Status(commands::status::StatusArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["svod-sync", "run"]);
        assert_eq!(cli.config, "svod-sync.toml");
        assert!(matches!(cli.command, Commands::Run(_)));
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["svod-sync", "--config", "custom.toml", "run"]);
        assert_eq!(cli.config, "custom.toml");
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["svod-sync", "--log-level", "debug", "sync-events"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_cli_parse_sync_commands() {
        assert!(matches!(
            Cli::parse_from(["svod-sync", "sync-events"]).command,
            Commands::SyncEvents(_)
        ));
        assert!(matches!(
            Cli::parse_from(["svod-sync", "sync-objects"]).command,
            Commands::SyncObjects(_)
        ));
    }

    #[test]
    fn test_cli_parse_status() {
        let cli = Cli::parse_from(["svod-sync", "status"]);
        assert!(matches!(cli.command, Commands::Status(_)));
    }

    #[test]
    fn test_cli_parse_validate_config() {
        let cli = Cli::parse_from(["svod-sync", "validate-config"]);
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["svod-sync", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
