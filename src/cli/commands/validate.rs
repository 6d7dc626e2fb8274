//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the svod-sync configuration file.

use crate::config::load_config;
use crate::config::StoreTarget;
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("Validating configuration file: {config_path}");
        println!();

        // load_config already runs validation; a loaded config is a valid one
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("Configuration validation failed");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        println!("Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);

        match config.agency.url {
            Some(ref url) => {
                let scheme = url
                    .expose_secret()
                    .as_ref()
                    .split(':')
                    .next()
                    .unwrap_or("unknown")
                    .to_string();
                println!("  Agency Source: configured ({scheme})");
            }
            None => println!("  Agency Source: not configured (sync cycles will be skipped)"),
        }
        println!("  Archives Database: {}", config.agency.archives_database);
        if let Some(start) = config.agency.archive_start_date_key {
            println!("  Archive Start Date Key: {start}");
        }

        match config.store_target {
            StoreTarget::PostgreSQL => {
                if let Some(ref pg_config) = config.postgresql {
                    println!("  Store Target: PostgreSQL");
                    println!(
                        "  PostgreSQL Connection: {}",
                        pg_config
                            .connection_string
                            .expose_secret()
                            .as_ref()
                            .split('@')
                            .next_back()
                            .unwrap_or("***")
                    );
                    println!("  Max Connections: {}", pg_config.max_connections);
                }
            }
            StoreTarget::Sqlite => {
                if let Some(ref sqlite_config) = config.sqlite {
                    println!("  Store Target: SQLite");
                    println!("  Database Path: {}", sqlite_config.path);
                }
            }
        }

        println!("  Sync Enabled: {}", config.sync.enabled);
        println!("  Sync Interval: {}s", config.sync.interval_seconds);
        println!("  Events Limit: {}", config.sync.events_limit);
        println!(
            "  Objects Interval: {}s",
            config.sync.objects_interval_seconds
        );
        println!();
        Ok(0)
    }
}
