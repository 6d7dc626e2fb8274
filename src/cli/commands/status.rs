//! Status command implementation
//!
//! This module implements the `status` command for displaying the auto-sync
//! configuration and persisted sync cursors.

use crate::adapters::store::create_store;
use crate::config::{load_config, SyncConfig};
use clap::Args;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Filter by cursor key
    #[arg(long)]
    pub key: Option<String>,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Checking sync status");

        println!("Sync Status");
        println!();

        // Load configuration
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        println!("{}", sync_summary(&config.sync));
        println!();

        // Create the canonical store client
        let store = match create_store(&config) {
            Ok(s) => s,
            Err(e) => {
                println!("Failed to connect to canonical store");
                println!("   Error: {e}");
                return Ok(4); // Connection error exit code
            }
        };

        let cursors = match store.all_cursors().await {
            Ok(c) => c,
            Err(e) => {
                println!("Failed to load sync cursors");
                println!("   Error: {e}");
                return Ok(5); // Fatal error exit code
            }
        };

        if cursors.is_empty() {
            println!("No sync history found.");
            println!("Run 'svod-sync sync-events' to start synchronizing.");
            return Ok(0);
        }

        let filtered: Vec<_> = cursors
            .iter()
            .filter(|c| self.key.as_ref().is_none_or(|k| &c.key == k))
            .collect();

        if filtered.is_empty() {
            println!("No cursors match the specified filter.");
            return Ok(0);
        }

        println!("Found {} cursor(s):", filtered.len());
        println!();
        println!("{:<40} {:<25} {:<25}", "Key", "Value", "Updated");
        println!("{}", "-".repeat(90));

        for cursor in filtered {
            println!(
                "{:<40} {:<25} {:<25}",
                cursor.key,
                cursor.value,
                cursor.updated_at.format("%Y-%m-%d %H:%M:%S").to_string()
            );
        }

        Ok(0)
    }
}

fn sync_summary(sync: &SyncConfig) -> String {
    format!(
        "Auto-sync: {}\n\
         {:<25} {}s\n\
         {:<25} {}s\n\
         {:<25} {}",
        if sync.enabled { "enabled" } else { "disabled" },
        "  Event interval:",
        sync.interval_seconds,
        "  Objects interval:",
        sync.objects_interval_seconds,
        "  Events limit:",
        sync.events_limit,
    )
}
