//! Status command implementation
//!
//! This module implements the `status` command for displaying a log group's
//! watermark and latest progress snapshot.

use crate::adapters::aws::{load_sdk_config, SsmParameterStore};
use crate::config::load_config;
use crate::core::state::{ProgressSnapshot, ProgressStore};
use crate::domain::{millis_to_datetime, LogGroupName};
use clap::Args;
use std::sync::Arc;

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Log group to report on
    #[arg(long)]
    pub log_group: String,
}

impl StatusArgs {
    /// Execute the status command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(log_group = %self.log_group, "Checking export status");

        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Failed to load configuration file");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        let log_group = match LogGroupName::new(&self.log_group) {
            Ok(name) => name,
            Err(e) => {
                println!("❌ Invalid log group name: {e}");
                return Ok(2);
            }
        };

        let sdk_config = load_sdk_config(&config.aws).await;
        let store = ProgressStore::new(
            Arc::new(SsmParameterStore::new(&sdk_config)),
            config.export.parameter_prefix.clone(),
        );

        let watermark = match store.load_watermark(&log_group).await {
            Ok(w) => w,
            Err(e) => {
                println!("❌ Failed to read watermark");
                println!("   Error: {e}");
                return Ok(4);
            }
        };
        let progress = match store.load_progress(&log_group).await {
            Ok(p) => p,
            Err(e) => {
                println!("❌ Failed to read progress snapshot");
                println!("   Error: {e}");
                return Ok(4);
            }
        };

        println!("📊 Export Status: {log_group}");
        println!();
        match watermark {
            Some(millis) => println!(
                "  Watermark: {} ({millis})",
                millis_to_datetime(millis).format("%Y-%m-%d %H:%M:%S UTC")
            ),
            None => {
                println!("  Watermark: none");
                println!("  No export has completed yet; the next run starts at creation time.");
            }
        }

        match progress {
            Some(snapshot) => print_snapshot(&snapshot),
            None => println!("  Progress: no snapshot recorded"),
        }
        println!();

        Ok(0)
    }
}

fn print_snapshot(snapshot: &ProgressSnapshot) {
    println!("  Status: {:?}", snapshot.status);
    println!(
        "  Chunks: {}/{} completed ({:.1}%)",
        snapshot.completed_chunks, snapshot.total_chunks, snapshot.percentage
    );
    if let Some(task_id) = &snapshot.task_id {
        println!("  Current task: {task_id}");
    }
    println!(
        "  Window: {} .. {}",
        millis_to_datetime(snapshot.start_time).format("%Y-%m-%d %H:%M:%S"),
        millis_to_datetime(snapshot.end_time).format("%Y-%m-%d %H:%M:%S")
    );
    println!("  Elapsed: {}s", snapshot.elapsed_seconds);
    if let Some(remaining) = snapshot.estimated_remaining_seconds {
        println!("  Estimated remaining: {remaining}s");
    }
    if let Some(message) = &snapshot.message {
        println!("  Message: {message}");
    }
}
