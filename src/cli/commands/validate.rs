//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the cwl-export configuration file.

use crate::config::{load_config, ExporterConfig};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as part of loading
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                return Ok(2);
            }
        };

        print_summary(&config);

        if let Err(e) = config.require_run_fields() {
            println!("⚠️  {e}");
            println!("   These must be supplied by the invocation payload (run --event).");
            println!();
        }

        Ok(0)
    }
}

fn print_summary(config: &ExporterConfig) {
    let unset = || "(not set)".to_string();

    println!();
    println!("Configuration Summary:");
    println!("  Log Level: {}", config.application.log_level);
    println!(
        "  AWS Region: {}",
        config.aws.region.clone().unwrap_or_else(|| "(default chain)".to_string())
    );
    println!(
        "  Destination: s3://{}/{}",
        config.export.destination_bucket.clone().unwrap_or_else(unset),
        config.export.destination_prefix
    );
    println!(
        "  Notification Topic: {}",
        config.export.notification_topic_arn.clone().unwrap_or_else(unset)
    );
    println!(
        "  Tag Filter: {}={}",
        config.export.tag_key, config.export.tag_value
    );
    println!("  Chunk Size: {} day(s)", config.export.chunk_size_days);
    println!("  Adaptive Chunking: {}", config.chunking.adaptive);
    println!("  Pool Width: {}", config.export.pool_width);
    println!("  Parameter Prefix: {}", config.export.parameter_prefix);
    println!(
        "  Polling: every {}s, up to {}h",
        config.polling.interval_secs, config.polling.max_wait_hours
    );
    println!("  Retry Attempts: {}", config.retry.max_attempts);
    println!();
}
