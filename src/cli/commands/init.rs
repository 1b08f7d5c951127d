//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "cwl-export.toml")]
    pub output: String,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing cwl-export configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        match fs::write(&self.output, Self::generate_config()) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Set destination_bucket and notification_topic_arn in {}", self.output);
                println!("     or pass them in the invocation payload (run --event event.json)");
                println!("  2. Tag the log groups to export, e.g. ExportToS3=true");
                println!("  3. Validate configuration: cwl-export validate-config");
                println!("  4. Run export: cwl-export run");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5)
            }
        }
    }

    /// Sample configuration with every setting at its default
    fn generate_config() -> String {
        r#"# cwl-export Configuration File
# CloudWatch Logs to S3 exporter

[application]
# Log level: trace, debug, info, warn, error
log_level = "info"

# Plan chunks without submitting export tasks or writing state
dry_run = false

[aws]
# Region and profile default to the standard provider chain
# region = "us-east-1"
# profile = "default"

[export]
# Destination bucket and notification topic are required before a run,
# either here or in the invocation payload
# destination_bucket = "${LOG_ARCHIVE_BUCKET}"
# notification_topic_arn = "${LOG_EXPORT_TOPIC_ARN}"

# Objects are written under <prefix>/<log-group>/<yyyy>/<mm>/<dd>
destination_prefix = "exported-logs"

# Only log groups carrying this tag are exported
tag_key = "ExportToS3"
tag_value = "true"

# Default chunk width in days
chunk_size_days = 7

# Log groups processed in parallel; only one export task runs at a time
pool_width = 3

# Parameter store path for watermarks and progress snapshots
parameter_prefix = "/log-exports"

[chunking]
# Pick the chunk width from the log group's stored bytes
adaptive = true
small_threshold_bytes = 1073741824
medium_threshold_bytes = 10737418240
large_threshold_bytes = 107374182400
long_window_days = 7
medium_window_days = 5
short_window_days = 3

[polling]
interval_secs = 60
max_wait_hours = 12
heartbeat_secs = 300

[retry]
# Throttled calls are retried with exponential backoff
max_attempts = 10
max_delay_secs = 32

[logging]
local_enabled = true
local_path = "./logs"
# Rotation: daily or hourly
local_rotation = "daily"
"#
        .to_string()
    }
}
