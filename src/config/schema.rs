//! Configuration schema types
//!
//! This module defines the configuration structure for cwl-export. Every
//! section has defaults so a file only needs the settings it changes.

use crate::domain::{ExporterError, Result, MILLIS_PER_DAY};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main exporter configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// AWS client settings
    #[serde(default)]
    pub aws: AwsConfig,

    /// Export destination, filter and pool settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Chunk sizing settings
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Export task polling settings
    #[serde(default)]
    pub polling: PollingConfig,

    /// Throttling retry settings
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ExporterConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> std::result::Result<(), String> {
        self.application.validate()?;
        self.export.validate()?;
        self.chunking.validate()?;
        self.polling.validate()?;
        self.retry.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Checks the fields a run cannot start without
    ///
    /// These may be absent from the file because the invocation payload is
    /// allowed to supply them.
    ///
    /// # Errors
    ///
    /// Returns [`ExporterError::MissingField`] naming every missing field.
    pub fn require_run_fields(&self) -> Result<()> {
        let mut missing = Vec::new();
        if is_blank(&self.export.destination_bucket) {
            missing.push("destination_bucket".to_string());
        }
        if is_blank(&self.export.notification_topic_arn) {
            missing.push("notification_topic_arn".to_string());
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ExporterError::MissingField(missing))
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim).unwrap_or_default().is_empty()
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Dry run mode: plan chunks without submitting tasks or writing state
    #[serde(default)]
    pub dry_run: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
        }
    }
}

/// AWS client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Region override; the default provider chain is used when absent
    #[serde(default)]
    pub region: Option<String>,

    /// Named profile override
    #[serde(default)]
    pub profile: Option<String>,
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Destination S3 bucket (required before a run)
    #[serde(default)]
    pub destination_bucket: Option<String>,

    /// Key prefix under which each log group's exports are placed
    #[serde(default = "default_destination_prefix")]
    pub destination_prefix: String,

    /// SNS topic ARN for notifications (required before a run)
    #[serde(default)]
    pub notification_topic_arn: Option<String>,

    /// Tag key a log group must carry to be exported
    #[serde(default = "default_tag_key")]
    pub tag_key: String,

    /// Tag value the tag key must have
    #[serde(default = "default_tag_value")]
    pub tag_value: String,

    /// Default chunk width in days
    #[serde(default = "default_chunk_size_days")]
    pub chunk_size_days: u32,

    /// Number of log groups processed in parallel
    #[serde(default = "default_pool_width")]
    pub pool_width: usize,

    /// Parameter store path prefix for watermarks and progress snapshots
    #[serde(default = "default_parameter_prefix")]
    pub parameter_prefix: String,
}

impl ExportConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.tag_key.trim().is_empty() {
            return Err("export.tag_key cannot be empty".to_string());
        }

        if !(1..=365).contains(&self.chunk_size_days) {
            return Err(format!(
                "export.chunk_size_days must be between 1 and 365, got {}",
                self.chunk_size_days
            ));
        }

        if self.pool_width == 0 || self.pool_width > 32 {
            return Err(format!(
                "export.pool_width must be between 1 and 32, got {}",
                self.pool_width
            ));
        }

        if !self.parameter_prefix.starts_with('/') {
            return Err(format!(
                "export.parameter_prefix must start with '/', got '{}'",
                self.parameter_prefix
            ));
        }

        if self.destination_prefix.starts_with('/') || self.destination_prefix.ends_with('/') {
            return Err(format!(
                "export.destination_prefix must not start or end with '/', got '{}'",
                self.destination_prefix
            ));
        }

        Ok(())
    }

    /// Default chunk width in milliseconds
    pub fn chunk_size_millis(&self) -> i64 {
        i64::from(self.chunk_size_days) * MILLIS_PER_DAY
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            destination_bucket: None,
            destination_prefix: default_destination_prefix(),
            notification_topic_arn: None,
            tag_key: default_tag_key(),
            tag_value: default_tag_value(),
            chunk_size_days: default_chunk_size_days(),
            pool_width: default_pool_width(),
            parameter_prefix: default_parameter_prefix(),
        }
    }
}

/// Volume-adaptive chunk sizing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Size chunks from the log group's stored bytes
    #[serde(default = "default_true")]
    pub adaptive: bool,

    /// Below this many stored bytes the long window is used
    #[serde(default = "default_small_threshold_bytes")]
    pub small_threshold_bytes: i64,

    /// Above this many stored bytes the medium window is used
    #[serde(default = "default_medium_threshold_bytes")]
    pub medium_threshold_bytes: i64,

    /// Above this many stored bytes the short window is used
    #[serde(default = "default_large_threshold_bytes")]
    pub large_threshold_bytes: i64,

    /// Window for low-volume log groups
    #[serde(default = "default_long_window_days")]
    pub long_window_days: u32,

    /// Window for medium-volume log groups
    #[serde(default = "default_medium_window_days")]
    pub medium_window_days: u32,

    /// Window for high-volume log groups
    #[serde(default = "default_short_window_days")]
    pub short_window_days: u32,
}

impl ChunkingConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.small_threshold_bytes < 0
            || self.small_threshold_bytes > self.medium_threshold_bytes
            || self.medium_threshold_bytes > self.large_threshold_bytes
        {
            return Err(format!(
                "chunking thresholds must satisfy 0 <= small <= medium <= large, got {} / {} / {}",
                self.small_threshold_bytes,
                self.medium_threshold_bytes,
                self.large_threshold_bytes
            ));
        }

        for (name, days) in [
            ("long_window_days", self.long_window_days),
            ("medium_window_days", self.medium_window_days),
            ("short_window_days", self.short_window_days),
        ] {
            if days == 0 {
                return Err(format!("chunking.{name} must be at least 1"));
            }
        }

        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            adaptive: true,
            small_threshold_bytes: default_small_threshold_bytes(),
            medium_threshold_bytes: default_medium_threshold_bytes(),
            large_threshold_bytes: default_large_threshold_bytes(),
            long_window_days: default_long_window_days(),
            medium_window_days: default_medium_window_days(),
            short_window_days: default_short_window_days(),
        }
    }
}

/// Export task polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Seconds between DescribeExportTasks calls
    #[serde(default = "default_poll_interval_secs")]
    pub interval_secs: u64,

    /// Hours after which a task that is still running counts as timed out
    #[serde(default = "default_max_wait_hours")]
    pub max_wait_hours: u64,

    /// Seconds between progress snapshots while the status is unchanged
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
}

impl PollingConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.interval_secs == 0 {
            return Err("polling.interval_secs must be at least 1".to_string());
        }
        if self.max_wait_hours == 0 || self.max_wait_hours > 48 {
            return Err(format!(
                "polling.max_wait_hours must be between 1 and 48, got {}",
                self.max_wait_hours
            ));
        }
        Ok(())
    }

    /// Poll interval
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Maximum wait for one task
    pub fn max_wait(&self) -> Duration {
        Duration::from_secs(self.max_wait_hours * 3600)
    }

    /// Progress heartbeat interval
    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval_secs(),
            max_wait_hours: default_max_wait_hours(),
            heartbeat_secs: default_heartbeat_secs(),
        }
    }
}

/// Retry configuration for throttled API calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Upper bound on the backoff delay in seconds
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

impl RetryConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.max_attempts == 0 {
            return Err("retry.max_attempts must be at least 1".to_string());
        }
        if self.max_delay_secs == 0 {
            return Err("retry.max_delay_secs must be at least 1".to_string());
        }
        Ok(())
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write JSON logs to a local rolling file
    #[serde(default = "default_true")]
    pub local_enabled: bool,

    /// Directory for log files
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Rotation policy (daily, hourly)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> std::result::Result<(), String> {
        if self.local_enabled {
            if self.local_path.is_empty() {
                return Err("logging.local_path cannot be empty when local logging is enabled"
                    .to_string());
            }

            let valid_rotations = ["daily", "hourly"];
            if !valid_rotations.contains(&self.local_rotation.as_str()) {
                return Err(format!(
                    "Invalid logging.local_rotation '{}'. Must be one of: {}",
                    self.local_rotation,
                    valid_rotations.join(", ")
                ));
            }
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: true,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_destination_prefix() -> String {
    "exported-logs".to_string()
}

fn default_tag_key() -> String {
    "ExportToS3".to_string()
}

fn default_tag_value() -> String {
    "true".to_string()
}

fn default_chunk_size_days() -> u32 {
    7
}

fn default_pool_width() -> usize {
    3
}

fn default_parameter_prefix() -> String {
    "/log-exports".to_string()
}

fn default_small_threshold_bytes() -> i64 {
    1024 * 1024 * 1024
}

fn default_medium_threshold_bytes() -> i64 {
    10 * 1024 * 1024 * 1024
}

fn default_large_threshold_bytes() -> i64 {
    100 * 1024 * 1024 * 1024
}

fn default_long_window_days() -> u32 {
    7
}

fn default_medium_window_days() -> u32 {
    5
}

fn default_short_window_days() -> u32 {
    3
}

fn default_poll_interval_secs() -> u64 {
    60
}

fn default_max_wait_hours() -> u64 {
    12
}

fn default_heartbeat_secs() -> u64 {
    300
}

fn default_max_attempts() -> u32 {
    10
}

fn default_max_delay_secs() -> u64 {
    32
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = ExporterConfig::default();
        assert_eq!(config.application.log_level, "info");
        assert_eq!(config.export.tag_key, "ExportToS3");
        assert_eq!(config.export.tag_value, "true");
        assert_eq!(config.export.chunk_size_days, 7);
        assert_eq!(config.export.pool_width, 3);
        assert_eq!(config.export.parameter_prefix, "/log-exports");
        assert_eq!(config.polling.interval_secs, 60);
        assert_eq!(config.polling.max_wait_hours, 12);
        assert_eq!(config.polling.heartbeat_secs, 300);
        assert_eq!(config.retry.max_attempts, 10);
        assert_eq!(config.retry.max_delay_secs, 32);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_application_config_validation() {
        let mut config = ApplicationConfig::default();
        assert!(config.validate().is_ok());

        config.log_level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_export_config_validation() {
        let mut config = ExportConfig::default();
        assert!(config.validate().is_ok());

        config.pool_width = 0;
        assert!(config.validate().is_err());
        config.pool_width = 33;
        assert!(config.validate().is_err());
        config.pool_width = 3;

        config.chunk_size_days = 0;
        assert!(config.validate().is_err());
        config.chunk_size_days = 7;

        config.parameter_prefix = "log-exports".to_string();
        assert!(config.validate().is_err());
        config.parameter_prefix = "/log-exports".to_string();

        config.destination_prefix = "exports/".to_string();
        assert!(config.validate().is_err());
        config.destination_prefix = String::new();
        assert!(config.validate().is_ok());

        config.tag_key = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_chunk_size_millis() {
        let config = ExportConfig::default();
        assert_eq!(config.chunk_size_millis(), 7 * MILLIS_PER_DAY);
    }

    #[test]
    fn test_chunking_thresholds_must_be_ordered() {
        let mut config = ChunkingConfig::default();
        assert!(config.validate().is_ok());

        config.medium_threshold_bytes = config.large_threshold_bytes + 1;
        assert!(config.validate().is_err());

        let mut config = ChunkingConfig::default();
        config.short_window_days = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_polling_config_validation() {
        let mut config = PollingConfig::default();
        assert_eq!(config.interval(), Duration::from_secs(60));
        assert_eq!(config.max_wait(), Duration::from_secs(12 * 3600));
        assert_eq!(config.heartbeat(), Duration::from_secs(300));

        config.interval_secs = 0;
        assert!(config.validate().is_err());

        config.interval_secs = 60;
        config.max_wait_hours = 49;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_config_validation() {
        let mut config = RetryConfig::default();
        assert!(config.validate().is_ok());
        config.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_logging_config_validation() {
        let mut config = LoggingConfig::default();
        assert!(config.validate().is_ok());

        config.local_rotation = "weekly".to_string();
        assert!(config.validate().is_err());

        config.local_enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_require_run_fields() {
        let mut config = ExporterConfig::default();
        match config.require_run_fields() {
            Err(ExporterError::MissingField(fields)) => {
                assert_eq!(fields, vec!["destination_bucket", "notification_topic_arn"]);
            }
            other => panic!("Expected MissingField, got {other:?}"),
        }

        config.export.destination_bucket = Some("log-archive".to_string());
        config.export.notification_topic_arn =
            Some("arn:aws:sns:us-east-1:123456789012:log-exports".to_string());
        assert!(config.require_run_fields().is_ok());

        config.export.destination_bucket = Some("  ".to_string());
        assert!(config.require_run_fields().is_err());
    }
}
