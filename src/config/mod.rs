//! Configuration management for cwl-export.
//!
//! # Overview
//!
//! Configuration comes from two places:
//! - a TOML file with defaults for every setting, `${VAR}` substitution and
//!   `CWL_EXPORT_<SECTION>_<KEY>` environment overrides
//! - the JSON invocation payload, which may override the destination,
//!   notification target, tag filter, chunk size and pool width
//!
//! ```rust,no_run
//! use cwl_export::config::{load_config, InvocationPayload};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("cwl-export.toml")?;
//! let payload = InvocationPayload::from_json(r#"{"destination_bucket": "log-archive"}"#)?;
//! let config = payload.resolve(config)?;
//! println!("Exporting to {:?}", config.export.destination_bucket);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [export]
//! destination_bucket = "${LOG_ARCHIVE_BUCKET}"
//! notification_topic_arn = "arn:aws:sns:us-east-1:123456789012:log-exports"
//! tag_key = "ExportToS3"
//! tag_value = "true"
//! chunk_size_days = 7
//! pool_width = 3
//!
//! [polling]
//! interval_secs = 60
//! max_wait_hours = 12
//! ```

pub mod loader;
pub mod payload;
pub mod schema;

// Re-export commonly used types
pub use loader::{load_config, parse_config};
pub use payload::InvocationPayload;
pub use schema::{
    ApplicationConfig, AwsConfig, ChunkingConfig, ExportConfig, ExporterConfig, LoggingConfig,
    PollingConfig, RetryConfig,
};
