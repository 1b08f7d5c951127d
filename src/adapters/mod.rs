//! External system integrations for cwl-export.
//!
//! The exporter depends on four collaborators, each behind a trait in
//! [`traits`]:
//!
//! - [`LogRegistry`] lists log groups, their tags and metadata
//! - [`ExportTaskService`] creates and describes export tasks
//! - [`ParameterStore`] holds watermarks and progress snapshots
//! - [`NotificationSink`] delivers notifications
//!
//! # Implementations
//!
//! - [`aws`] - CloudWatch Logs, SSM Parameter Store and SNS
//! - [`memory`] - In-process implementations for tests and local runs
//!
//! ```rust,no_run
//! use cwl_export::adapters::aws::{load_sdk_config, CloudWatchLogsAdapter, SsmParameterStore};
//! use cwl_export::config::AwsConfig;
//!
//! # async fn example() {
//! let sdk_config = load_sdk_config(&AwsConfig::default()).await;
//! let logs = CloudWatchLogsAdapter::new(&sdk_config);
//! let store = SsmParameterStore::new(&sdk_config);
//! # }
//! ```

pub mod aws;
pub mod memory;
pub mod traits;

pub use traits::{
    Clock, ExportTaskService, LogRegistry, NotificationSink, ParameterStore, SystemClock,
};
