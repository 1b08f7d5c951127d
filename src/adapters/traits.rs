//! Collaborator traits
//!
//! The exporter talks to four external systems. Each is a trait here so the
//! core can be driven by the AWS implementations in production and by the
//! in-memory implementations in tests and dry runs.

use crate::domain::{Chunk, LogGroupName, LogGroupPage, Result, TaskDescription, TaskId};
use async_trait::async_trait;
use std::collections::HashMap;

/// Log source registry
#[async_trait]
pub trait LogRegistry: Send + Sync {
    /// List one page of log groups
    ///
    /// # Arguments
    ///
    /// * `page_token` - Token from the previous page, `None` for the first page
    async fn list_log_groups(&self, page_token: Option<String>) -> Result<LogGroupPage>;

    /// Tags attached to a log group
    async fn get_tags(&self, log_group: &LogGroupName) -> Result<HashMap<String, String>>;

    /// Creation time of a log group in epoch milliseconds
    async fn get_creation_time(&self, log_group: &LogGroupName) -> Result<i64>;

    /// Stored bytes of a log group
    ///
    /// Best effort; only used for adaptive chunk sizing.
    async fn get_stored_bytes(&self, log_group: &LogGroupName) -> Result<i64>;
}

/// Export task service
#[async_trait]
pub trait ExportTaskService: Send + Sync {
    /// Create an export task copying `chunk` of `log_group` to the bucket
    ///
    /// # Errors
    ///
    /// Returns `ExporterError::TaskAlreadyActive` when the service refuses the
    /// task because another export is still running.
    async fn create_export_task(
        &self,
        log_group: &LogGroupName,
        chunk: &Chunk,
        destination: &str,
        destination_prefix: &str,
    ) -> Result<TaskId>;

    /// Current status of one task
    async fn describe_export_task(&self, task_id: &TaskId) -> Result<TaskDescription>;

    /// IDs of all tasks that are PENDING or RUNNING
    async fn list_active_export_tasks(&self) -> Result<Vec<TaskId>>;
}

/// Key-value parameter store with overwrite semantics
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Write a value, replacing any previous value
    async fn put(&self, name: &str, value: &str) -> Result<()>;

    /// Read a value; `Ok(None)` when the parameter does not exist
    async fn get(&self, name: &str) -> Result<Option<String>>;
}

/// Notification transport
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Publish a message
    async fn publish(&self, subject: &str, body: &str) -> Result<()>;
}

/// Source of the current wall-clock time
pub trait Clock: Send + Sync {
    /// Now in epoch milliseconds
    fn now_millis(&self) -> i64;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
