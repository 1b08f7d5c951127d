//! Export task model
//!
//! The status of an export task is owned by the export service. The
//! exporter only reads it, and only the poller interprets it.

use crate::domain::chunk::Chunk;
use crate::domain::ids::{LogGroupName, TaskId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of an export task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Accepted but not yet started
    Pending,
    /// Copying records to the bucket
    Running,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
    /// Cancelled before completion
    Cancelled,
    /// Exceeded the maximum wait ceiling while being polled
    Timeout,
}

impl TaskStatus {
    /// Terminal statuses end the poll loop
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Cancelled | TaskStatus::Timeout
        )
    }

    /// Pending and running tasks occupy the account-wide export slot
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Running)
    }

    /// Status code as reported by the export service
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "PENDING",
            TaskStatus::Running => "RUNNING",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Failed => "FAILED",
            TaskStatus::Cancelled => "CANCELLED",
            TaskStatus::Timeout => "TIMEOUT",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(TaskStatus::Pending),
            // A pending cancellation still holds the export slot
            "RUNNING" | "PENDING_CANCEL" => Ok(TaskStatus::Running),
            "COMPLETED" => Ok(TaskStatus::Completed),
            "FAILED" => Ok(TaskStatus::Failed),
            "CANCELLED" => Ok(TaskStatus::Cancelled),
            "TIMEOUT" => Ok(TaskStatus::Timeout),
            other => Err(format!("Unknown export task status: {other}")),
        }
    }
}

/// Status snapshot returned by the export service for one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescription {
    /// Current status
    pub status: TaskStatus,
    /// Human readable status message, present mostly on failures
    pub message: Option<String>,
}

impl TaskDescription {
    /// Create a description without a message
    pub fn new(status: TaskStatus) -> Self {
        Self {
            status,
            message: None,
        }
    }

    /// Attach a status message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// One in-flight export job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTask {
    /// Service-assigned task ID
    pub task_id: TaskId,
    /// Log group being exported
    pub log_group: LogGroupName,
    /// Time window being exported
    pub chunk: Chunk,
    /// Last observed status
    pub status: TaskStatus,
    /// Last observed status message
    pub message: Option<String>,
}

impl ExportTask {
    /// A task the service just accepted for `chunk`
    pub fn submitted(task_id: TaskId, log_group: LogGroupName, chunk: Chunk) -> Self {
        Self {
            task_id,
            log_group,
            chunk,
            status: TaskStatus::Pending,
            message: None,
        }
    }

    /// Record a description returned by the service
    ///
    /// Returns true when the status differs from the previous observation.
    pub fn observe(&mut self, description: TaskDescription) -> bool {
        let changed = self.status != description.status;
        self.status = description.status;
        self.message = description.message;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Cancelled.is_terminal());
        assert!(TaskStatus::Timeout.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
    }

    #[test]
    fn test_active_statuses() {
        assert!(TaskStatus::Pending.is_active());
        assert!(TaskStatus::Running.is_active());
        assert!(!TaskStatus::Completed.is_active());
    }

    #[test]
    fn test_parse_service_codes() {
        assert_eq!(TaskStatus::from_str("COMPLETED").unwrap(), TaskStatus::Completed);
        assert_eq!(TaskStatus::from_str("pending").unwrap(), TaskStatus::Pending);
        assert_eq!(
            TaskStatus::from_str("PENDING_CANCEL").unwrap(),
            TaskStatus::Running
        );
        assert!(TaskStatus::from_str("EXPLODED").is_err());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&TaskStatus::Cancelled).unwrap();
        assert_eq!(json, "\"CANCELLED\"");
    }

    #[test]
    fn test_export_task_observe() {
        let mut task = ExportTask::submitted(
            TaskId::new("t-1").unwrap(),
            LogGroupName::new("/app").unwrap(),
            Chunk::new(0, 1_000),
        );
        assert_eq!(task.status, TaskStatus::Pending);

        assert!(!task.observe(TaskDescription::new(TaskStatus::Pending)));
        assert!(task.observe(TaskDescription::new(TaskStatus::Running)));
        assert!(task.observe(TaskDescription::new(TaskStatus::Failed).with_message("denied")));
        assert_eq!(task.message.as_deref(), Some("denied"));
    }

    #[test]
    fn test_task_description_builder() {
        let desc = TaskDescription::new(TaskStatus::Failed).with_message("Access denied");
        assert_eq!(desc.status, TaskStatus::Failed);
        assert_eq!(desc.message.as_deref(), Some("Access denied"));
    }
}
