//! Export task client
//!
//! Wraps the export task service with throttling retries and computes where
//! each chunk lands in the bucket.

use crate::adapters::ExportTaskService;
use crate::core::retry::RetryPolicy;
use crate::domain::{Chunk, LogGroupName, Result, TaskDescription, TaskId};
use std::sync::Arc;

/// Bucket key prefix for a chunk: `{prefix}/{sanitized log group}/{YYYY}/{MM}/{DD}`
///
/// The date is the UTC day of the chunk start, so submitting the same chunk
/// twice writes to the same place.
///
/// # Examples
///
/// ```
/// use cwl_export::core::export::client::destination_key_prefix;
/// use cwl_export::domain::{Chunk, LogGroupName};
///
/// let log_group = LogGroupName::new("/aws/lambda/orders").unwrap();
/// // 2024-03-05T10:00:00Z
/// let chunk = Chunk::new(1_709_632_800_000, 1_709_719_200_000);
/// assert_eq!(
///     destination_key_prefix("exported-logs", &log_group, &chunk),
///     "exported-logs/aws-lambda-orders/2024/03/05"
/// );
/// ```
pub fn destination_key_prefix(prefix: &str, log_group: &LogGroupName, chunk: &Chunk) -> String {
    let day = chunk.start().format("%Y/%m/%d");
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        format!("{}/{}", log_group.sanitized(), day)
    } else {
        format!("{}/{}/{}", prefix, log_group.sanitized(), day)
    }
}

/// Submits, describes and counts export tasks
#[derive(Clone)]
pub struct ExportTaskClient {
    service: Arc<dyn ExportTaskService>,
    retry: RetryPolicy,
    destination: String,
    destination_prefix: String,
}

impl ExportTaskClient {
    /// Create a client exporting to `destination` under `destination_prefix`
    pub fn new(
        service: Arc<dyn ExportTaskService>,
        retry: RetryPolicy,
        destination: impl Into<String>,
        destination_prefix: impl Into<String>,
    ) -> Self {
        Self {
            service,
            retry,
            destination: destination.into(),
            destination_prefix: destination_prefix.into(),
        }
    }

    /// Create an export task for one chunk
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::ExporterError::TaskAlreadyActive`] without
    /// retrying when the service refuses because another task is running.
    pub async fn submit(&self, log_group: &LogGroupName, chunk: &Chunk) -> Result<TaskId> {
        let key_prefix = destination_key_prefix(&self.destination_prefix, log_group, chunk);

        let task_id = self
            .retry
            .run("CreateExportTask", || {
                self.service
                    .create_export_task(log_group, chunk, &self.destination, &key_prefix)
            })
            .await?;

        tracing::info!(
            log_group = %log_group,
            task_id = %task_id,
            destination = %self.destination,
            key_prefix = %key_prefix,
            "Export task created"
        );
        Ok(task_id)
    }

    /// Current status of a task
    pub async fn describe(&self, task_id: &TaskId) -> Result<TaskDescription> {
        self.retry
            .run("DescribeExportTasks", || self.service.describe_export_task(task_id))
            .await
    }

    /// True when any export task in the account is PENDING or RUNNING
    pub async fn has_active_task(&self) -> Result<bool> {
        let active = self
            .retry
            .run("DescribeExportTasks", || self.service.list_active_export_tasks())
            .await?;

        if !active.is_empty() {
            tracing::debug!(active_tasks = ?active, "Export task slot is busy");
        }
        Ok(!active.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryExportService, ServiceCall};
    use crate::core::retry::BackoffPolicy;
    use crate::domain::{ExporterError, TaskStatus, MILLIS_PER_DAY};

    const MARCH_5_2024: i64 = 1_709_596_800_000;

    fn client(service: Arc<InMemoryExportService>) -> ExportTaskClient {
        ExportTaskClient::new(
            service,
            RetryPolicy::new(10, BackoffPolicy::default()),
            "log-archive",
            "exported-logs",
        )
    }

    fn name(s: &str) -> LogGroupName {
        LogGroupName::new(s).unwrap()
    }

    #[test]
    fn test_destination_prefix_uses_chunk_start_day() {
        let chunk = Chunk::new(MARCH_5_2024 + 1, MARCH_5_2024 + 3 * MILLIS_PER_DAY);
        assert_eq!(
            destination_key_prefix("exported-logs", &name("/aws/ecs/api"), &chunk),
            "exported-logs/aws-ecs-api/2024/03/05"
        );
        assert_eq!(
            destination_key_prefix("", &name("app"), &chunk),
            "app/2024/03/05"
        );
    }

    #[tokio::test]
    async fn test_submit_passes_destination() {
        let service = Arc::new(InMemoryExportService::new());
        let client = client(service.clone());
        let chunk = Chunk::new(MARCH_5_2024, MARCH_5_2024 + MILLIS_PER_DAY);

        client.submit(&name("/app"), &chunk).await.unwrap();

        match &service.calls()[0] {
            ServiceCall::Create {
                destination,
                destination_prefix,
                ..
            } => {
                assert_eq!(destination, "log-archive");
                assert_eq!(destination_prefix, "exported-logs/app/2024/03/05");
            }
            other => panic!("Expected Create, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_retries_throttling() {
        let service = Arc::new(InMemoryExportService::new());
        service.throttle_next_creates(3);
        let client = client(service.clone());

        let result = client.submit(&name("/app"), &Chunk::new(0, 10)).await;
        assert!(result.is_ok());
        assert_eq!(service.submitted_chunks().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_throttled_ten_times_fails() {
        let service = Arc::new(InMemoryExportService::new());
        service.throttle_next_creates(10);
        let client = client(service.clone());

        let err = client.submit(&name("/app"), &Chunk::new(0, 10)).await.unwrap_err();
        assert!(err.is_throttling());
        assert_eq!(service.submitted_chunks().len(), 10);
    }

    #[tokio::test]
    async fn test_task_already_active_is_not_retried() {
        let service = Arc::new(InMemoryExportService::new());
        service.reject_next_creates_as_active(1);
        let client = client(service.clone());

        let err = client.submit(&name("/app"), &Chunk::new(0, 10)).await.unwrap_err();
        assert!(matches!(err, ExporterError::TaskAlreadyActive(_)));
        assert_eq!(service.submitted_chunks().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_has_active_task() {
        let service = Arc::new(InMemoryExportService::new());
        let client = client(service.clone());
        assert!(!client.has_active_task().await.unwrap());

        service.throttle_next_list_active(2);
        service.set_external_active(true);
        assert!(client.has_active_task().await.unwrap());
    }

    #[tokio::test]
    async fn test_describe() {
        let service = Arc::new(InMemoryExportService::new());
        service.script_next_task(vec![TaskDescription::new(TaskStatus::Running)]);
        let client = client(service.clone());

        let task_id = client.submit(&name("/app"), &Chunk::new(0, 10)).await.unwrap();
        let description = client.describe(&task_id).await.unwrap();
        assert_eq!(description.status, TaskStatus::Running);
    }
}
