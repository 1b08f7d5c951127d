//! Export orchestrator - main entry point of a run
//!
//! Discovers the log groups tagged for export and runs one
//! [`LogGroupWorkflow`] per log group on a bounded worker pool. The pool
//! width bounds bookkeeping parallelism only: every workflow checks the
//! account-wide export slot before each submit and skips when it is taken.

use crate::adapters::{
    Clock, ExportTaskService, LogRegistry, NotificationSink, ParameterStore, SystemClock,
};
use crate::config::ExporterConfig;
use crate::core::export::client::ExportTaskClient;
use crate::core::export::notify::Notifier;
use crate::core::export::poller::{shutdown_requested, TaskPoller};
use crate::core::export::summary::{LogGroupOutcome, RunResult};
use crate::core::export::workflow::LogGroupWorkflow;
use crate::core::planner::ChunkSizer;
use crate::core::retry::RetryPolicy;
use crate::core::state::ProgressStore;
use crate::domain::{ExporterError, LogGroupName, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use tokio::time::Instant;
use uuid::Uuid;

/// External systems the orchestrator is built from
#[derive(Clone)]
pub struct Collaborators {
    pub registry: Arc<dyn LogRegistry>,
    pub export_service: Arc<dyn ExportTaskService>,
    pub parameter_store: Arc<dyn ParameterStore>,
    pub notification_sink: Option<Arc<dyn NotificationSink>>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    /// Collaborators using the system clock
    pub fn new(
        registry: Arc<dyn LogRegistry>,
        export_service: Arc<dyn ExportTaskService>,
        parameter_store: Arc<dyn ParameterStore>,
        notification_sink: Option<Arc<dyn NotificationSink>>,
    ) -> Self {
        Self {
            registry,
            export_service,
            parameter_store,
            notification_sink,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Tag key/value pair a log group must carry to be exported
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    pub key: String,
    pub value: String,
}

impl TagFilter {
    /// Create a filter
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// True when `tags` contain the key with the expected value
    pub fn matches(&self, tags: &HashMap<String, String>) -> bool {
        tags.get(&self.key).is_some_and(|v| v == &self.value)
    }
}

/// Export orchestrator
pub struct ExportOrchestrator {
    registry: Arc<dyn LogRegistry>,
    workflow: LogGroupWorkflow,
    notifier: Notifier,
    retry: RetryPolicy,
    filter: TagFilter,
    pool_width: usize,
    dry_run: bool,
    shutdown: watch::Receiver<bool>,
}

impl ExportOrchestrator {
    /// Create an orchestrator from configuration and collaborators
    ///
    /// # Errors
    ///
    /// Returns [`ExporterError::MissingField`] when the destination bucket or
    /// notification topic is not configured.
    pub fn new(
        config: &ExporterConfig,
        collaborators: Collaborators,
        shutdown: watch::Receiver<bool>,
    ) -> Result<Self> {
        config.require_run_fields()?;
        let destination = config
            .export
            .destination_bucket
            .clone()
            .ok_or_else(|| ExporterError::MissingField(vec!["destination_bucket".to_string()]))?;

        let retry = RetryPolicy::from_config(&config.retry);
        let notifier = match collaborators.notification_sink {
            Some(sink) => Notifier::new(sink),
            None => Notifier::disabled(),
        };
        let client = ExportTaskClient::new(
            collaborators.export_service,
            retry,
            destination,
            config.export.destination_prefix.clone(),
        );
        let poller = TaskPoller::new(client.clone(), &config.polling);
        let store = ProgressStore::new(
            collaborators.parameter_store,
            config.export.parameter_prefix.clone(),
        );
        let sizer = ChunkSizer::new(config.chunking.clone(), config.export.chunk_size_millis());

        let workflow = LogGroupWorkflow::new(
            collaborators.registry.clone(),
            client,
            poller,
            store,
            notifier.clone(),
            sizer,
            collaborators.clock,
            shutdown.clone(),
        );

        Ok(Self {
            registry: collaborators.registry,
            workflow,
            notifier,
            retry,
            filter: TagFilter::new(&config.export.tag_key, &config.export.tag_value),
            pool_width: config.export.pool_width.max(1),
            dry_run: config.application.dry_run,
            shutdown,
        })
    }

    /// Discover the log groups carrying the export tag
    ///
    /// A log group whose tags cannot be read is logged and excluded.
    ///
    /// # Errors
    ///
    /// Returns an error if listing log groups fails after retries.
    pub async fn discover(&self) -> Result<Vec<LogGroupName>> {
        let mut matching = Vec::new();
        let mut page_token: Option<String> = None;
        let mut scanned = 0usize;

        loop {
            let token = page_token.take();
            let page = self
                .retry
                .run("DescribeLogGroups", || {
                    self.registry.list_log_groups(token.clone())
                })
                .await?;

            for log_group in page.log_groups {
                scanned += 1;
                let tags = self
                    .retry
                    .run("ListTagsForResource", || self.registry.get_tags(&log_group.name))
                    .await;
                match tags {
                    Ok(tags) if self.filter.matches(&tags) => matching.push(log_group.name),
                    Ok(_) => {}
                    Err(e) => tracing::warn!(
                        log_group = %log_group.name,
                        error = %e,
                        "Could not read tags, excluding log group"
                    ),
                }
            }

            match page.next_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::info!(
            scanned,
            matching = matching.len(),
            tag_key = %self.filter.key,
            tag_value = %self.filter.value,
            "Discovered log groups"
        );
        Ok(matching)
    }

    /// Export every tagged log group
    ///
    /// Individual log group failures are reported in the result; only a
    /// discovery failure is returned as an error.
    pub async fn run_all(&self) -> Result<RunResult> {
        let run_id = Uuid::new_v4();
        let started = Instant::now();
        let mut result = RunResult::new(run_id, Utc::now());

        tracing::info!(
            run_id = %run_id,
            pool_width = self.pool_width,
            dry_run = self.dry_run,
            "Starting export run"
        );

        let log_groups = self.discover().await?;

        if self.dry_run {
            for log_group in &log_groups {
                result.record(self.plan_only(log_group).await);
            }
            result.duration = started.elapsed();
            result.log_summary();
            return Ok(result);
        }

        let semaphore = Arc::new(Semaphore::new(self.pool_width));
        let mut join_set = JoinSet::new();
        let mut started_groups = Vec::new();
        let mut shutdown = self.shutdown.clone();
        let mut pending = log_groups.into_iter();

        while let Some(log_group) = pending.next() {
            let permit = tokio::select! {
                permit = semaphore.clone().acquire_owned() => permit
                    .map_err(|e| ExporterError::Other(format!("Worker pool closed: {e}")))?,
                _ = shutdown_requested(&mut shutdown) => {
                    tracing::warn!("Shutdown requested, not starting remaining log groups");
                    result.record(LogGroupOutcome::interrupted(&log_group));
                    for rest in pending.by_ref() {
                        result.record(LogGroupOutcome::interrupted(&rest));
                    }
                    break;
                }
            };

            let workflow = self.workflow.clone();
            started_groups.push(log_group.clone());
            join_set.spawn(async move {
                let _permit = permit;
                workflow.run(&log_group).await
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => result.record(outcome),
                Err(e) => tracing::error!(error = %e, "Worker task failed"),
            }
        }

        // A worker that panicked never reported its outcome
        for log_group in started_groups {
            if result.outcomes.contains_key(log_group.as_str()) {
                continue;
            }
            let error = ExporterError::Other("worker task ended without an outcome".to_string());
            self.notifier
                .failed(&log_group, "worker", &error.to_string())
                .await;
            result.record(LogGroupOutcome::failed(&log_group, "worker", &error));
        }

        result.duration = started.elapsed();
        result.log_summary();
        self.notifier.run_summary(&result).await;

        Ok(result)
    }

    async fn plan_only(&self, log_group: &LogGroupName) -> LogGroupOutcome {
        match self.workflow.plan(log_group).await {
            Ok((watermark, chunks)) => {
                for (offset, chunk) in chunks.iter().enumerate() {
                    tracing::info!(
                        log_group = %log_group,
                        chunk = offset + 1,
                        total_chunks = chunks.len(),
                        window = %chunk,
                        "Dry run: would export chunk"
                    );
                }
                LogGroupOutcome::planned(log_group, chunks.len(), watermark)
            }
            Err(e) => {
                tracing::warn!(log_group = %log_group, error = %e, "Dry run: planning failed");
                LogGroupOutcome::failed(log_group, "chunk planning", &e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_filter() {
        let filter = TagFilter::new("ExportToS3", "true");
        let mut tags = HashMap::new();
        assert!(!filter.matches(&tags));

        tags.insert("ExportToS3".to_string(), "false".to_string());
        assert!(!filter.matches(&tags));

        tags.insert("ExportToS3".to_string(), "true".to_string());
        assert!(filter.matches(&tags));
    }
}
