//! Log group export workflow
//!
//! Exports the window between a log group's watermark and now, one chunk at
//! a time. The watermark advances only after a chunk's task completes, so a
//! failure leaves the failed chunk to be retried by the next run.
//!
//! [`LogGroupWorkflow::run`] never returns an error: every failure becomes a
//! [`LogGroupOutcome`] so one log group cannot take down its siblings.

use crate::adapters::{Clock, LogRegistry};
use crate::core::export::client::ExportTaskClient;
use crate::core::export::notify::Notifier;
use crate::core::export::poller::{TaskOutcome, TaskPoller};
use crate::core::export::reporter::ProgressReporter;
use crate::core::export::summary::LogGroupOutcome;
use crate::core::planner::{plan_chunks, ChunkSizer};
use crate::core::state::{ProgressStatus, ProgressStore};
use crate::domain::{Chunk, ExportTask, ExporterError, LogGroupName, Result};
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;

/// Step of the workflow an error happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ActiveTaskCheck,
    Watermark,
    Submit,
    Poll,
    Checkpoint,
}

impl Stage {
    /// Name used in logs and notifications
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ActiveTaskCheck => "active task check",
            Stage::Watermark => "watermark lookup",
            Stage::Submit => "task submission",
            Stage::Poll => "task polling",
            Stage::Checkpoint => "watermark checkpoint",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An error tagged with the stage it happened in
#[derive(Debug)]
struct StageError {
    stage: Stage,
    error: ExporterError,
}

trait AtStage<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, StageError>;
}

impl<T> AtStage<T> for Result<T> {
    fn at(self, stage: Stage) -> std::result::Result<T, StageError> {
        self.map_err(|error| StageError { stage, error })
    }
}

/// Collaborators shared by every workflow run
#[derive(Clone)]
pub struct LogGroupWorkflow {
    registry: Arc<dyn LogRegistry>,
    client: ExportTaskClient,
    poller: TaskPoller,
    store: ProgressStore,
    notifier: Notifier,
    sizer: ChunkSizer,
    clock: Arc<dyn Clock>,
    shutdown: watch::Receiver<bool>,
}

impl LogGroupWorkflow {
    /// Create a workflow from its collaborators
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<dyn LogRegistry>,
        client: ExportTaskClient,
        poller: TaskPoller,
        store: ProgressStore,
        notifier: Notifier,
        sizer: ChunkSizer,
        clock: Arc<dyn Clock>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            registry,
            client,
            poller,
            store,
            notifier,
            sizer,
            clock,
            shutdown,
        }
    }

    /// Export everything accumulated since the log group's watermark
    pub async fn run(&self, log_group: &LogGroupName) -> LogGroupOutcome {
        let started = Instant::now();
        let mut reporter = ProgressReporter::new(
            log_group.clone(),
            self.store.clone(),
            self.notifier.clone(),
            self.clock.clone(),
        );

        let outcome = match self.try_run(log_group, &mut reporter, started).await {
            Ok(outcome) => outcome,
            Err(StageError { stage, error }) => {
                tracing::error!(
                    log_group = %log_group,
                    stage = %stage,
                    error = %error,
                    "Log group export failed"
                );
                reporter.fail(&format!("{stage}: {error}")).await;
                self.notifier
                    .failed(log_group, stage.as_str(), &error.to_string())
                    .await;

                let (exported, total) = reporter
                    .snapshot()
                    .map(|s| (s.completed_chunks, s.total_chunks))
                    .unwrap_or_default();
                LogGroupOutcome::failed(log_group, stage.as_str(), &error)
                    .with_progress(exported, total)
            }
        };

        outcome.with_duration(started.elapsed())
    }

    /// Plan the chunks a run would export, without submitting or writing
    pub async fn plan(&self, log_group: &LogGroupName) -> Result<(i64, Vec<Chunk>)> {
        let watermark = self.resolve_watermark(log_group).await?;
        let chunk_size = self
            .sizer
            .chunk_size_for(self.registry.as_ref(), log_group)
            .await;
        let now = self.clock.now_millis();
        Ok((watermark, plan_chunks(watermark, now, chunk_size)))
    }

    async fn try_run(
        &self,
        log_group: &LogGroupName,
        reporter: &mut ProgressReporter,
        started: Instant,
    ) -> std::result::Result<LogGroupOutcome, StageError> {
        let mut shutdown = self.shutdown.clone();
        if *shutdown.borrow() {
            return Ok(LogGroupOutcome::interrupted(log_group));
        }

        if self.client.has_active_task().await.at(Stage::ActiveTaskCheck)? {
            return Ok(self.skip(log_group, reporter, 0, 0, None).await);
        }

        let watermark = self
            .resolve_watermark(log_group)
            .await
            .at(Stage::Watermark)?;
        let chunk_size = self
            .sizer
            .chunk_size_for(self.registry.as_ref(), log_group)
            .await;
        let now = self.clock.now_millis();
        let chunks = plan_chunks(watermark, now, chunk_size);

        if chunks.is_empty() {
            tracing::info!(
                log_group = %log_group,
                watermark,
                "Watermark is current, nothing to export"
            );
            return Ok(LogGroupOutcome::nothing_to_export(log_group, watermark));
        }

        let total = chunks.len();
        let window = Chunk::new(watermark, now);
        tracing::info!(
            log_group = %log_group,
            total_chunks = total,
            chunk_days = chunk_size as f64 / crate::domain::MILLIS_PER_DAY as f64,
            window = %window,
            "Planned export"
        );
        reporter.start(total, window).await;

        let mut current_watermark = watermark;
        for (offset, chunk) in chunks.iter().enumerate() {
            let index = offset + 1;

            if *shutdown.borrow() {
                tracing::warn!(
                    log_group = %log_group,
                    chunk = index,
                    "Shutdown requested, stopping before next chunk"
                );
                return Ok(self
                    .interrupt(log_group, reporter, offset, total, current_watermark)
                    .await);
            }

            // Another worker may have taken the export slot since the last check
            if self.client.has_active_task().await.at(Stage::ActiveTaskCheck)? {
                return Ok(self
                    .skip(log_group, reporter, offset, total, Some(current_watermark))
                    .await);
            }

            crate::log_chunk_start!(log_group, index, total, chunk);
            let chunk_started = Instant::now();

            let task_id = match self.client.submit(log_group, chunk).await {
                Ok(task_id) => task_id,
                Err(ExporterError::TaskAlreadyActive(message)) => {
                    tracing::info!(
                        log_group = %log_group,
                        chunk = index,
                        message = %message,
                        "Export slot taken between check and submit"
                    );
                    return Ok(self
                        .skip(log_group, reporter, offset, total, Some(current_watermark))
                        .await);
                }
                Err(e) => return Err(e).at(Stage::Submit),
            };
            reporter.chunk_submitted(index, &task_id).await;
            let mut task = ExportTask::submitted(task_id, log_group.clone(), *chunk);

            let outcome = self
                .poller
                .drive(&mut task, index, total, reporter, &mut shutdown)
                .await;

            match outcome {
                TaskOutcome::Completed => {
                    self.store
                        .save_watermark(log_group, chunk.to)
                        .await
                        .at(Stage::Checkpoint)?;
                    current_watermark = chunk.to;
                    let took = chunk_started.elapsed();
                    crate::log_chunk_complete!(log_group, task.task_id, index, total, took);
                    reporter.chunk_completed(&task, index, took).await;
                }
                TaskOutcome::Interrupted => {
                    return Ok(self
                        .interrupt(log_group, reporter, offset, total, current_watermark)
                        .await);
                }
                failed @ (TaskOutcome::Failed { .. } | TaskOutcome::TimedOut) => {
                    let error = ExporterError::TaskFailed {
                        task_id: task.task_id.to_string(),
                        status: match &failed {
                            TaskOutcome::Failed { status, .. } => status.to_string(),
                            _ => "TIMEOUT".to_string(),
                        },
                        message: failed.describe(),
                    };
                    return Err(error).at(Stage::Poll);
                }
            }
        }

        reporter.complete().await;
        self.notifier
            .completed(log_group, total, window, started.elapsed())
            .await;

        Ok(LogGroupOutcome::completed(log_group, total, current_watermark))
    }

    /// Watermark from the store, seeded from the creation time on first export
    async fn resolve_watermark(&self, log_group: &LogGroupName) -> Result<i64> {
        if let Some(watermark) = self.store.load_watermark(log_group).await? {
            return Ok(watermark);
        }

        let created = self.registry.get_creation_time(log_group).await?;
        tracing::info!(
            log_group = %log_group,
            creation_time = created,
            "No watermark stored, starting from log group creation"
        );
        Ok(created)
    }

    async fn skip(
        &self,
        log_group: &LogGroupName,
        reporter: &mut ProgressReporter,
        exported: usize,
        total: usize,
        watermark: Option<i64>,
    ) -> LogGroupOutcome {
        let reason = "another export task is already active";
        tracing::info!(log_group = %log_group, chunks_exported = exported, "Skipping: {}", reason);
        reporter.stop(ProgressStatus::Skipped, reason).await;
        self.notifier.skipped(log_group, reason).await;
        LogGroupOutcome::skipped(log_group, reason)
            .with_progress(exported, total)
            .with_watermark(watermark)
    }

    async fn interrupt(
        &self,
        log_group: &LogGroupName,
        reporter: &mut ProgressReporter,
        exported: usize,
        total: usize,
        watermark: i64,
    ) -> LogGroupOutcome {
        reporter
            .stop(ProgressStatus::Interrupted, "interrupted by shutdown")
            .await;
        LogGroupOutcome::interrupted(log_group)
            .with_progress(exported, total)
            .with_watermark(Some(watermark))
    }
}

