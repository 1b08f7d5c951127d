//! Progress reporting for one workflow run
//!
//! Owns the run's [`ProgressSnapshot`] and persists it after every change.
//! Chunk and milestone notifications are sent from
//! [`ProgressReporter::chunk_completed`], which the workflow calls only once
//! the chunk's watermark is saved. Snapshot writes are informational: a
//! failed write is logged and the export continues.

use crate::adapters::Clock;
use crate::core::export::notify::Notifier;
use crate::core::state::{MilestoneTracker, ProgressSnapshot, ProgressStatus, ProgressStore};
use crate::domain::{Chunk, ExportTask, LogGroupName, TaskId, TaskStatus};
use std::sync::Arc;
use std::time::Duration;

/// Tracks and persists progress of one log group's export
pub struct ProgressReporter {
    log_group: LogGroupName,
    store: ProgressStore,
    notifier: Notifier,
    clock: Arc<dyn Clock>,
    snapshot: Option<ProgressSnapshot>,
    milestones: MilestoneTracker,
}

impl ProgressReporter {
    /// Create a reporter for `log_group`
    pub fn new(
        log_group: LogGroupName,
        store: ProgressStore,
        notifier: Notifier,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            log_group,
            store,
            notifier,
            clock,
            snapshot: None,
            milestones: MilestoneTracker::new(),
        }
    }

    /// Latest snapshot, `None` before [`ProgressReporter::start`]
    pub fn snapshot(&self) -> Option<&ProgressSnapshot> {
        self.snapshot.as_ref()
    }

    /// Persist the STARTING snapshot
    pub async fn start(&mut self, total_chunks: usize, window: Chunk) {
        let now = self.clock.now_millis();
        self.snapshot = Some(ProgressSnapshot::starting(total_chunks, window, now));
        self.persist().await;
    }

    /// A chunk's task was created
    pub async fn chunk_submitted(&mut self, chunk_index: usize, task_id: &TaskId) {
        let now = self.clock.now_millis();
        if let Some(snapshot) = self.snapshot.as_mut() {
            snapshot.chunk_submitted(chunk_index, task_id, now);
        }
        self.persist().await;
    }

    /// A poll observed `status` for the current task
    pub async fn task_observed(&mut self, status: TaskStatus) {
        let now = self.clock.now_millis();
        if let Some(snapshot) = self.snapshot.as_mut() {
            snapshot.task_observed(status, now);
        }
        self.persist().await;
    }

    /// Chunk `chunk_index` is exported and checkpointed
    pub async fn chunk_completed(
        &mut self,
        task: &ExportTask,
        chunk_index: usize,
        took: Duration,
    ) {
        let now = self.clock.now_millis();
        let Some(snapshot) = self.snapshot.as_mut() else {
            return;
        };
        snapshot.chunk_completed(chunk_index, now);
        let total_chunks = snapshot.total_chunks;
        self.persist().await;

        self.notifier
            .chunk_completed(task, chunk_index, total_chunks, took)
            .await;
        self.check_milestone().await;
    }

    /// Persist the COMPLETED snapshot
    pub async fn complete(&mut self) {
        let now = self.clock.now_millis();
        if let Some(snapshot) = self.snapshot.as_mut() {
            snapshot.complete(now);
        }
        self.persist().await;
        self.check_milestone().await;
    }

    /// Persist a FAILED snapshot, if the run got far enough to have one
    pub async fn fail(&mut self, message: &str) {
        let now = self.clock.now_millis();
        if let Some(snapshot) = self.snapshot.as_mut() {
            snapshot.fail(message, now);
            self.persist().await;
        }
    }

    /// Persist a SKIPPED or INTERRUPTED snapshot, if the run has one
    pub async fn stop(&mut self, status: ProgressStatus, message: &str) {
        let now = self.clock.now_millis();
        if let Some(snapshot) = self.snapshot.as_mut() {
            snapshot.stop(status, message, now);
            self.persist().await;
        }
    }

    async fn check_milestone(&mut self) {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return;
        };
        if let Some(milestone) = self.milestones.crossed(snapshot.percentage) {
            tracing::info!(
                log_group = %self.log_group,
                milestone,
                completed_chunks = snapshot.completed_chunks,
                total_chunks = snapshot.total_chunks,
                "Progress milestone reached"
            );
            self.notifier
                .milestone(
                    &self.log_group,
                    milestone,
                    snapshot.completed_chunks,
                    snapshot.total_chunks,
                    snapshot.estimated_remaining_seconds,
                )
                .await;
        }
    }

    async fn persist(&self) {
        let Some(snapshot) = self.snapshot.as_ref() else {
            return;
        };
        if let Err(e) = self.store.save_progress(&self.log_group, snapshot).await {
            tracing::warn!(
                log_group = %self.log_group,
                error = %e,
                "Failed to persist progress snapshot"
            );
        }
    }
}
