//! Progress snapshots and milestone tracking

use crate::domain::{Chunk, TaskId, TaskStatus};
use serde::{Deserialize, Serialize};

/// Percentages at which a milestone notification is sent
pub const MILESTONES: [u8; 4] = [25, 50, 75, 100];

/// Workflow status recorded in a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressStatus {
    /// Chunks planned, nothing submitted yet
    Starting,
    /// A chunk is being exported
    InProgress,
    /// Every chunk was exported
    Completed,
    /// A chunk failed or an unexpected error stopped the workflow
    Failed,
    /// Another export task held the slot, the rest is left for the next run
    Skipped,
    /// Stopped by a shutdown signal or the invocation deadline
    Interrupted,
}

impl Default for ProgressStatus {
    fn default() -> Self {
        Self::Starting
    }
}

/// Latest known progress of one log group's export
///
/// Persisted with overwrite semantics; only the most recent snapshot is kept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Workflow status
    pub status: ProgressStatus,

    /// 1-based index of the chunk being exported, 0 before the first submit
    pub current_chunk: usize,

    /// Number of planned chunks
    pub total_chunks: usize,

    /// Number of chunks exported and checkpointed
    #[serde(default)]
    pub completed_chunks: usize,

    /// Start of the export window, epoch milliseconds
    pub start_time: i64,

    /// End of the export window, epoch milliseconds
    pub end_time: i64,

    /// Wall-clock time the workflow started, epoch milliseconds
    pub started_at: i64,

    /// Wall-clock time of this snapshot, epoch milliseconds
    pub last_updated: i64,

    /// Completed chunks as a share of the total, 0 to 100
    pub percentage: f64,

    /// Seconds since the workflow started
    pub elapsed_seconds: i64,

    /// Linear extrapolation of the remaining time
    pub estimated_remaining_seconds: Option<i64>,

    /// Task exporting the current chunk
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,

    /// Last observed status of that task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_status: Option<TaskStatus>,

    /// Failure context
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProgressSnapshot {
    /// Snapshot for a freshly planned export of `window`
    pub fn starting(total_chunks: usize, window: Chunk, now: i64) -> Self {
        Self {
            status: ProgressStatus::Starting,
            current_chunk: 0,
            total_chunks,
            completed_chunks: 0,
            start_time: window.from,
            end_time: window.to,
            started_at: now,
            last_updated: now,
            percentage: 0.0,
            elapsed_seconds: 0,
            estimated_remaining_seconds: None,
            task_id: None,
            task_status: None,
            message: None,
        }
    }

    /// Record that chunk `current_chunk` is being exported by `task_id`
    pub fn chunk_submitted(&mut self, current_chunk: usize, task_id: &TaskId, now: i64) {
        self.status = ProgressStatus::InProgress;
        self.current_chunk = current_chunk;
        self.task_id = Some(task_id.clone());
        self.task_status = Some(TaskStatus::Pending);
        self.touch(now);
    }

    /// Record a status observed while polling the current task
    pub fn task_observed(&mut self, status: TaskStatus, now: i64) {
        self.task_status = Some(status);
        self.touch(now);
    }

    /// Record that chunk `chunk_index` is exported and its watermark saved
    pub fn chunk_completed(&mut self, chunk_index: usize, now: i64) {
        self.completed_chunks = chunk_index.max(self.completed_chunks);
        self.touch(now);
    }

    /// Mark every chunk done
    pub fn complete(&mut self, now: i64) {
        self.status = ProgressStatus::Completed;
        self.completed_chunks = self.total_chunks;
        self.message = None;
        self.touch(now);
    }

    /// Mark the workflow failed
    pub fn fail(&mut self, message: impl Into<String>, now: i64) {
        self.status = ProgressStatus::Failed;
        self.message = Some(message.into());
        self.touch(now);
    }

    /// Mark the workflow stopped before the last chunk without failing
    ///
    /// `status` should be [`ProgressStatus::Skipped`] or
    /// [`ProgressStatus::Interrupted`].
    pub fn stop(&mut self, status: ProgressStatus, message: impl Into<String>, now: i64) {
        self.status = status;
        self.message = Some(message.into());
        self.touch(now);
    }

    /// Recompute the derived fields at `now`
    fn touch(&mut self, now: i64) {
        self.last_updated = now;
        self.elapsed_seconds = (now - self.started_at).max(0) / 1000;
        self.percentage = if self.total_chunks == 0 {
            100.0
        } else {
            self.completed_chunks as f64 / self.total_chunks as f64 * 100.0
        };
        self.estimated_remaining_seconds = estimate_remaining(self.elapsed_seconds, self.percentage);
    }
}

/// Remaining seconds if progress continues at the observed rate
fn estimate_remaining(elapsed_seconds: i64, percentage: f64) -> Option<i64> {
    if percentage >= 100.0 {
        Some(0)
    } else if percentage > 0.0 {
        let remaining = elapsed_seconds as f64 / percentage * (100.0 - percentage);
        Some(remaining.round() as i64)
    } else {
        None
    }
}

/// Remembers the last milestone notified so each fires at most once
#[derive(Debug, Clone, Default)]
pub struct MilestoneTracker {
    last_notified: u8,
}

impl MilestoneTracker {
    /// Create a tracker with no milestone reached
    pub fn new() -> Self {
        Self::default()
    }

    /// Highest milestone newly reached at `percentage`, if any
    ///
    /// Skipped milestones are not reported separately: jumping from 20% to
    /// 80% yields only 75.
    pub fn crossed(&mut self, percentage: f64) -> Option<u8> {
        let reached = MILESTONES
            .iter()
            .rev()
            .copied()
            .find(|m| percentage + 1e-9 >= f64::from(*m))?;

        if reached > self.last_notified {
            self.last_notified = reached;
            Some(reached)
        } else {
            None
        }
    }
}
