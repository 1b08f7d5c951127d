//! Export outcomes and run reporting
//!
//! This module defines the per-log-group outcome, the run aggregate and the
//! JSON payload printed at the end of a run.

use crate::domain::{ErrorKind, ExporterError, LogGroupName};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use uuid::Uuid;

/// How a log group's workflow ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// Every planned chunk was exported
    Completed,
    /// The watermark was already current
    NothingToExport,
    /// Deferred because an export task was already active
    Skipped,
    /// A chunk failed or an error stopped the workflow
    Failed,
    /// Stopped by a shutdown signal
    Interrupted,
    /// Dry run: chunks were planned but not submitted
    Planned,
}

/// Result of one log group's workflow
#[derive(Debug, Clone, Serialize)]
pub struct LogGroupOutcome {
    /// Log group name
    #[serde(skip)]
    pub log_group: LogGroupName,

    /// True for completed, nothing-to-export and planned outcomes
    pub success: bool,

    /// How the workflow ended
    pub status: OutcomeStatus,

    /// Human readable one-line summary
    pub summary: String,

    /// Error classification for failed outcomes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorKind>,

    /// Chunks whose task reached COMPLETED during this run
    pub chunks_exported: usize,

    /// Chunks planned for this run
    pub total_chunks: usize,

    /// Watermark after the run, epoch milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub watermark: Option<i64>,

    /// Wall time spent on this log group
    pub duration_seconds: u64,
}

impl LogGroupOutcome {
    fn new(log_group: &LogGroupName, status: OutcomeStatus, summary: String) -> Self {
        Self {
            log_group: log_group.clone(),
            success: matches!(
                status,
                OutcomeStatus::Completed | OutcomeStatus::NothingToExport | OutcomeStatus::Planned
            ),
            status,
            summary,
            error: None,
            chunks_exported: 0,
            total_chunks: 0,
            watermark: None,
            duration_seconds: 0,
        }
    }

    /// All chunks exported
    pub fn completed(log_group: &LogGroupName, total_chunks: usize, watermark: i64) -> Self {
        let mut outcome = Self::new(
            log_group,
            OutcomeStatus::Completed,
            format!("Exported {total_chunks} chunk(s)"),
        );
        outcome.chunks_exported = total_chunks;
        outcome.total_chunks = total_chunks;
        outcome.watermark = Some(watermark);
        outcome
    }

    /// Watermark already at the current time
    pub fn nothing_to_export(log_group: &LogGroupName, watermark: i64) -> Self {
        let mut outcome = Self::new(
            log_group,
            OutcomeStatus::NothingToExport,
            "Nothing to export".to_string(),
        );
        outcome.watermark = Some(watermark);
        outcome
    }

    /// Deferred to the next run
    pub fn skipped(log_group: &LogGroupName, reason: impl Into<String>) -> Self {
        let mut outcome = Self::new(
            log_group,
            OutcomeStatus::Skipped,
            format!("Skipped: {}", reason.into()),
        );
        outcome.error = Some(ErrorKind::TaskAlreadyActive);
        outcome
    }

    /// Stopped by an error
    pub fn failed(log_group: &LogGroupName, stage: &str, error: &ExporterError) -> Self {
        let mut outcome = Self::new(
            log_group,
            OutcomeStatus::Failed,
            format!("Failed during {stage}: {error}"),
        );
        outcome.error = Some(error.kind());
        outcome
    }

    /// Stopped by a shutdown signal
    pub fn interrupted(log_group: &LogGroupName) -> Self {
        let mut outcome = Self::new(
            log_group,
            OutcomeStatus::Interrupted,
            "Interrupted before completion".to_string(),
        );
        outcome.error = Some(ErrorKind::Interrupted);
        outcome
    }

    /// Dry run plan
    pub fn planned(log_group: &LogGroupName, total_chunks: usize, watermark: i64) -> Self {
        let mut outcome = Self::new(
            log_group,
            OutcomeStatus::Planned,
            format!("Dry run: {total_chunks} chunk(s) planned"),
        );
        outcome.total_chunks = total_chunks;
        outcome.watermark = Some(watermark);
        outcome
    }

    /// Record chunk progress
    pub fn with_progress(mut self, chunks_exported: usize, total_chunks: usize) -> Self {
        self.chunks_exported = chunks_exported;
        self.total_chunks = total_chunks;
        self
    }

    /// Record the watermark after the run
    pub fn with_watermark(mut self, watermark: Option<i64>) -> Self {
        self.watermark = watermark;
        self
    }

    /// Record the wall time spent
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_seconds = duration.as_secs();
        self
    }
}

/// Aggregate of one orchestrator invocation
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Unique ID of this run, for correlating logs
    pub run_id: Uuid,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// Wall time of the whole run
    pub duration: Duration,

    /// Outcome per log group, keyed by name
    pub outcomes: BTreeMap<String, LogGroupOutcome>,
}

impl RunResult {
    /// Create an empty result
    pub fn new(run_id: Uuid, started_at: DateTime<Utc>) -> Self {
        Self {
            run_id,
            started_at,
            duration: Duration::ZERO,
            outcomes: BTreeMap::new(),
        }
    }

    /// Add a log group outcome
    pub fn record(&mut self, outcome: LogGroupOutcome) {
        self.outcomes
            .insert(outcome.log_group.as_str().to_string(), outcome);
    }

    /// Number of successful log groups
    pub fn succeeded(&self) -> usize {
        self.outcomes.values().filter(|o| o.success).count()
    }

    /// Number of unsuccessful log groups
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// True when no log group failed outright
    ///
    /// Skipped log groups are deferred, not failed.
    pub fn is_successful(&self) -> bool {
        self.outcomes
            .values()
            .all(|o| o.status != OutcomeStatus::Failed)
    }

    /// True when any log group stopped on a shutdown signal
    pub fn was_interrupted(&self) -> bool {
        self.outcomes
            .values()
            .any(|o| o.status == OutcomeStatus::Interrupted)
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            run_id = %self.run_id,
            log_groups = self.outcomes.len(),
            succeeded = self.succeeded(),
            failed = self.failed(),
            duration_secs = self.duration.as_secs(),
            "Export run completed"
        );

        for (name, outcome) in &self.outcomes {
            if outcome.status == OutcomeStatus::Failed {
                tracing::warn!(
                    log_group = %name,
                    error_kind = ?outcome.error,
                    summary = %outcome.summary,
                    "Log group export failed"
                );
            }
        }
    }
}

/// Payload printed at the end of an invocation
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum RunResponse {
    /// The run completed, possibly with failed log groups
    Success {
        run_id: Uuid,
        results: BTreeMap<String, LogGroupOutcome>,
    },
    /// The run could not start or discovery failed
    Error { message: String, error: ErrorKind },
}

impl RunResponse {
    /// Payload for a top-level failure
    pub fn from_error(error: &ExporterError) -> Self {
        RunResponse::Error {
            message: error.to_string(),
            error: error.kind(),
        }
    }

    /// Render as pretty JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            format!(r#"{{"status":"error","message":"failed to render result: {e}"}}"#)
        })
    }
}

impl From<RunResult> for RunResponse {
    fn from(result: RunResult) -> Self {
        RunResponse::Success {
            run_id: result.run_id,
            results: result.outcomes,
        }
    }
}
