//! Notification messages
//!
//! Publishing is fire-and-forget: a failed publish is logged and the export
//! carries on.

use crate::adapters::NotificationSink;
use crate::core::export::summary::RunResult;
use crate::domain::{millis_to_datetime, Chunk, ExportTask, LogGroupName};
use std::sync::Arc;
use std::time::Duration;

/// Formats and sends exporter notifications
#[derive(Clone, Default)]
pub struct Notifier {
    sink: Option<Arc<dyn NotificationSink>>,
}

impl Notifier {
    /// Notifier publishing to `sink`
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// Notifier that only logs
    pub fn disabled() -> Self {
        Self { sink: None }
    }

    /// Publish a message, logging instead of failing
    pub async fn send(&self, subject: &str, body: &str) {
        let Some(sink) = &self.sink else {
            tracing::debug!(subject = %subject, "Notifications disabled, not sending");
            return;
        };

        match sink.publish(subject, body).await {
            Ok(()) => tracing::debug!(subject = %subject, "Notification sent"),
            Err(e) => tracing::warn!(subject = %subject, error = %e, "Failed to send notification"),
        }
    }

    /// The workflow skipped a log group because an export task is running
    pub async fn skipped(&self, log_group: &LogGroupName, reason: &str) {
        let subject = format!("Log export skipped: {log_group}");
        let body = format!(
            "Export of log group {log_group} was skipped: {reason}.\n\
             It will be picked up again on the next scheduled run."
        );
        self.send(&subject, &body).await;
    }

    /// A progress milestone was reached
    pub async fn milestone(
        &self,
        log_group: &LogGroupName,
        milestone: u8,
        completed_chunks: usize,
        total_chunks: usize,
        estimated_remaining_seconds: Option<i64>,
    ) {
        let subject = format!("Log export {milestone}% complete: {log_group}");
        let remaining = estimated_remaining_seconds
            .map(|s| format_duration(Duration::from_secs(s.max(0) as u64)))
            .unwrap_or_else(|| "unknown".to_string());
        let body = format!(
            "Log group: {log_group}\n\
             Progress: {completed_chunks}/{total_chunks} chunks ({milestone}%)\n\
             Estimated time remaining: {remaining}"
        );
        self.send(&subject, &body).await;
    }

    /// One chunk's task completed and its watermark was saved
    pub async fn chunk_completed(
        &self,
        task: &ExportTask,
        chunk_index: usize,
        total_chunks: usize,
        took: Duration,
    ) {
        let subject = format!(
            "Log export chunk {chunk_index}/{total_chunks} completed: {}",
            task.log_group
        );
        let body = format!(
            "Log group: {}\n\
             Task ID: {}\n\
             Time range: {} to {}\n\
             Duration: {}",
            task.log_group,
            task.task_id,
            format_millis(task.chunk.from),
            format_millis(task.chunk.to),
            format_duration(took),
        );
        self.send(&subject, &body).await;
    }

    /// Every chunk of a log group was exported
    pub async fn completed(
        &self,
        log_group: &LogGroupName,
        total_chunks: usize,
        window: Chunk,
        duration: Duration,
    ) {
        let average = if total_chunks > 0 {
            duration.div_f64(total_chunks as f64)
        } else {
            Duration::ZERO
        };
        let subject = format!("Log export completed: {log_group}");
        let body = format!(
            "Log group: {log_group}\n\
             Chunks exported: {total_chunks}\n\
             Time range: {} to {}\n\
             Duration: {}\n\
             Average per chunk: {}",
            format_millis(window.from),
            format_millis(window.to),
            format_duration(duration),
            format_duration(average),
        );
        self.send(&subject, &body).await;
    }

    /// A log group's export failed
    pub async fn failed(&self, log_group: &LogGroupName, stage: &str, message: &str) {
        let subject = format!("Log export failed: {log_group}");
        let body = format!(
            "Log group: {log_group}\n\
             Stage: {stage}\n\
             Error: {message}\n\
             The watermark was not advanced past the failed chunk; it will be retried on the next run."
        );
        self.send(&subject, &body).await;
    }

    /// Run-level summary after all workers joined
    pub async fn run_summary(&self, result: &RunResult) {
        let subject = format!(
            "Log export run finished: {} succeeded, {} failed",
            result.succeeded(),
            result.failed()
        );
        let mut body = format!(
            "Run ID: {}\nLog groups: {}\nSucceeded: {}\nFailed: {}\n\n",
            result.run_id,
            result.outcomes.len(),
            result.succeeded(),
            result.failed()
        );
        for (name, outcome) in &result.outcomes {
            body.push_str(&format!("{name}: {}\n", outcome.summary));
        }
        self.send(&subject, &body).await;
    }
}

fn format_millis(millis: i64) -> String {
    millis_to_datetime(millis)
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string()
}

/// `1h 02m 03s` style duration
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{hours}h {minutes:02}m {seconds:02}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds:02}s")
    } else {
        format!("{seconds}s")
    }
}
