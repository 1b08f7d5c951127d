//! Export task poller
//!
//! Drives one task from submission to a terminal status. The task is
//! described immediately and then every poll interval. Progress is recorded
//! when the status changes or the heartbeat interval has passed. Transient
//! describe errors are logged and polling continues; only a terminal status,
//! the wait ceiling or a shutdown signal end the loop.

use crate::config::PollingConfig;
use crate::core::export::client::ExportTaskClient;
use crate::core::export::reporter::ProgressReporter;
use crate::domain::{ExportTask, TaskStatus};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// How a polled task ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The task reached COMPLETED
    Completed,
    /// The task reached FAILED, CANCELLED or TIMEOUT
    Failed {
        status: TaskStatus,
        message: Option<String>,
    },
    /// The task was still running when the wait ceiling passed
    TimedOut,
    /// A shutdown signal arrived while waiting
    Interrupted,
}

impl TaskOutcome {
    /// True only for [`TaskOutcome::Completed`]
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Completed)
    }

    /// Human readable description of a non-successful outcome
    pub fn describe(&self) -> String {
        match self {
            TaskOutcome::Completed => "completed".to_string(),
            TaskOutcome::Failed {
                status,
                message: Some(message),
            } => format!("task ended as {status}: {message}"),
            TaskOutcome::Failed {
                status,
                message: None,
            } => format!("task ended as {status}"),
            TaskOutcome::TimedOut => "task did not finish within the wait ceiling".to_string(),
            TaskOutcome::Interrupted => "interrupted by shutdown".to_string(),
        }
    }
}

/// Polls export tasks until they finish
#[derive(Clone)]
pub struct TaskPoller {
    client: ExportTaskClient,
    interval: Duration,
    max_wait: Duration,
    heartbeat: Duration,
}

impl TaskPoller {
    /// Create a poller using the `[polling]` settings
    pub fn new(client: ExportTaskClient, config: &PollingConfig) -> Self {
        Self {
            client,
            interval: config.interval(),
            max_wait: config.max_wait(),
            heartbeat: config.heartbeat(),
        }
    }

    /// Poll `task` until it reaches a terminal status
    ///
    /// The task's status and message are updated from every successful
    /// describe.
    pub async fn drive(
        &self,
        task: &mut ExportTask,
        chunk_index: usize,
        total_chunks: usize,
        reporter: &mut ProgressReporter,
        shutdown: &mut watch::Receiver<bool>,
    ) -> TaskOutcome {
        let started = Instant::now();
        let mut observed = false;
        let mut last_emitted = Instant::now();

        loop {
            match self.client.describe(&task.task_id).await {
                Ok(description) => {
                    let changed = task.observe(description) || !observed;
                    observed = true;
                    if changed || last_emitted.elapsed() >= self.heartbeat {
                        tracing::debug!(
                            log_group = %task.log_group,
                            task_id = %task.task_id,
                            chunk = chunk_index,
                            total_chunks,
                            status = %task.status,
                            elapsed_secs = started.elapsed().as_secs(),
                            "Export task status"
                        );
                        reporter.task_observed(task.status).await;
                        last_emitted = Instant::now();
                    }

                    match task.status {
                        TaskStatus::Completed => return TaskOutcome::Completed,
                        TaskStatus::Failed | TaskStatus::Cancelled | TaskStatus::Timeout => {
                            tracing::warn!(
                                log_group = %task.log_group,
                                task_id = %task.task_id,
                                chunk = chunk_index,
                                status = %task.status,
                                message = task.message.as_deref().unwrap_or(""),
                                "Export task did not complete"
                            );
                            return TaskOutcome::Failed {
                                status: task.status,
                                message: task.message.clone(),
                            };
                        }
                        TaskStatus::Pending | TaskStatus::Running => {}
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        log_group = %task.log_group,
                        task_id = %task.task_id,
                        error = %e,
                        "Failed to describe export task, will poll again"
                    );
                }
            }

            if started.elapsed() >= self.max_wait {
                tracing::error!(
                    log_group = %task.log_group,
                    task_id = %task.task_id,
                    chunk = chunk_index,
                    waited_secs = started.elapsed().as_secs(),
                    "Export task exceeded the maximum wait"
                );
                return TaskOutcome::TimedOut;
            }

            if wait_or_shutdown(self.interval, shutdown).await {
                tracing::warn!(
                    log_group = %task.log_group,
                    task_id = %task.task_id,
                    "Shutdown requested while polling export task"
                );
                return TaskOutcome::Interrupted;
            }
        }
    }
}

/// Sleep for `duration`; returns true if a shutdown was signalled instead
pub(crate) async fn wait_or_shutdown(
    duration: Duration,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    if *shutdown.borrow() {
        return true;
    }

    let sleep = tokio::time::sleep(duration);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            changed = shutdown.changed() => match changed {
                Ok(()) if *shutdown.borrow() => return true,
                Ok(()) => continue,
                // Sender gone: no signal can arrive any more
                Err(_) => {
                    sleep.await;
                    return false;
                }
            },
        }
    }
}

/// Resolves once a shutdown is signalled; never resolves if the sender is gone
pub(crate) async fn shutdown_requested(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        if shutdown.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryExportService, InMemoryParameterStore, RecordingNotificationSink, ServiceCall,
    };
    use crate::adapters::Clock;
    use crate::core::export::notify::Notifier;
    use crate::core::retry::RetryPolicy;
    use crate::core::state::{ProgressSnapshot, ProgressStore};
    use crate::domain::{Chunk, LogGroupName, TaskDescription};
    use std::sync::Arc;

    const PROGRESS_KEY: &str = "/log-exports/app/progress";

    /// Clock following tokio time, so paused tests see it move
    struct TokioClock {
        base: Instant,
    }

    impl Clock for TokioClock {
        fn now_millis(&self) -> i64 {
            self.base.elapsed().as_millis() as i64
        }
    }

    struct Fixture {
        service: Arc<InMemoryExportService>,
        params: Arc<InMemoryParameterStore>,
        poller: TaskPoller,
        reporter: ProgressReporter,
        log_group: LogGroupName,
    }

    fn fixture(config: PollingConfig) -> Fixture {
        let service = Arc::new(InMemoryExportService::new());
        let params = Arc::new(InMemoryParameterStore::new());
        let client = ExportTaskClient::new(
            service.clone(),
            RetryPolicy::default(),
            "bucket",
            "exported-logs",
        );
        let log_group = LogGroupName::new("/app").unwrap();
        let reporter = ProgressReporter::new(
            log_group.clone(),
            ProgressStore::new(params.clone(), "/log-exports"),
            Notifier::new(Arc::new(RecordingNotificationSink::new())),
            Arc::new(TokioClock {
                base: Instant::now(),
            }),
        );
        Fixture {
            service,
            params,
            poller: TaskPoller::new(client, &config),
            reporter,
            log_group,
        }
    }

    async fn submit(f: &Fixture, statuses: Vec<TaskDescription>) -> ExportTask {
        let chunk = Chunk::new(0, 1_000);
        f.service.script_next_task(statuses);
        let task_id = f.poller.client.submit(&f.log_group, &chunk).await.unwrap();
        ExportTask::submitted(task_id, f.log_group.clone(), chunk)
    }

    fn describes(service: &InMemoryExportService) -> usize {
        service
            .calls()
            .iter()
            .filter(|c| matches!(c, ServiceCall::Describe(_)))
            .count()
    }

    fn running(n: usize) -> Vec<TaskDescription> {
        vec![TaskDescription::new(TaskStatus::Running); n]
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_until_completed() {
        let mut f = fixture(PollingConfig::default());
        f.reporter.start(1, Chunk::new(0, 1_000)).await;
        let mut task = submit(
            &f,
            vec![
                TaskDescription::new(TaskStatus::Pending),
                TaskDescription::new(TaskStatus::Running),
                TaskDescription::new(TaskStatus::Running),
                TaskDescription::new(TaskStatus::Completed),
            ],
        )
        .await;
        let (_tx, mut rx) = watch::channel(false);

        let start = Instant::now();
        let outcome = f
            .poller
            .drive(&mut task, 1, 1, &mut f.reporter, &mut rx)
            .await;

        assert_eq!(outcome, TaskOutcome::Completed);
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(describes(&f.service), 4);
        assert_eq!(start.elapsed(), Duration::from_secs(180));

        // Chunks count as done only once the workflow checkpoints them
        let snapshot = f.reporter.snapshot().unwrap();
        assert_eq!(snapshot.task_status, Some(TaskStatus::Completed));
        assert_eq!(snapshot.completed_chunks, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_heartbeat_refreshes_unchanged_status() {
        let config = PollingConfig {
            interval_secs: 60,
            heartbeat_secs: 300,
            ..Default::default()
        };
        let mut f = fixture(config);
        f.reporter.start(1, Chunk::new(0, 1_000)).await;

        // RUNNING from 0s to 360s, COMPLETED at 420s
        let mut statuses = running(7);
        statuses.push(TaskDescription::new(TaskStatus::Completed));
        let mut task = submit(&f, statuses).await;
        let (_tx, mut rx) = watch::channel(false);

        let outcome = f
            .poller
            .drive(&mut task, 1, 1, &mut f.reporter, &mut rx)
            .await;
        assert_eq!(outcome, TaskOutcome::Completed);
        assert_eq!(describes(&f.service), 8);

        let updated_secs: Vec<i64> = f
            .params
            .writes(PROGRESS_KEY)
            .iter()
            .map(|json| serde_json::from_str::<ProgressSnapshot>(json).unwrap())
            .map(|snapshot| snapshot.last_updated / 1000)
            .collect();

        // start, first RUNNING, heartbeat at 300s, COMPLETED; the polls in
        // between leave the snapshot alone
        assert_eq!(updated_secs, vec![0, 0, 300, 420]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_task_carries_message() {
        let mut f = fixture(PollingConfig::default());
        let mut task = submit(
            &f,
            vec![
                TaskDescription::new(TaskStatus::Running),
                TaskDescription::new(TaskStatus::Failed).with_message("Access denied"),
            ],
        )
        .await;
        let (_tx, mut rx) = watch::channel(false);

        let outcome = f
            .poller
            .drive(&mut task, 1, 3, &mut f.reporter, &mut rx)
            .await;

        assert_eq!(
            outcome,
            TaskOutcome::Failed {
                status: TaskStatus::Failed,
                message: Some("Access denied".to_string())
            }
        );
        assert!(!outcome.is_success());
        assert_eq!(outcome.describe(), "task ended as FAILED: Access denied");
        assert_eq!(task.message.as_deref(), Some("Access denied"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_is_failure() {
        let mut f = fixture(PollingConfig::default());
        let mut task = submit(&f, vec![TaskDescription::new(TaskStatus::Cancelled)]).await;
        let (_tx, mut rx) = watch::channel(false);

        let outcome = f
            .poller
            .drive(&mut task, 1, 1, &mut f.reporter, &mut rx)
            .await;
        assert!(matches!(
            outcome,
            TaskOutcome::Failed {
                status: TaskStatus::Cancelled,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_after_max_wait() {
        let config = PollingConfig {
            max_wait_hours: 1,
            ..Default::default()
        };
        let mut f = fixture(config);
        let mut task = submit(&f, running(1)).await;
        let (_tx, mut rx) = watch::channel(false);

        let start = Instant::now();
        let outcome = f
            .poller
            .drive(&mut task, 1, 1, &mut f.reporter, &mut rx)
            .await;

        assert_eq!(outcome, TaskOutcome::TimedOut);
        assert!(start.elapsed() >= Duration::from_secs(3600));
        assert!(start.elapsed() < Duration::from_secs(3600 + 60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_describe_errors_keep_polling() {
        let mut f = fixture(PollingConfig::default());
        let mut task = submit(&f, vec![TaskDescription::new(TaskStatus::Completed)]).await;
        f.service.fail_next_describes(2);
        let (_tx, mut rx) = watch::channel(false);

        let outcome = f
            .poller
            .drive(&mut task, 1, 1, &mut f.reporter, &mut rx)
            .await;

        assert_eq!(outcome, TaskOutcome::Completed);
        assert_eq!(describes(&f.service), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_wait() {
        let mut f = fixture(PollingConfig::default());
        let mut task = submit(&f, running(1)).await;
        let (tx, mut rx) = watch::channel(false);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(90)).await;
            let _ = tx.send(true);
        });

        let outcome = f
            .poller
            .drive(&mut task, 1, 1, &mut f.reporter, &mut rx)
            .await;
        assert_eq!(outcome, TaskOutcome::Interrupted);
        assert_eq!(task.status, TaskStatus::Running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_without_sender_sleeps_full_interval() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);

        let start = Instant::now();
        assert!(!wait_or_shutdown(Duration::from_secs(60), &mut rx).await);
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }
}
