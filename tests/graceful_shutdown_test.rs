//! Integration tests for graceful shutdown functionality
//!
//! These tests verify that:
//! - A shutdown signal stops new log groups from starting
//! - A workflow waiting on a task stops without advancing the watermark
//! - The next run resumes from the last completed chunk

use cwl_export::adapters::memory::{
    FixedClock, InMemoryExportService, InMemoryLogRegistry, InMemoryParameterStore,
};
use cwl_export::config::ExporterConfig;
use cwl_export::core::export::{Collaborators, ExportOrchestrator, OutcomeStatus};
use cwl_export::core::state::{ProgressStatus, ProgressStore};
use cwl_export::domain::{
    Chunk, LogGroup, LogGroupName, TaskDescription, TaskStatus, MILLIS_PER_DAY,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

const DAY: i64 = MILLIS_PER_DAY;
const T0: i64 = 1_700_000_000_000;

struct Fixture {
    registry: Arc<InMemoryLogRegistry>,
    service: Arc<InMemoryExportService>,
    params: Arc<InMemoryParameterStore>,
    config: ExporterConfig,
}

fn fixture() -> Fixture {
    let registry = Arc::new(InMemoryLogRegistry::new(50));
    for name in ["/a", "/b"] {
        registry.add_log_group(
            LogGroup::new(LogGroupName::new(name).unwrap()).with_creation_time(T0),
            &[("ExportToS3", "true")],
        );
    }

    let mut config = ExporterConfig::default();
    config.export.destination_bucket = Some("log-archive".to_string());
    config.export.notification_topic_arn =
        Some("arn:aws:sns:us-east-1:123456789012:log-exports".to_string());
    config.export.pool_width = 1;
    config.chunking.adaptive = false;

    Fixture {
        registry,
        service: Arc::new(InMemoryExportService::new()),
        params: Arc::new(InMemoryParameterStore::new()),
        config,
    }
}

impl Fixture {
    fn orchestrator(&self, shutdown: watch::Receiver<bool>) -> ExportOrchestrator {
        let collaborators = Collaborators::new(
            self.registry.clone(),
            self.service.clone(),
            self.params.clone(),
            None,
        )
        .with_clock(Arc::new(FixedClock::new(T0 + 20 * DAY)));
        ExportOrchestrator::new(&self.config, collaborators, shutdown).unwrap()
    }
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_before_run_starts_nothing() {
    let f = fixture();
    let (tx, rx) = watch::channel(false);
    tx.send(true).unwrap();

    let result = f.orchestrator(rx).run_all().await.unwrap();

    assert!(result.was_interrupted());
    assert_eq!(result.outcomes.len(), 2);
    assert!(result
        .outcomes
        .values()
        .all(|o| o.status == OutcomeStatus::Interrupted));
    assert!(f.service.submitted_chunks().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_while_polling_then_resume() {
    let f = fixture();
    f.service.script_next_task(vec![
        TaskDescription::new(TaskStatus::Running),
        TaskDescription::new(TaskStatus::Running),
        TaskDescription::new(TaskStatus::Completed),
    ]);

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(90)).await;
        let _ = tx.send(true);
    });

    let result = f.orchestrator(rx).run_all().await.unwrap();

    assert!(result.was_interrupted());
    assert_eq!(result.outcomes["/a"].status, OutcomeStatus::Interrupted);
    assert_eq!(result.outcomes["/b"].status, OutcomeStatus::Interrupted);
    assert_eq!(f.service.submitted_chunks().len(), 1);

    let store = ProgressStore::new(f.params.clone(), "/log-exports");
    let a = LogGroupName::new("/a").unwrap();
    assert_eq!(store.load_watermark(&a).await.unwrap(), None);
    let snapshot = store.load_progress(&a).await.unwrap().unwrap();
    assert_eq!(snapshot.status, ProgressStatus::Interrupted);
    assert_eq!(snapshot.completed_chunks, 0);

    // A fresh run picks up from the start of the interrupted chunk
    let (_tx, rx) = watch::channel(false);
    let result = f.orchestrator(rx).run_all().await.unwrap();

    assert!(result.is_successful());
    assert!(!result.was_interrupted());
    let submitted = f.service.submitted_chunks();
    assert_eq!(submitted[1], (a.clone(), Chunk::new(T0, T0 + 7 * DAY)));
    assert_eq!(store.load_watermark(&a).await.unwrap(), Some(T0 + 20 * DAY));
}
