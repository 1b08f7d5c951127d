//! Run command implementation
//!
//! This module implements the `run` command: resolve the invocation, build
//! the AWS collaborators, export every tagged log group and print the JSON
//! result payload.

use crate::adapters::aws::{
    load_sdk_config, CloudWatchLogsAdapter, SnsNotificationSink, SsmParameterStore,
};
use crate::config::{load_config, InvocationPayload};
use crate::core::export::poller::shutdown_requested;
use crate::core::export::{Collaborators, ExportOrchestrator, RunResponse};
use crate::domain::{ExporterError, Result};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// JSON invocation payload overriding destination, topic and tag filter
    #[arg(long, value_name = "FILE")]
    pub event: Option<String>,

    /// Stop scheduling work after this many seconds; progress is kept
    #[arg(long, value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Plan chunks without submitting tasks or writing state
    #[arg(long)]
    pub dry_run: bool,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Starting run command");

        let config = match self.resolve_config(config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Invalid invocation");
                println!("{}", RunResponse::from_error(&e).to_json());
                return Ok(exit_code_for(&e));
            }
        };

        let Some(topic_arn) = config.export.notification_topic_arn.clone() else {
            let e = ExporterError::MissingField(vec!["notification_topic_arn".to_string()]);
            println!("{}", RunResponse::from_error(&e).to_json());
            return Ok(2);
        };

        let sdk_config = load_sdk_config(&config.aws).await;
        let logs = Arc::new(CloudWatchLogsAdapter::new(&sdk_config));
        let collaborators = Collaborators::new(
            logs.clone(),
            logs,
            Arc::new(SsmParameterStore::new(&sdk_config)),
            Some(Arc::new(SnsNotificationSink::new(&sdk_config, topic_arn))),
        );

        let shutdown = with_deadline(shutdown_signal, self.timeout_secs.map(Duration::from_secs));
        let orchestrator = match ExportOrchestrator::new(&config, collaborators, shutdown) {
            Ok(o) => o,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create export orchestrator");
                println!("{}", RunResponse::from_error(&e).to_json());
                return Ok(exit_code_for(&e));
            }
        };

        let result = match orchestrator.run_all().await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Export run failed");
                println!("{}", RunResponse::from_error(&e).to_json());
                return Ok(exit_code_for(&e));
            }
        };

        let exit_code = if result.was_interrupted() {
            tracing::info!("Export run interrupted, progress saved");
            130
        } else if result.is_successful() {
            0
        } else {
            1
        };

        println!("{}", RunResponse::from(result).to_json());
        Ok(exit_code)
    }

    fn resolve_config(&self, config_path: &str) -> Result<crate::config::ExporterConfig> {
        let mut config = load_config(config_path)?;

        let payload = match &self.event {
            Some(path) => {
                tracing::info!(event = %path, "Applying invocation payload");
                InvocationPayload::from_file(path)?
            }
            None => InvocationPayload::default(),
        };

        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.application.dry_run = true;
        }

        payload.resolve(config)
    }
}

/// Exit code for an error that stopped the run before any outcome existed
pub fn exit_code_for(error: &ExporterError) -> i32 {
    match error {
        ExporterError::Configuration(_) | ExporterError::MissingField(_) => 2,
        ExporterError::Aws { .. } | ExporterError::Throttled { .. } | ExporterError::NotFound(_) => {
            4
        }
        ExporterError::Interrupted(_) => 130,
        _ => 5,
    }
}

/// Combine the shutdown signal with an optional invocation deadline
///
/// The returned receiver turns true when either fires, so workflows stop at
/// the same checkpoints for both.
pub fn with_deadline(
    shutdown: watch::Receiver<bool>,
    timeout: Option<Duration>,
) -> watch::Receiver<bool> {
    let Some(timeout) = timeout else {
        return shutdown;
    };

    let (tx, rx) = watch::channel(*shutdown.borrow());
    tokio::spawn(async move {
        let mut shutdown = shutdown;
        tokio::select! {
            _ = shutdown_requested(&mut shutdown) => {}
            _ = tokio::time::sleep(timeout) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "Invocation timeout reached, stopping after current work"
                );
            }
        }
        let _ = tx.send(true);
    });
    rx
}
