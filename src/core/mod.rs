//! Core business logic for cwl-export.
//!
//! # Modules
//!
//! - [`export`] - Discovery, the worker pool and the per-log-group workflow
//! - [`planner`] - Chunk planning and volume-adaptive chunk sizing
//! - [`retry`] - Exponential backoff for throttled API calls
//! - [`state`] - Watermarks and progress snapshots in the parameter store
//!
//! # Export Workflow
//!
//! For each log group carrying the export tag:
//!
//! 1. **Check**: Skip if an export task is already active in the account
//! 2. **Load State**: Read the watermark, or start from the creation time
//! 3. **Plan**: Split `[watermark, now)` into chunks
//! 4. **Export**: Submit one task per chunk and poll it to a terminal status
//! 5. **Checkpoint**: Advance the watermark after each completed chunk
//! 6. **Report**: Persist progress and send notifications
//!
//! # Example
//!
//! ```rust,no_run
//! use cwl_export::adapters::memory::{
//!     InMemoryExportService, InMemoryLogRegistry, InMemoryParameterStore,
//! };
//! use cwl_export::config::ExporterConfig;
//! use cwl_export::core::export::{Collaborators, ExportOrchestrator};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut config = ExporterConfig::default();
//! config.export.destination_bucket = Some("log-archive".to_string());
//! config.export.notification_topic_arn = Some("arn:aws:sns:us-east-1:1:exports".to_string());
//!
//! let collaborators = Collaborators::new(
//!     Arc::new(InMemoryLogRegistry::new(50)),
//!     Arc::new(InMemoryExportService::new()),
//!     Arc::new(InMemoryParameterStore::new()),
//!     None,
//! );
//! let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
//!
//! let orchestrator = ExportOrchestrator::new(&config, collaborators, shutdown_rx)?;
//! let result = orchestrator.run_all().await?;
//! println!("Succeeded: {}, failed: {}", result.succeeded(), result.failed());
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod planner;
pub mod retry;
pub mod state;
