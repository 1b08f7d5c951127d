//! Export orchestration
//!
//! This module provides the export logic for cwl-export, including:
//! - Tag-filtered discovery and the bounded worker pool
//! - The per-log-group chunk workflow
//! - Export task submission and polling
//! - Progress reporting, notifications and the run summary

pub mod client;
pub mod coordinator;
pub mod notify;
pub mod poller;
pub mod reporter;
pub mod summary;
pub mod workflow;

pub use client::{destination_key_prefix, ExportTaskClient};
pub use coordinator::{Collaborators, ExportOrchestrator, TagFilter};
pub use notify::Notifier;
pub use poller::{TaskOutcome, TaskPoller};
pub use reporter::ProgressReporter;
pub use summary::{LogGroupOutcome, OutcomeStatus, RunResponse, RunResult};
pub use workflow::{LogGroupWorkflow, Stage};
