// cwl-export - CloudWatch Logs to S3 Exporter
// Copyright (c) 2025 cwl-export Contributors
// Licensed under the MIT License

//! # cwl-export - CloudWatch Logs to S3
//!
//! cwl-export incrementally exports CloudWatch Logs log groups to S3 using
//! the service's asynchronous export tasks.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Discovering** log groups that carry an export tag
//! - **Planning** the window since the last export as fixed-width chunks
//! - **Exporting** one chunk at a time, polling each task to completion
//! - **Checkpointing** a per-log-group watermark so the next run resumes
//!
//! ## Architecture
//!
//! cwl-export follows a layered architecture:
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (discovery, workflow, polling, state)
//! - [`adapters`] - External integrations (CloudWatch Logs, SSM, SNS) and in-memory fakes
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging and observability
//!
//! ## Incremental Export
//!
//! Each log group has a watermark in the parameter store. A run exports
//! `[watermark, now)` and advances the watermark after every completed
//! chunk, so a failed chunk is retried from the same point next time:
//!
//! ```rust
//! use cwl_export::core::planner::plan_chunks;
//! use cwl_export::domain::MILLIS_PER_DAY;
//!
//! let chunks = plan_chunks(0, 20 * MILLIS_PER_DAY, 7 * MILLIS_PER_DAY);
//! assert_eq!(chunks.len(), 3);
//! assert_eq!(chunks[2].to, 20 * MILLIS_PER_DAY);
//! ```
//!
//! ## Error Handling
//!
//! cwl-export uses the [`domain::ExporterError`] type for all errors. Only
//! throttling errors are retried; a log group's workflow turns every other
//! failure into a [`core::export::LogGroupOutcome`].
//!
//! ## Logging
//!
//! cwl-export uses structured logging with the `tracing` crate:
//!
//! ```rust,no_run
//! tracing::info!(log_group = "/aws/lambda/orders", chunk = 1, "Exporting chunk");
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
