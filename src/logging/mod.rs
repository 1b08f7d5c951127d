//! Logging and observability
//!
//! Structured logging through `tracing`, with a console layer and an
//! optional rolling JSON file. Events carry the log group, task ID and chunk
//! bounds as fields so a single run can be followed across workers.
//!
//! # Example
//!
//! ```no_run
//! use cwl_export::logging::init_logging;
//! use cwl_export::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!(log_group = "/aws/lambda/orders", "Export started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the submission of one chunk
///
/// # Example
///
/// ```no_run
/// use cwl_export::log_chunk_start;
/// use cwl_export::domain::{Chunk, LogGroupName};
///
/// let log_group = LogGroupName::new("/aws/lambda/orders").unwrap();
/// let chunk = Chunk::new(0, 86_400_000);
/// log_chunk_start!(&log_group, 1, 3, &chunk);
/// ```
#[macro_export]
macro_rules! log_chunk_start {
    ($log_group:expr, $index:expr, $total:expr, $chunk:expr) => {
        tracing::info!(
            log_group = %$log_group,
            chunk = $index,
            total_chunks = $total,
            from = $chunk.from,
            to = $chunk.to,
            window = %$chunk,
            "Exporting chunk"
        );
    };
}

/// Log the completion of one chunk
///
/// # Example
///
/// ```no_run
/// use cwl_export::log_chunk_complete;
/// use std::time::Duration;
///
/// log_chunk_complete!("/aws/lambda/orders", "task-1", 1, 3, Duration::from_secs(90));
/// ```
#[macro_export]
macro_rules! log_chunk_complete {
    ($log_group:expr, $task_id:expr, $index:expr, $total:expr, $duration:expr) => {
        tracing::info!(
            log_group = %$log_group,
            task_id = %$task_id,
            chunk = $index,
            total_chunks = $total,
            duration_ms = $duration.as_millis() as u64,
            "Chunk exported"
        );
    };
}

/// Log a retry of a throttled call
///
/// # Example
///
/// ```no_run
/// use cwl_export::log_retry_attempt;
/// use std::time::Duration;
///
/// log_retry_attempt!("CreateExportTask", 2, 10, Duration::from_secs(4), "Rate exceeded");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($operation:expr, $attempt:expr, $max_attempts:expr, $delay:expr, $reason:expr) => {
        tracing::warn!(
            operation = $operation,
            attempt = $attempt,
            max_attempts = $max_attempts,
            delay_ms = $delay.as_millis() as u64,
            reason = %$reason,
            "Throttled, retrying"
        );
    };
}
