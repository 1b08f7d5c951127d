//! Domain models and types for cwl-export.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`LogGroupName`], [`TaskId`])
//! - **Domain models** ([`Chunk`], [`ExportTask`], [`LogGroup`])
//! - **Error types** ([`ExporterError`], [`ErrorKind`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, ExporterError>`]:
//!
//! ```rust
//! use cwl_export::domain::{ExporterError, Result};
//!
//! fn example() -> Result<()> {
//!     let config = cwl_export::config::load_config("cwl-export.toml")?;
//!     Ok(())
//! }
//! ```

pub mod chunk;
pub mod errors;
pub mod ids;
pub mod log_group;
pub mod result;
pub mod task;

// Re-export commonly used types for convenience
pub use chunk::{millis_to_datetime, Chunk, MILLIS_PER_DAY};
pub use errors::{ErrorKind, ExporterError};
pub use ids::{LogGroupName, TaskId};
pub use log_group::{LogGroup, LogGroupPage};
pub use result::Result;
pub use task::{ExportTask, TaskDescription, TaskStatus};
