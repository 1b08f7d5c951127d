//! Domain error types
//!
//! This module defines the error hierarchy for cwl-export. AWS SDK errors are
//! translated at the adapter boundary, so no third-party error type leaks
//! through these variants.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main exporter error type
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Error)]
pub enum ExporterError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Required invocation fields were not supplied
    #[error("Missing required fields: {}", .0.join(", "))]
    MissingField(Vec<String>),

    /// Rate-limit rejection from an AWS API
    #[error("Throttled during {operation}: {message}")]
    Throttled { operation: String, message: String },

    /// The export service refused a new task because one is already running
    #[error("An export task is already active: {0}")]
    TaskAlreadyActive(String),

    /// A named resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other AWS service or transport error
    #[error("AWS error during {operation} ({code}): {message}")]
    Aws {
        operation: String,
        code: String,
        message: String,
    },

    /// An export task reached FAILED, CANCELLED or TIMEOUT
    #[error("Export task {task_id} ended as {status}: {message}")]
    TaskFailed {
        task_id: String,
        status: String,
        message: String,
    },

    /// Progress store errors
    #[error("State management error: {0}")]
    State(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Notification delivery errors
    #[error("Notification error: {0}")]
    Notification(String),

    /// The run was stopped by a shutdown signal
    #[error("Interrupted: {0}")]
    Interrupted(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl ExporterError {
    /// Returns true for rate-limit errors that are safe to retry
    pub fn is_throttling(&self) -> bool {
        matches!(self, ExporterError::Throttled { .. })
    }

    /// Coarse classification used in outcomes and result payloads
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExporterError::Configuration(_) | ExporterError::MissingField(_) => {
                ErrorKind::Configuration
            }
            ExporterError::Throttled { .. } => ErrorKind::Throttled,
            ExporterError::TaskAlreadyActive(_) => ErrorKind::TaskAlreadyActive,
            ExporterError::NotFound(_) => ErrorKind::NotFound,
            ExporterError::Aws { .. } => ErrorKind::Service,
            ExporterError::TaskFailed { .. } => ErrorKind::TaskFailed,
            ExporterError::State(_) | ExporterError::Serialization(_) => ErrorKind::State,
            ExporterError::Interrupted(_) => ErrorKind::Interrupted,
            ExporterError::Io(_) | ExporterError::Notification(_) | ExporterError::Other(_) => {
                ErrorKind::Unexpected
            }
        }
    }
}

/// Error classification carried by workflow outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Invalid or incomplete configuration
    Configuration,
    /// Retries exhausted on a rate-limited API
    Throttled,
    /// Another export task holds the account-wide slot
    TaskAlreadyActive,
    /// A required resource was missing
    NotFound,
    /// AWS service or transport failure
    Service,
    /// The export task itself failed, was cancelled or timed out
    TaskFailed,
    /// Progress store read/write failure
    State,
    /// Stopped by a shutdown signal
    Interrupted,
    /// Anything else
    Unexpected,
}

// Conversion from std::io::Error
impl From<std::io::Error> for ExporterError {
    fn from(err: std::io::Error) -> Self {
        ExporterError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ExporterError {
    fn from(err: serde_json::Error) -> Self {
        ExporterError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ExporterError {
    fn from(err: toml::de::Error) -> Self {
        ExporterError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exporter_error_display() {
        let err = ExporterError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_missing_field_lists_all_names() {
        let err = ExporterError::MissingField(vec![
            "destination_bucket".to_string(),
            "notification_topic_arn".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Missing required fields: destination_bucket, notification_topic_arn"
        );
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_only_throttled_is_throttling() {
        let throttled = ExporterError::Throttled {
            operation: "DescribeExportTasks".to_string(),
            message: "Rate exceeded".to_string(),
        };
        assert!(throttled.is_throttling());

        let aws = ExporterError::Aws {
            operation: "CreateExportTask".to_string(),
            code: "InvalidParameterException".to_string(),
            message: "bad bucket".to_string(),
        };
        assert!(!aws.is_throttling());
        assert!(!ExporterError::TaskAlreadyActive("limit".to_string()).is_throttling());
    }

    #[test]
    fn test_error_kind_classification() {
        assert_eq!(
            ExporterError::TaskAlreadyActive("x".to_string()).kind(),
            ErrorKind::TaskAlreadyActive
        );
        assert_eq!(
            ExporterError::TaskFailed {
                task_id: "t-1".to_string(),
                status: "FAILED".to_string(),
                message: "denied".to_string(),
            }
            .kind(),
            ErrorKind::TaskFailed
        );
        assert_eq!(
            ExporterError::Serialization("x".to_string()).kind(),
            ErrorKind::State
        );
        assert_eq!(ExporterError::Other("x".to_string()).kind(), ErrorKind::Unexpected);
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::TaskAlreadyActive).unwrap();
        assert_eq!(json, "\"task_already_active\"");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: ExporterError = io_err.into();
        assert!(matches!(err, ExporterError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: ExporterError = json_err.into();
        assert!(matches!(err, ExporterError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: ExporterError = toml_err.into();
        assert!(matches!(err, ExporterError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }

    #[test]
    fn test_exporter_error_implements_std_error() {
        let err = ExporterError::State("Test error".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
