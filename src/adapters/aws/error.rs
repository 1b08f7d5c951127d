//! Translation of AWS SDK errors into domain errors

use crate::domain::ExporterError;
use aws_sdk_cloudwatchlogs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use std::error::Error as StdError;
use std::fmt::Debug;

/// Error codes AWS uses for rate limiting
const THROTTLING_CODES: &[&str] = &[
    "Throttling",
    "ThrottlingException",
    "ThrottledException",
    "RequestThrottledException",
    "TooManyRequestsException",
    "RequestLimitExceeded",
    "ProvisionedThroughputExceededException",
    "SlowDown",
    "ServiceUnavailableException",
];

/// Returns true when `code` denotes a rate-limit rejection
pub fn is_throttling_code(code: &str) -> bool {
    THROTTLING_CODES.contains(&code)
}

/// Map an SDK error to an [`ExporterError`]
///
/// Throttling codes become [`ExporterError::Throttled`], missing resources
/// become [`ExporterError::NotFound`], everything else becomes
/// [`ExporterError::Aws`] carrying the service code.
pub fn map_sdk_error<E, R>(operation: &str, err: SdkError<E, R>) -> ExporterError
where
    E: ProvideErrorMetadata + StdError + Send + Sync + 'static,
    R: Debug,
{
    let code = err.code().map(str::to_string);
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());

    match code.as_deref() {
        Some(code) if is_throttling_code(code) => ExporterError::Throttled {
            operation: operation.to_string(),
            message,
        },
        Some("ResourceNotFoundException") | Some("ParameterNotFound") | Some("NotFound") => {
            ExporterError::NotFound(format!("{operation}: {message}"))
        }
        Some(code) => ExporterError::Aws {
            operation: operation.to_string(),
            code: code.to_string(),
            message,
        },
        None => ExporterError::Aws {
            operation: operation.to_string(),
            code: "Unknown".to_string(),
            message,
        },
    }
}

/// Map a CreateExportTask error
///
/// CloudWatch Logs answers `LimitExceededException` when an export task is
/// already running in the account.
pub fn map_create_export_error<E, R>(err: SdkError<E, R>) -> ExporterError
where
    E: ProvideErrorMetadata + StdError + Send + Sync + 'static,
    R: Debug,
{
    if err.code() == Some("LimitExceededException") {
        let message = err
            .message()
            .unwrap_or("Resource limit exceeded")
            .to_string();
        return ExporterError::TaskAlreadyActive(message);
    }
    map_sdk_error("CreateExportTask", err)
}
