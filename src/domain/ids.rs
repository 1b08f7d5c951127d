//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers the exporter passes around, so a log
//! group name can never be handed to an API that expects a task ID.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Log group name newtype wrapper
///
/// Log group names are opaque, but they are also used to derive parameter
/// store keys and S3 prefixes, which must not contain nested path segments.
/// [`LogGroupName::sanitized`] produces that flat form.
///
/// # Examples
///
/// ```
/// use cwl_export::domain::ids::LogGroupName;
/// use std::str::FromStr;
///
/// let name = LogGroupName::from_str("/aws/lambda/orders").unwrap();
/// assert_eq!(name.sanitized(), "aws-lambda-orders");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LogGroupName(String);

impl LogGroupName {
    /// Creates a new LogGroupName from a string
    ///
    /// # Returns
    ///
    /// Returns `Ok(LogGroupName)` if the name is non-blank, `Err` otherwise
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("Log group name cannot be empty".to_string());
        }
        Ok(Self(name))
    }

    /// Returns the log group name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Flat, path-safe form of the name: the leading `/` is dropped and the
    /// remaining separators become `-`.
    pub fn sanitized(&self) -> String {
        self.0.trim_start_matches('/').replace('/', "-")
    }
}

impl fmt::Display for LogGroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LogGroupName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for LogGroupName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Export task identifier returned by `CreateExportTask`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    /// Creates a new TaskId from a string
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Export task ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the task ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}
