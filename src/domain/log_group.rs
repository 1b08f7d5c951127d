//! Log group registry entries

use crate::domain::ids::LogGroupName;
use serde::{Deserialize, Serialize};

/// A log group as listed by the registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogGroup {
    /// Log group name
    pub name: LogGroupName,

    /// ARN without the trailing `:*`, used for tag lookups
    pub arn: Option<String>,

    /// Creation time in epoch milliseconds
    pub creation_time: Option<i64>,

    /// Stored bytes as last reported by the registry
    pub stored_bytes: Option<i64>,
}

impl LogGroup {
    /// Create an entry with only a name
    pub fn new(name: LogGroupName) -> Self {
        Self {
            name,
            arn: None,
            creation_time: None,
            stored_bytes: None,
        }
    }

    /// Set the ARN
    pub fn with_arn(mut self, arn: impl Into<String>) -> Self {
        self.arn = Some(arn.into());
        self
    }

    /// Set the creation time
    pub fn with_creation_time(mut self, millis: i64) -> Self {
        self.creation_time = Some(millis);
        self
    }

    /// Set the stored bytes
    pub fn with_stored_bytes(mut self, bytes: i64) -> Self {
        self.stored_bytes = Some(bytes);
        self
    }
}

/// One page of a paginated log group listing
#[derive(Debug, Clone, Default)]
pub struct LogGroupPage {
    /// Entries on this page
    pub log_groups: Vec<LogGroup>,

    /// Token for the next page, `None` on the last page
    pub next_token: Option<String>,
}
