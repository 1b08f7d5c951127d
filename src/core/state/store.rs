//! Progress store for watermark and snapshot persistence
//!
//! Values live in the parameter store under
//! `{parameter_prefix}/{sanitized log group}/{kind}`. Writes overwrite; there
//! is no compare-and-swap, so only one workflow may own a log group's keys at
//! a time.

use crate::adapters::ParameterStore;
use crate::core::state::progress::ProgressSnapshot;
use crate::domain::{ExporterError, LogGroupName, Result};
use std::fmt;
use std::sync::Arc;

/// What a stored value describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgressKind {
    /// Latest progress snapshot, JSON
    Progress,
    /// Watermark in epoch milliseconds
    LastExport,
}

impl ProgressKind {
    /// Key suffix for this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressKind::Progress => "progress",
            ProgressKind::LastExport => "last-export",
        }
    }
}

impl fmt::Display for ProgressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-log-group persistence over a [`ParameterStore`]
#[derive(Clone)]
pub struct ProgressStore {
    /// Parameter store backend
    store: Arc<dyn ParameterStore>,

    /// Path prefix, always starting with `/`
    prefix: String,
}

impl ProgressStore {
    /// Create a store writing below `prefix`
    ///
    /// # Arguments
    ///
    /// * `store` - Parameter store implementation
    /// * `prefix` - Key prefix such as `/log-exports`
    pub fn new(store: Arc<dyn ParameterStore>, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            store,
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Parameter name for a log group and kind
    pub fn key(&self, log_group: &LogGroupName, kind: ProgressKind) -> String {
        format!("{}/{}/{}", self.prefix, log_group.sanitized(), kind)
    }

    /// Write a raw value
    pub async fn put(&self, log_group: &LogGroupName, kind: ProgressKind, value: &str) -> Result<()> {
        self.store.put(&self.key(log_group, kind), value).await
    }

    /// Read a raw value; `Ok(None)` when nothing was stored yet
    pub async fn get(&self, log_group: &LogGroupName, kind: ProgressKind) -> Result<Option<String>> {
        self.store.get(&self.key(log_group, kind)).await
    }

    /// Load the watermark of a log group
    ///
    /// # Returns
    ///
    /// Returns `Ok(Some(millis))` if found, `Ok(None)` if the log group was
    /// never exported.
    ///
    /// # Errors
    ///
    /// Returns an error if the read fails or the stored value is not an
    /// integer.
    pub async fn load_watermark(&self, log_group: &LogGroupName) -> Result<Option<i64>> {
        match self.get(log_group, ProgressKind::LastExport).await? {
            Some(raw) => raw.trim().parse::<i64>().map(Some).map_err(|e| {
                ExporterError::State(format!(
                    "Invalid watermark '{raw}' for log group {log_group}: {e}"
                ))
            }),
            None => Ok(None),
        }
    }

    /// Save the watermark of a log group
    pub async fn save_watermark(&self, log_group: &LogGroupName, watermark: i64) -> Result<()> {
        tracing::debug!(log_group = %log_group, watermark, "Saving watermark");
        self.put(log_group, ProgressKind::LastExport, &watermark.to_string())
            .await
    }

    /// Load the latest progress snapshot
    pub async fn load_progress(&self, log_group: &LogGroupName) -> Result<Option<ProgressSnapshot>> {
        match self.get(log_group, ProgressKind::Progress).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Replace the progress snapshot
    pub async fn save_progress(
        &self,
        log_group: &LogGroupName,
        snapshot: &ProgressSnapshot,
    ) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        self.put(log_group, ProgressKind::Progress, &json).await
    }
}
