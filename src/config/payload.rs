//! Invocation payload
//!
//! A run is started with a JSON event naming the destination, the
//! notification target and the tag filter. Every field is optional in the
//! payload itself; values present override the file configuration, and
//! [`InvocationPayload::resolve`] fails if a required field is still missing
//! afterwards.

use super::schema::ExporterConfig;
use crate::domain::{ExporterError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Fields accepted in the invocation event
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationPayload {
    /// Destination S3 bucket
    #[serde(default, alias = "destination", alias = "s3_bucket")]
    pub destination_bucket: Option<String>,

    /// Key prefix inside the bucket
    #[serde(default)]
    pub destination_prefix: Option<String>,

    /// SNS topic ARN
    #[serde(default, alias = "notification_target", alias = "sns_topic_arn")]
    pub notification_topic_arn: Option<String>,

    /// Tag key filter
    #[serde(default)]
    pub tag_key: Option<String>,

    /// Tag value filter
    #[serde(default)]
    pub tag_value: Option<String>,

    /// Default chunk width in days
    #[serde(default)]
    pub chunk_size_days: Option<u32>,

    /// Worker pool width
    #[serde(default, alias = "max_workers")]
    pub pool_width: Option<usize>,
}

impl InvocationPayload {
    /// Parse a payload from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| {
            ExporterError::Configuration(format!("Invalid invocation payload: {e}"))
        })
    }

    /// Parse a payload from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ExporterError::Configuration(format!(
                "Failed to read invocation payload {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json(&contents)
    }

    /// Overlay the payload on a file configuration and check it is runnable
    ///
    /// # Errors
    ///
    /// Returns [`ExporterError::MissingField`] when the destination bucket or
    /// notification topic is still missing, and
    /// [`ExporterError::Configuration`] when an overridden value is invalid.
    pub fn resolve(self, mut config: ExporterConfig) -> Result<ExporterConfig> {
        if let Some(bucket) = self.destination_bucket {
            config.export.destination_bucket = Some(bucket);
        }
        if let Some(prefix) = self.destination_prefix {
            config.export.destination_prefix = prefix;
        }
        if let Some(topic) = self.notification_topic_arn {
            config.export.notification_topic_arn = Some(topic);
        }
        if let Some(tag_key) = self.tag_key {
            config.export.tag_key = tag_key;
        }
        if let Some(tag_value) = self.tag_value {
            config.export.tag_value = tag_value;
        }
        if let Some(days) = self.chunk_size_days {
            config.export.chunk_size_days = days;
        }
        if let Some(width) = self.pool_width {
            config.export.pool_width = width;
        }

        config.require_run_fields()?;
        config
            .validate()
            .map_err(|e| ExporterError::Configuration(format!("Invalid invocation: {e}")))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_with_all_fields() {
        let payload = InvocationPayload::from_json(
            r#"{
                "destination_bucket": "log-archive",
                "notification_topic_arn": "arn:aws:sns:eu-west-1:123456789012:exports",
                "tag_key": "Archive",
                "tag_value": "yes",
                "chunk_size_days": 3,
                "pool_width": 5
            }"#,
        )
        .unwrap();

        let config = payload.resolve(ExporterConfig::default()).unwrap();
        assert_eq!(config.export.destination_bucket.as_deref(), Some("log-archive"));
        assert_eq!(config.export.tag_key, "Archive");
        assert_eq!(config.export.tag_value, "yes");
        assert_eq!(config.export.chunk_size_days, 3);
        assert_eq!(config.export.pool_width, 5);
    }

    #[test]
    fn test_payload_defaults_apply() {
        let payload = InvocationPayload::from_json(
            r#"{"destination": "log-archive", "sns_topic_arn": "arn:aws:sns:eu-west-1:1:t"}"#,
        )
        .unwrap();

        let config = payload.resolve(ExporterConfig::default()).unwrap();
        assert_eq!(config.export.tag_key, "ExportToS3");
        assert_eq!(config.export.tag_value, "true");
        assert_eq!(config.export.chunk_size_days, 7);
        assert_eq!(config.export.pool_width, 3);
    }

    #[test]
    fn test_missing_required_fields() {
        let payload = InvocationPayload::from_json(r#"{"tag_key": "Archive"}"#).unwrap();
        let err = payload.resolve(ExporterConfig::default()).unwrap_err();

        match err {
            ExporterError::MissingField(fields) => {
                assert!(fields.contains(&"destination_bucket".to_string()));
                assert!(fields.contains(&"notification_topic_arn".to_string()));
            }
            other => panic!("Expected MissingField, got {other:?}"),
        }
    }

    #[test]
    fn test_file_config_satisfies_required_fields() {
        let mut base = ExporterConfig::default();
        base.export.destination_bucket = Some("from-file".to_string());
        base.export.notification_topic_arn = Some("arn:aws:sns:eu-west-1:1:t".to_string());

        let config = InvocationPayload::default().resolve(base).unwrap();
        assert_eq!(config.export.destination_bucket.as_deref(), Some("from-file"));
    }

    #[test]
    fn test_invalid_override_rejected() {
        let payload = InvocationPayload {
            destination_bucket: Some("b".to_string()),
            notification_topic_arn: Some("arn:aws:sns:eu-west-1:1:t".to_string()),
            pool_width: Some(0),
            ..Default::default()
        };
        let err = payload.resolve(ExporterConfig::default()).unwrap_err();
        assert!(matches!(err, ExporterError::Configuration(_)));
    }

    #[test]
    fn test_malformed_json() {
        assert!(InvocationPayload::from_json("{not json").is_err());
    }
}
