//! SNS notification adapter

use super::error::map_sdk_error;
use crate::adapters::traits::NotificationSink;
use crate::domain::Result;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sns as sns;

/// SNS rejects subjects longer than this
const MAX_SUBJECT_CHARS: usize = 100;

/// Publishes notifications to one SNS topic
pub struct SnsNotificationSink {
    client: sns::Client,
    topic_arn: String,
}

impl SnsNotificationSink {
    /// Create a sink for `topic_arn`
    pub fn new(sdk_config: &SdkConfig, topic_arn: impl Into<String>) -> Self {
        Self {
            client: sns::Client::new(sdk_config),
            topic_arn: topic_arn.into(),
        }
    }
}

fn truncate_subject(subject: &str) -> String {
    subject.chars().take(MAX_SUBJECT_CHARS).collect()
}

#[async_trait]
impl NotificationSink for SnsNotificationSink {
    async fn publish(&self, subject: &str, body: &str) -> Result<()> {
        self.client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(truncate_subject(subject))
            .message(body)
            .send()
            .await
            .map_err(|e| map_sdk_error("Publish", e))?;
        Ok(())
    }
}
