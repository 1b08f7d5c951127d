//! AWS-backed collaborators
//!
//! CloudWatch Logs provides both the log registry and the export task
//! service, SSM Parameter Store holds watermarks and progress snapshots, and
//! SNS carries notifications.

pub mod error;
pub mod logs;
pub mod sns;
pub mod ssm;

pub use logs::CloudWatchLogsAdapter;
pub use sns::SnsNotificationSink;
pub use ssm::SsmParameterStore;

use crate::config::AwsConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Load shared SDK configuration, honouring region and profile overrides
pub async fn load_sdk_config(config: &AwsConfig) -> SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(profile) = &config.profile {
        loader = loader.profile_name(profile);
    }

    let sdk_config = loader.load().await;
    tracing::debug!(
        region = ?sdk_config.region().map(|r| r.as_ref().to_string()),
        "Loaded AWS SDK configuration"
    );
    sdk_config
}
