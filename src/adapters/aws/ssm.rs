//! SSM Parameter Store adapter

use super::error::map_sdk_error;
use crate::adapters::traits::ParameterStore;
use crate::domain::Result;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ssm as ssm;
use aws_sdk_ssm::error::ProvideErrorMetadata;

/// Parameter store backed by SSM `String` parameters
pub struct SsmParameterStore {
    client: ssm::Client,
}

impl SsmParameterStore {
    /// Create a store from shared SDK configuration
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: ssm::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn put(&self, name: &str, value: &str) -> Result<()> {
        self.client
            .put_parameter()
            .name(name)
            .value(value)
            .r#type(ssm::types::ParameterType::String)
            .overwrite(true)
            .send()
            .await
            .map_err(|e| map_sdk_error("PutParameter", e))?;

        tracing::trace!(parameter = %name, "Stored parameter");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<String>> {
        match self.client.get_parameter().name(name).send().await {
            Ok(response) => Ok(response
                .parameter()
                .and_then(|p| p.value())
                .map(str::to_string)),
            Err(err) if err.code() == Some("ParameterNotFound") => Ok(None),
            Err(err) => Err(map_sdk_error("GetParameter", err)),
        }
    }
}
