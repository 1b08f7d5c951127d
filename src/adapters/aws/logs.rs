//! CloudWatch Logs adapter

use super::error::{map_create_export_error, map_sdk_error};
use crate::adapters::traits::{ExportTaskService, LogRegistry};
use crate::domain::{
    Chunk, ExporterError, LogGroup, LogGroupName, LogGroupPage, Result, TaskDescription, TaskId,
    TaskStatus,
};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudwatchlogs as logs;
use aws_sdk_cloudwatchlogs::types::ExportTaskStatusCode;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;

/// CloudWatch Logs client implementing both the registry and the export service
pub struct CloudWatchLogsAdapter {
    client: logs::Client,
    arns: Mutex<HashMap<LogGroupName, String>>,
}

impl CloudWatchLogsAdapter {
    /// Create an adapter from shared SDK configuration
    pub fn new(sdk_config: &SdkConfig) -> Self {
        Self {
            client: logs::Client::new(sdk_config),
            arns: Mutex::new(HashMap::new()),
        }
    }

    fn remember_arn(&self, log_group: &LogGroup) {
        if let Some(arn) = &log_group.arn {
            if let Ok(mut arns) = self.arns.lock() {
                arns.insert(log_group.name.clone(), arn.clone());
            }
        }
    }

    fn cached_arn(&self, name: &LogGroupName) -> Option<String> {
        self.arns.lock().ok().and_then(|arns| arns.get(name).cloned())
    }

    /// Look up a single log group by exact name
    async fn describe_one(&self, name: &LogGroupName) -> Result<LogGroup> {
        let mut paginator = self
            .client
            .describe_log_groups()
            .log_group_name_prefix(name.as_str())
            .into_paginator()
            .send();

        while let Some(page) = paginator.next().await {
            let page = page.map_err(|e| map_sdk_error("DescribeLogGroups", e))?;
            let found = page
                .log_groups()
                .iter()
                .filter(|lg| lg.log_group_name() == Some(name.as_str()))
                .find_map(to_domain);
            if let Some(log_group) = found {
                self.remember_arn(&log_group);
                return Ok(log_group);
            }
        }

        Err(ExporterError::NotFound(format!("log group {name}")))
    }

    async fn list_tasks_with_status(&self, code: ExportTaskStatusCode) -> Result<Vec<TaskId>> {
        let mut task_ids = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_export_tasks()
                .status_code(code.clone())
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| map_sdk_error("DescribeExportTasks", e))?;

            task_ids.extend(
                response
                    .export_tasks()
                    .iter()
                    .filter_map(|t| t.task_id())
                    .filter_map(|id| TaskId::new(id).ok()),
            );

            match response.next_token() {
                Some(token) if !token.is_empty() => next_token = Some(token.to_string()),
                _ => break,
            }
        }

        Ok(task_ids)
    }
}

fn to_domain(log_group: &logs::types::LogGroup) -> Option<LogGroup> {
    let name = LogGroupName::new(log_group.log_group_name()?).ok()?;
    let mut entry = LogGroup::new(name);
    if let Some(arn) = log_group.log_group_arn() {
        entry = entry.with_arn(arn);
    } else if let Some(arn) = log_group.arn() {
        entry = entry.with_arn(arn.trim_end_matches(":*"));
    }
    if let Some(created) = log_group.creation_time() {
        entry = entry.with_creation_time(created);
    }
    if let Some(bytes) = log_group.stored_bytes() {
        entry = entry.with_stored_bytes(bytes);
    }
    Some(entry)
}

#[async_trait]
impl LogRegistry for CloudWatchLogsAdapter {
    async fn list_log_groups(&self, page_token: Option<String>) -> Result<LogGroupPage> {
        let response = self
            .client
            .describe_log_groups()
            .set_next_token(page_token)
            .send()
            .await
            .map_err(|e| map_sdk_error("DescribeLogGroups", e))?;

        let log_groups: Vec<LogGroup> = response.log_groups().iter().filter_map(to_domain).collect();
        for log_group in &log_groups {
            self.remember_arn(log_group);
        }

        Ok(LogGroupPage {
            log_groups,
            next_token: response
                .next_token()
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        })
    }

    async fn get_tags(&self, log_group: &LogGroupName) -> Result<HashMap<String, String>> {
        let arn = match self.cached_arn(log_group) {
            Some(arn) => arn,
            None => self.describe_one(log_group).await?.arn.ok_or_else(|| {
                ExporterError::NotFound(format!("ARN for log group {log_group}"))
            })?,
        };

        let response = self
            .client
            .list_tags_for_resource()
            .resource_arn(arn)
            .send()
            .await
            .map_err(|e| map_sdk_error("ListTagsForResource", e))?;

        Ok(response.tags().cloned().unwrap_or_default())
    }

    async fn get_creation_time(&self, log_group: &LogGroupName) -> Result<i64> {
        self.describe_one(log_group).await?.creation_time.ok_or_else(|| {
            ExporterError::NotFound(format!("creation time for log group {log_group}"))
        })
    }

    async fn get_stored_bytes(&self, log_group: &LogGroupName) -> Result<i64> {
        self.describe_one(log_group).await?.stored_bytes.ok_or_else(|| {
            ExporterError::NotFound(format!("stored bytes for log group {log_group}"))
        })
    }
}

#[async_trait]
impl ExportTaskService for CloudWatchLogsAdapter {
    async fn create_export_task(
        &self,
        log_group: &LogGroupName,
        chunk: &Chunk,
        destination: &str,
        destination_prefix: &str,
    ) -> Result<TaskId> {
        let task_name = format!("{}-{}", log_group.sanitized(), chunk.from);

        let response = self
            .client
            .create_export_task()
            .task_name(task_name)
            .log_group_name(log_group.as_str())
            .from(chunk.from)
            .to(chunk.to)
            .destination(destination)
            .destination_prefix(destination_prefix)
            .send()
            .await
            .map_err(map_create_export_error)?;

        let task_id = response.task_id().ok_or_else(|| ExporterError::Aws {
            operation: "CreateExportTask".to_string(),
            code: "MissingTaskId".to_string(),
            message: "response did not include a task ID".to_string(),
        })?;

        TaskId::new(task_id).map_err(ExporterError::Other)
    }

    async fn describe_export_task(&self, task_id: &TaskId) -> Result<TaskDescription> {
        let response = self
            .client
            .describe_export_tasks()
            .task_id(task_id.as_str())
            .send()
            .await
            .map_err(|e| map_sdk_error("DescribeExportTasks", e))?;

        let task = response
            .export_tasks()
            .first()
            .ok_or_else(|| ExporterError::NotFound(format!("export task {task_id}")))?;
        let status = task.status();

        let code = status
            .and_then(|s| s.code())
            .map(|c| c.as_str())
            .unwrap_or("PENDING");
        let status_code = TaskStatus::from_str(code).map_err(|e| ExporterError::Aws {
            operation: "DescribeExportTasks".to_string(),
            code: "UnknownStatus".to_string(),
            message: e,
        })?;

        let mut description = TaskDescription::new(status_code);
        if let Some(message) = status.and_then(|s| s.message()) {
            description = description.with_message(message);
        }
        Ok(description)
    }

    async fn list_active_export_tasks(&self) -> Result<Vec<TaskId>> {
        let mut active = self.list_tasks_with_status(ExportTaskStatusCode::Pending).await?;
        active.extend(self.list_tasks_with_status(ExportTaskStatusCode::Running).await?);
        active.extend(
            self.list_tasks_with_status(ExportTaskStatusCode::PendingCancel)
                .await?,
        );
        Ok(active)
    }
}
