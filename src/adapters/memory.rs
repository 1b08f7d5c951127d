//! In-memory collaborators
//!
//! Process-local implementations of the collaborator traits. They back the
//! test suites and let the workflow run end to end without AWS credentials.
//! The export service is scriptable: each created task walks through a queue
//! of statuses, one per describe call.

use crate::adapters::traits::{
    Clock, ExportTaskService, LogRegistry, NotificationSink, ParameterStore,
};
use crate::domain::{
    Chunk, ExporterError, LogGroup, LogGroupName, LogGroupPage, Result, TaskDescription, TaskId,
    TaskStatus,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Registry over a fixed list of log groups
#[derive(Debug, Default)]
pub struct InMemoryLogRegistry {
    log_groups: Mutex<Vec<LogGroup>>,
    tags: Mutex<HashMap<LogGroupName, HashMap<String, String>>>,
    page_size: usize,
}

impl InMemoryLogRegistry {
    /// Create an empty registry returning `page_size` entries per page
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Default::default()
        }
    }

    /// Register a log group with its tags
    pub fn add_log_group(&self, log_group: LogGroup, tags: &[(&str, &str)]) {
        let tag_map = tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        lock(&self.tags).insert(log_group.name.clone(), tag_map);
        lock(&self.log_groups).push(log_group);
    }

    fn find(&self, name: &LogGroupName) -> Result<LogGroup> {
        lock(&self.log_groups)
            .iter()
            .find(|lg| &lg.name == name)
            .cloned()
            .ok_or_else(|| ExporterError::NotFound(format!("log group {name}")))
    }
}

#[async_trait]
impl LogRegistry for InMemoryLogRegistry {
    async fn list_log_groups(&self, page_token: Option<String>) -> Result<LogGroupPage> {
        let start = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| ExporterError::Other(format!("Invalid page token: {token}")))?,
            None => 0,
        };

        let groups = lock(&self.log_groups);
        let end = (start + self.page_size).min(groups.len());
        let page = groups.get(start..end).map(<[LogGroup]>::to_vec).unwrap_or_default();
        let next_token = (end < groups.len()).then(|| end.to_string());

        Ok(LogGroupPage {
            log_groups: page,
            next_token,
        })
    }

    async fn get_tags(&self, log_group: &LogGroupName) -> Result<HashMap<String, String>> {
        Ok(lock(&self.tags).get(log_group).cloned().unwrap_or_default())
    }

    async fn get_creation_time(&self, log_group: &LogGroupName) -> Result<i64> {
        self.find(log_group)?.creation_time.ok_or_else(|| {
            ExporterError::NotFound(format!("creation time for log group {log_group}"))
        })
    }

    async fn get_stored_bytes(&self, log_group: &LogGroupName) -> Result<i64> {
        self.find(log_group)?.stored_bytes.ok_or_else(|| {
            ExporterError::NotFound(format!("stored bytes for log group {log_group}"))
        })
    }
}

/// A call observed by [`InMemoryExportService`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    /// `list_active_export_tasks`
    ListActive,
    /// `create_export_task`
    Create {
        log_group: LogGroupName,
        chunk: Chunk,
        destination: String,
        destination_prefix: String,
    },
    /// `describe_export_task`
    Describe(TaskId),
}

#[derive(Debug, Default)]
struct ServiceState {
    next_id: u64,
    calls: Vec<ServiceCall>,
    tasks: HashMap<TaskId, VecDeque<TaskDescription>>,
    scripts: VecDeque<Vec<TaskDescription>>,
    external_active: bool,
    throttle_creates: u32,
    throttle_describes: u32,
    throttle_list_active: u32,
    describe_failures: u32,
    reject_creates_as_active: u32,
}

/// Scriptable export task service
#[derive(Debug, Default)]
pub struct InMemoryExportService {
    state: Mutex<ServiceState>,
}

impl InMemoryExportService {
    /// Create a service whose tasks complete on the first describe
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the status sequence for the next created task
    ///
    /// Each describe call returns the next entry; the last entry repeats.
    /// Tasks created without a queued script complete immediately.
    pub fn script_next_task(&self, statuses: Vec<TaskDescription>) {
        lock(&self.state).scripts.push_back(statuses);
    }

    /// Pretend a task owned by someone else is running
    pub fn set_external_active(&self, active: bool) {
        lock(&self.state).external_active = active;
    }

    /// Throttle the next `n` create calls
    pub fn throttle_next_creates(&self, n: u32) {
        lock(&self.state).throttle_creates = n;
    }

    /// Throttle the next `n` describe calls
    pub fn throttle_next_describes(&self, n: u32) {
        lock(&self.state).throttle_describes = n;
    }

    /// Throttle the next `n` active-task listings
    pub fn throttle_next_list_active(&self, n: u32) {
        lock(&self.state).throttle_list_active = n;
    }

    /// Fail the next `n` describe calls with a non-throttling service error
    pub fn fail_next_describes(&self, n: u32) {
        lock(&self.state).describe_failures = n;
    }

    /// Reject the next `n` create calls as "task already active"
    pub fn reject_next_creates_as_active(&self, n: u32) {
        lock(&self.state).reject_creates_as_active = n;
    }

    /// Every call received so far, in order
    pub fn calls(&self) -> Vec<ServiceCall> {
        lock(&self.state).calls.clone()
    }

    /// Chunks submitted so far, in order
    pub fn submitted_chunks(&self) -> Vec<(LogGroupName, Chunk)> {
        lock(&self.state)
            .calls
            .iter()
            .filter_map(|call| match call {
                ServiceCall::Create {
                    log_group, chunk, ..
                } => Some((log_group.clone(), *chunk)),
                _ => None,
            })
            .collect()
    }
}

fn throttled(operation: &str) -> ExporterError {
    ExporterError::Throttled {
        operation: operation.to_string(),
        message: "Rate exceeded".to_string(),
    }
}

#[async_trait]
impl ExportTaskService for InMemoryExportService {
    async fn create_export_task(
        &self,
        log_group: &LogGroupName,
        chunk: &Chunk,
        destination: &str,
        destination_prefix: &str,
    ) -> Result<TaskId> {
        let mut state = lock(&self.state);
        state.calls.push(ServiceCall::Create {
            log_group: log_group.clone(),
            chunk: *chunk,
            destination: destination.to_string(),
            destination_prefix: destination_prefix.to_string(),
        });

        if state.throttle_creates > 0 {
            state.throttle_creates -= 1;
            return Err(throttled("CreateExportTask"));
        }
        if state.reject_creates_as_active > 0 {
            state.reject_creates_as_active -= 1;
            return Err(ExporterError::TaskAlreadyActive(
                "Resource limit exceeded".to_string(),
            ));
        }

        state.next_id += 1;
        let task_id = TaskId::new(format!("task-{:04}", state.next_id))
            .map_err(ExporterError::Other)?;
        let script = state
            .scripts
            .pop_front()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| vec![TaskDescription::new(TaskStatus::Completed)]);
        state.tasks.insert(task_id.clone(), script.into());

        Ok(task_id)
    }

    async fn describe_export_task(&self, task_id: &TaskId) -> Result<TaskDescription> {
        let mut state = lock(&self.state);
        state.calls.push(ServiceCall::Describe(task_id.clone()));

        if state.throttle_describes > 0 {
            state.throttle_describes -= 1;
            return Err(throttled("DescribeExportTasks"));
        }
        if state.describe_failures > 0 {
            state.describe_failures -= 1;
            return Err(ExporterError::Aws {
                operation: "DescribeExportTasks".to_string(),
                code: "ServiceUnavailable".to_string(),
                message: "connection reset".to_string(),
            });
        }

        let queue = state
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| ExporterError::NotFound(format!("export task {task_id}")))?;
        let current = queue
            .front()
            .cloned()
            .ok_or_else(|| ExporterError::Other(format!("export task {task_id} has no status")))?;
        if queue.len() > 1 {
            queue.pop_front();
        }

        Ok(current)
    }

    async fn list_active_export_tasks(&self) -> Result<Vec<TaskId>> {
        let mut state = lock(&self.state);
        state.calls.push(ServiceCall::ListActive);

        if state.throttle_list_active > 0 {
            state.throttle_list_active -= 1;
            return Err(throttled("DescribeExportTasks"));
        }

        let mut active: Vec<TaskId> = state
            .tasks
            .iter()
            .filter(|(_, queue)| queue.front().is_some_and(|d| d.status.is_active()))
            .map(|(id, _)| id.clone())
            .collect();
        if state.external_active {
            active.push(TaskId::new("external-task").map_err(ExporterError::Other)?);
        }

        Ok(active)
    }
}

/// Parameter store backed by a map
#[derive(Debug, Default)]
pub struct InMemoryParameterStore {
    values: Mutex<HashMap<String, String>>,
    history: Mutex<Vec<(String, String)>>,
    reject_writes: Mutex<bool>,
}

impl InMemoryParameterStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail
    pub fn reject_writes(&self, reject: bool) {
        *lock(&self.reject_writes) = reject;
    }

    /// Current value of a parameter
    pub fn value(&self, name: &str) -> Option<String> {
        lock(&self.values).get(name).cloned()
    }

    /// Every value written to `name`, oldest first
    pub fn writes(&self, name: &str) -> Vec<String> {
        lock(&self.history)
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
            .collect()
    }

    /// All parameter names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = lock(&self.values).keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl ParameterStore for InMemoryParameterStore {
    async fn put(&self, name: &str, value: &str) -> Result<()> {
        if *lock(&self.reject_writes) {
            return Err(ExporterError::State(format!(
                "write to parameter {name} rejected"
            )));
        }
        lock(&self.values).insert(name.to_string(), value.to_string());
        lock(&self.history).push((name.to_string(), value.to_string()));
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(lock(&self.values).get(name).cloned())
    }
}

/// A message captured by [`RecordingNotificationSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// Notification sink that keeps every message
#[derive(Debug, Default)]
pub struct RecordingNotificationSink {
    messages: Mutex<Vec<Notification>>,
    fail: Mutex<bool>,
}

impl RecordingNotificationSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent publish fail
    pub fn fail_publishes(&self, fail: bool) {
        *lock(&self.fail) = fail;
    }

    /// Messages published so far
    pub fn messages(&self) -> Vec<Notification> {
        lock(&self.messages).clone()
    }

    /// Subjects published so far
    pub fn subjects(&self) -> Vec<String> {
        lock(&self.messages)
            .iter()
            .map(|n| n.subject.clone())
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingNotificationSink {
    async fn publish(&self, subject: &str, body: &str) -> Result<()> {
        if *lock(&self.fail) {
            return Err(ExporterError::Notification("topic unavailable".to_string()));
        }
        lock(&self.messages).push(Notification {
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct FixedClock {
    now: AtomicI64,
}

impl FixedClock {
    /// Create a clock reading `now_millis`
    pub fn new(now_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(now_millis),
        }
    }

    /// Set the current time
    pub fn set(&self, now_millis: i64) {
        self.now.store(now_millis, Ordering::SeqCst);
    }

    /// Move the clock forward
    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
