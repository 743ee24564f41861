//! Task domain types
//!
//! A task is created client-side, submitted in bulk, and from then on only
//! mutated by the provider. The client observes its execution record by
//! listing or refreshing.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::pool::PackageRef;

/// Identifier of a task, unique within its job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id of the task generated for the work item at `index`
    pub fn for_index(index: usize) -> Self {
        Self(format!("task{index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Task state as reported by the provider
///
/// Transitions run `Active -> Preparing -> Running -> Completed`; the
/// provider may skip intermediate states.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskState {
    #[default]
    Active,
    Preparing,
    Running,
    Completed,
}

impl TaskState {
    /// Returns true if no further transition can occur
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Active => write!(f, "Active"),
            TaskState::Preparing => write!(f, "Preparing"),
            TaskState::Running => write!(f, "Running"),
            TaskState::Completed => write!(f, "Completed"),
        }
    }
}

/// Outcome of a completed task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskResult {
    Success,
    Failure,
}

/// Failure details attached by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureInfo {
    pub code: Option<String>,
    pub message: String,
}

/// Execution details of a task
///
/// Only meaningful once the task reached `Completed`; before that `result`
/// and `exit_code` are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskExecutionInfo {
    pub result: Option<TaskResult>,
    pub exit_code: Option<i32>,
    pub failure_info: Option<FailureInfo>,
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
}

/// Task as held by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub job_id: String,
    pub command_line: String,
    #[serde(default)]
    pub packages: Vec<PackageRef>,
    pub state: TaskState,
    pub execution_info: Option<TaskExecutionInfo>,
}
