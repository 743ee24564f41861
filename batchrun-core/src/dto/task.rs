//! Task DTOs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::pool::PackageRef;
use crate::domain::task::{TaskExecutionInfo, TaskId, TaskState};

/// Descriptor of a task to submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSpec {
    pub id: TaskId,
    pub command_line: String,
    #[serde(default)]
    pub packages: Vec<PackageRef>,
}

/// Local reference to a submitted task
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskHandle {
    pub job_id: String,
    pub task_id: TaskId,
}

impl TaskHandle {
    pub fn new(job_id: impl Into<String>, task_id: TaskId) -> Self {
        Self {
            job_id: job_id.into(),
            task_id,
        }
    }
}

/// Task view returned by listing; only selected fields are populated
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskSummary {
    pub id: TaskId,
    pub state: Option<TaskState>,
}

/// Task view returned by a refresh; only selected fields are populated
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskExecutionRecord {
    pub id: TaskId,
    pub state: Option<TaskState>,
    pub execution_info: Option<TaskExecutionInfo>,
}

/// Task property that can be requested from the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskField {
    Id,
    State,
    ExecutionInfo,
}

impl TaskField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskField::Id => "id",
            TaskField::State => "state",
            TaskField::ExecutionInfo => "executionInfo",
        }
    }
}

/// Set of task properties to populate in a response
///
/// Asking only for what is needed keeps provider responses small.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSelection {
    fields: Vec<TaskField>,
}

impl FieldSelection {
    pub fn new(fields: impl IntoIterator<Item = TaskField>) -> Self {
        let mut selected = Vec::new();
        for field in fields {
            if !selected.contains(&field) {
                selected.push(field);
            }
        }
        Self { fields: selected }
    }

    /// `id,state` - used while waiting for completion
    pub fn id_and_state() -> Self {
        Self::new([TaskField::Id, TaskField::State])
    }

    /// `id,executionInfo` - used to refresh completed tasks
    pub fn id_and_execution_info() -> Self {
        Self::new([TaskField::Id, TaskField::ExecutionInfo])
    }

    pub fn includes(&self, field: TaskField) -> bool {
        self.fields.contains(&field)
    }

    /// Comma separated select clause sent to the provider
    pub fn select_clause(&self) -> String {
        self.fields
            .iter()
            .map(TaskField::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for FieldSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.select_clause())
    }
}
