//! Task submission
//!
//! Turns work items into task descriptors and hands the whole batch to the
//! provider in a single call.

use batchrun_client::{BatchProvider, ProviderError};
use batchrun_core::domain::pool::PackageRef;
use batchrun_core::domain::task::TaskId;
use batchrun_core::dto::task::{TaskHandle, TaskSpec};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::WorkflowError;

/// One unit of work; becomes exactly one task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Reference to the item's input, substituted into the command line
    pub payload: String,
}

impl WorkItem {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

/// Command line template and package profile shared by all tasks
///
/// `{payload}` in the command is replaced by the work item's payload and
/// `{index}` by its position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTemplate {
    pub command: String,
    pub packages: Vec<PackageRef>,
}

impl TaskTemplate {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            packages: Vec::new(),
        }
    }

    pub fn with_package(mut self, package: PackageRef) -> Self {
        self.packages.push(package);
        self
    }

    /// Task descriptor for the work item at `index`
    pub fn render(&self, index: usize, item: &WorkItem) -> TaskSpec {
        let command_line = self
            .command
            .replace("{index}", &index.to_string())
            .replace("{payload}", &item.payload);

        TaskSpec {
            id: TaskId::for_index(index),
            command_line: command_line.trim_end().to_string(),
            packages: self.packages.clone(),
        }
    }
}

/// Bulk submitter of tasks
pub struct TaskSubmitter {
    provider: Arc<dyn BatchProvider>,
    template: TaskTemplate,
}

impl TaskSubmitter {
    pub fn new(provider: Arc<dyn BatchProvider>, template: TaskTemplate) -> Self {
        Self { provider, template }
    }

    /// Submits one task per work item
    ///
    /// # Returns
    /// Handles in work-item order: `handles[i]` is the task of `items[i]`
    pub async fn submit_tasks(
        &self,
        job_id: &str,
        items: &[WorkItem],
    ) -> Result<Vec<TaskHandle>, WorkflowError> {
        if items.is_empty() {
            warn!("No work items for job [{}], nothing to submit", job_id);
            return Ok(Vec::new());
        }

        info!("Adding {} task(s) to job [{}]", items.len(), job_id);

        let specs: Vec<TaskSpec> = items
            .iter()
            .enumerate()
            .map(|(index, item)| self.template.render(index, item))
            .collect();

        let acknowledged = self
            .provider
            .submit_tasks(job_id, &specs)
            .await
            .map_err(|source| WorkflowError::Submission {
                job_id: job_id.to_string(),
                source,
            })?;

        // Order comes from our own batch; the provider only has to account
        // for every task in it.
        let acked: HashSet<&TaskId> = acknowledged.iter().map(|h| &h.task_id).collect();
        let missing = specs.iter().filter(|s| !acked.contains(&s.id)).count();
        if missing > 0 || acknowledged.len() != specs.len() {
            return Err(WorkflowError::Submission {
                job_id: job_id.to_string(),
                source: ProviderError::ParseError(format!(
                    "bulk submission of {} task(s) returned {} handle(s), {} task(s) unaccounted for",
                    specs.len(),
                    acknowledged.len(),
                    missing
                )),
            });
        }

        Ok(specs
            .into_iter()
            .map(|spec| TaskHandle::new(job_id, spec.id))
            .collect())
    }
}
