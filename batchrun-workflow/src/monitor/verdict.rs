//! Per-task outcomes and the aggregate verdict

use batchrun_core::domain::task::{FailureInfo, TaskId, TaskResult, TaskState};
use batchrun_core::dto::task::TaskExecutionRecord;

use crate::config::ExitCodePolicy;

/// Reconciled outcome of one task after completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub task_id: TaskId,
    pub state: Option<TaskState>,
    pub result: Option<TaskResult>,
    pub exit_code: Option<i32>,
    pub failure: Option<FailureInfo>,
}

impl TaskOutcome {
    pub(crate) fn from_record(task_id: TaskId, record: TaskExecutionRecord) -> Self {
        let info = record.execution_info.unwrap_or_default();
        Self {
            task_id,
            state: record.state,
            result: info.result,
            exit_code: info.exit_code,
            failure: info.failure_info,
        }
    }

    /// Whether this task counts as succeeded under `policy`
    ///
    /// A missing result is not a success.
    pub fn succeeded(&self, policy: ExitCodePolicy) -> bool {
        if self.result != Some(TaskResult::Success) {
            return false;
        }
        match policy {
            ExitCodePolicy::Diagnostic => true,
            ExitCodePolicy::Strict => self.exit_code.is_none_or(|code| code == 0),
        }
    }

    pub fn has_nonzero_exit(&self) -> bool {
        self.exit_code.is_some_and(|code| code != 0)
    }

    /// Failure message reported by the provider, if any
    pub fn failure_message(&self) -> Option<&str> {
        self.failure.as_ref().map(|f| f.message.as_str())
    }
}

/// Aggregate success/failure of a run whose tasks all completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    outcomes: Vec<TaskOutcome>,
    policy: ExitCodePolicy,
}

impl Verdict {
    pub fn new(outcomes: Vec<TaskOutcome>, policy: ExitCodePolicy) -> Self {
        Self { outcomes, policy }
    }

    /// True iff every task succeeded
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(|o| o.succeeded(self.policy))
    }

    /// Outcomes in submission order
    pub fn outcomes(&self) -> &[TaskOutcome] {
        &self.outcomes
    }

    /// Every task that did not succeed, in submission order
    pub fn failures(&self) -> Vec<&TaskOutcome> {
        self.outcomes
            .iter()
            .filter(|o| !o.succeeded(self.policy))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(id: &str, result: Option<TaskResult>, exit_code: Option<i32>) -> TaskOutcome {
        TaskOutcome {
            task_id: TaskId::from(id),
            state: Some(TaskState::Completed),
            result,
            exit_code,
            failure: None,
        }
    }

    #[test]
    fn test_verdict_requires_every_success() {
        let verdict = Verdict::new(
            vec![
                outcome("task0", Some(TaskResult::Success), Some(0)),
                outcome("task1", Some(TaskResult::Failure), Some(1)),
            ],
            ExitCodePolicy::Diagnostic,
        );
        assert!(!verdict.succeeded());
        let failures = verdict.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].task_id, TaskId::from("task1"));
    }

    #[test]
    fn test_exit_code_is_diagnostic_by_default() {
        let task = outcome("task0", Some(TaskResult::Success), Some(3));
        assert!(task.succeeded(ExitCodePolicy::Diagnostic));
        assert!(!task.succeeded(ExitCodePolicy::Strict));
        assert!(task.has_nonzero_exit());
    }

    #[test]
    fn test_missing_result_is_failure() {
        let task = outcome("task0", None, None);
        assert!(!task.succeeded(ExitCodePolicy::Diagnostic));
    }

    #[test]
    fn test_empty_verdict_succeeds() {
        assert!(Verdict::new(Vec::new(), ExitCodePolicy::Strict).succeeded());
    }
}
