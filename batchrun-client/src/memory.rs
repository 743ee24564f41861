//! In-memory provider
//!
//! A scripted simulation of a batch service. Every task follows a
//! [`TaskScript`]: listing the tasks of a job moves each one a step further
//! along its script, so a test controls exactly how many polls a task needs
//! to complete and how it ends. All calls are recorded as [`ProviderCall`]s.

use async_trait::async_trait;
use batchrun_core::domain::job::{Job, JobState};
use batchrun_core::domain::pool::Pool;
use batchrun_core::domain::task::{
    FailureInfo, Task, TaskExecutionInfo, TaskId, TaskResult, TaskState,
};
use batchrun_core::dto::job::CreateJob;
use batchrun_core::dto::pool::PoolSpec;
use batchrun_core::dto::task::{
    FieldSelection, TaskExecutionRecord, TaskField, TaskHandle, TaskSpec, TaskSummary,
};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{
    JOB_EXISTS, JOB_NOT_ACTIVE, JOB_NOT_FOUND, POOL_EXISTS, POOL_NOT_FOUND, ProviderError,
    Result, TASK_EXISTS, TASK_NOT_FOUND,
};
use crate::provider::BatchProvider;

/// Failure code attached to tasks torn down by a job termination
pub const JOB_TERMINATED: &str = "JobTerminated";

/// Provider operation, used to inject faults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreatePool,
    CreateJob,
    SubmitTasks,
    ListTasks,
    RefreshTask,
    TerminateJob,
    DeleteJob,
    DeletePool,
}

/// A call received by the in-memory provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCall {
    CreatePool { pool_id: String },
    CreateJob { job_id: String, pool_id: String },
    SubmitTasks { job_id: String, task_ids: Vec<TaskId> },
    ListTasks { job_id: String, select: String },
    RefreshTask { task_id: TaskId, select: String },
    TerminateJob { job_id: String, reason: String },
    DeleteJob { job_id: String },
    DeletePool { pool_id: String },
}

/// Error returned by every call of an operation once injected
#[derive(Debug, Clone)]
pub struct Fault {
    status: u16,
    code: Option<String>,
    message: String,
}

impl Fault {
    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status: 409,
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self {
            status: 500,
            code: Some("InternalError".to_string()),
            message: message.into(),
        }
    }

    fn to_error(&self) -> ProviderError {
        match (self.status, &self.code) {
            (409, Some(code)) => ProviderError::conflict(code.clone(), self.message.clone()),
            (status, code) => ProviderError::api_error(status, code.clone(), self.message.clone()),
        }
    }
}

/// How a completed task ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedOutcome {
    pub result: TaskResult,
    pub exit_code: Option<i32>,
    pub failure: Option<FailureInfo>,
}

/// Sequence of states a simulated task walks through
///
/// The task starts in the first state and moves one step per listing of its
/// job, staying in the last state once reached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskScript {
    steps: Vec<TaskState>,
    outcome: ScriptedOutcome,
}

impl TaskScript {
    pub fn new(steps: Vec<TaskState>, outcome: ScriptedOutcome) -> Self {
        let steps = if steps.is_empty() {
            vec![TaskState::Active]
        } else {
            steps
        };
        Self { steps, outcome }
    }

    /// Runs and completes with exit code 0
    pub fn succeeds() -> Self {
        Self::new(
            vec![TaskState::Active, TaskState::Running, TaskState::Completed],
            ScriptedOutcome {
                result: TaskResult::Success,
                exit_code: Some(0),
                failure: None,
            },
        )
    }

    /// Runs and completes with a failure
    pub fn fails(exit_code: i32, message: impl Into<String>) -> Self {
        Self::new(
            vec![TaskState::Active, TaskState::Running, TaskState::Completed],
            ScriptedOutcome {
                result: TaskResult::Failure,
                exit_code: Some(exit_code),
                failure: Some(FailureInfo {
                    code: Some("CommandProgramNonZeroExitCode".to_string()),
                    message: message.into(),
                }),
            },
        )
    }

    /// Completes without ever running, as when the node could not start it
    pub fn scheduling_error(message: impl Into<String>) -> Self {
        Self::new(
            vec![TaskState::Active, TaskState::Completed],
            ScriptedOutcome {
                result: TaskResult::Failure,
                exit_code: None,
                failure: Some(FailureInfo {
                    code: Some("TaskSchedulingError".to_string()),
                    message: message.into(),
                }),
            },
        )
    }

    /// Reaches `state` and never leaves it
    pub fn stuck_in(state: TaskState) -> Self {
        let mut script = Self::succeeds();
        script.steps = vec![TaskState::Active, state];
        script
    }

    /// Spends `polls` extra listings in `Running` before completing
    pub fn slow(polls: usize) -> Self {
        let mut script = Self::succeeds();
        let mut steps = vec![TaskState::Active, TaskState::Preparing];
        steps.extend(std::iter::repeat_n(TaskState::Running, polls.max(1)));
        steps.push(TaskState::Completed);
        script.steps = steps;
        script
    }

    fn initial_state(&self) -> TaskState {
        self.steps[0]
    }
}

impl Default for TaskScript {
    fn default() -> Self {
        Self::succeeds()
    }
}

struct SimTask {
    task: Task,
    script: TaskScript,
    cursor: usize,
}

impl SimTask {
    fn advance(&mut self) {
        if self.task.state.is_terminal() {
            return;
        }
        self.cursor = (self.cursor + 1).min(self.script.steps.len() - 1);
        let next = self.script.steps[self.cursor];

        if next == TaskState::Running && self.task.state != TaskState::Running {
            self.task.execution_info = Some(TaskExecutionInfo {
                start_time: Some(Utc::now()),
                ..Default::default()
            });
        }
        if next.is_terminal() {
            let outcome = &self.script.outcome;
            let mut info = self.task.execution_info.take().unwrap_or_default();
            info.result = Some(outcome.result);
            info.exit_code = outcome.exit_code;
            info.failure_info = outcome.failure.clone();
            info.end_time = Some(Utc::now());
            self.task.execution_info = Some(info);
        }
        self.task.state = next;
    }

    fn terminate(&mut self, reason: &str) {
        if self.task.state.is_terminal() {
            return;
        }
        let mut info = self.task.execution_info.take().unwrap_or_default();
        info.result = Some(TaskResult::Failure);
        info.failure_info = Some(FailureInfo {
            code: Some(JOB_TERMINATED.to_string()),
            message: reason.to_string(),
        });
        info.end_time = Some(Utc::now());
        self.task.execution_info = Some(info);
        self.task.state = TaskState::Completed;
    }
}

#[derive(Default)]
struct State {
    pools: HashMap<String, Pool>,
    jobs: HashMap<String, Job>,
    /// Tasks per job, in submission order
    tasks: HashMap<String, Vec<SimTask>>,
    scripts: HashMap<TaskId, TaskScript>,
    default_script: TaskScript,
    faults: HashMap<Operation, Fault>,
    calls: Vec<ProviderCall>,
}

impl State {
    fn check_fault(&self, op: Operation) -> Result<()> {
        match self.faults.get(&op) {
            Some(fault) => Err(fault.to_error()),
            None => Ok(()),
        }
    }
}

/// Scripted in-process batch provider
pub struct InMemoryProvider {
    state: Mutex<State>,
}

impl InMemoryProvider {
    /// Creates an empty provider where every task succeeds
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
        }
    }

    /// Script used for tasks without their own script
    pub fn with_default_script(mut self, script: TaskScript) -> Self {
        self.state.get_mut().default_script = script;
        self
    }

    /// Script for every task with the given id
    pub fn with_script(mut self, task_id: impl Into<TaskId>, script: TaskScript) -> Self {
        self.state.get_mut().scripts.insert(task_id.into(), script);
        self
    }

    /// Make every call of `op` fail
    pub fn with_fault(mut self, op: Operation, fault: Fault) -> Self {
        self.state.get_mut().faults.insert(op, fault);
        self
    }

    /// Seed a pool as if a previous run had created it
    pub fn with_existing_pool(mut self, spec: &PoolSpec) -> Self {
        let pool = pool_from_spec(spec);
        self.state.get_mut().pools.insert(pool.id.clone(), pool);
        self
    }

    /// All calls received so far, oldest first
    pub async fn calls(&self) -> Vec<ProviderCall> {
        self.state.lock().await.calls.clone()
    }

    pub async fn pool_count(&self) -> usize {
        self.state.lock().await.pools.len()
    }

    pub async fn job(&self, job_id: &str) -> Option<Job> {
        self.state.lock().await.jobs.get(job_id).cloned()
    }

    /// Tasks of a job in submission order
    pub async fn tasks(&self, job_id: &str) -> Vec<Task> {
        self.state
            .lock()
            .await
            .tasks
            .get(job_id)
            .map(|tasks| tasks.iter().map(|t| t.task.clone()).collect())
            .unwrap_or_default()
    }
}

impl Default for InMemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn pool_from_spec(spec: &PoolSpec) -> Pool {
    Pool {
        id: spec.id.clone(),
        target_nodes: spec.target_nodes,
        machine: spec.machine.clone(),
        start_task: spec.start_task.clone(),
        packages: spec.packages.clone(),
        created_at: Utc::now(),
    }
}

#[async_trait]
impl BatchProvider for InMemoryProvider {
    async fn create_pool(&self, spec: &PoolSpec) -> Result<Pool> {
        let mut state = self.state.lock().await;
        state.calls.push(ProviderCall::CreatePool {
            pool_id: spec.id.clone(),
        });
        state.check_fault(Operation::CreatePool)?;

        if state.pools.contains_key(&spec.id) {
            return Err(ProviderError::conflict(
                POOL_EXISTS,
                format!("The specified pool {} already exists.", spec.id),
            ));
        }

        let pool = pool_from_spec(spec);
        state.pools.insert(pool.id.clone(), pool.clone());
        debug!("Simulated pool {} created", pool.id);
        Ok(pool)
    }

    async fn create_job(&self, req: &CreateJob) -> Result<Job> {
        let mut state = self.state.lock().await;
        state.calls.push(ProviderCall::CreateJob {
            job_id: req.id.clone(),
            pool_id: req.pool_id.clone(),
        });
        state.check_fault(Operation::CreateJob)?;

        if state.jobs.contains_key(&req.id) {
            return Err(ProviderError::conflict(
                JOB_EXISTS,
                format!("The specified job {} already exists.", req.id),
            ));
        }
        if !state.pools.contains_key(&req.pool_id) {
            return Err(ProviderError::NotFound(format!(
                "{}: pool {} does not exist",
                POOL_NOT_FOUND, req.pool_id
            )));
        }

        let job = Job {
            id: req.id.clone(),
            pool_id: req.pool_id.clone(),
            state: JobState::Active,
            created_at: Utc::now(),
            terminated_at: None,
            terminate_reason: None,
        };
        state.jobs.insert(job.id.clone(), job.clone());
        state.tasks.insert(job.id.clone(), Vec::new());
        debug!("Simulated job {} created on pool {}", job.id, job.pool_id);
        Ok(job)
    }

    async fn submit_tasks(&self, job_id: &str, tasks: &[TaskSpec]) -> Result<Vec<TaskHandle>> {
        let mut state = self.state.lock().await;
        state.calls.push(ProviderCall::SubmitTasks {
            job_id: job_id.to_string(),
            task_ids: tasks.iter().map(|t| t.id.clone()).collect(),
        });
        state.check_fault(Operation::SubmitTasks)?;

        let job = state.jobs.get(job_id).ok_or_else(|| {
            ProviderError::NotFound(format!("{}: job {} does not exist", JOB_NOT_FOUND, job_id))
        })?;
        if job.state != JobState::Active {
            return Err(ProviderError::conflict(
                JOB_NOT_ACTIVE,
                format!("Job {} is {} and does not accept tasks", job_id, job.state),
            ));
        }

        // Validate the whole batch before anything becomes visible
        let mut seen: HashSet<&TaskId> = state
            .tasks
            .get(job_id)
            .map(|existing| existing.iter().map(|t| &t.task.id).collect())
            .unwrap_or_default();
        for spec in tasks {
            if !seen.insert(&spec.id) {
                return Err(ProviderError::conflict(
                    TASK_EXISTS,
                    format!("Task {} already exists in job {}", spec.id, job_id),
                ));
            }
        }

        let new_tasks: Vec<SimTask> = tasks
            .iter()
            .map(|spec| {
                let script = state
                    .scripts
                    .get(&spec.id)
                    .unwrap_or(&state.default_script)
                    .clone();
                SimTask {
                    task: Task {
                        id: spec.id.clone(),
                        job_id: job_id.to_string(),
                        command_line: spec.command_line.clone(),
                        packages: spec.packages.clone(),
                        state: script.initial_state(),
                        execution_info: None,
                    },
                    script,
                    cursor: 0,
                }
            })
            .collect();

        state
            .tasks
            .entry(job_id.to_string())
            .or_default()
            .extend(new_tasks);

        debug!("Simulated job {} received {} task(s)", job_id, tasks.len());
        Ok(tasks
            .iter()
            .map(|spec| TaskHandle::new(job_id, spec.id.clone()))
            .collect())
    }

    async fn list_tasks(&self, job_id: &str, fields: &FieldSelection) -> Result<Vec<TaskSummary>> {
        let mut state = self.state.lock().await;
        state.calls.push(ProviderCall::ListTasks {
            job_id: job_id.to_string(),
            select: fields.select_clause(),
        });
        state.check_fault(Operation::ListTasks)?;

        let tasks = state.tasks.get_mut(job_id).ok_or_else(|| {
            ProviderError::NotFound(format!("{}: job {} does not exist", JOB_NOT_FOUND, job_id))
        })?;

        let with_state = fields.includes(TaskField::State);
        Ok(tasks
            .iter_mut()
            .map(|sim| {
                sim.advance();
                TaskSummary {
                    id: sim.task.id.clone(),
                    state: with_state.then_some(sim.task.state),
                }
            })
            .collect())
    }

    async fn refresh_task(
        &self,
        handle: &TaskHandle,
        fields: &FieldSelection,
    ) -> Result<TaskExecutionRecord> {
        let mut state = self.state.lock().await;
        state.calls.push(ProviderCall::RefreshTask {
            task_id: handle.task_id.clone(),
            select: fields.select_clause(),
        });
        state.check_fault(Operation::RefreshTask)?;

        let task = state
            .tasks
            .get(&handle.job_id)
            .and_then(|tasks| tasks.iter().find(|t| t.task.id == handle.task_id))
            .map(|sim| &sim.task)
            .ok_or_else(|| {
                ProviderError::NotFound(format!(
                    "{}: task {} does not exist in job {}",
                    TASK_NOT_FOUND, handle.task_id, handle.job_id
                ))
            })?;

        Ok(TaskExecutionRecord {
            id: task.id.clone(),
            state: fields.includes(TaskField::State).then_some(task.state),
            execution_info: if fields.includes(TaskField::ExecutionInfo) {
                task.execution_info.clone()
            } else {
                None
            },
        })
    }

    async fn terminate_job(&self, job_id: &str, reason: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.calls.push(ProviderCall::TerminateJob {
            job_id: job_id.to_string(),
            reason: reason.to_string(),
        });
        state.check_fault(Operation::TerminateJob)?;

        let job = state.jobs.get_mut(job_id).ok_or_else(|| {
            ProviderError::NotFound(format!("{}: job {} does not exist", JOB_NOT_FOUND, job_id))
        })?;
        job.state = JobState::Completed;
        job.terminated_at = Some(Utc::now());
        job.terminate_reason = Some(reason.to_string());

        if let Some(tasks) = state.tasks.get_mut(job_id) {
            for sim in tasks.iter_mut() {
                sim.terminate(reason);
            }
        }
        debug!("Simulated job {} terminated: {}", job_id, reason);
        Ok(())
    }

    async fn delete_job(&self, job_id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.calls.push(ProviderCall::DeleteJob {
            job_id: job_id.to_string(),
        });
        state.check_fault(Operation::DeleteJob)?;

        if state.jobs.remove(job_id).is_none() {
            return Err(ProviderError::NotFound(format!(
                "{}: job {} does not exist",
                JOB_NOT_FOUND, job_id
            )));
        }
        state.tasks.remove(job_id);
        Ok(())
    }

    async fn delete_pool(&self, pool_id: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.calls.push(ProviderCall::DeletePool {
            pool_id: pool_id.to_string(),
        });
        state.check_fault(Operation::DeletePool)?;

        if state.pools.remove(pool_id).is_none() {
            return Err(ProviderError::NotFound(format!(
                "{}: pool {} does not exist",
                POOL_NOT_FOUND, pool_id
            )));
        }
        Ok(())
    }
}
