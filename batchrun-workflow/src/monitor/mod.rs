//! Completion monitoring
//!
//! Waits for every submitted task to reach `Completed`, terminates the job,
//! and only then refreshes each task to find out how it ended. Completion
//! and success are independent: a completed task may still have failed.

mod poller;
mod verdict;

pub use verdict::{TaskOutcome, Verdict};

use batchrun_client::BatchProvider;
use batchrun_core::dto::task::{FieldSelection, TaskHandle};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::{ExitCodePolicy, PollPolicy};
use crate::error::{MonitorError, TimeoutError};
use poller::{StatePoller, WaitOutcome};

/// Termination reason used when every task completed
pub const SUCCESS_REASON: &str = "All tasks reached state Completed.";

/// Termination reason used when the deadline passed first
pub const TIMEOUT_REASON: &str =
    "One or more tasks failed to reach the Completed state within the timeout period.";

/// Tracks submitted tasks to a verdict
pub struct CompletionMonitor {
    provider: Arc<dyn BatchProvider>,
    poll: PollPolicy,
    exit_codes: ExitCodePolicy,
}

impl CompletionMonitor {
    pub fn new(provider: Arc<dyn BatchProvider>, poll: PollPolicy, exit_codes: ExitCodePolicy) -> Self {
        Self {
            provider,
            poll,
            exit_codes,
        }
    }

    /// Waits for the tasks and reconciles their outcomes
    ///
    /// On timeout the job is terminated with [`TIMEOUT_REASON`] and no task
    /// is refreshed; the timeout is returned even if the termination fails. Otherwise the job is terminated with [`SUCCESS_REASON`]
    /// and every task is refreshed, in handle order.
    pub async fn await_completion(
        &self,
        job_id: &str,
        handles: &[TaskHandle],
        timeout: Duration,
    ) -> Result<Verdict, MonitorError> {
        info!("Awaiting task completion, timeout in {:?}...", timeout);

        let outcome = StatePoller::new(self.provider.as_ref(), &self.poll)
            .wait_all_completed(job_id, handles, timeout)
            .await
            .map_err(|source| MonitorError::Provider {
                job_id: job_id.to_string(),
                action: "listing tasks",
                source,
            })?;

        if let WaitOutcome::TimedOut { incomplete } = outcome {
            // The timeout is the more useful signal, so a failed termination
            // is only logged
            if let Err(e) = self.terminate(job_id, TIMEOUT_REASON).await {
                error!("{}", e);
            }
            warn!("{}", TIMEOUT_REASON);
            return Err(TimeoutError {
                job_id: job_id.to_string(),
                timeout,
                total: handles.len(),
                incomplete,
            }
            .into());
        }

        self.terminate(job_id, SUCCESS_REASON).await?;

        let fields = FieldSelection::id_and_execution_info();
        let mut outcomes = Vec::with_capacity(handles.len());
        for handle in handles {
            let record = self
                .provider
                .refresh_task(handle, &fields)
                .await
                .map_err(|source| MonitorError::Provider {
                    job_id: job_id.to_string(),
                    action: "refreshing tasks",
                    source,
                })?;

            let outcome = TaskOutcome::from_record(handle.task_id.clone(), record);
            if !outcome.succeeded(self.exit_codes) {
                warn!(
                    "Task [{}] encountered a failure: {}",
                    outcome.task_id,
                    outcome.failure_message().unwrap_or("no failure information")
                );
            }
            if outcome.has_nonzero_exit() {
                // Not every program signals failure through its exit code
                warn!(
                    "Task [{}] returned a non-zero exit code - this may indicate task execution or completion failure.",
                    outcome.task_id
                );
            }
            outcomes.push(outcome);
        }

        let verdict = Verdict::new(outcomes, self.exit_codes);
        if verdict.succeeded() {
            info!("Success! All tasks completed successfully within the specified timeout period.");
        } else {
            warn!(
                "{} of {} task(s) in job {} failed",
                verdict.failures().len(),
                handles.len(),
                job_id
            );
        }

        Ok(verdict)
    }

    async fn terminate(&self, job_id: &str, reason: &str) -> Result<(), MonitorError> {
        info!("Terminating job [{}]: {}", job_id, reason);
        self.provider
            .terminate_job(job_id, reason)
            .await
            .map_err(|source| MonitorError::Provider {
                job_id: job_id.to_string(),
                action: "terminating the job",
                source,
            })
    }
}
