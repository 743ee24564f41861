//! Bounded wait for task completion
//!
//! Lists the job's tasks until every watched task is `Completed` or the
//! deadline passes. The deadline is checked between listings only; a
//! listing in flight is never cut short.

use batchrun_client::{BatchProvider, ProviderError};
use batchrun_core::domain::task::{TaskId, TaskState};
use batchrun_core::dto::task::{FieldSelection, TaskHandle};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::{self, Instant};
use tracing::debug;

use crate::config::PollPolicy;

/// Lower bound on the pause between two listings
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Stand-in deadline for timeouts too large to add to the current instant
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Result of waiting for completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WaitOutcome {
    AllCompleted,
    /// Tasks still not completed at the deadline, in handle order
    TimedOut { incomplete: Vec<TaskId> },
}

/// Polls task states with the cadence described by [`PollPolicy`]
pub(crate) struct StatePoller<'a> {
    provider: &'a dyn BatchProvider,
    policy: &'a PollPolicy,
}

impl<'a> StatePoller<'a> {
    pub(crate) fn new(provider: &'a dyn BatchProvider, policy: &'a PollPolicy) -> Self {
        Self { provider, policy }
    }

    /// Waits until every handle is observed `Completed` or `timeout` elapses
    pub(crate) async fn wait_all_completed(
        &self,
        job_id: &str,
        handles: &[TaskHandle],
        timeout: Duration,
    ) -> Result<WaitOutcome, ProviderError> {
        let start = Instant::now();
        let deadline = start
            .checked_add(timeout)
            .unwrap_or_else(|| start + FAR_FUTURE);
        let fields = FieldSelection::id_and_state();
        let mut delay = self.policy.interval.max(MIN_POLL_INTERVAL);
        let mut completed_before: Option<usize> = None;

        loop {
            let summaries = self.provider.list_tasks(job_id, &fields).await?;
            let states: HashMap<&TaskId, TaskState> = summaries
                .iter()
                .filter_map(|s| s.state.map(|state| (&s.id, state)))
                .collect();

            // A watched task missing from the listing counts as not completed
            let incomplete: Vec<TaskId> = handles
                .iter()
                .filter(|h| !states.get(&h.task_id).is_some_and(TaskState::is_terminal))
                .map(|h| h.task_id.clone())
                .collect();

            if incomplete.is_empty() {
                return Ok(WaitOutcome::AllCompleted);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(WaitOutcome::TimedOut { incomplete });
            }

            let completed = handles.len() - incomplete.len();
            if let Some(before) = completed_before {
                delay = if completed > before {
                    self.policy.interval
                } else {
                    self.policy.next_interval(delay)
                }
                .max(MIN_POLL_INTERVAL);
            }
            completed_before = Some(completed);

            let sleep_for = delay.min(deadline - now);
            debug!(
                "{}/{} task(s) completed in job {}, next poll in {:?}",
                completed,
                handles.len(),
                job_id,
                sleep_for
            );
            time::sleep(sleep_for).await;
        }
    }
}
