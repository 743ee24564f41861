//! Workflow configuration
//!
//! Everything the orchestrator needs is carried by [`WorkflowConfig`] and
//! handed over at construction.

use batchrun_core::dto::pool::PoolSpec;
use std::str::FromStr;
use std::time::Duration;

use crate::service::TaskTemplate;
use crate::teardown::TeardownPolicy;

/// Default time to wait for all tasks to complete
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Polling cadence of the completion monitor
///
/// The first listing happens immediately. Between listings the monitor
/// sleeps for the current interval, clipped to the time left before the
/// deadline. The interval is multiplied by `backoff_factor` (up to
/// `max_interval`) after each listing that saw no new completions, and goes
/// back to `interval` as soon as one more task completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_interval: Duration,
    pub backoff_factor: u32,
}

impl PollPolicy {
    /// A policy that never backs off
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            max_interval: interval,
            backoff_factor: 1,
        }
    }

    /// Interval to use after a listing that made no progress
    pub fn next_interval(&self, current: Duration) -> Duration {
        current
            .saturating_mul(self.backoff_factor.max(1))
            .min(self.max_interval)
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(30),
            backoff_factor: 2,
        }
    }
}

/// How exit codes weigh on the verdict
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExitCodePolicy {
    /// Only the task result counts; non-zero exit codes are logged
    #[default]
    Diagnostic,
    /// A non-zero exit code also fails the task
    Strict,
}

impl FromStr for ExitCodePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "diagnostic" => Ok(Self::Diagnostic),
            "strict" => Ok(Self::Strict),
            other => Err(format!(
                "unknown exit code policy '{other}' (expected diagnostic or strict)"
            )),
        }
    }
}

/// Configuration of one workflow run
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Pool to ensure before anything else
    pub pool: PoolSpec,

    /// Id of the job created for this run
    pub job_id: String,

    /// Template turning work items into task descriptors
    pub task_template: TaskTemplate,

    /// Maximum time to wait for every task to complete
    pub timeout: Duration,

    pub poll: PollPolicy,

    /// What to delete once the verdict is known
    pub teardown: TeardownPolicy,

    pub exit_codes: ExitCodePolicy,
}

impl WorkflowConfig {
    /// Creates a configuration with defaults
    pub fn new(pool: PoolSpec, job_id: impl Into<String>, task_template: TaskTemplate) -> Self {
        Self {
            pool,
            job_id: job_id.into(),
            task_template,
            timeout: DEFAULT_TIMEOUT,
            poll: PollPolicy::default(),
            teardown: TeardownPolicy::default(),
            exit_codes: ExitCodePolicy::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_teardown(mut self, teardown: TeardownPolicy) -> Self {
        self.teardown = teardown;
        self
    }

    pub fn with_exit_codes(mut self, exit_codes: ExitCodePolicy) -> Self {
        self.exit_codes = exit_codes;
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.pool.id.is_empty() {
            anyhow::bail!("pool id cannot be empty");
        }

        if self.pool.target_nodes == 0 {
            anyhow::bail!("pool target node count must be greater than 0");
        }

        if self.job_id.is_empty() {
            anyhow::bail!("job id cannot be empty");
        }

        if self.task_template.command.trim().is_empty() {
            anyhow::bail!("task command template cannot be empty");
        }

        if self.timeout.is_zero() {
            anyhow::bail!("timeout must be greater than 0");
        }

        if self.poll.interval.is_zero() {
            anyhow::bail!("poll interval must be greater than 0");
        }

        if self.poll.max_interval < self.poll.interval {
            anyhow::bail!("max poll interval cannot be smaller than the poll interval");
        }

        Ok(())
    }
}
