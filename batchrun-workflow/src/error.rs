//! Workflow error types
//!
//! Stage failures abort the workflow. A timeout is reported separately: it
//! means the run is incomplete, not that the workflow broke.

use batchrun_client::ProviderError;
use batchrun_core::domain::task::TaskId;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Workflow stage, used to name the failing step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configuration,
    Provision,
    Registration,
    Submission,
    Monitor,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Configuration => write!(f, "configuration"),
            Stage::Provision => write!(f, "pool provisioning"),
            Stage::Registration => write!(f, "job registration"),
            Stage::Submission => write!(f, "task submission"),
            Stage::Monitor => write!(f, "completion monitoring"),
        }
    }
}

/// Fatal workflow errors, one per stage
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Configuration rejected before any provider call
    #[error("invalid workflow configuration: {0}")]
    Config(String),

    /// Pool creation rejected for a reason other than "already exists"
    #[error("pool provisioning failed for pool {pool_id}: {source}")]
    Provision {
        pool_id: String,
        #[source]
        source: ProviderError,
    },

    /// Job creation rejected, including id collisions
    #[error("job registration failed for job {job_id}: {source}")]
    Registration {
        job_id: String,
        #[source]
        source: ProviderError,
    },

    /// Bulk task submission rejected
    #[error("task submission failed for job {job_id}: {source}")]
    Submission {
        job_id: String,
        #[source]
        source: ProviderError,
    },

    /// Provider failure while polling, terminating or refreshing
    #[error("completion monitoring failed for job {job_id} while {action}: {source}")]
    Monitor {
        job_id: String,
        action: &'static str,
        #[source]
        source: ProviderError,
    },
}

impl WorkflowError {
    /// The stage that failed
    pub fn stage(&self) -> Stage {
        match self {
            Self::Config(_) => Stage::Configuration,
            Self::Provision { .. } => Stage::Provision,
            Self::Registration { .. } => Stage::Registration,
            Self::Submission { .. } => Stage::Submission,
            Self::Monitor { .. } => Stage::Monitor,
        }
    }
}

/// Not every task reached `Completed` before the deadline
#[derive(Debug, Clone, Error)]
#[error(
    "{} of {total} task(s) in job {job_id} did not reach Completed within {timeout:?}",
    .incomplete.len()
)]
pub struct TimeoutError {
    pub job_id: String,
    pub timeout: Duration,
    pub total: usize,
    /// Tasks last observed in a non-terminal state, in submission order
    pub incomplete: Vec<TaskId>,
}

/// Errors from [`crate::CompletionMonitor::await_completion`]
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Timeout(#[from] TimeoutError),

    #[error("provider call failed for job {job_id} while {action}: {source}")]
    Provider {
        job_id: String,
        action: &'static str,
        #[source]
        source: ProviderError,
    },
}
