//! Teardown of the job and pool after a run
//!
//! Teardown is best effort: its failures are logged and reported, never
//! turned into workflow errors.

use async_trait::async_trait;
use batchrun_client::BatchProvider;
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Whether to delete the job and pool once the verdict is known
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TeardownPolicy {
    Always,
    Never,
    /// Ask a [`TeardownConfirm`] adapter for each resource
    #[default]
    Ask,
}

impl FromStr for TeardownPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            "ask" => Ok(Self::Ask),
            other => Err(format!(
                "unknown teardown policy '{other}' (expected always, never or ask)"
            )),
        }
    }
}

/// Resource up for deletion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownTarget {
    Job(String),
    Pool(String),
}

impl fmt::Display for TeardownTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeardownTarget::Job(id) => write!(f, "job {}", id),
            TeardownTarget::Pool(id) => write!(f, "pool {}", id),
        }
    }
}

/// Decides [`TeardownPolicy::Ask`] teardowns, e.g. by prompting an operator
#[async_trait]
pub trait TeardownConfirm: Send + Sync {
    async fn confirm(&self, target: &TeardownTarget) -> bool;
}

/// What happened to one resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownAction {
    Deleted,
    Skipped,
    Failed(String),
}

/// Teardown result for the job and the pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownSummary {
    pub job: TeardownAction,
    pub pool: TeardownAction,
}

impl TeardownSummary {
    pub fn skipped() -> Self {
        Self {
            job: TeardownAction::Skipped,
            pool: TeardownAction::Skipped,
        }
    }
}

/// Deletes the job, then the pool, as the policy allows
pub(crate) async fn tear_down(
    provider: &dyn BatchProvider,
    policy: TeardownPolicy,
    confirm: Option<&dyn TeardownConfirm>,
    job_id: &str,
    pool_id: &str,
) -> TeardownSummary {
    let job = TeardownTarget::Job(job_id.to_string());
    let job_action = if should_delete(policy, confirm, &job).await {
        report(&job, provider.delete_job(job_id).await)
    } else {
        TeardownAction::Skipped
    };

    let pool = TeardownTarget::Pool(pool_id.to_string());
    let pool_action = if should_delete(policy, confirm, &pool).await {
        report(&pool, provider.delete_pool(pool_id).await)
    } else {
        TeardownAction::Skipped
    };

    TeardownSummary {
        job: job_action,
        pool: pool_action,
    }
}

async fn should_delete(
    policy: TeardownPolicy,
    confirm: Option<&dyn TeardownConfirm>,
    target: &TeardownTarget,
) -> bool {
    match (policy, confirm) {
        (TeardownPolicy::Always, _) => true,
        (TeardownPolicy::Never, _) => false,
        (TeardownPolicy::Ask, Some(confirm)) => confirm.confirm(target).await,
        (TeardownPolicy::Ask, None) => {
            info!("No teardown confirmation available, keeping {}", target);
            false
        }
    }
}

fn report(target: &TeardownTarget, result: batchrun_client::Result<()>) -> TeardownAction {
    match result {
        Ok(()) => {
            info!("Deleted {}", target);
            TeardownAction::Deleted
        }
        Err(e) => {
            warn!("Failed to delete {}: {}", target, e);
            TeardownAction::Failed(e.to_string())
        }
    }
}
