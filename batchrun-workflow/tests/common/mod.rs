//! Shared fixtures for workflow tests

#![allow(dead_code)]

use batchrun_client::{InMemoryProvider, ProviderCall};
use batchrun_core::domain::pool::{PackageRef, StartTask};
use batchrun_core::dto::pool::PoolSpec;
use batchrun_workflow::{TaskTemplate, TeardownPolicy, WorkItem, WorkflowConfig};
use std::time::Duration;

pub const POOL_ID: &str = "TutorialPool";
pub const JOB_ID: &str = "TutorialJob";
pub const TIMEOUT: Duration = Duration::from_secs(30 * 60);

pub fn pool_spec() -> PoolSpec {
    PoolSpec::new(POOL_ID, 3)
        .with_start_task(StartTask::new("setup-node"))
        .with_package(PackageRef::new("test1", "1.0"))
}

pub fn config() -> WorkflowConfig {
    WorkflowConfig::new(
        pool_spec(),
        JOB_ID,
        TaskTemplate::new("TaskApplication {payload}").with_package(PackageRef::new("test1", "1.0")),
    )
    .with_timeout(TIMEOUT)
    .with_teardown(TeardownPolicy::Never)
}

pub fn work_items(n: usize) -> Vec<WorkItem> {
    (0..n).map(|i| WorkItem::new(format!("input-{i}.txt"))).collect()
}

pub async fn terminate_reasons(provider: &InMemoryProvider) -> Vec<String> {
    provider
        .calls()
        .await
        .into_iter()
        .filter_map(|call| match call {
            ProviderCall::TerminateJob { reason, .. } => Some(reason),
            _ => None,
        })
        .collect()
}

pub async fn refresh_count(provider: &InMemoryProvider) -> usize {
    provider
        .calls()
        .await
        .iter()
        .filter(|call| matches!(call, ProviderCall::RefreshTask { .. }))
        .count()
}
