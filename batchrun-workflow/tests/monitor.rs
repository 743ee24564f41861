//! Completion monitor behavior

mod common;

use batchrun_client::memory::{Fault, Operation, ScriptedOutcome};
use batchrun_client::{BatchProvider, InMemoryProvider, ProviderCall, TaskScript};
use batchrun_core::domain::task::{TaskId, TaskResult, TaskState};
use batchrun_core::dto::job::CreateJob;
use batchrun_core::dto::task::TaskHandle;
use batchrun_workflow::monitor::{SUCCESS_REASON, TIMEOUT_REASON};
use batchrun_workflow::{
    CompletionMonitor, ExitCodePolicy, MonitorError, PollPolicy, TaskSubmitter, TaskTemplate,
    Verdict,
};
use common::*;
use std::sync::Arc;
use std::time::Duration;

async fn submitted(provider: Arc<InMemoryProvider>, n: usize) -> Vec<TaskHandle> {
    provider.create_pool(&pool_spec()).await.unwrap();
    provider
        .create_job(&CreateJob {
            id: JOB_ID.to_string(),
            pool_id: POOL_ID.to_string(),
        })
        .await
        .unwrap();
    TaskSubmitter::new(provider, TaskTemplate::new("TaskApplication"))
        .submit_tasks(JOB_ID, &work_items(n))
        .await
        .unwrap()
}

fn monitor(provider: Arc<InMemoryProvider>, exit_codes: ExitCodePolicy) -> CompletionMonitor {
    CompletionMonitor::new(provider, PollPolicy::default(), exit_codes)
}

#[tokio::test(start_paused = true)]
async fn all_tasks_succeed_within_timeout() {
    let provider = Arc::new(InMemoryProvider::new());
    let handles = submitted(provider.clone(), 2).await;

    let verdict = monitor(provider.clone(), ExitCodePolicy::Diagnostic)
        .await_completion(JOB_ID, &handles, TIMEOUT)
        .await
        .unwrap();

    assert!(verdict.succeeded());
    assert!(verdict.failures().is_empty());
    assert_eq!(verdict.outcomes().len(), 2);
    assert!(verdict.outcomes().iter().all(|o| o.exit_code == Some(0)));
    assert_eq!(terminate_reasons(&provider).await, vec![SUCCESS_REASON.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn stuck_task_times_out_without_refresh() {
    let provider = Arc::new(
        InMemoryProvider::new().with_script("task1", TaskScript::stuck_in(TaskState::Running)),
    );
    let handles = submitted(provider.clone(), 2).await;

    let err = monitor(provider.clone(), ExitCodePolicy::Diagnostic)
        .await_completion(JOB_ID, &handles, TIMEOUT)
        .await
        .unwrap_err();

    match err {
        MonitorError::Timeout(timeout) => {
            assert_eq!(timeout.job_id, JOB_ID);
            assert_eq!(timeout.total, 2);
            assert_eq!(timeout.incomplete, vec![TaskId::from("task1")]);
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
    assert_eq!(terminate_reasons(&provider).await, vec![TIMEOUT_REASON.to_string()]);
    assert_eq!(refresh_count(&provider).await, 0);
}

#[tokio::test(start_paused = true)]
async fn completed_failure_gives_negative_verdict() {
    let provider = Arc::new(
        InMemoryProvider::new().with_script("task1", TaskScript::fails(1, "exit code 1")),
    );
    let handles = submitted(provider.clone(), 2).await;

    let verdict = monitor(provider.clone(), ExitCodePolicy::Diagnostic)
        .await_completion(JOB_ID, &handles, TIMEOUT)
        .await
        .unwrap();

    assert!(!verdict.succeeded());
    let failures = verdict.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].task_id, TaskId::from("task1"));
    assert_eq!(failures[0].exit_code, Some(1));
    assert_eq!(failures[0].failure_message(), Some("exit code 1"));
    assert_eq!(terminate_reasons(&provider).await, vec![SUCCESS_REASON.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn scheduling_error_counts_as_failure() {
    let provider = Arc::new(
        InMemoryProvider::new()
            .with_script("task0", TaskScript::scheduling_error("package not found")),
    );
    let handles = submitted(provider.clone(), 2).await;

    let verdict = monitor(provider, ExitCodePolicy::Diagnostic)
        .await_completion(JOB_ID, &handles, TIMEOUT)
        .await
        .unwrap();

    let failures = verdict.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].task_id, TaskId::from("task0"));
    assert_eq!(failures[0].exit_code, None);
}

#[tokio::test(start_paused = true)]
async fn refresh_starts_only_after_wait_finished() {
    let provider = Arc::new(InMemoryProvider::new().with_default_script(TaskScript::slow(4)));
    let handles = submitted(provider.clone(), 3).await;

    monitor(provider.clone(), ExitCodePolicy::Diagnostic)
        .await_completion(JOB_ID, &handles, TIMEOUT)
        .await
        .unwrap();

    let calls = provider.calls().await;
    let last_list = calls
        .iter()
        .rposition(|c| matches!(c, ProviderCall::ListTasks { .. }))
        .unwrap();
    let terminate = calls
        .iter()
        .position(|c| matches!(c, ProviderCall::TerminateJob { .. }))
        .unwrap();
    let first_refresh = calls
        .iter()
        .position(|c| matches!(c, ProviderCall::RefreshTask { .. }))
        .unwrap();
    assert!(last_list < terminate);
    assert!(terminate < first_refresh);

    let refreshed: Vec<TaskId> = calls
        .iter()
        .filter_map(|c| match c {
            ProviderCall::RefreshTask { task_id, select } => {
                assert_eq!(select, "id,executionInfo");
                Some(task_id.clone())
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        refreshed,
        vec![TaskId::from("task0"), TaskId::from("task1"), TaskId::from("task2")]
    );
}

#[tokio::test(start_paused = true)]
async fn listing_requests_only_id_and_state() {
    let provider = Arc::new(InMemoryProvider::new());
    let handles = submitted(provider.clone(), 1).await;

    monitor(provider.clone(), ExitCodePolicy::Diagnostic)
        .await_completion(JOB_ID, &handles, TIMEOUT)
        .await
        .unwrap();

    for call in provider.calls().await {
        if let ProviderCall::ListTasks { select, .. } = call {
            assert_eq!(select, "id,state");
        }
    }
}

#[tokio::test(start_paused = true)]
async fn strict_policy_fails_nonzero_exit() {
    // Successful result but a non-zero exit code
    let script = TaskScript::new(
        vec![TaskState::Active, TaskState::Completed],
        ScriptedOutcome {
            result: TaskResult::Success,
            exit_code: Some(2),
            failure: None,
        },
    );
    let provider = Arc::new(InMemoryProvider::new().with_script("task0", script));
    let handles = submitted(provider.clone(), 1).await;

    let strict = monitor(provider, ExitCodePolicy::Strict)
        .await_completion(JOB_ID, &handles, TIMEOUT)
        .await
        .unwrap();
    assert!(!strict.succeeded());

    let lenient = Verdict::new(strict.outcomes().to_vec(), ExitCodePolicy::Diagnostic);
    assert!(lenient.succeeded());
}

#[tokio::test(start_paused = true)]
async fn listing_failure_is_reported_as_provider_error() {
    let provider = Arc::new(
        InMemoryProvider::new().with_fault(Operation::ListTasks, Fault::server_error("unavailable")),
    );
    let handles = submitted(provider.clone(), 1).await;

    let err = monitor(provider, ExitCodePolicy::Diagnostic)
        .await_completion(JOB_ID, &handles, Duration::from_secs(60))
        .await
        .unwrap_err();
    assert!(matches!(err, MonitorError::Provider { action: "listing tasks", .. }));
}

#[tokio::test(start_paused = true)]
async fn failed_termination_keeps_the_timeout() {
    let provider = Arc::new(
        InMemoryProvider::new()
            .with_script("task1", TaskScript::stuck_in(TaskState::Running))
            .with_fault(Operation::TerminateJob, Fault::server_error("unavailable")),
    );
    let handles = submitted(provider.clone(), 2).await;

    let err = monitor(provider.clone(), ExitCodePolicy::Diagnostic)
        .await_completion(JOB_ID, &handles, Duration::from_secs(60))
        .await
        .unwrap_err();

    match err {
        MonitorError::Timeout(timeout) => {
            assert_eq!(timeout.incomplete, vec![TaskId::from("task1")]);
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
    assert_eq!(terminate_reasons(&provider).await, vec![TIMEOUT_REASON.to_string()]);
    assert_eq!(refresh_count(&provider).await, 0);
}
