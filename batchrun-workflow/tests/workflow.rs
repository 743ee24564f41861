//! End-to-end runs of the orchestrator against the in-memory provider

mod common;

use async_trait::async_trait;
use batchrun_client::memory::{Fault, Operation};
use batchrun_client::{InMemoryProvider, ProviderCall, TaskScript};
use batchrun_core::domain::job::JobState;
use batchrun_core::domain::task::{TaskId, TaskState};
use batchrun_workflow::monitor::{SUCCESS_REASON, TIMEOUT_REASON};
use batchrun_workflow::{
    Orchestrator, PollPolicy, PoolStatus, RunOutcome, Stage, TeardownAction, TeardownConfirm,
    TeardownPolicy, TeardownTarget, WorkflowError,
};
use common::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn two_tasks_succeed() {
    let provider = Arc::new(InMemoryProvider::new());
    let orchestrator = Orchestrator::new(provider.clone(), config());

    let report = orchestrator.run(&work_items(2)).await.unwrap();

    assert!(report.succeeded());
    assert_eq!(report.pool_status, PoolStatus::Created);
    let ids: Vec<&TaskId> = report.tasks.iter().map(|h| &h.task_id).collect();
    assert_eq!(ids, vec![&TaskId::from("task0"), &TaskId::from("task1")]);
    assert!(matches!(report.outcome, RunOutcome::Completed(_)));

    let job = provider.job(JOB_ID).await.unwrap();
    assert_eq!(job.state, JobState::Completed);
    assert_eq!(job.terminate_reason.as_deref(), Some(SUCCESS_REASON));
}

#[tokio::test(start_paused = true)]
async fn stuck_task_times_out() {
    let provider = Arc::new(
        InMemoryProvider::new().with_script("task1", TaskScript::stuck_in(TaskState::Running)),
    );
    let orchestrator = Orchestrator::new(provider.clone(), config());

    let report = orchestrator.run(&work_items(2)).await.unwrap();

    assert!(!report.succeeded());
    match &report.outcome {
        RunOutcome::TimedOut(timeout) => {
            assert_eq!(timeout.incomplete, vec![TaskId::from("task1")]);
            assert_eq!(timeout.timeout, TIMEOUT);
        }
        other => panic!("expected a timeout, got {other:?}"),
    }
    assert!(report.failures().is_empty());
    assert_eq!(terminate_reasons(&provider).await, vec![TIMEOUT_REASON.to_string()]);
    assert_eq!(refresh_count(&provider).await, 0);
}

#[tokio::test(start_paused = true)]
async fn one_failed_task_is_reported() {
    let provider = Arc::new(
        InMemoryProvider::new().with_script("task1", TaskScript::fails(1, "exit code 1")),
    );
    let orchestrator = Orchestrator::new(provider.clone(), config());

    let report = orchestrator.run(&work_items(2)).await.unwrap();

    assert!(!report.succeeded());
    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].task_id, TaskId::from("task1"));
    assert_eq!(failures[0].exit_code, Some(1));
    assert_eq!(failures[0].failure_message(), Some("exit code 1"));
}

#[tokio::test(start_paused = true)]
async fn existing_pool_is_reused() {
    let provider = Arc::new(InMemoryProvider::new().with_existing_pool(&pool_spec()));
    let orchestrator = Orchestrator::new(provider.clone(), config());

    let report = orchestrator.run(&work_items(1)).await.unwrap();

    assert!(report.succeeded());
    assert_eq!(report.pool_status, PoolStatus::AlreadyExisted);
    assert_eq!(provider.pool_count().await, 1);
}

#[tokio::test(start_paused = true)]
async fn job_collision_stops_the_run() {
    let provider = Arc::new(InMemoryProvider::new());
    let orchestrator = Orchestrator::new(provider.clone(), config());
    orchestrator.run(&work_items(1)).await.unwrap();

    let err = orchestrator.run(&work_items(1)).await.unwrap_err();

    assert_eq!(err.stage(), Stage::Registration);
    let calls = provider.calls().await;
    let submissions = calls
        .iter()
        .filter(|c| matches!(c, ProviderCall::SubmitTasks { .. }))
        .count();
    assert_eq!(submissions, 1);
}

#[tokio::test(start_paused = true)]
async fn provisioning_failure_short_circuits() {
    let provider = Arc::new(
        InMemoryProvider::new().with_fault(Operation::CreatePool, Fault::server_error("quota")),
    );
    let orchestrator = Orchestrator::new(provider.clone(), config().with_teardown(TeardownPolicy::Always));

    let err = orchestrator.run(&work_items(2)).await.unwrap_err();

    assert_eq!(err.stage(), Stage::Provision);
    assert!(err.to_string().contains(POOL_ID));
    assert_eq!(provider.calls().await.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn submission_failure_short_circuits() {
    let provider = Arc::new(
        InMemoryProvider::new().with_fault(Operation::SubmitTasks, Fault::server_error("too large")),
    );
    let orchestrator = Orchestrator::new(provider.clone(), config());

    let err = orchestrator.run(&work_items(2)).await.unwrap_err();

    assert_eq!(err.stage(), Stage::Submission);
    let listed = provider
        .calls()
        .await
        .iter()
        .any(|c| matches!(c, ProviderCall::ListTasks { .. }));
    assert!(!listed);
}

#[tokio::test(start_paused = true)]
async fn teardown_always_deletes_job_then_pool() {
    let provider = Arc::new(InMemoryProvider::new());
    let orchestrator = Orchestrator::new(provider.clone(), config().with_teardown(TeardownPolicy::Always));

    let report = orchestrator.run(&work_items(2)).await.unwrap();

    assert_eq!(report.teardown.job, TeardownAction::Deleted);
    assert_eq!(report.teardown.pool, TeardownAction::Deleted);
    let calls = provider.calls().await;
    let tail: Vec<&ProviderCall> = calls.iter().rev().take(2).collect();
    assert!(matches!(tail[0], ProviderCall::DeletePool { .. }));
    assert!(matches!(tail[1], ProviderCall::DeleteJob { .. }));
}

#[tokio::test(start_paused = true)]
async fn teardown_failure_keeps_verdict() {
    let provider = Arc::new(
        InMemoryProvider::new().with_fault(Operation::DeletePool, Fault::server_error("busy")),
    );
    let orchestrator = Orchestrator::new(provider, config().with_teardown(TeardownPolicy::Always));

    let report = orchestrator.run(&work_items(2)).await.unwrap();

    assert!(report.succeeded());
    assert_eq!(report.teardown.job, TeardownAction::Deleted);
    assert!(matches!(report.teardown.pool, TeardownAction::Failed(_)));
}

struct CountingConfirm {
    asked: AtomicUsize,
}

#[async_trait]
impl TeardownConfirm for CountingConfirm {
    async fn confirm(&self, target: &TeardownTarget) -> bool {
        self.asked.fetch_add(1, Ordering::SeqCst);
        matches!(target, TeardownTarget::Job(_))
    }
}

#[tokio::test(start_paused = true)]
async fn teardown_runs_after_timeout() {
    let provider = Arc::new(
        InMemoryProvider::new().with_default_script(TaskScript::stuck_in(TaskState::Preparing)),
    );
    let confirm = Arc::new(CountingConfirm {
        asked: AtomicUsize::new(0),
    });
    let orchestrator = Orchestrator::new(provider.clone(), config().with_teardown(TeardownPolicy::Ask))
        .with_teardown_confirm(confirm.clone());

    let report = orchestrator.run(&work_items(2)).await.unwrap();

    assert!(matches!(report.outcome, RunOutcome::TimedOut(_)));
    assert_eq!(confirm.asked.load(Ordering::SeqCst), 2);
    assert_eq!(report.teardown.job, TeardownAction::Deleted);
    assert_eq!(report.teardown.pool, TeardownAction::Skipped);
    assert!(provider.job(JOB_ID).await.is_none());
}

#[tokio::test(start_paused = true)]
async fn no_work_items_is_a_vacuous_success() {
    let provider = Arc::new(InMemoryProvider::new());
    let orchestrator = Orchestrator::new(provider.clone(), config());

    let report = orchestrator.run(&[]).await.unwrap();

    assert!(report.succeeded());
    assert!(report.tasks.is_empty());
    assert_eq!(terminate_reasons(&provider).await, vec![SUCCESS_REASON.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn zero_poll_interval_is_rejected_before_any_call() {
    let provider = Arc::new(
        InMemoryProvider::new().with_script("task1", TaskScript::stuck_in(TaskState::Running)),
    );
    let config = config()
        .with_timeout(Duration::from_millis(200))
        .with_poll(PollPolicy::fixed(Duration::ZERO));
    let orchestrator = Orchestrator::new(provider.clone(), config);

    let err = orchestrator.run(&work_items(2)).await.unwrap_err();

    assert!(matches!(err, WorkflowError::Config(_)));
    assert_eq!(err.stage(), Stage::Configuration);
    assert!(err.to_string().contains("poll interval"));
    assert!(provider.calls().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn unbounded_timeout_runs_to_completion() {
    let provider = Arc::new(InMemoryProvider::new());
    let orchestrator = Orchestrator::new(provider.clone(), config().with_timeout(Duration::MAX));

    let report = orchestrator.run(&work_items(2)).await.unwrap();

    assert!(report.succeeded());
    assert_eq!(terminate_reasons(&provider).await, vec![SUCCESS_REASON.to_string()]);
}
