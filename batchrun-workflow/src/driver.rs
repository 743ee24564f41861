//! Orchestrator driver
//!
//! Runs provisioning, registration, submission and monitoring strictly in
//! that order. A stage error stops the run at once; a timeout or failed
//! tasks produce a negative outcome and the run still finishes, including
//! teardown.

use batchrun_client::BatchProvider;
use batchrun_core::dto::task::TaskHandle;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::WorkflowConfig;
use crate::error::{MonitorError, TimeoutError, WorkflowError};
use crate::monitor::{CompletionMonitor, TaskOutcome, Verdict};
use crate::service::{JobRegistrar, PoolProvisioner, PoolStatus, TaskSubmitter, WorkItem};
use crate::teardown::{self, TeardownConfirm, TeardownSummary};

/// How the monitored part of a run ended
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Every task completed; the verdict says whether they all succeeded
    Completed(Verdict),
    /// The deadline passed before every task completed
    TimedOut(TimeoutError),
}

/// Final report of a run
#[derive(Debug, Clone)]
pub struct RunReport {
    pub pool_id: String,
    pub job_id: String,
    pub pool_status: PoolStatus,
    /// Submitted tasks in work-item order
    pub tasks: Vec<TaskHandle>,
    pub outcome: RunOutcome,
    pub teardown: TeardownSummary,
    pub started_at: DateTime<Utc>,
    /// When the verdict was reached, before teardown
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// True iff every task completed and succeeded in time
    pub fn succeeded(&self) -> bool {
        match &self.outcome {
            RunOutcome::Completed(verdict) => verdict.succeeded(),
            RunOutcome::TimedOut(_) => false,
        }
    }

    /// Tasks that completed without success; empty after a timeout
    pub fn failures(&self) -> Vec<&TaskOutcome> {
        match &self.outcome {
            RunOutcome::Completed(verdict) => verdict.failures(),
            RunOutcome::TimedOut(_) => Vec::new(),
        }
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at.signed_duration_since(self.started_at)
    }
}

/// Drives one workflow run against a provider
pub struct Orchestrator {
    provider: Arc<dyn BatchProvider>,
    config: WorkflowConfig,
    confirm: Option<Arc<dyn TeardownConfirm>>,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn BatchProvider>, config: WorkflowConfig) -> Self {
        Self {
            provider,
            config,
            confirm: None,
        }
    }

    /// Adapter consulted when the teardown policy is `Ask`
    pub fn with_teardown_confirm(mut self, confirm: Arc<dyn TeardownConfirm>) -> Self {
        self.confirm = Some(confirm);
        self
    }

    /// Runs the whole workflow for `items`
    ///
    /// The configuration is validated first; an invalid one fails before
    /// any provider call.
    pub async fn run(&self, items: &[WorkItem]) -> Result<RunReport, WorkflowError> {
        let config = &self.config;
        config
            .validate()
            .map_err(|e| WorkflowError::Config(format!("{:#}", e)))?;

        let started_at = Utc::now();
        info!(
            "Workflow start: pool [{}], job [{}], {} work item(s)",
            config.pool.id,
            config.job_id,
            items.len()
        );

        let pool_status = PoolProvisioner::new(Arc::clone(&self.provider))
            .ensure_pool(&config.pool)
            .await?;

        let job = JobRegistrar::new(Arc::clone(&self.provider))
            .create_job(&config.job_id, &config.pool.id)
            .await?;

        let tasks = TaskSubmitter::new(Arc::clone(&self.provider), config.task_template.clone())
            .submit_tasks(&job.id, items)
            .await?;

        let monitor = CompletionMonitor::new(
            Arc::clone(&self.provider),
            config.poll.clone(),
            config.exit_codes,
        );
        let outcome = match monitor.await_completion(&job.id, &tasks, config.timeout).await {
            Ok(verdict) => RunOutcome::Completed(verdict),
            Err(MonitorError::Timeout(timeout)) => {
                warn!("{}", timeout);
                RunOutcome::TimedOut(timeout)
            }
            Err(MonitorError::Provider {
                job_id,
                action,
                source,
            }) => {
                return Err(WorkflowError::Monitor {
                    job_id,
                    action,
                    source,
                });
            }
        };
        let finished_at = Utc::now();

        let teardown = self.teardown().await;

        let report = RunReport {
            pool_id: config.pool.id.clone(),
            job_id: job.id,
            pool_status,
            tasks,
            outcome,
            teardown,
            started_at,
            finished_at,
        };
        info!(
            "Workflow end: {} (elapsed {}s)",
            if report.succeeded() { "success" } else { "failure" },
            report.elapsed().num_seconds()
        );

        Ok(report)
    }

    /// Applies the teardown policy to the configured job and pool
    pub async fn teardown(&self) -> TeardownSummary {
        teardown::tear_down(
            self.provider.as_ref(),
            self.config.teardown,
            self.confirm.as_deref(),
            &self.config.job_id,
            &self.config.pool.id,
        )
        .await
    }
}
