//! Provider capability set
//!
//! The workflow only ever talks to a provider through this trait, so any
//! backend (a real service account, a simulation) can be plugged in.

use async_trait::async_trait;
use batchrun_core::domain::job::Job;
use batchrun_core::domain::pool::Pool;
use batchrun_core::dto::job::CreateJob;
use batchrun_core::dto::pool::PoolSpec;
use batchrun_core::dto::task::{
    FieldSelection, TaskExecutionRecord, TaskHandle, TaskSpec, TaskSummary,
};

use crate::error::Result;
use crate::http::HttpBatchProvider;

/// Operations a batch provider must support
#[async_trait]
pub trait BatchProvider: Send + Sync {
    /// Creates and commits a pool
    ///
    /// Fails with a conflict carrying the `PoolExists` code if a pool with
    /// the same id is already present.
    async fn create_pool(&self, spec: &PoolSpec) -> Result<Pool>;

    /// Creates and commits a job bound to an existing pool
    async fn create_job(&self, req: &CreateJob) -> Result<Job>;

    /// Submits a batch of tasks in a single call
    ///
    /// The batch becomes visible to listing all at once, or not at all.
    async fn submit_tasks(&self, job_id: &str, tasks: &[TaskSpec]) -> Result<Vec<TaskHandle>>;

    /// Lists every task of a job, populating only the selected fields
    async fn list_tasks(&self, job_id: &str, fields: &FieldSelection) -> Result<Vec<TaskSummary>>;

    /// Fetches the current record of one task
    async fn refresh_task(
        &self,
        handle: &TaskHandle,
        fields: &FieldSelection,
    ) -> Result<TaskExecutionRecord>;

    /// Terminates a job; in-flight tasks are torn down by the provider
    async fn terminate_job(&self, job_id: &str, reason: &str) -> Result<()>;

    async fn delete_job(&self, job_id: &str) -> Result<()>;

    async fn delete_pool(&self, pool_id: &str) -> Result<()>;
}

#[async_trait]
impl BatchProvider for HttpBatchProvider {
    async fn create_pool(&self, spec: &PoolSpec) -> Result<Pool> {
        HttpBatchProvider::create_pool(self, spec).await
    }

    async fn create_job(&self, req: &CreateJob) -> Result<Job> {
        HttpBatchProvider::create_job(self, req).await
    }

    async fn submit_tasks(&self, job_id: &str, tasks: &[TaskSpec]) -> Result<Vec<TaskHandle>> {
        self.add_task_collection(job_id, tasks).await
    }

    async fn list_tasks(&self, job_id: &str, fields: &FieldSelection) -> Result<Vec<TaskSummary>> {
        HttpBatchProvider::list_tasks(self, job_id, fields).await
    }

    async fn refresh_task(
        &self,
        handle: &TaskHandle,
        fields: &FieldSelection,
    ) -> Result<TaskExecutionRecord> {
        self.get_task(handle, fields).await
    }

    async fn terminate_job(&self, job_id: &str, reason: &str) -> Result<()> {
        HttpBatchProvider::terminate_job(self, job_id, reason).await
    }

    async fn delete_job(&self, job_id: &str) -> Result<()> {
        HttpBatchProvider::delete_job(self, job_id).await
    }

    async fn delete_pool(&self, pool_id: &str) -> Result<()> {
        HttpBatchProvider::delete_pool(self, pool_id).await
    }
}
