//! Job registration

use batchrun_client::BatchProvider;
use batchrun_core::domain::job::Job;
use batchrun_core::dto::job::CreateJob;
use std::sync::Arc;
use tracing::info;

use crate::error::WorkflowError;

/// Creates the job of a run
///
/// Unlike pools, jobs are expected to be fresh: an existing job with the
/// same id is a collision and fails the run.
pub struct JobRegistrar {
    provider: Arc<dyn BatchProvider>,
}

impl JobRegistrar {
    pub fn new(provider: Arc<dyn BatchProvider>) -> Self {
        Self { provider }
    }

    /// Binds a new job to the pool and commits it
    pub async fn create_job(&self, job_id: &str, pool_id: &str) -> Result<Job, WorkflowError> {
        info!("Creating job [{}] on pool [{}]", job_id, pool_id);

        let req = CreateJob {
            id: job_id.to_string(),
            pool_id: pool_id.to_string(),
        };

        self.provider
            .create_job(&req)
            .await
            .map_err(|source| WorkflowError::Registration {
                job_id: job_id.to_string(),
                source,
            })
    }
}
