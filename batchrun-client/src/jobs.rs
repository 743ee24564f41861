//! Job endpoints

use batchrun_core::domain::job::Job;
use batchrun_core::dto::job::{CreateJob, TerminateJob};
use reqwest::Method;
use tracing::debug;

use crate::HttpBatchProvider;
use crate::error::Result;

impl HttpBatchProvider {
    // =============================================================================
    // Job Lifecycle
    // =============================================================================

    /// Create and commit a job bound to a pool
    pub async fn create_job(&self, req: &CreateJob) -> Result<Job> {
        debug!("POST /jobs ({} on pool {})", req.id, req.pool_id);
        let response = self.request(Method::POST, "/jobs").json(req).send().await?;

        self.handle_response(response).await
    }

    /// Terminate a job with a human-readable reason
    pub async fn terminate_job(&self, job_id: &str, reason: &str) -> Result<()> {
        let path = format!("/jobs/{}/terminate", job_id);
        let response = self
            .request(Method::POST, &path)
            .json(&TerminateJob {
                reason: reason.to_string(),
            })
            .send()
            .await?;

        self.handle_empty_response(response).await
    }

    /// Delete a job and its tasks
    pub async fn delete_job(&self, job_id: &str) -> Result<()> {
        let path = format!("/jobs/{}", job_id);
        let response = self.request(Method::DELETE, &path).send().await?;

        self.handle_empty_response(response).await
    }
}
