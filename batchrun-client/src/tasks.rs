//! Task endpoints

use batchrun_core::dto::task::{
    FieldSelection, TaskExecutionRecord, TaskHandle, TaskSpec, TaskSummary,
};
use reqwest::Method;
use tracing::debug;

use crate::HttpBatchProvider;
use crate::error::Result;

impl HttpBatchProvider {
    /// Add a collection of tasks to a job in one request
    pub async fn add_task_collection(
        &self,
        job_id: &str,
        tasks: &[TaskSpec],
    ) -> Result<Vec<TaskHandle>> {
        debug!("POST /jobs/{}/addtaskcollection ({} tasks)", job_id, tasks.len());
        let path = format!("/jobs/{}/addtaskcollection", job_id);
        let response = self.request(Method::POST, &path).json(tasks).send().await?;

        self.handle_response(response).await
    }

    /// List the tasks of a job
    ///
    /// # Arguments
    /// * `job_id` - The job to list
    /// * `fields` - Properties the service should populate
    pub async fn list_tasks(
        &self,
        job_id: &str,
        fields: &FieldSelection,
    ) -> Result<Vec<TaskSummary>> {
        let path = format!("/jobs/{}/tasks", job_id);
        let response = self
            .request(Method::GET, &path)
            .query(&[("$select", fields.select_clause())])
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Get the current record of one task
    pub async fn get_task(
        &self,
        handle: &TaskHandle,
        fields: &FieldSelection,
    ) -> Result<TaskExecutionRecord> {
        let path = format!("/jobs/{}/tasks/{}", handle.job_id, handle.task_id);
        let response = self
            .request(Method::GET, &path)
            .query(&[("$select", fields.select_clause())])
            .send()
            .await?;

        self.handle_response(response).await
    }
}
