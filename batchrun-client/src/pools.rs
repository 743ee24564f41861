//! Pool endpoints

use batchrun_core::domain::pool::Pool;
use batchrun_core::dto::pool::PoolSpec;
use reqwest::Method;
use tracing::debug;

use crate::HttpBatchProvider;
use crate::error::Result;

impl HttpBatchProvider {
    /// Create and commit a pool
    ///
    /// # Returns
    /// The committed pool, or a `PoolExists` conflict
    pub async fn create_pool(&self, spec: &PoolSpec) -> Result<Pool> {
        debug!("POST /pools ({})", spec.id);
        let response = self.request(Method::POST, "/pools").json(spec).send().await?;

        self.handle_response(response).await
    }

    /// Delete a pool and release its nodes
    pub async fn delete_pool(&self, pool_id: &str) -> Result<()> {
        let path = format!("/pools/{}", pool_id);
        let response = self.request(Method::DELETE, &path).send().await?;

        self.handle_empty_response(response).await
    }
}
