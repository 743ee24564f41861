//! Pool provisioning
//!
//! Ensures the pool exists. An existing pool with the same id is the normal
//! case on repeated runs and counts as success.

use batchrun_client::BatchProvider;
use batchrun_core::dto::pool::PoolSpec;
use std::sync::Arc;
use tracing::info;

use crate::error::WorkflowError;

/// What [`PoolProvisioner::ensure_pool`] found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolStatus {
    Created,
    AlreadyExisted,
}

/// Idempotent create-if-absent of a pool
pub struct PoolProvisioner {
    provider: Arc<dyn BatchProvider>,
}

impl PoolProvisioner {
    pub fn new(provider: Arc<dyn BatchProvider>) -> Self {
        Self { provider }
    }

    /// Creates the pool unless one with the same id exists
    ///
    /// Returns once the provider acknowledged the commit. Any rejection other
    /// than "pool exists" is fatal and not retried.
    pub async fn ensure_pool(&self, spec: &PoolSpec) -> Result<PoolStatus, WorkflowError> {
        info!(
            "Creating pool [{}] ({} node(s), size {})",
            spec.id, spec.target_nodes, spec.machine.vm_size
        );

        match self.provider.create_pool(spec).await {
            Ok(pool) => {
                info!("Pool [{}] created", pool.id);
                Ok(PoolStatus::Created)
            }
            Err(e) if e.is_pool_exists() => {
                info!("The pool {} already existed when we tried to create it", spec.id);
                Ok(PoolStatus::AlreadyExisted)
            }
            Err(source) => Err(WorkflowError::Provision {
                pool_id: spec.id.clone(),
                source,
            }),
        }
    }
}
