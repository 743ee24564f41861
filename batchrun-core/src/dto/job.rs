//! Job DTOs

use serde::{Deserialize, Serialize};

/// Request to create a job bound to a pool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJob {
    pub id: String,
    pub pool_id: String,
}

/// Request to terminate a job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminateJob {
    pub reason: String,
}
