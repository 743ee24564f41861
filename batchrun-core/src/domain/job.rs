//! Job domain types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Job bound to exactly one pool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub pool_id: String,
    pub state: JobState,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub terminated_at: Option<chrono::DateTime<chrono::Utc>>,
    /// Reason given when the job was terminated
    pub terminate_reason: Option<String>,
}

impl Job {
    /// Generates a fresh job id
    ///
    /// Jobs are expected to be new on every run, so callers that do not pin
    /// an id get a unique one.
    pub fn generate_id() -> String {
        format!("job-{}", Uuid::new_v4().simple())
    }
}

/// Job lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobState {
    Active,
    Completed,
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Active => write!(f, "Active"),
            JobState::Completed => write!(f, "Completed"),
        }
    }
}
