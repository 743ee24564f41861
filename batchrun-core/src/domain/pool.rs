//! Pool domain types

use serde::{Deserialize, Serialize};

/// Reference to an application package installed on nodes or made
/// available to a task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageRef {
    pub application_id: String,
    pub version: String,
}

impl PackageRef {
    pub fn new(application_id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            application_id: application_id.into(),
            version: version.into(),
        }
    }
}

impl std::fmt::Display for PackageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.application_id, self.version)
    }
}

/// Machine profile of the nodes in a pool
///
/// Both fields are opaque to the client and interpreted by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineProfile {
    /// Node size descriptor (e.g., "small")
    pub vm_size: String,
    /// Operating system family or image descriptor
    pub os_family: String,
}

impl Default for MachineProfile {
    fn default() -> Self {
        Self {
            vm_size: "small".to_string(),
            os_family: "4".to_string(),
        }
    }
}

/// Bootstrap command run once on every node when it joins the pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTask {
    pub command_line: String,
    /// When set, a node does not accept tasks until the command succeeded
    pub wait_for_success: bool,
}

impl StartTask {
    pub fn new(command_line: impl Into<String>) -> Self {
        Self {
            command_line: command_line.into(),
            wait_for_success: true,
        }
    }
}

/// Committed pool as reported by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub id: String,
    pub target_nodes: u32,
    pub machine: MachineProfile,
    pub start_task: Option<StartTask>,
    #[serde(default)]
    pub packages: Vec<PackageRef>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
