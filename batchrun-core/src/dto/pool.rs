//! Pool DTOs

use serde::{Deserialize, Serialize};

use crate::domain::pool::{MachineProfile, PackageRef, StartTask};

/// Request to create a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolSpec {
    pub id: String,
    pub target_nodes: u32,
    pub machine: MachineProfile,
    pub start_task: Option<StartTask>,
    #[serde(default)]
    pub packages: Vec<PackageRef>,
}

impl PoolSpec {
    /// Creates a pool spec with the default machine profile and no bootstrap
    pub fn new(id: impl Into<String>, target_nodes: u32) -> Self {
        Self {
            id: id.into(),
            target_nodes,
            machine: MachineProfile::default(),
            start_task: None,
            packages: Vec::new(),
        }
    }

    pub fn with_machine(mut self, machine: MachineProfile) -> Self {
        self.machine = machine;
        self
    }

    pub fn with_start_task(mut self, start_task: StartTask) -> Self {
        self.start_task = Some(start_task);
        self
    }

    pub fn with_package(mut self, package: PackageRef) -> Self {
        self.packages.push(package);
        self
    }
}
