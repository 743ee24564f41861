//! Service layer
//!
//! The three provisioning stages of the workflow. Each holds a shared
//! handle to the provider and talks to it only through request/response
//! calls; none keeps state between runs.

mod provisioner;
mod registrar;
mod submitter;

pub use provisioner::{PoolProvisioner, PoolStatus};
pub use registrar::JobRegistrar;
pub use submitter::{TaskSubmitter, TaskTemplate, WorkItem};
