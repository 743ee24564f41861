//! Batchrun Workflow
//!
//! Provisions capacity, submits work items as tasks and tracks them to a
//! verdict. The stages run strictly in order:
//!
//! - [`PoolProvisioner`]: create-if-absent of the pool
//! - [`JobRegistrar`]: a fresh job bound to the pool
//! - [`TaskSubmitter`]: one bulk submission of all tasks
//! - [`CompletionMonitor`]: bounded polling until every task completed, then
//!   per-task reconciliation into a [`Verdict`]
//! - [`Orchestrator`]: sequences the above and applies the teardown policy
//!
//! Every interaction with the provider goes through
//! [`batchrun_client::BatchProvider`].

pub mod config;
pub mod driver;
pub mod error;
pub mod monitor;
pub mod service;
pub mod teardown;

pub use config::{ExitCodePolicy, PollPolicy, WorkflowConfig};
pub use driver::{Orchestrator, RunOutcome, RunReport};
pub use error::{MonitorError, Stage, TimeoutError, WorkflowError};
pub use monitor::{CompletionMonitor, TaskOutcome, Verdict};
pub use service::{JobRegistrar, PoolProvisioner, PoolStatus, TaskSubmitter, TaskTemplate, WorkItem};
pub use teardown::{TeardownAction, TeardownConfirm, TeardownPolicy, TeardownSummary, TeardownTarget};
