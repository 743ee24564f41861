//! Data Transfer Objects for provider communication
//!
//! Requests sent to a batch provider and the partial views it returns.

pub mod job;
pub mod pool;
pub mod task;
