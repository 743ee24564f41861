//! Batchrun Core
//!
//! Core types for the batchrun job orchestrator client.
//!
//! This crate contains:
//! - Domain types: provider-owned entities (Pool, Job, Task and its execution record)
//! - DTOs: requests and views exchanged with a batch provider

pub mod domain;
pub mod dto;
