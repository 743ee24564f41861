//! Core domain types
//!
//! These types describe the entities a batch provider owns once they are
//! committed. The client only ever holds copies of them; all mutation goes
//! through provider calls.

pub mod job;
pub mod pool;
pub mod task;
