//! Batchrun Provider Client
//!
//! The provider collaborator of the batchrun workflow: everything that
//! talks to the service which actually owns pools, jobs and tasks.
//!
//! Two implementations of [`BatchProvider`] ship with this crate:
//! - [`HttpBatchProvider`]: REST client for a batch service account
//! - [`InMemoryProvider`]: scripted in-process simulation for tests and dry runs
//!
//! # Example
//!
//! ```no_run
//! use batchrun_client::{BatchProvider, Credentials, HttpBatchProvider};
//! use batchrun_core::dto::pool::PoolSpec;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let creds = Credentials::from_env();
//!     creds.validate()?;
//!     let provider = HttpBatchProvider::new(creds);
//!
//!     let pool = provider.create_pool(&PoolSpec::new("TutorialPool", 3)).await?;
//!     println!("Created pool: {}", pool.id);
//!     Ok(())
//! }
//! ```

pub mod credentials;
pub mod error;
mod http;
mod jobs;
pub mod memory;
mod pools;
mod provider;
mod tasks;

// Re-export commonly used types
pub use credentials::Credentials;
pub use error::{ProviderError, Result};
pub use http::HttpBatchProvider;
pub use memory::{InMemoryProvider, ProviderCall, TaskScript};
pub use provider::BatchProvider;
