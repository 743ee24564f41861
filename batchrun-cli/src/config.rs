//! Configuration module
//!
//! Handles CLI configuration: which provider to talk to and with which
//! credentials.

use anyhow::{Context, Result};
use batchrun_client::{BatchProvider, Credentials, HttpBatchProvider};
use std::sync::Arc;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Account credentials, ignored when simulating
    pub credentials: Credentials,
    /// Use the in-memory provider
    pub simulate: bool,
}

impl Config {
    /// Provider for the configured batch account
    ///
    /// Fails under `--simulate`: a simulated account only lives for the
    /// duration of one `run`, so there is nothing to inspect or delete.
    pub fn provider(&self) -> Result<Arc<dyn BatchProvider>> {
        if self.simulate {
            anyhow::bail!(
                "--simulate only applies to `run`; this command needs a batch account"
            );
        }

        self.credentials
            .validate()
            .context("Invalid batch account credentials")?;

        Ok(Arc::new(HttpBatchProvider::new(self.credentials.clone())))
    }
}
