//! Provider account credentials

/// Account credentials for a batch provider
///
/// Passed explicitly to the provider at construction; nothing is read from
/// process-wide state after that.
#[derive(Clone)]
pub struct Credentials {
    /// Account name
    pub account_name: String,
    /// Shared account key
    pub account_key: String,
    /// Account endpoint (e.g., "https://myaccount.region.batch.example.com")
    pub account_url: String,
}

impl Credentials {
    pub fn new(
        account_name: impl Into<String>,
        account_key: impl Into<String>,
        account_url: impl Into<String>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            account_key: account_key.into(),
            account_url: account_url.into(),
        }
    }

    /// Reads credentials from environment variables
    ///
    /// Expected environment variables:
    /// - BATCH_ACCOUNT_NAME
    /// - BATCH_ACCOUNT_KEY
    /// - BATCH_ACCOUNT_URL
    ///
    /// Missing variables come back empty; call [`Credentials::validate`]
    /// before use.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            account_name: lookup("BATCH_ACCOUNT_NAME").unwrap_or_default(),
            account_key: lookup("BATCH_ACCOUNT_KEY").unwrap_or_default(),
            account_url: lookup("BATCH_ACCOUNT_URL").unwrap_or_default(),
        }
    }

    /// Validates the credentials
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.account_name.is_empty() || self.account_key.is_empty() || self.account_url.is_empty()
        {
            anyhow::bail!(
                "one or more account credential strings have not been populated; \
                 set the account name, key and url"
            );
        }

        if !self.account_url.starts_with("http://") && !self.account_url.starts_with("https://") {
            anyhow::bail!("account_url must start with http:// or https://");
        }

        Ok(())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("account_name", &self.account_name)
            .field("account_key", &"<redacted>")
            .field("account_url", &self.account_url)
            .finish()
    }
}
