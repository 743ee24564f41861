//! REST provider
//!
//! Talks to a batch service account over HTTP. Resource-specific calls live
//! in `pools.rs`, `jobs.rs` and `tasks.rs`; this module holds the shared
//! plumbing.

use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::credentials::Credentials;
use crate::error::{ProviderError, Result};

/// HTTP client for a batch service account
#[derive(Debug, Clone)]
pub struct HttpBatchProvider {
    /// Account credentials, sent with every request
    credentials: Credentials,
    /// Base URL of the account endpoint, without trailing slash
    pub(crate) base_url: String,
    /// HTTP client instance
    client: Client,
}

/// Error body sent by the service
#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: Option<String>,
    message: Option<String>,
}

impl HttpBatchProvider {
    /// Create a new provider for the given account
    pub fn new(credentials: Credentials) -> Self {
        Self::with_client(credentials, Client::new())
    }

    /// Create a new provider with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(credentials: Credentials, client: Client) -> Self {
        let base_url = credentials.account_url.trim_end_matches('/').to_string();
        Self {
            credentials,
            base_url,
            client,
        }
    }

    /// Get the base URL of the account endpoint
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start an authenticated request against `path`
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.client.request(method, url).basic_auth(
            &self.credentials.account_name,
            Some(&self.credentials.account_key),
        )
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle a provider response and deserialize JSON
    pub(crate) async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_body(status.as_u16(), &body));
        }

        response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle a provider response that returns no content
    pub(crate) async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_body(status.as_u16(), &body));
        }

        Ok(())
    }
}

/// Map an error status and body to a [`ProviderError`]
fn error_from_body(status: u16, body: &str) -> ProviderError {
    let parsed = serde_json::from_str::<ErrorBody>(body).ok();
    let code = parsed.as_ref().and_then(|b| b.code.clone());
    let message = parsed
        .and_then(|b| b.message)
        .unwrap_or_else(|| if body.is_empty() { "Unknown error".to_string() } else { body.to_string() });

    match (status, code) {
        (404, _) => ProviderError::NotFound(message),
        (409, Some(code)) => ProviderError::conflict(code, message),
        (400, None) => ProviderError::InvalidRequest(message),
        (status, code) => ProviderError::api_error(status, code, message),
    }
}
