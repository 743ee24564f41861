//! Error types for batch providers

use thiserror::Error;

/// Result type alias for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Error code reported when a pool with the same id already exists
pub const POOL_EXISTS: &str = "PoolExists";
/// Error code reported when a job with the same id already exists
pub const JOB_EXISTS: &str = "JobExists";
/// Error code reported when a submitted task id is already taken
pub const TASK_EXISTS: &str = "TaskExists";
pub const POOL_NOT_FOUND: &str = "PoolNotFound";
pub const JOB_NOT_FOUND: &str = "JobNotFound";
pub const TASK_NOT_FOUND: &str = "TaskNotFound";
/// Error code reported when tasks are added to a job that is no longer active
pub const JOB_NOT_ACTIVE: &str = "JobNotActive";

/// Errors a batch provider can report
#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Provider returned an error status code
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Provider error code, when one was sent
        code: Option<String>,
        /// Error message from the provider
        message: String,
    },

    /// The request collided with existing provider state
    #[error("Conflict ({code}): {message}")]
    Conflict { code: String, message: String },

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Invalid request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ProviderError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, code: Option<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Provider error code, if the provider sent one
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Conflict { code, .. } => Some(code),
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::Api { status: 404, .. })
    }

    /// Check if this error is a conflict with existing state
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. }) || matches!(self, Self::Api { status: 409, .. })
    }

    /// Check if pool creation failed only because the pool already exists
    pub fn is_pool_exists(&self) -> bool {
        self.error_code() == Some(POOL_EXISTS)
    }

    /// Check if job creation failed because the job id is taken
    pub fn is_job_exists(&self) -> bool {
        self.error_code() == Some(JOB_EXISTS)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_exists_detection() {
        let err = ProviderError::conflict(POOL_EXISTS, "The specified pool already exists.");
        assert!(err.is_pool_exists());
        assert!(err.is_conflict());
        assert!(!err.is_job_exists());
    }

    #[test]
    fn test_api_error_code() {
        let err = ProviderError::api_error(500, Some("ServerBusy".to_string()), "try later");
        assert_eq!(err.error_code(), Some("ServerBusy"));
        assert!(err.is_server_error());
        assert!(!err.is_pool_exists());

        let err = ProviderError::api_error(404, None, "gone");
        assert!(err.is_not_found());
        assert_eq!(err.error_code(), None);
    }
}
