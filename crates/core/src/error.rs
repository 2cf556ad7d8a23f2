//! Error types for the Vouch domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each collaborator seam has its own error enum.

use thiserror::Error;

/// Failures talking to the upstream model provider.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures loading content records from a collaborator.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("Failed to read content at {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to parse content at {path}: {reason}")]
    Parse { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn content_error_names_path() {
        let err = ContentError::Parse {
            path: "projects/projects.json".into(),
            reason: "expected value".into(),
        };
        assert!(err.to_string().contains("projects/projects.json"));
    }
}
