//! Error types for the Graph provider

use core_auth::AuthError;
use thiserror::Error;

/// Graph provider errors
#[derive(Error, Debug)]
pub enum GraphError {
    /// No bearer token could be obtained for the call
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// API request returned an error status
    #[error("Graph API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// Still throttled after the last retry
    #[error("Throttled, retry after {retry_after_seconds} seconds")]
    Throttled { retry_after_seconds: u64 },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    #[error(transparent)]
    Bridge(#[from] bridge_traits::error::BridgeError),
}

impl GraphError {
    /// The access token could not be acquired, so the session needs a fresh
    /// sign-in rather than a retry.
    pub fn is_token_failure(&self) -> bool {
        matches!(self, GraphError::Auth(e) if e.is_token_failure())
    }

    /// No signed-in account was available to request a token for.
    pub fn is_missing_account(&self) -> bool {
        matches!(
            self,
            GraphError::Auth(AuthError::NoActiveAccount | AuthError::Unavailable)
        )
    }
}

/// Result type for Graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = GraphError::ApiError {
            status_code: 403,
            message: "Access denied".to_string(),
        };

        assert_eq!(
            error.to_string(),
            "Graph API error (status 403): Access denied"
        );
    }

    #[test]
    fn test_auth_classification() {
        let token = GraphError::from(AuthError::TokenAcquisition("expired".into()));
        assert!(token.is_token_failure());
        assert!(!token.is_missing_account());

        let account = GraphError::from(AuthError::NoActiveAccount);
        assert!(account.is_missing_account());
        assert!(!account.is_token_failure());

        let api = GraphError::ApiError {
            status_code: 401,
            message: String::new(),
        };
        assert!(!api.is_token_failure());
    }
}
