use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes produced by the authentication client itself.
///
/// Codes coming back from the identity provider (`invalid_request`,
/// `invalid_grant`, `AADSTS…`) pass through unchanged.
pub mod codes {
    pub const INTERACTION_IN_PROGRESS: &str = "interaction_in_progress";
    pub const USER_CANCELLED: &str = "user_cancelled";
    pub const POPUP_WINDOW_CLOSED: &str = "popup_window_closed";
    pub const POPUP_WINDOW_ERROR: &str = "popup_window_error";
    pub const TIMED_OUT: &str = "timed_out";
    pub const STATE_MISMATCH: &str = "state_mismatch";
    pub const NONCE_MISMATCH: &str = "nonce_mismatch";
    pub const INTERACTION_REQUIRED: &str = "interaction_required";
    pub const NO_ACCOUNT: &str = "no_account_error";
    pub const UNINITIALIZED: &str = "uninitialized_public_client_application";
    pub const NAVIGATION_FAILED: &str = "navigation_failed";
    pub const INVALID_RESPONSE: &str = "invalid_response";
    pub const NETWORK_ERROR: &str = "network_error";
    pub const STORAGE_ERROR: &str = "storage_error";
    pub const UNKNOWN: &str = "unknown_error";
}

/// Normalized failure reported by the authentication client.
///
/// Everything that crosses the client boundary is reduced to a code and a
/// message so the session coordinator can classify it by signature. The type
/// is `Clone` because it travels through the shared initialization future.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn interaction_in_progress() -> Self {
        Self::new(
            codes::INTERACTION_IN_PROGRESS,
            "Interaction is currently in progress. Please ensure that this interaction has been completed before calling an interactive API.",
        )
    }

    pub fn interaction_required(message: impl Into<String>) -> Self {
        Self::new(codes::INTERACTION_REQUIRED, message)
    }

    pub fn uninitialized() -> Self {
        Self::new(
            codes::UNINITIALIZED,
            "The client must be initialized before calling any other API.",
        )
    }

    pub fn is_code(&self, code: &str) -> bool {
        self.code == code
    }
}

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Authentication client is not available in this environment")]
    Unavailable,

    #[error("No active account")]
    NoActiveAccount,

    #[error("Token acquisition failed: {0}")]
    TokenAcquisition(String),

    #[error("OAuth state mismatch")]
    StateMismatch,

    #[error("Invalid authorization response: {0}")]
    InvalidAuthCode(String),

    #[error("Token refresh failed: {0}")]
    TokenRefreshFailed(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("{0}")]
    Other(String),
}

impl AuthError {
    /// Whether the failure means the caller no longer holds a usable credential.
    pub fn is_token_failure(&self) -> bool {
        matches!(
            self,
            AuthError::TokenAcquisition(_) | AuthError::TokenRefreshFailed(_)
        )
    }
}

impl From<AuthError> for ProviderError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Provider(inner) => inner,
            AuthError::StateMismatch => ProviderError::new(
                codes::STATE_MISMATCH,
                "State returned by the identity provider does not match the request",
            ),
            AuthError::NoActiveAccount => {
                ProviderError::new(codes::NO_ACCOUNT, "No account is signed in")
            }
            AuthError::TokenRefreshFailed(message) => {
                ProviderError::interaction_required(message)
            }
            AuthError::InvalidAuthCode(message) => {
                ProviderError::new(codes::INVALID_RESPONSE, message)
            }
            AuthError::NetworkError(message) => ProviderError::new(codes::NETWORK_ERROR, message),
            AuthError::Storage(message) => ProviderError::new(codes::STORAGE_ERROR, message),
            other => ProviderError::new(codes::UNKNOWN, other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
