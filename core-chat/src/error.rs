use bridge_traits::error::BridgeError;
use provider_graph::GraphError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("No active account")]
    NoActiveAccount,

    #[error("Access token unavailable: {0}")]
    TokenExpired(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Text generation failed: {0}")]
    Generation(String),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

impl ChatError {
    pub fn is_token_failure(&self) -> bool {
        matches!(self, ChatError::TokenExpired(_))
    }
}

impl From<GraphError> for ChatError {
    fn from(error: GraphError) -> Self {
        if error.is_missing_account() {
            ChatError::NoActiveAccount
        } else if error.is_token_failure() {
            ChatError::TokenExpired(error.to_string())
        } else {
            ChatError::Repository(error.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;
