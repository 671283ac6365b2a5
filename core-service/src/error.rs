use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Configuration error: {0}")]
    Config(#[from] core_runtime::error::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] core_auth::AuthError),

    #[error("Graph error: {0}")]
    Graph(#[from] provider_graph::GraphError),

    #[error("Chat error: {0}")]
    Chat(#[from] core_chat::ChatError),
}

pub type Result<T> = std::result::Result<T, CoreError>;
