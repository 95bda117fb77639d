use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PecError {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("No usable response received")]
    EmptyResponse,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Document rendering unavailable: {0}")]
    RenderingUnavailable(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("A reply is still being generated")]
    Busy,

    #[error("Cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JS interop error: {0}")]
    JsInterop(String),

    #[error("{0}")]
    Other(String),
}

impl PecError {
    /// Errors the user can recover from by pressing "try again".
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PecError::Llm(_)
                | PecError::Network(_)
                | PecError::EmptyResponse
                | PecError::Cancelled
                | PecError::RenderingUnavailable(_)
        )
    }
}

impl From<serde_json::Error> for PecError {
    fn from(e: serde_json::Error) -> Self {
        PecError::Serialization(e.to_string())
    }
}
