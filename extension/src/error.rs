use thiserror::Error;

/// Everything that can go wrong between the extension contexts, the
/// settings store and the explanation endpoint.
#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("API request failed: {status} - {detail}")]
    Http { status: u16, detail: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("DOM error: {0}")]
    Dom(String),

    #[error("messaging error: {0}")]
    Messaging(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<reqwest::Error> for ExtensionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ExtensionError::InvalidResponse(err.to_string())
        } else {
            ExtensionError::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, ExtensionError>;
