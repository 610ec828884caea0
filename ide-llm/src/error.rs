use crate::types::Provider;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LlmError>;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{provider} API key not configured")]
    NotConfigured { provider: Provider },

    #[error("{provider} API error: {status} {status_text} - {body}")]
    Api {
        provider: Provider,
        status: u16,
        status_text: String,
        body: String,
    },

    #[error("{provider} request failed: {message}")]
    Transport { provider: Provider, message: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unexpected response format: {0}")]
    ResponseFormat(String),
}

impl LlmError {
    pub(crate) fn transport(provider: Provider, e: reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            format!("request timed out: {e}")
        } else {
            e.to_string()
        };
        Self::Transport { provider, message }
    }

    /// HTTP status carried by the error, if the provider answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(e: serde_json::Error) -> Self {
        Self::ResponseFormat(e.to_string())
    }
}
