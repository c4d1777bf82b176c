use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Provider returned {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Provider response has no completion text")]
    EmptyCompletion,

    #[error("Invalid gateway configuration: {0}")]
    Config(String),
}

/// Error body returned by OpenAI-compatible providers
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub param: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

impl GatewayError {
    /// Build a status error, preferring the provider's own message
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|response| response.error.message)
            .unwrap_or_else(|_| body.trim().to_string());
        Self::Status { status, message }
    }
}
