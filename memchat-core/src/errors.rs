//! Error types for memchat
//!
//! Only failures that must stop a turn or a session surface here. Malformed
//! model output is recovered where it is parsed and never becomes an error.

use std::path::PathBuf;
use thiserror::Error;

use crate::gateway::CallPurpose;

/// Main error type for memchat
#[derive(Error, Debug)]
pub enum MemchatError {
    /// The language-model call itself failed (network, HTTP status, bad body)
    #[error("Language model call failed during {purpose}: {message}")]
    Gateway {
        /// Which call of the turn failed
        purpose: CallPurpose,
        /// Transport or provider error description
        message: String,
    },

    /// The persisted memory file exists but cannot be used
    #[error("Memory file {} is corrupt: {reason}", .path.display())]
    CorruptStore {
        /// Location of the persisted memory file
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Filesystem errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for memchat operations
pub type Result<T> = std::result::Result<T, MemchatError>;

impl MemchatError {
    /// Create a new Gateway error
    pub fn gateway(purpose: CallPurpose, message: impl Into<String>) -> Self {
        Self::Gateway {
            purpose,
            message: message.into(),
        }
    }

    /// Create a new CorruptStore error
    pub fn corrupt_store(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CorruptStore {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Check if the error was raised while talking to the language model
    pub fn is_gateway_error(&self) -> bool {
        matches!(self, Self::Gateway { .. })
    }

    /// Check if the error prevents the session from starting
    pub fn is_startup_error(&self) -> bool {
        matches!(self, Self::CorruptStore { .. } | Self::Config(_))
    }
}
