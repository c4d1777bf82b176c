//! Language-model gateway abstractions
//!
//! This module defines the `LanguageModelGateway` trait the orchestrator talks
//! to, the request shape it sends, and the in-crate implementations: a
//! scripted gateway for tests and a decorator that writes every call to the
//! call log.

use crate::errors::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub mod logging;
pub mod mock;

pub use logging::{CallLog, LoggingGateway};
pub use mock::ScriptedGateway;

/// Which step of a turn a model call belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallPurpose {
    /// Choosing the memories relevant to the input
    SelectRelevant,
    /// Producing the reply shown to the user
    GenerateReply,
    /// Asking which memories to add, modify or delete
    ComputeMutations,
}

impl CallPurpose {
    /// Short identifier used in log titles
    pub fn label(&self) -> &'static str {
        match self {
            CallPurpose::SelectRelevant => "select_relevant",
            CallPurpose::GenerateReply => "generate_reply",
            CallPurpose::ComputeMutations => "compute_mutations",
        }
    }
}

impl fmt::Display for CallPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallPurpose::SelectRelevant => write!(f, "relevance selection"),
            CallPurpose::GenerateReply => write!(f, "reply generation"),
            CallPurpose::ComputeMutations => write!(f, "memory update"),
        }
    }
}

/// Role of a prompt message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    /// Instruction framing the request
    System,
    /// Request content
    User,
    /// Earlier model output
    Assistant,
}

impl fmt::Display for PromptRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptRole::System => write!(f, "system"),
            PromptRole::User => write!(f, "user"),
            PromptRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single role-tagged message sent to the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    /// Message role
    pub role: PromptRole,
    /// Message text
    pub content: String,
}

impl PromptMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            content: content.into(),
        }
    }
}

/// Everything a gateway needs for one completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Step of the turn issuing the call
    pub purpose: CallPurpose,
    /// Model identifier passed through to the provider
    pub model: String,
    /// Ordered prompt messages
    pub messages: Vec<PromptMessage>,
    /// Whether the provider may use extended reasoning
    pub enable_thinking: bool,
}

impl CompletionRequest {
    /// Text of the last user message, if any
    pub fn last_user_content(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == PromptRole::User)
            .map(|m| m.content.as_str())
    }
}

/// Default model identifier
pub const DEFAULT_MODEL: &str = "deepseek-v3";

/// Model parameters shared by every call of a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Model identifier passed through to the provider
    pub model: String,
    /// Whether the provider may use extended reasoning
    pub enable_thinking: bool,
}

impl ModelSettings {
    /// Build a request for `purpose` carrying these settings
    pub fn request(&self, purpose: CallPurpose, messages: Vec<PromptMessage>) -> CompletionRequest {
        CompletionRequest {
            purpose,
            model: self.model.clone(),
            messages,
            enable_thinking: self.enable_thinking,
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            enable_thinking: false,
        }
    }
}

/// Gateway trait for talking to a language model
///
/// Implementations return the raw completion text. Callers treat it as
/// untrusted and parse it defensively. Any `Err` is a transport failure and
/// ends the current turn.
#[async_trait]
pub trait LanguageModelGateway: Send + Sync {
    /// Send the request and return the completion text
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

#[async_trait]
impl<G> LanguageModelGateway for Arc<G>
where
    G: LanguageModelGateway + ?Sized,
{
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        (**self).complete(request).await
    }
}

#[async_trait]
impl<G> LanguageModelGateway for Box<G>
where
    G: LanguageModelGateway + ?Sized,
{
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        (**self).complete(request).await
    }
}
