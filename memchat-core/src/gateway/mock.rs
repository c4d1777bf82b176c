//! In-memory scripted gateway for testing and offline simulations
use super::{CallPurpose, CompletionRequest, LanguageModelGateway};
use crate::errors::{MemchatError, Result};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

/// A gateway that replays queued completions in order
///
/// Every request is recorded so tests can assert on what the orchestrator
/// sent. Once the queue is exhausted each call fails like a transport error.
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<std::result::Result<String, String>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ScriptedGateway {
    /// Create a gateway with no queued completions
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a gateway that answers with `responses`, in order
    pub fn with_responses<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let gateway = Self::new();
        for response in responses {
            gateway.push_response(response);
        }
        gateway
    }

    /// Queue a successful completion
    pub fn push_response(&self, response: impl Into<String>) {
        lock(&self.responses).push_back(Ok(response.into()));
    }

    /// Queue a transport failure
    pub fn push_failure(&self, message: impl Into<String>) {
        lock(&self.responses).push_back(Err(message.into()));
    }

    /// Number of completions still queued
    pub fn remaining(&self) -> usize {
        lock(&self.responses).len()
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock(&self.requests).clone()
    }

    /// Purposes of the requests received so far, in call order
    pub fn purposes(&self) -> Vec<CallPurpose> {
        lock(&self.requests).iter().map(|r| r.purpose).collect()
    }
}

#[async_trait]
impl LanguageModelGateway for ScriptedGateway {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        lock(&self.requests).push(request.clone());
        match lock(&self.responses).pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(MemchatError::gateway(request.purpose, message)),
            None => Err(MemchatError::gateway(
                request.purpose,
                "scripted gateway has no response queued",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::PromptMessage;

    fn request(purpose: CallPurpose) -> CompletionRequest {
        CompletionRequest {
            purpose,
            model: "test-model".to_string(),
            messages: vec![PromptMessage::user("hello")],
            enable_thinking: false,
        }
    }

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let gateway = ScriptedGateway::with_responses(["[1]", "Hi there"]);

        let first = gateway.complete(&request(CallPurpose::SelectRelevant)).await;
        let second = gateway.complete(&request(CallPurpose::GenerateReply)).await;

        assert_eq!(first.unwrap(), "[1]");
        assert_eq!(second.unwrap(), "Hi there");
        assert_eq!(
            gateway.purposes(),
            vec![CallPurpose::SelectRelevant, CallPurpose::GenerateReply]
        );
        assert_eq!(gateway.remaining(), 0);
    }

    #[tokio::test]
    async fn test_failure_and_exhaustion() {
        let gateway = ScriptedGateway::new();
        gateway.push_failure("503 service unavailable");

        let err = gateway
            .complete(&request(CallPurpose::GenerateReply))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("503"));

        let err = gateway
            .complete(&request(CallPurpose::ComputeMutations))
            .await
            .unwrap_err();
        assert!(err.is_gateway_error());
    }
}
