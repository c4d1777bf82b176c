//! Conversation orchestration
//!
//! A [`MemoryChat`] owns the memory set and the conversation window for one
//! session and drives each turn through the same sequence:
//!
//! 1. pick the relevant memories (all of them on a clear intent)
//! 2. generate the reply
//! 3. ask the model for memory mutations
//! 4. apply them and persist the full set
//!
//! Model calls are issued one after another; a transport failure ends the turn
//! with an error and leaves the previously persisted state untouched.

use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::errors::Result;
use crate::gateway::{CallPurpose, LanguageModelGateway, ModelSettings};
use crate::memory::{
    ApplySummary, MemoryStore, MutationOp, RelevanceSelector, apply_mutations, is_clear_intent,
    parse_mutations,
};
use crate::prompts::{mutation_prompt, reply_prompt};
use crate::types::{ChatTurn, ConversationContext, DEFAULT_CONTEXT_WINDOW, MemorySet};

/// Inputs that end the session, compared trimmed and case-insensitively
pub const EXIT_COMMANDS: &[&str] = &["exit", "quit", "q"];

/// How a line typed by the user should be handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInput<'a> {
    /// End the session
    Exit,
    /// Nothing to send
    Blank,
    /// A message for the assistant
    Message(&'a str),
}

/// Classify one line of user input
pub fn classify_input(line: &str) -> UserInput<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return UserInput::Blank;
    }
    if EXIT_COMMANDS
        .iter()
        .any(|command| trimmed.eq_ignore_ascii_case(command))
    {
        return UserInput::Exit;
    }
    UserInput::Message(trimmed)
}

/// Session options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryChatOptions {
    /// Model parameters used for every call
    pub model: ModelSettings,
    /// Number of recent messages sent as conversation history
    pub context_window: usize,
}

impl Default for MemoryChatOptions {
    fn default() -> Self {
        Self {
            model: ModelSettings::default(),
            context_window: DEFAULT_CONTEXT_WINDOW,
        }
    }
}

impl MemoryChatOptions {
    /// Create a new builder
    pub fn builder() -> MemoryChatOptionsBuilder {
        MemoryChatOptionsBuilder::default()
    }
}

/// Builder for [`MemoryChatOptions`]
#[derive(Debug, Default)]
pub struct MemoryChatOptionsBuilder {
    options: MemoryChatOptions,
}

impl MemoryChatOptionsBuilder {
    /// Set the model identifier
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.options.model.model = model.into();
        self
    }

    /// Allow or forbid extended reasoning
    pub fn enable_thinking(mut self, enable: bool) -> Self {
        self.options.model.enable_thinking = enable;
        self
    }

    /// Set the number of recent messages kept as history
    pub fn context_window(mut self, messages: usize) -> Self {
        self.options.context_window = messages;
        self
    }

    /// Build the options
    pub fn build(self) -> MemoryChatOptions {
        self.options
    }
}

/// Everything that happened during one turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReport {
    /// Reply to show the user
    pub reply: String,
    /// Whether the input was treated as an erase request
    pub clear_intent: bool,
    /// Memories handed to the reply and mutation calls
    pub relevant_ids: BTreeSet<u64>,
    /// Mutations parsed from the model output
    pub mutations: Vec<MutationOp>,
    /// Effect of those mutations on the memory set
    pub summary: ApplySummary,
}

/// A chat session with long-term memory
pub struct MemoryChat<G, S> {
    gateway: G,
    store: S,
    options: MemoryChatOptions,
    memories: MemorySet,
    context: ConversationContext,
}

impl<G, S> MemoryChat<G, S>
where
    G: LanguageModelGateway,
    S: MemoryStore,
{
    /// Open a session, loading the persisted memories from `store`
    ///
    /// A corrupt store is an error; an absent one starts empty.
    pub async fn open(gateway: G, store: S, options: MemoryChatOptions) -> Result<Self> {
        let memories = store.load().await?;
        info!("Session opened with {} stored memories", memories.len());
        Ok(Self {
            gateway,
            store,
            context: ConversationContext::new(options.context_window),
            options,
            memories,
        })
    }

    /// Current memory set
    pub fn memories(&self) -> &MemorySet {
        &self.memories
    }

    /// Current conversation window
    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    /// Session options
    pub fn options(&self) -> &MemoryChatOptions {
        &self.options
    }

    /// The gateway used for model calls
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// The backing store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run one full turn for `user_input`
    pub async fn handle_turn(&mut self, user_input: &str) -> Result<TurnReport> {
        let recent = self.context.recent();

        let clear_intent = is_clear_intent(user_input);
        let relevant = if clear_intent {
            info!("Clear intent detected, reviewing all {} memories", self.memories.len());
            self.memories.clone()
        } else {
            let ids = RelevanceSelector::new(&self.gateway, &self.options.model)
                .select(&self.memories, user_input, &recent)
                .await?;
            self.memories.subset(&ids)
        };
        let relevant_ids: BTreeSet<u64> = relevant.ids().into_iter().collect();

        let reply = self.generate_reply(&relevant, user_input, &recent).await?;
        self.context.push_exchange(user_input, reply.as_str());

        let mut history = recent;
        history.push(ChatTurn::user(user_input));
        history.push(ChatTurn::assistant(reply.as_str()));
        let mutations = self.compute_mutations(&relevant, user_input, &history).await?;

        let applied = apply_mutations(&self.memories, &mutations);
        self.memories = applied.memories;
        self.store.save(&self.memories).await?;
        debug!("Persisted {} memories", self.memories.len());

        Ok(TurnReport {
            reply,
            clear_intent,
            relevant_ids,
            mutations,
            summary: applied.summary,
        })
    }

    async fn generate_reply(
        &self,
        relevant: &MemorySet,
        user_input: &str,
        recent: &[ChatTurn],
    ) -> Result<String> {
        let messages = reply_prompt(relevant, user_input, recent)?;
        let request = self.options.model.request(CallPurpose::GenerateReply, messages);
        self.gateway.complete(&request).await
    }

    async fn compute_mutations(
        &self,
        relevant: &MemorySet,
        user_input: &str,
        history: &[ChatTurn],
    ) -> Result<Vec<MutationOp>> {
        let messages = mutation_prompt(relevant, user_input, history)?;
        let request = self
            .options
            .model
            .request(CallPurpose::ComputeMutations, messages);
        let output = self.gateway.complete(&request).await?;
        Ok(parse_mutations(&output))
    }
}
