//! # memchat-core
//!
//! Long-term memory for chat sessions driven by a language model.
//!
//! The model plays two roles: it answers the user, and it decides which
//! memories to add, modify or delete after each turn. This crate implements
//! the protocol around those decisions and treats every completion as
//! untrusted text.
//!
//! ## Features
//!
//! - **Relevance selection**: the model picks the memories that matter for a turn
//! - **Clear-intent detection**: erase requests review the whole memory set
//! - **Defensive parsing**: malformed model output degrades to "no change"
//! - **Atomic mutation**: adds, modifies and deletes applied as one batch
//! - **Persistence**: the memory set is rewritten to disk after every turn
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use memchat_core::{JsonFileStore, MemoryChat, MemoryChatOptions, Result, ScriptedGateway};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let gateway = ScriptedGateway::with_responses([
//!         "[]",
//!         "Nice to meet you!",
//!         r#"[{"id": -1, "content": "Likes tea"}]"#,
//!     ]);
//!     let store = JsonFileStore::new("memories.json");
//!     let mut chat = MemoryChat::open(gateway, store, MemoryChatOptions::default()).await?;
//!
//!     let report = chat.handle_turn("I like tea").await?;
//!     println!("{}", report.reply);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

mod errors;
pub mod gateway;
/// Long-term memory: store, selection, parsing and application of mutations
pub mod memory;
pub mod message_parser;
pub mod prompts;
mod session;
mod types;

// Re-export main types and functions
pub use errors::{MemchatError, Result};
pub use gateway::{
    CallLog, CallPurpose, CompletionRequest, DEFAULT_MODEL, LanguageModelGateway, LoggingGateway,
    ModelSettings, PromptMessage, PromptRole, ScriptedGateway,
};
pub use memory::{
    AppliedMutations, ApplySummary, InMemoryStore, JsonFileStore, MemoryStore, MutationOp,
    RelevanceSelector, apply_mutations, is_clear_intent, parse_mutations, parse_relevant_ids,
};
pub use session::{
    EXIT_COMMANDS, MemoryChat, MemoryChatOptions, MemoryChatOptionsBuilder, TurnReport, UserInput,
    classify_input,
};
pub use types::{
    ChatTurn, ConversationContext, DEFAULT_CONTEXT_WINDOW, MAX_MEMORY_ID, MemoryRecord, MemorySet,
    MemorySetError, Role,
};
