//! # Long-term memory
//!
//! This module implements the memory lifecycle of a chat session: choosing
//! the memories relevant to a turn, turning model output into mutations,
//! applying them, and persisting the result.
//!
//! ## Components
//!
//! - `MemoryStore`: load and save the memory set (`JsonFileStore`, `InMemoryStore`)
//! - `RelevanceSelector`: model-driven selection of relevant memory IDs
//! - `is_clear_intent`: keyword detection of "erase everything" requests
//! - `parse_mutations`: model output to `MutationOp` values
//! - `apply_mutations`: `MutationOp` values to a new memory snapshot

mod apply;
mod clear_intent;
pub(crate) mod mutation;
mod relevance;
mod store;

pub use apply::{AppliedMutations, ApplySummary, apply_mutations};
pub use clear_intent::{CLEAR_INTENT_KEYWORDS, is_clear_intent};
pub use mutation::{ADD_SENTINEL_ID, DELETE_SENTINEL, MutationOp, parse_mutations};
pub use relevance::{RelevanceSelector, parse_relevant_ids};
pub use store::{InMemoryStore, JsonFileStore, MemoryStore};

#[cfg(test)]
pub(crate) use store::MockMemoryStore;
