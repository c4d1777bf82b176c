//! Prompt construction for the three model calls of a turn
//!
//! Memories and conversation history are embedded as pretty-printed JSON so
//! the model sees every field exactly as stored.

use serde::Serialize;

use crate::errors::Result;
use crate::gateway::PromptMessage;
use crate::memory::mutation::{ADD_SENTINEL_ID, DELETE_SENTINEL};
use crate::types::{ChatTurn, MemorySet};

/// System instruction for the mutation call
pub const MUTATION_SYSTEM_PROMPT: &str =
    "Decide whether any long-term memory needs to be added, modified or deleted.";

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Prompt asking which stored memories matter for this input
pub fn relevance_prompt(
    memories: &MemorySet,
    user_input: &str,
    recent: &[ChatTurn],
) -> Result<Vec<PromptMessage>> {
    let prompt = format!(
        "You are a memory retrieval assistant. These are the stored memories:\n\
         {memories}\n\n\
         User input: {user_input}\n\n\
         Conversation history: {history}\n\n\
         Return the ids of the memories relevant to the user input and the conversation \
         as a JSON array, for example [1,3,5]. Return only the ids.",
        memories = to_json(memories)?,
        history = to_json(recent)?,
    );
    Ok(vec![PromptMessage::user(prompt)])
}

/// Prompt producing the reply shown to the user
pub fn reply_prompt(
    relevant: &MemorySet,
    user_input: &str,
    recent: &[ChatTurn],
) -> Result<Vec<PromptMessage>> {
    let prompt = format!(
        "These are the memories relevant to this conversation:\n\
         {memories}\n\n\
         User input: {user_input}\n\n\
         Conversation history: {history}\n\
         Reply to the user based on the memories and the conversation, in the user's language.",
        memories = to_json(relevant)?,
        history = to_json(recent)?,
    );
    Ok(vec![PromptMessage::user(prompt)])
}

/// Prompt asking for the memory changes this turn implies
///
/// `history` already ends with the current user input and the reply.
pub fn mutation_prompt(
    relevant: &MemorySet,
    user_input: &str,
    history: &[ChatTurn],
) -> Result<Vec<PromptMessage>> {
    let prompt = format!(
        "You are a memory management assistant. These are the memories relevant to this \
         conversation:\n\
         {memories}\n\n\
         User input: {user_input}\n\n\
         Conversation history: {history}\n\n\
         Decide whether there are new long-term facts, habits, preferences, relationships, \
         identity details or plans worth remembering. Prefer saving useful information: if \
         the user revealed a new fact that is not in memory, add it.\n\
         Return the memories to add, modify or delete after this conversation as a JSON array.\n\
         - Add: id {add_id}, content is the new memory.\n\
         - Modify: the existing id, content is the updated memory.\n\
         - Delete: the id to delete, content is null or \"{delete}\".\n\
         For example:\n\
         [\n  {{\"id\": {add_id}, \"content\": \"new memory\"}},\n  \
         {{\"id\": 2, \"content\": \"updated memory\"}},\n  \
         {{\"id\": 3, \"content\": null}}\n]\n\
         If nothing changes, return an empty array [].",
        memories = to_json(relevant)?,
        history = to_json(history)?,
        add_id = ADD_SENTINEL_ID,
        delete = DELETE_SENTINEL,
    );
    Ok(vec![
        PromptMessage::system(MUTATION_SYSTEM_PROMPT),
        PromptMessage::user(prompt),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::PromptRole;
    use crate::types::MemoryRecord;

    fn memories() -> MemorySet {
        MemorySet::from_records(vec![MemoryRecord::new(1, "喜欢喝茶")]).unwrap()
    }

    #[test]
    fn test_relevance_prompt_embeds_memories_verbatim() {
        let messages = relevance_prompt(&memories(), "推荐一个饮料", &[]).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].role, PromptRole::User);
        assert!(messages[0].content.contains("\"content\": \"喜欢喝茶\""));
        assert!(messages[0].content.contains("User input: 推荐一个饮料"));
    }

    #[test]
    fn test_reply_prompt_embeds_history() {
        let history = vec![ChatTurn::user("hi"), ChatTurn::assistant("hello")];
        let messages = reply_prompt(&MemorySet::new(), "how are you", &history).unwrap();
        assert!(messages[0].content.contains("\"role\": \"assistant\""));
        assert!(messages[0].content.contains("\"content\": \"hello\""));
    }

    #[test]
    fn test_mutation_prompt_has_system_instruction() {
        let history = vec![ChatTurn::user("I like tea"), ChatTurn::assistant("Noted!")];
        let messages = mutation_prompt(&MemorySet::new(), "I like tea", &history).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], PromptMessage::system(MUTATION_SYSTEM_PROMPT));
        assert!(messages[1].content.contains("{\"id\": -1, \"content\": \"new memory\"}"));
        assert!(messages[1].content.contains("\"delete\""));
    }
}
