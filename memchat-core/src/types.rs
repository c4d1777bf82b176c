//! Type definitions for memchat
//!
//! The persisted memory model and the in-process conversation window.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::fmt;
use thiserror::Error;

/// Default number of messages kept in the conversation window (five exchanges)
pub const DEFAULT_CONTEXT_WINDOW: usize = 10;

/// Highest ID a memory may carry; model output addresses IDs as signed integers
pub const MAX_MEMORY_ID: u64 = i64::MAX as u64;

/// A single remembered fact or preference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Stable identifier, unique within a set and never below 1
    pub id: u64,
    /// Remembered text
    pub content: String,
    /// Fields written by other tools, carried through load and save untouched
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MemoryRecord {
    /// Create a new record
    pub fn new(id: u64, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            extra: Map::new(),
        }
    }
}

/// Reasons a list of records cannot form a [`MemorySet`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemorySetError {
    /// Two records share an ID
    #[error("duplicate memory id {0}")]
    DuplicateId(u64),
    /// A record uses ID 0 or one above [`MAX_MEMORY_ID`]
    #[error("memory ids must be between 1 and {max}, found {0}", max = MAX_MEMORY_ID)]
    InvalidId(u64),
}

/// Ordered collection of memory records with unique IDs
///
/// Order is the persistence order only. The set is serialized as a plain JSON
/// array of records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MemorySet {
    records: Vec<MemoryRecord>,
}

impl MemorySet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from records, rejecting duplicate or out-of-range IDs
    pub fn from_records(records: Vec<MemoryRecord>) -> Result<Self, MemorySetError> {
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if record.id == 0 || record.id > MAX_MEMORY_ID {
                return Err(MemorySetError::InvalidId(record.id));
            }
            if !seen.insert(record.id) {
                return Err(MemorySetError::DuplicateId(record.id));
            }
        }
        Ok(Self { records })
    }

    /// Records in persistence order
    pub fn records(&self) -> &[MemoryRecord] {
        &self.records
    }

    /// Consume the set and return its records
    pub fn into_records(self) -> Vec<MemoryRecord> {
        self.records
    }

    /// Iterate over the records
    pub fn iter(&self) -> std::slice::Iter<'_, MemoryRecord> {
        self.records.iter()
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by ID
    pub fn get(&self, id: u64) -> Option<&MemoryRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Whether a record with this ID exists
    pub fn contains(&self, id: u64) -> bool {
        self.get(id).is_some()
    }

    /// Highest ID in use, 0 for an empty set
    pub fn max_id(&self) -> u64 {
        self.records.iter().map(|r| r.id).max().unwrap_or(0)
    }

    /// All IDs in persistence order
    pub fn ids(&self) -> Vec<u64> {
        self.records.iter().map(|r| r.id).collect()
    }

    /// Records whose ID is in `ids`, kept in persistence order
    pub fn subset(&self, ids: &BTreeSet<u64>) -> MemorySet {
        Self {
            records: self
                .records
                .iter()
                .filter(|r| ids.contains(&r.id))
                .cloned()
                .collect(),
        }
    }

    // Callers uphold ID uniqueness; only the applier mutates in place.
    pub(crate) fn records_mut(&mut self) -> &mut Vec<MemoryRecord> {
        &mut self.records
    }
}

impl<'de> Deserialize<'de> for MemorySet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let records = Vec::<MemoryRecord>::deserialize(deserializer)?;
        MemorySet::from_records(records).map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a MemorySet {
    type Item = &'a MemoryRecord;
    type IntoIter = std::slice::Iter<'a, MemoryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Speaker of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person typing
    User,
    /// The model's reply
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message of the running conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Who said it
    pub role: Role,
    /// What was said
    pub content: String,
}

impl ChatTurn {
    /// A user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// An assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Sliding window over the most recent conversation messages
#[derive(Debug, Clone)]
pub struct ConversationContext {
    messages: VecDeque<ChatTurn>,
    capacity: usize,
}

impl ConversationContext {
    /// Create a window holding at most `capacity` messages
    pub fn new(capacity: usize) -> Self {
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Maximum number of messages kept
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of messages currently held
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the window is empty
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message, evicting the oldest ones beyond capacity
    pub fn push(&mut self, turn: ChatTurn) {
        self.messages.push_back(turn);
        while self.messages.len() > self.capacity {
            self.messages.pop_front();
        }
    }

    /// Append a user message and the assistant reply to it
    pub fn push_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.push(ChatTurn::user(user));
        self.push(ChatTurn::assistant(assistant));
    }

    /// Snapshot of the window, oldest first
    pub fn recent(&self) -> Vec<ChatTurn> {
        self.messages.iter().cloned().collect()
    }

    /// Drop every message
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new(DEFAULT_CONTEXT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_set() -> MemorySet {
        MemorySet::from_records(vec![
            MemoryRecord::new(1, "Likes tea"),
            MemoryRecord::new(4, "Lives in Hangzhou"),
            MemoryRecord::new(2, "Has a cat"),
        ])
        .unwrap()
    }

    #[test]
    fn test_from_records_rejects_duplicates() {
        let err = MemorySet::from_records(vec![
            MemoryRecord::new(1, "a"),
            MemoryRecord::new(1, "b"),
        ])
        .unwrap_err();
        assert_eq!(err, MemorySetError::DuplicateId(1));
    }

    #[test]
    fn test_from_records_rejects_zero_id() {
        let err = MemorySet::from_records(vec![MemoryRecord::new(0, "a")]).unwrap_err();
        assert_eq!(err, MemorySetError::InvalidId(0));
    }

    #[test]
    fn test_from_records_rejects_ids_beyond_signed_range() {
        let err = MemorySet::from_records(vec![MemoryRecord::new(u64::MAX, "a")]).unwrap_err();
        assert_eq!(err, MemorySetError::InvalidId(u64::MAX));
        assert!(MemorySet::from_records(vec![MemoryRecord::new(MAX_MEMORY_ID, "a")]).is_ok());

        let json = r#"[{"id":18446744073709551615,"content":"x"}]"#;
        assert!(serde_json::from_str::<MemorySet>(json).is_err());
    }

    #[test]
    fn test_unknown_record_fields_survive_round_trip() {
        let json = r#"[{"id":1,"content":"x","created":"2025-01-01"}]"#;
        let memories: MemorySet = serde_json::from_str(json).unwrap();
        assert_eq!(memories.records()[0].extra["created"], "2025-01-01");
        assert_eq!(serde_json::to_string(&memories).unwrap(), json);
    }

    #[test]
    fn test_into_records_keeps_order() {
        let records = sample_set().into_records();
        let ids: Vec<u64> = records.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 4, 2]);
    }

    #[test]
    fn test_max_id() {
        assert_eq!(MemorySet::new().max_id(), 0);
        assert_eq!(sample_set().max_id(), 4);
    }

    #[test]
    fn test_subset_keeps_persistence_order() {
        let ids: BTreeSet<u64> = [2, 4, 99].into_iter().collect();
        let subset = sample_set().subset(&ids);
        assert_eq!(subset.ids(), vec![4, 2]);
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let json = serde_json::to_string(&sample_set()).unwrap();
        assert!(json.starts_with("[{\"id\":1,\"content\":\"Likes tea\"}"));
    }

    #[test]
    fn test_deserialize_rejects_duplicates() {
        let json = r#"[{"id":3,"content":"a"},{"id":3,"content":"b"}]"#;
        let err = serde_json::from_str::<MemorySet>(json).unwrap_err();
        assert!(err.to_string().contains("duplicate memory id 3"));
    }

    #[test]
    fn test_deserialize_rejects_null_content() {
        let json = r#"[{"id":1,"content":null}]"#;
        assert!(serde_json::from_str::<MemorySet>(json).is_err());
    }

    #[test]
    fn test_context_window_evicts_oldest() {
        let mut context = ConversationContext::new(4);
        for i in 0..3 {
            context.push_exchange(format!("question {i}"), format!("answer {i}"));
        }
        let recent = context.recent();
        assert_eq!(recent.len(), 4);
        assert_eq!(recent[0], ChatTurn::user("question 1"));
        assert_eq!(recent[3], ChatTurn::assistant("answer 2"));
        assert_eq!(context.capacity(), 4);

        context.clear();
        assert!(context.is_empty());
        assert_eq!(context.capacity(), 4);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatTurn::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }
}
