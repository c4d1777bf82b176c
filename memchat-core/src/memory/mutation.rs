//! Memory mutations and the parser that extracts them from model output
//!
//! The model is asked for a JSON array of `{"id": .., "content": ..}` objects.
//! The protocol encodes three operations in that shape:
//!
//! - `id == -1` adds a memory with `content`
//! - `content` null, or the word `delete`, removes memory `id`
//! - anything else replaces the content of memory `id`
//!
//! [`parse_mutations`] turns that encoding into [`MutationOp`] values so no
//! code past this module compares content against sentinel strings.

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::message_parser::{integer_id, parse_json_payload};

/// ID the model uses to request a new memory
pub const ADD_SENTINEL_ID: i64 = -1;

/// Content the model may send instead of null to request a deletion
pub const DELETE_SENTINEL: &str = "delete";

/// A single change to the memory set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum MutationOp {
    /// Store a new memory; the applier assigns its ID
    Add {
        /// Text to remember
        content: String,
    },
    /// Replace the content of an existing memory
    Modify {
        /// Target memory
        id: u64,
        /// New text
        content: String,
    },
    /// Remove a memory
    Delete {
        /// Target memory
        id: u64,
    },
}

impl MutationOp {
    /// Convenience constructor for [`MutationOp::Add`]
    pub fn add(content: impl Into<String>) -> Self {
        Self::Add {
            content: content.into(),
        }
    }

    /// Convenience constructor for [`MutationOp::Modify`]
    pub fn modify(id: u64, content: impl Into<String>) -> Self {
        Self::Modify {
            id,
            content: content.into(),
        }
    }

    /// Convenience constructor for [`MutationOp::Delete`]
    pub fn delete(id: u64) -> Self {
        Self::Delete { id }
    }

    /// ID this operation targets; `None` for additions
    pub fn target_id(&self) -> Option<u64> {
        match self {
            MutationOp::Add { .. } => None,
            MutationOp::Modify { id, .. } | MutationOp::Delete { id } => Some(*id),
        }
    }
}

/// Why an element of the mutation array was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
enum RejectReason {
    NotAnArray,
    NotAnObject(usize),
    BadId(usize),
    BadContent(usize),
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::NotAnArray => write!(f, "expected a JSON array"),
            RejectReason::NotAnObject(i) => write!(f, "element {i} is not an object"),
            RejectReason::BadId(i) => write!(f, "element {i} has a missing or non-integer id"),
            RejectReason::BadContent(i) => {
                write!(f, "element {i} has content that is missing or not a string/null")
            },
        }
    }
}

/// One decoded element, before sentinel interpretation
struct RawMutation {
    id: i64,
    content: Option<String>,
}

fn decode_element(index: usize, element: &Value) -> Result<RawMutation, RejectReason> {
    let object = element
        .as_object()
        .ok_or(RejectReason::NotAnObject(index))?;
    let id = object
        .get("id")
        .and_then(integer_id)
        .ok_or(RejectReason::BadId(index))?;
    let content = match object.get("content") {
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Null) => None,
        _ => return Err(RejectReason::BadContent(index)),
    };
    Ok(RawMutation { id, content })
}

fn decode_all(value: &Value) -> Result<Vec<RawMutation>, RejectReason> {
    value
        .as_array()
        .ok_or(RejectReason::NotAnArray)?
        .iter()
        .enumerate()
        .map(|(index, element)| decode_element(index, element))
        .collect()
}

fn is_delete_sentinel(content: &str) -> bool {
    content.trim().eq_ignore_ascii_case(DELETE_SENTINEL)
}

fn interpret(raw: RawMutation) -> Option<MutationOp> {
    if raw.id == ADD_SENTINEL_ID {
        return match raw.content {
            Some(content) if !content.trim().is_empty() => Some(MutationOp::Add { content }),
            _ => {
                warn!("Dropping add mutation without content");
                None
            },
        };
    }

    let Ok(id) = u64::try_from(raw.id) else {
        debug!("Dropping mutation for impossible memory id {}", raw.id);
        return None;
    };
    if id == 0 {
        debug!("Dropping mutation for impossible memory id 0");
        return None;
    }

    match raw.content {
        None => Some(MutationOp::Delete { id }),
        Some(content) if is_delete_sentinel(&content) => Some(MutationOp::Delete { id }),
        Some(content) => Some(MutationOp::Modify { id, content }),
    }
}

/// Parse model output into an ordered list of mutations
///
/// Malformed output of any kind yields an empty list: the turn then proceeds
/// as if no change was requested. The whole batch is rejected when a single
/// element is malformed, since a partially understood batch could delete the
/// wrong records.
pub fn parse_mutations(model_output: &str) -> Vec<MutationOp> {
    let Some(value) = parse_json_payload(model_output, "mutation parser") else {
        return Vec::new();
    };

    match decode_all(&value) {
        Ok(raw) => {
            let ops: Vec<MutationOp> = raw.into_iter().filter_map(interpret).collect();
            debug!("Parsed {} memory mutation(s)", ops.len());
            ops
        },
        Err(reason) => {
            warn!("Ignoring malformed mutation output: {}", reason);
            Vec::new()
        },
    }
}
