//! Applying mutations to a memory snapshot

use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use super::mutation::MutationOp;
use crate::types::{MAX_MEMORY_ID, MemoryRecord, MemorySet};

/// What an [`apply_mutations`] call changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplySummary {
    /// IDs assigned to new records, in assignment order
    pub added: Vec<u64>,
    /// IDs whose content was overwritten and that survived deletion
    pub modified: Vec<u64>,
    /// IDs actually removed
    pub deleted: Vec<u64>,
    /// Operations that matched no record, or adds left without a free ID
    pub ignored: Vec<MutationOp>,
}

impl ApplySummary {
    /// Whether the batch left the set untouched
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

/// Result of applying a batch: the new snapshot and what changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMutations {
    /// Memory set after the batch
    pub memories: MemorySet,
    /// Per-operation outcome
    pub summary: ApplySummary,
}

/// Apply `mutations` to a copy of `memories`
///
/// Adds and modifies run in array order. New IDs continue from the highest
/// existing ID, so they never collide with or reuse an existing one. Deletes
/// are collected and applied last in a single pass, so a record that is both
/// modified and deleted in one batch ends up deleted whatever the order.
/// Operations naming an unknown ID are no-ops, as are adds once the next ID
/// would pass [`MAX_MEMORY_ID`].
pub fn apply_mutations(memories: &MemorySet, mutations: &[MutationOp]) -> AppliedMutations {
    let mut next = memories.clone();
    let mut summary = ApplySummary::default();
    let mut max_id = next.max_id();
    let mut to_delete = BTreeSet::new();
    let mut modified = BTreeSet::new();

    for op in mutations {
        match op {
            MutationOp::Add { content } => {
                let Some(id) = max_id.checked_add(1).filter(|id| *id <= MAX_MEMORY_ID) else {
                    warn!("Memory ids exhausted at {}, dropping add", max_id);
                    summary.ignored.push(op.clone());
                    continue;
                };
                max_id = id;
                next.records_mut().push(MemoryRecord::new(id, content.clone()));
                summary.added.push(id);
            },
            MutationOp::Modify { id, content } => {
                match next.records_mut().iter_mut().find(|r| r.id == *id) {
                    Some(record) => {
                        record.content = content.clone();
                        modified.insert(*id);
                    },
                    None => {
                        debug!("Ignoring modify for unknown memory id {}", id);
                        summary.ignored.push(op.clone());
                    },
                }
            },
            MutationOp::Delete { id } => {
                to_delete.insert(*id);
            },
        }
    }

    if !to_delete.is_empty() {
        for id in &to_delete {
            if !next.contains(*id) {
                debug!("Ignoring delete for unknown memory id {}", id);
                summary.ignored.push(MutationOp::delete(*id));
            }
        }
        next.records_mut().retain(|record| {
            if to_delete.contains(&record.id) {
                summary.deleted.push(record.id);
                false
            } else {
                true
            }
        });
    }

    summary.modified = modified
        .into_iter()
        .filter(|id| !to_delete.contains(id))
        .collect();

    if !summary.is_noop() {
        info!(
            "Applied memory mutations: {} added, {} modified, {} deleted",
            summary.added.len(),
            summary.modified.len(),
            summary.deleted.len()
        );
    }

    AppliedMutations {
        memories: next,
        summary,
    }
}
