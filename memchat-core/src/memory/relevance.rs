//! Model-driven selection of the memories relevant to a turn

use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::errors::Result;
use crate::gateway::{CallPurpose, LanguageModelGateway, ModelSettings};
use crate::message_parser::{integer_id, parse_json_payload};
use crate::prompts::relevance_prompt;
use crate::types::{ChatTurn, MemorySet};

/// Parse a relevance reply: a JSON array of integer memory IDs
///
/// Anything else, including a single non-integer element, yields the empty
/// set. Whole-number floats like `2.0` are read as integers. Non-positive
/// integers cannot name a memory and are skipped.
pub fn parse_relevant_ids(model_output: &str) -> BTreeSet<u64> {
    let Some(value) = parse_json_payload(model_output, "relevance selector") else {
        return BTreeSet::new();
    };
    let Some(elements) = value.as_array() else {
        warn!("Relevance reply is not a JSON array, selecting no memories");
        return BTreeSet::new();
    };

    let mut ids = BTreeSet::new();
    for element in elements {
        match integer_id(element) {
            Some(id) if id > 0 => {
                ids.insert(id as u64);
            },
            Some(_) => {},
            None => {
                warn!("Relevance reply holds a non-integer id {}, selecting no memories", element);
                return BTreeSet::new();
            },
        }
    }
    ids
}

/// Asks the model which memories matter for the current input
pub struct RelevanceSelector<'a, G: ?Sized> {
    gateway: &'a G,
    settings: &'a ModelSettings,
}

impl<'a, G> RelevanceSelector<'a, G>
where
    G: LanguageModelGateway + ?Sized,
{
    /// Create a selector issuing calls through `gateway`
    pub fn new(gateway: &'a G, settings: &'a ModelSettings) -> Self {
        Self { gateway, settings }
    }

    /// IDs of the memories judged relevant
    ///
    /// The full memory set is sent to the model. A malformed reply selects no
    /// memories and is never retried; only transport failures are errors.
    /// IDs the model invents are dropped.
    pub async fn select(
        &self,
        memories: &MemorySet,
        user_input: &str,
        recent: &[ChatTurn],
    ) -> Result<BTreeSet<u64>> {
        let messages = relevance_prompt(memories, user_input, recent)?;
        let request = self.settings.request(CallPurpose::SelectRelevant, messages);
        let output = self.gateway.complete(&request).await?;

        let ids: BTreeSet<u64> = parse_relevant_ids(&output)
            .into_iter()
            .filter(|id| memories.contains(*id))
            .collect();
        debug!("Selected {} relevant memories: {:?}", ids.len(), ids);
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::ScriptedGateway;
    use crate::types::MemoryRecord;

    fn ids(values: &[u64]) -> BTreeSet<u64> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_parse_plain_array() {
        assert_eq!(parse_relevant_ids("[1,3,5]"), ids(&[1, 3, 5]));
    }

    #[test]
    fn test_parse_fenced_array() {
        assert_eq!(parse_relevant_ids("```json\n[2]\n```"), ids(&[2]));
    }

    #[test]
    fn test_parse_failures_select_nothing() {
        assert!(parse_relevant_ids("The relevant memory is 1").is_empty());
        assert!(parse_relevant_ids("{\"ids\": [1]}").is_empty());
        assert!(parse_relevant_ids("[1, \"2\"]").is_empty());
        assert!(parse_relevant_ids("[1.5]").is_empty());
        assert!(parse_relevant_ids("").is_empty());
    }

    #[test]
    fn test_parse_whole_number_floats() {
        assert_eq!(parse_relevant_ids("[2.0, 3]"), ids(&[2, 3]));
    }

    #[test]
    fn test_parse_skips_non_positive() {
        assert_eq!(parse_relevant_ids("[0, -1, 4]"), ids(&[4]));
    }

    #[tokio::test]
    async fn test_select_drops_unknown_ids() {
        let memories = MemorySet::from_records(vec![
            MemoryRecord::new(1, "Likes tea"),
            MemoryRecord::new(2, "Has a cat"),
        ])
        .unwrap();
        let gateway = ScriptedGateway::with_responses(["[2, 9]"]);
        let settings = ModelSettings::default();

        let selected = RelevanceSelector::new(&gateway, &settings)
            .select(&memories, "tell me about my pet", &[])
            .await
            .unwrap();

        assert_eq!(selected, ids(&[2]));
        let requests = gateway.requests();
        assert_eq!(requests[0].purpose, CallPurpose::SelectRelevant);
        assert!(requests[0].messages[0].content.contains("Has a cat"));
    }

    #[tokio::test]
    async fn test_select_propagates_transport_failure() {
        let gateway = ScriptedGateway::new();
        gateway.push_failure("connection reset");
        let settings = ModelSettings::default();

        let result = RelevanceSelector::new(&gateway, &settings)
            .select(&MemorySet::new(), "hello", &[])
            .await;
        assert!(result.unwrap_err().is_gateway_error());
    }
}
