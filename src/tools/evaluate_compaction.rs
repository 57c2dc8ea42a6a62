//! MCP `evaluate_compaction` tool parameter definition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::compaction::{CompactableItem, EvaluationContext, ItemKind, Priority};

/// Parameters for the `evaluate_compaction` MCP tool.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct EvaluateCompactionParams {
    #[schemars(description = "Session being compacted; echoed back in the result")]
    pub session_id: String,

    #[schemars(description = "Agent that owns the session; echoed back in the result")]
    pub agent_id: String,

    #[schemars(description = "Items competing for retention, in context order")]
    pub items: Vec<CompactableItemParam>,
}

/// One compactable item as sent by the client.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct CompactableItemParam {
    #[schemars(description = "Item identifier, unique within this call")]
    pub id: String,

    #[schemars(description = "Item kind: 'note', 'task', 'memory', 'context'; anything else is treated as 'other'")]
    #[serde(default)]
    pub r#type: Option<String>,

    #[schemars(description = "Item content (not inspected by the retention policy)")]
    pub content: String,

    #[schemars(description = "Retention priority: 'high', 'medium', 'low'. Missing or unknown values discard the item")]
    #[serde(default)]
    pub priority: Option<String>,
}

impl EvaluateCompactionParams {
    /// Build the evaluator snapshot. Unknown kinds become [`ItemKind::Other`];
    /// unknown priorities are kept as [`Priority::Unrecognized`] for the
    /// evaluator to discard.
    pub fn into_context(self) -> EvaluationContext {
        let items = self
            .items
            .into_iter()
            .map(|p| {
                let kind = p.r#type.as_deref().map_or(ItemKind::Other, ItemKind::from_wire);
                let priority = p
                    .priority
                    .as_deref()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(Priority::Unrecognized);
                CompactableItem::new(p.id, kind, p.content, priority)
            })
            .collect();
        EvaluationContext::new(self.session_id, self.agent_id, items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(id: &str, kind: &str, priority: &str) -> CompactableItemParam {
        CompactableItemParam {
            id: id.into(),
            r#type: Some(kind.into()),
            content: "c".into(),
            priority: Some(priority.into()),
        }
    }

    #[test]
    fn converts_items_in_order() {
        let params = EvaluateCompactionParams {
            session_id: "s".into(),
            agent_id: "a".into(),
            items: vec![param("1", "note", "high"), param("2", "context", "sometimes")],
        };
        let ctx = params.into_context();
        assert_eq!(ctx.items[0].priority, Priority::High);
        assert_eq!(ctx.items[1].kind, ItemKind::Context);
        assert_eq!(ctx.items[1].priority, Priority::Unrecognized);
    }

    #[test]
    fn missing_priority_is_unrecognized() {
        let mut item = param("1", "note", "high");
        item.priority = None;
        item.r#type = None;
        let params = EvaluateCompactionParams {
            session_id: "s".into(),
            agent_id: "a".into(),
            items: vec![item],
        };
        let ctx = params.into_context();
        assert_eq!(ctx.items[0].priority, Priority::Unrecognized);
        assert_eq!(ctx.items[0].kind, ItemKind::Other);
    }

    #[test]
    fn unknown_kind_keeps_item_in_batch() {
        let params = EvaluateCompactionParams {
            session_id: "s".into(),
            agent_id: "a".into(),
            items: vec![param("1", "note", "high"), param("2", "document", "low")],
        };
        let ctx = params.into_context();
        assert_eq!(ctx.items.len(), 2);
        assert_eq!(ctx.items[1].kind, ItemKind::Other);

        let result = crate::compaction::CompactionEvaluator::default().evaluate(&ctx);
        assert!(result.is_success());
        assert_eq!(result.preserved_ids(), vec!["1"]);
        assert_eq!(result.removed_ids(), vec!["2"]);
    }
}
