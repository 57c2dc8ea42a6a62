//! Applies a [`RetentionPolicy`] across one compaction snapshot.
//!
//! [`CompactionEvaluator::evaluate`] is a single-shot, stateless partition: each
//! input item gets exactly one decision, in input order, and the result holds
//! newly built items. A policy fault (error or panic) aborts the whole batch and
//! yields an `error` result with empty partitions.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::Level;

use super::events::{Event, EventSink, TracingSink};
use super::policy::{BatchStanding, HighPriorityOnly, PolicyError, RetentionPolicy};
use super::types::{
    CompactableItem, DecidedItem, EvaluationContext, EvaluationResult, EvaluationStatus,
};

/// Number of recognized priority ordinals.
const RANKS: usize = 3;

/// Partitions compactable items into preserved and removed sequences.
///
/// Holds no mutable state, so one instance can be shared across sessions.
#[derive(Clone)]
pub struct CompactionEvaluator {
    policy: Arc<dyn RetentionPolicy>,
    sink: Arc<dyn EventSink>,
}

impl Default for CompactionEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(HighPriorityOnly), Arc::new(TracingSink))
    }
}

impl CompactionEvaluator {
    pub fn new(policy: Arc<dyn RetentionPolicy>, sink: Arc<dyn EventSink>) -> Self {
        Self { policy, sink }
    }

    pub fn policy_name(&self) -> &str {
        self.policy.name()
    }

    /// Evaluate one snapshot. Never panics and never returns an error: faults
    /// are reported through `status = error`.
    pub fn evaluate(&self, context: &EvaluationContext) -> EvaluationResult {
        self.sink.emit(
            Event::new(Level::INFO, "pre-compaction evaluation started")
                .with("session_id", context.session_id.as_str())
                .with("agent_id", context.agent_id.as_str())
                .with("item_count", context.items.len())
                .with("policy", self.policy.name()),
        );

        match self.partition(&context.items) {
            Ok(partition) => {
                let message = summary_message(&partition);
                self.sink.emit(
                    Event::new(Level::INFO, "pre-compaction evaluation completed")
                        .with("session_id", context.session_id.as_str())
                        .with("preserved_count", partition.preserved.len())
                        .with("removed_count", partition.removed.len())
                        .with("unrecognized_count", partition.unrecognized),
                );
                EvaluationResult {
                    status: EvaluationStatus::Success,
                    session_id: context.session_id.clone(),
                    agent_id: context.agent_id.clone(),
                    preserved: partition.preserved,
                    removed: partition.removed,
                    message,
                }
            }
            Err(fault) => {
                self.sink.emit(
                    Event::new(Level::ERROR, "pre-compaction evaluation failed")
                        .with("session_id", context.session_id.as_str())
                        .with("error", fault.to_string()),
                );
                EvaluationResult {
                    status: EvaluationStatus::Error,
                    session_id: context.session_id.clone(),
                    agent_id: context.agent_id.clone(),
                    preserved: Vec::new(),
                    removed: Vec::new(),
                    message: format!("pre-compaction evaluation failed: {fault}"),
                }
            }
        }
    }

    fn partition(&self, items: &[CompactableItem]) -> Result<Partition, PolicyError> {
        let mut totals = [0usize; RANKS];
        for rank in items.iter().filter_map(|i| i.priority.rank()) {
            totals[rank as usize] += 1;
        }
        let mut seen = [0usize; RANKS];

        let mut partition = Partition::default();
        for (position, item) in items.iter().enumerate() {
            let Some(rank) = item.priority.rank() else {
                // Fail closed: unrecognized priority is discarded, the batch continues.
                self.sink.emit(
                    Event::new(Level::WARN, "unrecognized priority, discarding item")
                        .with("item_id", item.id.as_str()),
                );
                partition.unrecognized += 1;
                partition.removed.push(decided(item, false));
                continue;
            };
            let rank = rank as usize;

            let standing = BatchStanding {
                position,
                batch_len: items.len(),
                ahead: totals[..rank].iter().sum::<usize>() + seen[rank],
            };
            seen[rank] += 1;

            let preserve = self.decide_guarded(item, &standing)?;
            self.sink.emit(
                Event::new(Level::DEBUG, "item decided")
                    .with("item_id", item.id.as_str())
                    .with("priority", item.priority.as_str())
                    .with("preserve", preserve),
            );
            if preserve {
                partition.preserved.push(decided(item, true));
            } else {
                partition.removed.push(decided(item, false));
            }
        }

        Ok(partition)
    }

    fn decide_guarded(
        &self,
        item: &CompactableItem,
        standing: &BatchStanding,
    ) -> Result<bool, PolicyError> {
        match catch_unwind(AssertUnwindSafe(|| self.policy.decide(item, standing))) {
            Ok(decision) => decision,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic payload".to_string());
                Err(PolicyError::Panicked {
                    item_id: item.id.clone(),
                    message,
                })
            }
        }
    }
}

#[derive(Default)]
struct Partition {
    preserved: Vec<DecidedItem>,
    removed: Vec<DecidedItem>,
    unrecognized: usize,
}

fn decided(item: &CompactableItem, preserve: bool) -> DecidedItem {
    DecidedItem {
        item: item.clone(),
        preserve,
    }
}

fn summary_message(partition: &Partition) -> String {
    let preserved = partition.preserved.len();
    let removed = partition.removed.len();
    let mut message = format!(
        "evaluated {} items: {preserved} preserved, {removed} removed",
        preserved + removed
    );
    if partition.unrecognized > 0 {
        message.push_str(&format!(
            "; {} discarded with unrecognized priority",
            partition.unrecognized
        ));
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compaction::events::MemorySink;
    use crate::compaction::policy::{HighAndMedium, TopK};
    use crate::compaction::types::{ItemKind, Priority};

    fn item(id: &str, priority: Priority) -> CompactableItem {
        CompactableItem::new(id, ItemKind::Note, format!("content of {id}"), priority)
    }

    fn evaluator_with(policy: Arc<dyn RetentionPolicy>) -> (CompactionEvaluator, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        (CompactionEvaluator::new(policy, sink.clone()), sink)
    }

    #[test]
    fn baseline_scenario() {
        let (evaluator, _) = evaluator_with(Arc::new(HighPriorityOnly));
        let ctx = EvaluationContext::new(
            "s",
            "agent",
            vec![
                item("a", Priority::High),
                item("b", Priority::Medium),
                item("c", Priority::Low),
                item("d", Priority::High),
            ],
        );

        let result = evaluator.evaluate(&ctx);
        assert_eq!(result.status, EvaluationStatus::Success);
        assert_eq!(result.preserved_ids(), vec!["a", "d"]);
        assert_eq!(result.removed_ids(), vec!["b", "c"]);
        assert!(result.preserved.iter().all(|d| d.preserve));
        assert!(result.removed.iter().all(|d| !d.preserve));
        assert_eq!(result.message, "evaluated 4 items: 2 preserved, 2 removed");
    }

    #[test]
    fn empty_input_is_success() {
        let (evaluator, _) = evaluator_with(Arc::new(HighPriorityOnly));
        let result = evaluator.evaluate(&EvaluationContext::new("s", "a", vec![]));
        assert!(result.is_success());
        assert!(result.preserved.is_empty());
        assert!(result.removed.is_empty());
        assert_eq!(result.message, "evaluated 0 items: 0 preserved, 0 removed");
    }

    #[test]
    fn unrecognized_priority_fails_closed() {
        // HighAndMedium would keep everything recognized here; the bad item must still go.
        let (evaluator, sink) = evaluator_with(Arc::new(HighAndMedium));
        let ctx = EvaluationContext::new(
            "s",
            "a",
            vec![
                item("a", Priority::Medium),
                item("b", Priority::Unrecognized),
                item("c", Priority::High),
            ],
        );

        let result = evaluator.evaluate(&ctx);
        assert!(result.is_success());
        assert_eq!(result.preserved_ids(), vec!["a", "c"]);
        assert_eq!(result.removed_ids(), vec!["b"]);
        assert!(result.message.ends_with("; 1 discarded with unrecognized priority"));

        let warnings: Vec<_> = sink
            .events()
            .into_iter()
            .filter(|e| e.level == Level::WARN)
            .collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].fields["item_id"], "b");
    }

    #[test]
    fn top_k_breaks_ties_by_input_order() {
        let (evaluator, _) = evaluator_with(Arc::new(TopK::new(3)));
        let ctx = EvaluationContext::new(
            "s",
            "a",
            vec![
                item("m1", Priority::Medium),
                item("h1", Priority::High),
                item("l1", Priority::Low),
                item("m2", Priority::Medium),
                item("m3", Priority::Medium),
            ],
        );

        let result = evaluator.evaluate(&ctx);
        // h1 first, then the two earliest mediums; order follows the input.
        assert_eq!(result.preserved_ids(), vec!["m1", "h1", "m2"]);
        assert_eq!(result.removed_ids(), vec!["l1", "m3"]);
    }

    #[test]
    fn completion_event_carries_counts() {
        let (evaluator, sink) = evaluator_with(Arc::new(HighPriorityOnly));
        let ctx = EvaluationContext::new(
            "sess-9",
            "agent-2",
            vec![item("a", Priority::High), item("b", Priority::Low)],
        );
        evaluator.evaluate(&ctx);

        let events = sink.events();
        assert_eq!(events.first().unwrap().message, "pre-compaction evaluation started");
        assert_eq!(events.first().unwrap().fields["agent_id"], "agent-2");
        let done = events.last().unwrap();
        assert_eq!(done.message, "pre-compaction evaluation completed");
        assert_eq!(done.fields["preserved_count"], 1);
        assert_eq!(done.fields["removed_count"], 1);
        assert_eq!(done.fields["session_id"], "sess-9");
    }
}
