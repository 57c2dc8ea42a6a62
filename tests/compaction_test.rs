mod helpers;

use helpers::{context, item};
use srp_mcp::compaction::policy::{HighAndMedium, HighPriorityOnly, TopK};
use srp_mcp::compaction::{
    BatchStanding, CompactableItem, CompactionEvaluator, EvaluationContext, EvaluationResult,
    EvaluationStatus, MemorySink, PolicyError, Priority, RetentionPolicy,
};
use std::sync::Arc;

fn evaluator(policy: impl RetentionPolicy + 'static) -> (CompactionEvaluator, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    (CompactionEvaluator::new(Arc::new(policy), sink.clone()), sink)
}

fn mixed_batch() -> Vec<CompactableItem> {
    vec![
        item("a", Priority::High),
        item("b", Priority::Low),
        item("c", Priority::Medium),
        item("d", Priority::High),
        item("e", Priority::Low),
        item("f", Priority::Medium),
    ]
}

/// Fails on one item id, decides everything else by the baseline rule.
struct FailsOn(&'static str);

impl RetentionPolicy for FailsOn {
    fn name(&self) -> &str {
        "fails_on"
    }

    fn decide(&self, item: &CompactableItem, _: &BatchStanding) -> Result<bool, PolicyError> {
        if item.id == self.0 {
            return Err(PolicyError::Undecidable {
                policy: self.name().into(),
                item_id: item.id.clone(),
                reason: "oracle unavailable".into(),
            });
        }
        Ok(item.priority == Priority::High)
    }
}

struct PanicsOn(&'static str);

impl RetentionPolicy for PanicsOn {
    fn name(&self) -> &str {
        "panics_on"
    }

    fn decide(&self, item: &CompactableItem, _: &BatchStanding) -> Result<bool, PolicyError> {
        if item.id == self.0 {
            panic!("boom");
        }
        Ok(true)
    }
}

#[test]
fn every_item_lands_in_exactly_one_partition() {
    let (ev, _) = evaluator(HighAndMedium);
    let result = ev.evaluate(&context(mixed_batch()));

    assert!(result.is_success());
    assert_eq!(result.preserved.len() + result.removed.len(), 6);
    let mut all: Vec<String> = result.preserved_ids().into_iter().map(String::from).collect();
    all.extend(result.removed_ids().into_iter().map(String::from));
    all.sort();
    assert_eq!(all, vec!["a", "b", "c", "d", "e", "f"]);
}

#[test]
fn baseline_keeps_only_high_priority_in_input_order() {
    let (ev, _) = evaluator(HighPriorityOnly);
    let result = ev.evaluate(&context(mixed_batch()));

    assert_eq!(result.preserved_ids(), vec!["a", "d"]);
    assert_eq!(result.removed_ids(), vec!["b", "c", "e", "f"]);
    assert!(result.preserved.iter().all(|d| d.preserve));
    assert!(result.removed.iter().all(|d| !d.preserve));
    assert_eq!(result.message, "evaluated 6 items: 2 preserved, 4 removed");
}

#[test]
fn baseline_scenario_from_hook_payload() {
    let (ev, _) = evaluator(HighPriorityOnly);
    let result = ev.evaluate(&context(vec![
        item("a", Priority::High),
        item("b", Priority::Medium),
        item("c", Priority::Low),
        item("d", Priority::High),
    ]));

    assert_eq!(result.status, EvaluationStatus::Success);
    assert_eq!(result.session_id, "s1");
    assert_eq!(result.agent_id, "a1");
    assert_eq!(result.preserved_ids(), vec!["a", "d"]);
    assert_eq!(result.removed_ids(), vec!["b", "c"]);
}

#[test]
fn higher_priority_is_never_removed_while_lower_is_kept() {
    let policies: Vec<Box<dyn RetentionPolicy>> = vec![
        Box::new(HighPriorityOnly),
        Box::new(HighAndMedium),
        Box::new(TopK { capacity: 1 }),
        Box::new(TopK { capacity: 3 }),
        Box::new(TopK { capacity: 5 }),
    ];
    for policy in policies {
        let name = policy.name().to_string();
        let ev = CompactionEvaluator::new(Arc::from(policy), Arc::new(MemorySink::new()));
        let result = ev.evaluate(&context(mixed_batch()));

        let lowest_kept = result
            .preserved
            .iter()
            .filter_map(|d| d.item.priority.rank())
            .max();
        let highest_removed = result
            .removed
            .iter()
            .filter_map(|d| d.item.priority.rank())
            .min();
        if let (Some(kept), Some(removed)) = (lowest_kept, highest_removed) {
            assert!(kept <= removed, "{name} kept a lower priority than it removed");
        }
    }
}

#[test]
fn evaluation_is_repeatable_and_does_not_touch_input() {
    let (ev, _) = evaluator(TopK { capacity: 2 });
    let ctx = context(mixed_batch());
    let before = ctx.items.clone();

    let first = ev.evaluate(&ctx);
    let second = ev.evaluate(&ctx);

    assert_eq!(first, second);
    assert_eq!(ctx.items, before);
}

#[test]
fn empty_snapshot_succeeds_with_empty_partitions() {
    let (ev, _) = evaluator(HighPriorityOnly);
    let result = ev.evaluate(&context(Vec::new()));

    assert_eq!(result.status, EvaluationStatus::Success);
    assert!(result.preserved.is_empty());
    assert!(result.removed.is_empty());
    assert_eq!(result.message, "evaluated 0 items: 0 preserved, 0 removed");
}

#[test]
fn policy_fault_aborts_whole_batch() {
    let (ev, sink) = evaluator(FailsOn("c"));
    let result = ev.evaluate(&context(vec![
        item("a", Priority::High),
        item("b", Priority::Low),
        item("c", Priority::Medium),
        item("d", Priority::High),
        item("e", Priority::Low),
    ]));

    assert_eq!(result.status, EvaluationStatus::Error);
    assert!(result.preserved.is_empty());
    assert!(result.removed.is_empty());
    assert!(result.message.contains("oracle unavailable"), "{}", result.message);
    assert!(sink
        .messages()
        .contains(&"pre-compaction evaluation failed".to_string()));
}

#[test]
fn policy_panic_is_contained() {
    let (ev, _) = evaluator(PanicsOn("b"));
    let result = ev.evaluate(&context(vec![item("a", Priority::High), item("b", Priority::High)]));

    assert_eq!(result.status, EvaluationStatus::Error);
    assert!(result.preserved.is_empty());
    assert!(result.removed.is_empty());
    assert!(result.message.contains("boom"), "{}", result.message);
}

#[test]
fn unrecognized_priority_is_discarded_without_failing() {
    let (ev, sink) = evaluator(HighAndMedium);
    let result = ev.evaluate(&context(vec![
        item("a", Priority::High),
        item("x", Priority::Unrecognized),
        item("b", Priority::Medium),
    ]));

    assert!(result.is_success());
    assert_eq!(result.preserved_ids(), vec!["a", "b"]);
    assert_eq!(result.removed_ids(), vec!["x"]);
    assert_eq!(
        result.message,
        "evaluated 3 items: 2 preserved, 1 removed; 1 discarded with unrecognized priority"
    );
    assert!(sink
        .messages()
        .contains(&"unrecognized priority, discarding item".to_string()));
}

#[test]
fn top_k_keeps_the_best_ranked_items() {
    let (ev, _) = evaluator(TopK { capacity: 3 });
    let result = ev.evaluate(&context(mixed_batch()));

    // a, d are high; c is the first medium
    assert_eq!(result.preserved_ids(), vec!["a", "c", "d"]);
    assert_eq!(result.removed_ids(), vec!["b", "e", "f"]);
}

#[test]
fn shared_evaluator_serves_concurrent_sessions() {
    let ev = CompactionEvaluator::new(Arc::new(HighPriorityOnly), Arc::new(MemorySink::new()));

    let results: Vec<EvaluationResult> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let ev = &ev;
                s.spawn(move || {
                    let ctx = EvaluationContext::new(
                        format!("session-{n}"),
                        "agent",
                        vec![item("keep", Priority::High), item("drop", Priority::Low)],
                    );
                    ev.evaluate(&ctx)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (n, result) in results.iter().enumerate() {
        assert_eq!(result.session_id, format!("session-{n}"));
        assert_eq!(result.preserved_ids(), vec!["keep"]);
        assert_eq!(result.removed_ids(), vec!["drop"]);
    }
}

#[test]
fn hook_payload_round_trips_through_json() {
    let payload = r#"{
        "sessionId": "sess-42",
        "agentId": "agent-7",
        "currentContext": "working on the parser",
        "compactableContent": [
            {"id": "n1", "type": "note", "content": "decision log", "priority": "high"},
            {"id": "t1", "type": "task", "content": "old task", "priority": "low"},
            {"id": "m1", "type": "memory", "content": "odd", "priority": "urgent"}
        ]
    }"#;
    let ctx: EvaluationContext = serde_json::from_str(payload).unwrap();
    assert_eq!(ctx.items[2].priority, Priority::Unrecognized);

    let (ev, _) = evaluator(HighPriorityOnly);
    let value = serde_json::to_value(ev.evaluate(&ctx)).unwrap();

    assert_eq!(value["status"], "success");
    assert_eq!(value["sessionId"], "sess-42");
    assert_eq!(value["agentId"], "agent-7");
    assert_eq!(value["preservedContent"][0]["id"], "n1");
    assert_eq!(value["preservedContent"][0]["type"], "note");
    assert_eq!(value["removedContent"].as_array().unwrap().len(), 2);
    assert_eq!(value["removedContent"][0]["preserve"], false);
}
