//! Pre-compaction content preservation.
//!
//! Before a context-window compaction, the orchestration client sends the items
//! competing for retention. A [`CompactionEvaluator`] runs a pluggable
//! [`RetentionPolicy`] over them and returns which survive.

pub mod evaluator;
pub mod events;
pub mod policy;
pub mod types;

pub use evaluator::CompactionEvaluator;
pub use events::{Event, EventSink, MemorySink, TracingSink};
pub use policy::{create_policy, BatchStanding, PolicyError, RetentionPolicy};
pub use types::{
    CompactableItem, DecidedItem, EvaluationContext, EvaluationResult, EvaluationStatus, ItemKind,
    Priority,
};
