//! Pre-compaction data model.
//!
//! Defines [`CompactableItem`] (a unit of content competing for retention),
//! [`EvaluationContext`] (the frozen snapshot handed to the evaluator), and
//! [`EvaluationResult`] (the stable partition it produces). Wire names follow
//! the hook payload: `sessionId`, `compactableContent`, `preservedContent`, ...

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// What kind of content an item carries. Informational only; no policy reads it.
///
/// Unknown or missing kinds map to [`ItemKind::Other`] instead of failing the payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Note,
    Task,
    Memory,
    Context,
    #[default]
    #[serde(other)]
    Other,
}

impl ItemKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Task => "task",
            Self::Memory => "memory",
            Self::Context => "context",
            Self::Other => "other",
        }
    }

    /// Map a wire name to a kind. Never fails.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "note" => Self::Note,
            "task" => Self::Task,
            "memory" => Self::Memory,
            "context" => Self::Context,
            _ => Self::Other,
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Retention priority ordinal.
///
/// Any wire value outside `high`/`medium`/`low` lands in
/// [`Priority::Unrecognized`] so that one malformed item cannot reject the
/// whole payload. The evaluator discards such items without asking the policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
    #[default]
    #[serde(other)]
    Unrecognized,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Unrecognized => "unrecognized",
        }
    }

    /// Rank used for ordering: 0 is the most important. `None` for unrecognized values.
    pub fn rank(&self) -> Option<u8> {
        match self {
            Self::High => Some(0),
            Self::Medium => Some(1),
            Self::Low => Some(2),
            Self::Unrecognized => None,
        }
    }

    pub fn is_recognized(&self) -> bool {
        self.rank().is_some()
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(format!("unknown priority: {s}")),
        }
    }
}

/// A unit of content eligible for preservation or discard.
///
/// `type` and `priority` accept any JSON value: a defect in one item is
/// handled by the evaluator for that item alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactableItem {
    pub id: String,
    #[serde(
        rename = "type",
        alias = "kind",
        default,
        deserialize_with = "lenient_kind"
    )]
    pub kind: ItemKind,
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "lenient_priority")]
    pub priority: Priority,
}

fn lenient_kind<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ItemKind, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value.as_str().map_or(ItemKind::Other, ItemKind::from_wire))
}

fn lenient_priority<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Priority, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(value
        .as_str()
        .and_then(|s| s.parse().ok())
        .unwrap_or(Priority::Unrecognized))
}

impl CompactableItem {
    pub fn new(
        id: impl Into<String>,
        kind: ItemKind,
        content: impl Into<String>,
        priority: Priority,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            content: content.into(),
            priority,
        }
    }
}

/// An item together with the decision made for it.
///
/// Serializes flat, e.g. `{"id": "a", "type": "note", ..., "preserve": true}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecidedItem {
    #[serde(flatten)]
    pub item: CompactableItem,
    pub preserve: bool,
}

/// Snapshot handed to the evaluator for one compaction trigger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationContext {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub agent_id: String,
    /// The conversation text being compacted. Carried for callers; never read by policies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_context: Option<String>,
    #[serde(default, rename = "compactableContent", alias = "items")]
    pub items: Vec<CompactableItem>,
}

impl EvaluationContext {
    pub fn new(
        session_id: impl Into<String>,
        agent_id: impl Into<String>,
        items: Vec<CompactableItem>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            agent_id: agent_id.into(),
            current_context: None,
            items,
        }
    }
}

/// Outcome of an evaluation.
///
/// `Warning` is part of the wire vocabulary shared with other hook producers;
/// the built-in evaluator only emits `Success` and `Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationStatus {
    Success,
    Error,
    Warning,
}

/// The stable partition produced by [`super::CompactionEvaluator::evaluate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub status: EvaluationStatus,
    pub session_id: String,
    pub agent_id: String,
    #[serde(rename = "preservedContent")]
    pub preserved: Vec<DecidedItem>,
    #[serde(rename = "removedContent")]
    pub removed: Vec<DecidedItem>,
    pub message: String,
}

impl EvaluationResult {
    pub fn is_success(&self) -> bool {
        self.status == EvaluationStatus::Success
    }

    pub fn preserved_ids(&self) -> Vec<&str> {
        self.preserved.iter().map(|d| d.item.id.as_str()).collect()
    }

    pub fn removed_ids(&self) -> Vec<&str> {
        self.removed.iter().map(|d| d.item.id.as_str()).collect()
    }
}
