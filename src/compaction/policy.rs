//! Retention policies: the keep/drop rule applied to each compactable item.
//!
//! A policy is a [`RetentionPolicy`] trait object, so the evaluator's loop never
//! changes when the rule does. Policies are pure: the same item and standing
//! always produce the same decision.

use thiserror::Error;

use super::types::{CompactableItem, Priority};

/// Fault raised by a policy while deciding an item.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("policy {policy} cannot decide item {item_id}: {reason}")]
    Undecidable {
        policy: String,
        item_id: String,
        reason: String,
    },
    #[error("policy panicked on item {item_id}: {message}")]
    Panicked { item_id: String, message: String },
}

/// Where an item stands in its batch, computed once per item by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchStanding {
    /// Zero-based position in the input sequence.
    pub position: usize,
    /// Number of items in the batch, including unrecognized ones.
    pub batch_len: usize,
    /// Recognized items that rank strictly ahead of this one: higher priority,
    /// or equal priority and earlier in input order.
    pub ahead: usize,
}

/// Decides whether one item survives compaction.
pub trait RetentionPolicy: Send + Sync {
    /// Short identifier used in logs and configuration.
    fn name(&self) -> &str;

    /// `Ok(true)` to preserve, `Ok(false)` to discard.
    ///
    /// Only called for items whose priority is recognized.
    fn decide(&self, item: &CompactableItem, standing: &BatchStanding)
        -> Result<bool, PolicyError>;
}

/// Baseline: keep high-priority items, discard medium and low.
#[derive(Debug, Default, Clone, Copy)]
pub struct HighPriorityOnly;

impl RetentionPolicy for HighPriorityOnly {
    fn name(&self) -> &str {
        "high_only"
    }

    fn decide(&self, item: &CompactableItem, _standing: &BatchStanding) -> Result<bool, PolicyError> {
        Ok(item.priority == Priority::High)
    }
}

/// Keep high and medium items, discard low.
#[derive(Debug, Default, Clone, Copy)]
pub struct HighAndMedium;

impl RetentionPolicy for HighAndMedium {
    fn name(&self) -> &str {
        "high_and_medium"
    }

    fn decide(&self, item: &CompactableItem, _standing: &BatchStanding) -> Result<bool, PolicyError> {
        Ok(matches!(item.priority, Priority::High | Priority::Medium))
    }
}

/// Keep at most `capacity` items, best priority first, ties by input order.
#[derive(Debug, Clone, Copy)]
pub struct TopK {
    pub capacity: usize,
}

impl TopK {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }
}

impl RetentionPolicy for TopK {
    fn name(&self) -> &str {
        "top_k"
    }

    fn decide(&self, _item: &CompactableItem, standing: &BatchStanding) -> Result<bool, PolicyError> {
        Ok(standing.ahead < self.capacity)
    }
}

/// Configured policy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    HighOnly,
    HighAndMedium,
    TopK,
}

impl PolicyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HighOnly => "high_only",
            Self::HighAndMedium => "high_and_medium",
            Self::TopK => "top_k",
        }
    }
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high_only" => Ok(Self::HighOnly),
            "high_and_medium" => Ok(Self::HighAndMedium),
            "top_k" => Ok(Self::TopK),
            _ => Err(format!(
                "unknown retention policy: {s}. Supported: high_only, high_and_medium, top_k"
            )),
        }
    }
}

/// Build the retention policy named in config.
pub fn create_policy(
    config: &crate::config::CompactionConfig,
) -> anyhow::Result<Box<dyn RetentionPolicy>> {
    let kind: PolicyKind = config.policy.parse().map_err(anyhow::Error::msg)?;
    let policy: Box<dyn RetentionPolicy> = match kind {
        PolicyKind::HighOnly => Box::new(HighPriorityOnly),
        PolicyKind::HighAndMedium => Box::new(HighAndMedium),
        PolicyKind::TopK => {
            anyhow::ensure!(config.capacity > 0, "top_k policy needs capacity > 0");
            Box::new(TopK::new(config.capacity))
        }
    };
    Ok(policy)
}
