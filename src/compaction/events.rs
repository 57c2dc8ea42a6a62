//! Structured observation events emitted by the evaluator.
//!
//! The evaluator is handed an [`EventSink`] at construction instead of logging
//! through a global. [`TracingSink`] forwards to `tracing`; [`MemorySink`] keeps
//! events in memory so callers can assert on them.

use serde_json::{Map, Value};
use std::sync::Mutex;
use tracing::Level;

/// One structured event: level, message, and a flat metadata map.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub level: Level,
    pub message: String,
    pub fields: Map<String, Value>,
}

impl Event {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            fields: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }
}

/// Receives evaluator events. Used for observability only, never for control flow.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: Event);
}

/// Forwards events to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: Event) {
        let fields = Value::Object(event.fields);
        let message = event.message;
        match event.level {
            Level::ERROR => tracing::error!(fields = %fields, "{message}"),
            Level::WARN => tracing::warn!(fields = %fields, "{message}"),
            Level::INFO => tracing::info!(fields = %fields, "{message}"),
            Level::DEBUG => tracing::debug!(fields = %fields, "{message}"),
            _ => tracing::trace!(fields = %fields, "{message}"),
        }
    }
}

/// Collects events in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.message).collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: Event) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.emit(Event::new(Level::INFO, "first").with("count", 3));
        sink.emit(Event::new(Level::WARN, "second").with("item_id", "b"));

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message, "first");
        assert_eq!(events[0].fields["count"], 3);
        assert_eq!(events[1].level, Level::WARN);
        assert_eq!(events[1].fields["item_id"], "b");
    }

    #[test]
    fn tracing_sink_accepts_every_level() {
        let sink = TracingSink;
        for level in [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE] {
            sink.emit(Event::new(level, "probe").with("level", level.as_str()));
        }
    }
}
