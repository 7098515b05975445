//! Domain events emitted toward the hosting application.
//!
//! The core emits two events: one whenever a raw delimited span is
//! materialized into a chip, and one when the user activates a rendered
//! chip. Hosts subscribe by name with callbacks; emission is synchronous
//! and fire-and-forget.

use crate::dom::NodeId;
use std::collections::HashMap;

/// Fired whenever a raw span is materialized into a chip (scan-based or
/// explicit insertion).
pub const VARIABLE_TO_HTML: &str = "variableToHTML";

/// Fired when the user activates (clicks) a rendered chip.
pub const VARIABLE_CLICK: &str = "variableClick";

/// Arguments passed to event callbacks.
#[derive(Debug, Clone)]
pub enum EventArgs {
    /// A raw span became a chip. `value` is the matched raw span (or the
    /// explicitly inserted value); `clean_value` is the stripped identifier.
    VariableToHtml { value: String, clean_value: String },

    /// A chip was clicked. `value` is the cleaned identifier recovered from
    /// the chip's metadata; `target` is the chip node.
    VariableClick { value: String, target: NodeId },
}

/// Type for event callbacks.
pub type EventCallback = Box<dyn Fn(&EventArgs)>;

/// Registry of named event subscriptions.
#[derive(Default)]
pub struct EventBus {
    listeners: HashMap<String, Vec<EventCallback>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            listeners: HashMap::new(),
        }
    }

    /// Subscribe a callback to an event name.
    pub fn on(&mut self, name: &str, callback: EventCallback) {
        self.listeners
            .entry(name.to_string())
            .or_default()
            .push(callback);
    }

    /// Remove all callbacks for an event name.
    pub fn off(&mut self, name: &str) {
        self.listeners.remove(name);
    }

    /// Invoke every callback registered for `name`.
    pub fn emit(&self, name: &str, args: &EventArgs) {
        if let Some(callbacks) = self.listeners.get(name) {
            tracing::trace!("emitting '{}' to {} listener(s)", name, callbacks.len());
            for callback in callbacks {
                callback(args);
            }
        }
    }

    /// Number of callbacks registered for `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.get(name).map(Vec::len).unwrap_or(0)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("events", &self.listeners.keys().collect::<Vec<_>>())
            .finish()
    }
}
