//! Event payloads and the names of the events the kernel emits itself.

use serde::{Deserialize, Serialize};

/// Data handed to every handler of one emission
///
/// Handlers carry their own bound arguments as closure captures; the payload is what the
/// emitter appends.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EventPayload {
    /// No payload.
    #[default]
    Empty,
    /// A position inside a collection.
    Index(usize),
    /// A single name (strategy, section, plugin, ...).
    Name(String),
    /// A named entity of a collection.
    Entity {
        /// Collection key, e.g. `tools`.
        collection: String,
        /// Entity name.
        name: String,
    },
    /// Free-form structured data.
    Value(serde_json::Value),
}

impl EventPayload {
    /// Name carried by the payload, if any
    pub fn name(&self) -> Option<&str> {
        match self {
            EventPayload::Name(name) => Some(name),
            EventPayload::Entity { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Emitted after a collection gained, lost or reordered entities.
pub fn list_changed(kind: &str) -> String {
    format!("{kind}-list-changed")
}

/// Emitted after the interactive selection of a collection changed.
pub fn selection_changed(kind: &str) -> String {
    format!("{kind}-selection-changed")
}

/// Emitted after an attribute of a single entity changed.
pub fn entity_changed(kind: &str) -> String {
    format!("{kind}-changed")
}

/// Emitted after a strategy was registered or unregistered for a task kind.
pub fn strategy_list_changed(kind: &str) -> String {
    format!("{kind}-strategy-list-changed")
}

/// Emitted after the currently selected strategy of a parameter group changed.
pub fn strategy_changed(kind: &str) -> String {
    format!("{kind}-strategy-changed")
}

/// Emitted after a toolpath was generated and stored.
pub const TOOLPATH_GENERATED: &str = "toolpath-generated";

/// Emitted after a plugin finished its setup.
pub const PLUGIN_LOADED: &str = "plugin-loaded";

/// Emitted after a plugin finished its teardown.
pub const PLUGIN_UNLOADED: &str = "plugin-unloaded";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        assert_eq!(list_changed("model"), "model-list-changed");
        assert_eq!(selection_changed("tool"), "tool-selection-changed");
        assert_eq!(entity_changed("process"), "process-changed");
        assert_eq!(strategy_list_changed("task"), "task-strategy-list-changed");
        assert_eq!(strategy_changed("process"), "process-strategy-changed");
    }

    #[test]
    fn test_payload_name() {
        let payload = EventPayload::Entity {
            collection: "tools".to_string(),
            name: "T1".to_string(),
        };
        assert_eq!(payload.name(), Some("T1"));
        assert_eq!(EventPayload::Index(3).name(), None);
    }
}
