//! Parameter groups
//!
//! A parameter group is whatever keeps the "current" strategy and values of one kind, e.g.
//! the fields of a process editor. The registry only talks to it through
//! [`ParameterControls`].

use std::cell::RefCell;

use serde_json::Value;

use crate::data::ParameterMap;

/// Consumer-side state of a parameter group
pub trait ParameterControls {
    /// Name of the currently selected strategy
    fn current_strategy(&self) -> Option<String>;

    /// Current value of a parameter, `None` if the consumer has none
    fn value(&self, key: &str) -> Option<Value>;

    /// Replace the current value of a parameter
    fn set_value(&self, key: &str, value: Value);
}

/// In-memory parameter group for headless use
#[derive(Debug, Default)]
pub struct ParameterState {
    strategy: RefCell<Option<String>>,
    values: RefCell<ParameterMap>,
}

impl ParameterState {
    /// Create an empty state with no strategy selected
    pub fn new() -> Self {
        Self::default()
    }

    /// Select the current strategy
    pub fn select_strategy(&self, name: impl Into<String>) {
        *self.strategy.borrow_mut() = Some(name.into());
    }

    /// Clear the selection
    pub fn clear_strategy(&self) {
        *self.strategy.borrow_mut() = None;
    }

    /// Snapshot of all current values
    pub fn values(&self) -> ParameterMap {
        self.values.borrow().clone()
    }
}

impl ParameterControls for ParameterState {
    fn current_strategy(&self) -> Option<String> {
        self.strategy.borrow().clone()
    }

    fn value(&self, key: &str) -> Option<Value> {
        self.values.borrow().get(key).cloned()
    }

    fn set_value(&self, key: &str, value: Value) {
        self.values.borrow_mut().insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parameter_state() {
        let state = ParameterState::new();
        assert_eq!(state.current_strategy(), None);
        state.select_strategy("slice");
        assert_eq!(state.current_strategy().as_deref(), Some("slice"));
        state.set_value("overlap", json!(0.2));
        assert_eq!(state.values().len(), 1);
        state.clear_strategy();
        assert_eq!(state.current_strategy(), None);
    }
}
