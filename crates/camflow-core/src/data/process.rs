//! Machining processes
//!
//! A process names the strategy that turns a bound box into a motion grid and carries the
//! strategy's parameters. Which parameters are meaningful is decided by the strategy's
//! schema in the strategy registry, not here.

use serde_json::Value;
use std::collections::BTreeMap;

use super::{AppValues, CollectionItem, EntityKind, FieldReader};
use crate::error::EntityError;

/// Parameter name → value
pub type ParameterMap = BTreeMap<String, Value>;

/// A machining process
#[derive(Debug, Clone, PartialEq)]
pub struct Process {
    name: String,
    /// Name of the `process` strategy
    pub strategy: String,
    /// Strategy parameters
    pub parameters: ParameterMap,
    app: AppValues,
}

impl Process {
    /// Create a process for a strategy with no parameters
    pub fn new(name: impl Into<String>, strategy: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            strategy: strategy.into(),
            parameters: ParameterMap::new(),
            app: AppValues::new(),
        }
    }

    /// Set one parameter, builder style
    pub fn with_parameter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(key.into(), value);
        self
    }

    /// Build a process from a specification entry
    ///
    /// `strategy` is required; every other field becomes a parameter. A nested
    /// `parameters` mapping is accepted as well.
    pub(crate) fn from_fields(fields: &FieldReader<'_>) -> Result<Self, EntityError> {
        let strategy = fields.required_str("strategy")?;
        if strategy.trim().is_empty() {
            return Err(fields.invalid("strategy", "must not be empty"));
        }
        let mut parameters = fields.remaining(&["strategy", "name", "parameters"]);
        if let Some(nested) = fields.get("parameters") {
            let Some(nested) = nested.as_object() else {
                return Err(fields.invalid("parameters", "expected a mapping"));
            };
            parameters.extend(nested.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        Ok(Self {
            name: fields.entity().to_string(),
            strategy: strategy.to_string(),
            parameters,
            app: AppValues::new(),
        })
    }
}

impl CollectionItem for Process {
    const KIND: EntityKind = EntityKind::Process;

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn app_values(&self) -> &AppValues {
        &self.app
    }
}
