//! Strategy records keyed by (kind, name).

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::generator::{ProcessStrategy, StrategyGenerator, TaskRunner};
use super::parameters::ParameterControls;
use crate::data::ParameterMap;
use crate::error::RegistryError;

/// A registered strategy; immutable once registered
#[derive(Debug, Clone)]
pub struct StrategyRecord {
    /// Unique name within its kind
    pub name: String,
    /// Human readable label
    pub label: String,
    /// The generator
    pub generator: StrategyGenerator,
    /// Recognised parameters with their defaults
    pub parameters: ParameterMap,
    /// Sort weight, lower first
    pub weight: i32,
}

impl StrategyRecord {
    /// Record of a process strategy
    pub fn process(
        name: impl Into<String>,
        label: impl Into<String>,
        strategy: Rc<dyn ProcessStrategy>,
    ) -> Self {
        Self::with_generator(name, label, StrategyGenerator::Process(strategy))
    }

    /// Record of a task strategy
    pub fn task(name: impl Into<String>, label: impl Into<String>, runner: Rc<dyn TaskRunner>) -> Self {
        Self::with_generator(name, label, StrategyGenerator::Task(runner))
    }

    fn with_generator(
        name: impl Into<String>,
        label: impl Into<String>,
        generator: StrategyGenerator,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            generator,
            parameters: ParameterMap::new(),
            weight: 100,
        }
    }

    /// Add a recognised parameter with its default
    pub fn with_parameter(mut self, key: impl Into<String>, default: Value) -> Self {
        self.parameters.insert(key.into(), default);
        self
    }

    /// Set the sort weight
    pub fn with_weight(mut self, weight: i32) -> Self {
        self.weight = weight;
        self
    }
}

/// Registry of strategies and parameter groups
#[derive(Default)]
pub struct StrategyRegistry {
    records: RefCell<BTreeMap<String, Vec<Rc<StrategyRecord>>>>,
    controls: RefCell<BTreeMap<String, Rc<dyn ParameterControls>>>,
}

impl StrategyRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a strategy under `kind`
    ///
    /// A second record with the same (kind, name) is rejected; the first stays.
    pub fn register(&self, kind: &str, record: StrategyRecord) -> Result<(), RegistryError> {
        let mut records = self.records.borrow_mut();
        let list = records.entry(kind.to_string()).or_default();
        if list.iter().any(|r| r.name == record.name) {
            warn!(
                "Tried to register the same strategy twice: {}/{}",
                kind, record.name
            );
            return Err(RegistryError::DuplicateStrategy {
                kind: kind.to_string(),
                name: record.name,
            });
        }
        debug!("Registered strategy {}/{}", kind, record.name);
        list.push(Rc::new(record));
        Ok(())
    }

    /// Remove a strategy, returning its record
    pub fn unregister(&self, kind: &str, name: &str) -> Result<Rc<StrategyRecord>, RegistryError> {
        let mut records = self.records.borrow_mut();
        let removed = records.get_mut(kind).and_then(|list| {
            let pos = list.iter().position(|r| r.name == name)?;
            Some(list.remove(pos))
        });
        match removed {
            Some(record) => {
                debug!("Unregistered strategy {}/{}", kind, name);
                Ok(record)
            }
            None => {
                info!("Tried to unregister an unknown strategy: {}/{}", kind, name);
                Err(unknown(kind, name))
            }
        }
    }

    /// Look a strategy up
    pub fn get(&self, kind: &str, name: &str) -> Option<Rc<StrategyRecord>> {
        self.records
            .borrow()
            .get(kind)?
            .iter()
            .find(|r| r.name == name)
            .cloned()
    }

    /// Whether (kind, name) is registered
    pub fn contains(&self, kind: &str, name: &str) -> bool {
        self.get(kind, name).is_some()
    }

    /// All records of `kind` by ascending weight; equal weights keep registration order
    pub fn list(&self, kind: &str) -> Vec<Rc<StrategyRecord>> {
        let mut list = self
            .records
            .borrow()
            .get(kind)
            .cloned()
            .unwrap_or_default();
        list.sort_by_key(|r| r.weight);
        list
    }

    /// Names of the live strategies of `kind`, by ascending weight
    pub fn names(&self, kind: &str) -> Vec<String> {
        self.list(kind).iter().map(|r| r.name.clone()).collect()
    }

    /// Attach the consumer tracking the current values of `kind`
    ///
    /// Replaces a previously attached consumer.
    pub fn attach_controls(&self, kind: &str, controls: Rc<dyn ParameterControls>) {
        if self
            .controls
            .borrow_mut()
            .insert(kind.to_string(), controls)
            .is_some()
        {
            info!("Replacing the parameter controls of '{}'", kind);
        }
    }

    /// Detach the consumer of `kind`
    pub fn detach_controls(&self, kind: &str) -> bool {
        self.controls.borrow_mut().remove(kind).is_some()
    }

    fn controls(&self, kind: &str) -> Result<Rc<dyn ParameterControls>, RegistryError> {
        self.controls
            .borrow()
            .get(kind)
            .cloned()
            .ok_or_else(|| RegistryError::NoParameterGroup {
                kind: kind.to_string(),
            })
    }

    fn current_record(
        &self,
        kind: &str,
        controls: &dyn ParameterControls,
    ) -> Result<Rc<StrategyRecord>, RegistryError> {
        let name = controls
            .current_strategy()
            .ok_or_else(|| unknown(kind, ""))?;
        self.get(kind, &name).ok_or_else(|| unknown(kind, &name))
    }

    /// Current values of the selected strategy of `kind`
    ///
    /// Every parameter of the strategy's schema is present: the consumer's value where it
    /// has one, the schema default otherwise.
    pub fn get_current_parameter_values(&self, kind: &str) -> Result<ParameterMap, RegistryError> {
        let controls = self.controls(kind)?;
        let record = self.current_record(kind, controls.as_ref())?;
        Ok(record
            .parameters
            .iter()
            .map(|(key, default)| {
                let value = controls.value(key).unwrap_or_else(|| default.clone());
                (key.clone(), value)
            })
            .collect())
    }

    /// Push values to the consumer of `kind`
    ///
    /// Only keys the selected strategy recognises are pushed; returns how many were.
    pub fn set_current_parameter_values(
        &self,
        kind: &str,
        values: &ParameterMap,
    ) -> Result<usize, RegistryError> {
        let controls = self.controls(kind)?;
        let record = self.current_record(kind, controls.as_ref())?;
        let mut pushed = 0;
        for (key, value) in values {
            if record.parameters.contains_key(key) {
                controls.set_value(key, value.clone());
                pushed += 1;
            }
        }
        Ok(pushed)
    }
}

fn unknown(kind: &str, name: &str) -> RegistryError {
    RegistryError::UnknownStrategy {
        kind: kind.to_string(),
        name: name.to_string(),
    }
}

impl std::fmt::Debug for StrategyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let records = self.records.borrow();
        let names: BTreeMap<&str, Vec<&str>> = records
            .iter()
            .map(|(kind, list)| (kind.as_str(), list.iter().map(|r| r.name.as_str()).collect()))
            .collect();
        f.debug_struct("StrategyRegistry")
            .field("strategies", &names)
            .finish()
    }
}
