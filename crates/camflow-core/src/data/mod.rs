//! Domain entities
//!
//! This module provides:
//! - The six entity kinds (tools, processes, bounds, tasks, models, toolpaths)
//! - The application bag of display-only attributes every entity carries
//! - Construction of entities from specification entries
//!
//! Entities never point at each other; references are names, resolved against the target
//! collection whenever they are needed.

pub mod boundary;
pub mod model;
pub mod process;
pub mod task;
pub mod tools;
pub mod toolpath;

pub use boundary::{BoundsSpecification, Boundary, ToolBoundary};
pub use model::{Model, ModelSource};
pub use process::{ParameterMap, Process};
pub use task::Task;
pub use toolpath::{Move, MoveKind, Toolpath, ToolpathFilter};
pub use tools::{SpindleSettings, Tool, ToolGeometry, ToolShape};

use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use crate::error::EntityError;
use crate::geometry::Point;

/// Entity kinds, one collection each
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    /// Cutting tools
    Tool,
    /// Machining processes (strategy + parameters)
    Process,
    /// Boundaries constraining generation
    Boundary,
    /// Tasks combining tool, process, boundary and models
    Task,
    /// Collision models
    Model,
    /// Generated toolpaths
    Toolpath,
}

impl EntityKind {
    /// All kinds, in the order a specification document is processed
    pub fn all() -> &'static [EntityKind] {
        &[
            EntityKind::Tool,
            EntityKind::Process,
            EntityKind::Boundary,
            EntityKind::Task,
            EntityKind::Model,
            EntityKind::Toolpath,
        ]
    }

    /// Key of the collection holding this kind (also the specification section name)
    pub fn collection_key(&self) -> &'static str {
        match self {
            Self::Tool => "tools",
            Self::Process => "processes",
            Self::Boundary => "bounds",
            Self::Task => "tasks",
            Self::Model => "models",
            Self::Toolpath => "toolpaths",
        }
    }

    /// Prefix of the events concerning this kind, e.g. `model` in `model-list-changed`
    pub fn event_prefix(&self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::Process => "process",
            Self::Boundary => "bounds",
            Self::Task => "task",
            Self::Model => "model",
            Self::Toolpath => "toolpath",
        }
    }

    /// Template for generated names, `{}` is replaced by a counter
    pub fn name_template(&self) -> &'static str {
        match self {
            Self::Tool => "Tool #{}",
            Self::Process => "Process #{}",
            Self::Boundary => "Bounds #{}",
            Self::Task => "Task #{}",
            Self::Model => "Model #{}",
            Self::Toolpath => "Toolpath #{}",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.collection_key())
    }
}

/// Display-only attributes (color, visibility, ...) of an entity
///
/// Never read by computation. Interior mutability lets the UI side change them on
/// entities that are otherwise immutable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppValues {
    values: RefCell<BTreeMap<String, Value>>,
}

impl AppValues {
    /// Create an empty bag
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an attribute
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.borrow().get(key).cloned()
    }

    /// Set an attribute, returning the previous value
    pub fn set(&self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.borrow_mut().insert(key.into(), value)
    }

    /// Whether the entity should be displayed (defaults to true)
    pub fn visible(&self) -> bool {
        self.get("visible").and_then(|v| v.as_bool()).unwrap_or(true)
    }
}

/// Behaviour shared by everything stored in a collection
pub trait CollectionItem: std::fmt::Debug + 'static {
    /// Kind of the entity
    const KIND: EntityKind;

    /// Unique name within the collection
    fn name(&self) -> &str;

    /// Rename; only collections call this, before the entity is shared
    fn set_name(&mut self, name: String);

    /// Display-only attributes
    fn app_values(&self) -> &AppValues;
}

/// Any entity, as produced from a specification entry
#[derive(Debug, Clone)]
pub enum Entity {
    /// A tool
    Tool(Tool),
    /// A process
    Process(Process),
    /// A boundary
    Boundary(Boundary),
    /// A task
    Task(Task),
    /// A model
    Model(Model),
    /// A toolpath
    Toolpath(Toolpath),
}

impl Entity {
    /// Construct an entity of `kind` from a specification entry
    ///
    /// Toolpaths are generated, not constructed, and are rejected here. Relative model
    /// locations are resolved against `base_dir`.
    pub fn from_spec(
        kind: EntityKind,
        name: &str,
        spec: &Value,
        base_dir: &Path,
    ) -> Result<Entity, EntityError> {
        let fields = FieldReader::new(kind, name, spec)?;
        Ok(match kind {
            EntityKind::Tool => Entity::Tool(Tool::from_fields(&fields)?),
            EntityKind::Process => Entity::Process(Process::from_fields(&fields)?),
            EntityKind::Boundary => Entity::Boundary(Boundary::from_fields(&fields)?),
            EntityKind::Task => Entity::Task(Task::from_fields(&fields)?),
            EntityKind::Model => Entity::Model(Model::from_fields(&fields, base_dir)?),
            EntityKind::Toolpath => {
                return Err(fields.invalid("source", "toolpaths are generated, not declared"))
            }
        })
    }

    /// Kind of the entity
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Tool(_) => EntityKind::Tool,
            Entity::Process(_) => EntityKind::Process,
            Entity::Boundary(_) => EntityKind::Boundary,
            Entity::Task(_) => EntityKind::Task,
            Entity::Model(_) => EntityKind::Model,
            Entity::Toolpath(_) => EntityKind::Toolpath,
        }
    }

    /// Name of the entity
    pub fn name(&self) -> &str {
        match self {
            Entity::Tool(e) => e.name(),
            Entity::Process(e) => e.name(),
            Entity::Boundary(e) => e.name(),
            Entity::Task(e) => e.name(),
            Entity::Model(e) => e.name(),
            Entity::Toolpath(e) => e.name(),
        }
    }
}

/// Typed access to the fields of one specification entry
///
/// Every failure names the collection, the entity and the offending field.
#[derive(Debug, Clone)]
pub struct FieldReader<'a> {
    kind: EntityKind,
    entity: &'a str,
    prefix: String,
    fields: &'a Map<String, Value>,
}

impl<'a> FieldReader<'a> {
    /// Wrap an entry; the entry must be a mapping
    pub fn new(kind: EntityKind, entity: &'a str, spec: &'a Value) -> Result<Self, EntityError> {
        match spec.as_object() {
            Some(fields) => Ok(Self {
                kind,
                entity,
                prefix: String::new(),
                fields,
            }),
            None => Err(EntityError::InvalidField {
                collection: kind.collection_key().to_string(),
                entity: entity.to_string(),
                field: "<entry>".to_string(),
                reason: "expected a mapping of fields".to_string(),
            }),
        }
    }

    /// Name of the entity being read
    pub fn entity(&self) -> &'a str {
        self.entity
    }

    fn path(&self, field: &str) -> String {
        format!("{}{}", self.prefix, field)
    }

    /// Error for a missing field
    pub fn missing(&self, field: &str) -> EntityError {
        EntityError::MissingField {
            collection: self.kind.collection_key().to_string(),
            entity: self.entity.to_string(),
            field: self.path(field),
        }
    }

    /// Error for a field with an unusable value
    pub fn invalid(&self, field: &str, reason: impl Into<String>) -> EntityError {
        EntityError::InvalidField {
            collection: self.kind.collection_key().to_string(),
            entity: self.entity.to_string(),
            field: self.path(field),
            reason: reason.into(),
        }
    }

    /// Raw value of a field
    pub fn get(&self, field: &str) -> Option<&'a Value> {
        self.fields.get(field).filter(|v| !v.is_null())
    }

    /// Reader for a nested mapping, `None` if absent
    pub fn nested(&self, field: &str) -> Result<Option<FieldReader<'a>>, EntityError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Object(fields)) => Ok(Some(FieldReader {
                kind: self.kind,
                entity: self.entity,
                prefix: format!("{}.", self.path(field)),
                fields,
            })),
            Some(_) => Err(self.invalid(field, "expected a mapping")),
        }
    }

    /// A string field that must be present
    pub fn required_str(&self, field: &str) -> Result<&'a str, EntityError> {
        self.optional_str(field)?.ok_or_else(|| self.missing(field))
    }

    /// An optional string field
    pub fn optional_str(&self, field: &str) -> Result<Option<&'a str>, EntityError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(self.invalid(field, "expected a string")),
        }
    }

    /// A number field that must be present
    pub fn required_f64(&self, field: &str) -> Result<f64, EntityError> {
        self.optional_f64(field)?.ok_or_else(|| self.missing(field))
    }

    /// An optional number field
    pub fn optional_f64(&self, field: &str) -> Result<Option<f64>, EntityError> {
        match self.get(field) {
            None => Ok(None),
            Some(value) => value
                .as_f64()
                .filter(|v| v.is_finite())
                .map(Some)
                .ok_or_else(|| self.invalid(field, "expected a number")),
        }
    }

    /// An optional non-negative integer field
    pub fn optional_u32(&self, field: &str) -> Result<Option<u32>, EntityError> {
        match self.get(field) {
            None => Ok(None),
            Some(value) => value
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .map(Some)
                .ok_or_else(|| self.invalid(field, "expected a non-negative integer")),
        }
    }

    /// An optional boolean field
    pub fn optional_bool(&self, field: &str) -> Result<Option<bool>, EntityError> {
        match self.get(field) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(_) => Err(self.invalid(field, "expected a boolean")),
        }
    }

    /// A list of names; absent means empty
    pub fn string_list(&self, field: &str) -> Result<Vec<String>, EntityError> {
        match self.get(field) {
            None => Ok(Vec::new()),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| self.invalid(field, "expected a list of names"))
                })
                .collect(),
            Some(Value::String(single)) => Ok(vec![single.clone()]),
            Some(_) => Err(self.invalid(field, "expected a list of names")),
        }
    }

    /// An optional `[x, y, z]` triple
    pub fn optional_point(&self, field: &str) -> Result<Option<Point>, EntityError> {
        match self.get(field) {
            None => Ok(None),
            Some(value) => parse_point(value)
                .map(Some)
                .ok_or_else(|| self.invalid(field, "expected [x, y, z]")),
        }
    }

    /// An optional string field parsed into an enum
    pub fn optional_enum<T: FromStr>(&self, field: &str) -> Result<Option<T>, EntityError> {
        match self.optional_str(field)? {
            None => Ok(None),
            Some(text) => T::from_str(text)
                .map(Some)
                .map_err(|_| self.invalid(field, format!("unknown value '{}'", text))),
        }
    }

    /// Every field not listed in `known`, as a parameter map
    pub fn remaining(&self, known: &[&str]) -> BTreeMap<String, Value> {
        self.fields
            .iter()
            .filter(|(key, _)| !known.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Parse `[x, y, z]`
pub(crate) fn parse_point(value: &Value) -> Option<Point> {
    let items = value.as_array()?;
    if items.len() != 3 {
        return None;
    }
    let x = items[0].as_f64()?;
    let y = items[1].as_f64()?;
    let z = items[2].as_f64()?;
    Some(Point::new(x, y, z))
}
