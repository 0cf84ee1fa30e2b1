//! Tasks
//!
//! A task binds a tool, a process, a boundary and any number of collision models, all by
//! name, to a task strategy (`milling` unless stated otherwise).

use super::{AppValues, CollectionItem, EntityKind, FieldReader};
use crate::error::EntityError;

/// Task strategy used when a task does not name one
pub const DEFAULT_TASK_TYPE: &str = "milling";

/// A task
///
/// References stay names; a missing tool, process or bounds reference is legal here and is
/// reported when the task is generated.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    name: String,
    /// Name of the `task` strategy
    pub task_type: String,
    /// Tool name
    pub tool: Option<String>,
    /// Process name
    pub process: Option<String>,
    /// Boundary name
    pub bounds: Option<String>,
    /// Collision model names
    pub collision_models: Vec<String>,
    app: AppValues,
}

impl Task {
    /// Create an unbound milling task
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            task_type: DEFAULT_TASK_TYPE.to_string(),
            tool: None,
            process: None,
            bounds: None,
            collision_models: Vec::new(),
            app: AppValues::new(),
        }
    }

    /// Bind tool, process and bounds, builder style
    pub fn bound_to(mut self, tool: &str, process: &str, bounds: &str) -> Self {
        self.tool = Some(tool.to_string());
        self.process = Some(process.to_string());
        self.bounds = Some(bounds.to_string());
        self
    }

    /// Build a task from a specification entry
    ///
    /// Accepts `collision_models` or `models` for the model list.
    pub(crate) fn from_fields(fields: &FieldReader<'_>) -> Result<Self, EntityError> {
        let mut collision_models = fields.string_list("collision_models")?;
        if collision_models.is_empty() {
            collision_models = fields.string_list("models")?;
        }
        Ok(Self {
            name: fields.entity().to_string(),
            task_type: fields
                .optional_str("type")?
                .unwrap_or(DEFAULT_TASK_TYPE)
                .to_string(),
            tool: fields.optional_str("tool")?.map(str::to_string),
            process: fields.optional_str("process")?.map(str::to_string),
            bounds: fields.optional_str("bounds")?.map(str::to_string),
            collision_models,
            app: AppValues::new(),
        })
    }
}

impl CollectionItem for Task {
    const KIND: EntityKind = EntityKind::Task;

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
