use serde_json::Value;
use tracing::{debug, error, info, warn};

use camflow_core::event_bus::TOOLPATH_GENERATED;
use camflow_core::{
    Boundary, CollectionItem, Core, Entity, EntityKind, EventPayload, Model, Process, Task, Tool,
    Toolpath, PROCESS_KIND, TASK_KIND,
};

use super::{Document, FlowError, FlowReport};
use crate::environment::Environment;

/// Sections holding declared entities, in processing order
const ENTITY_SECTIONS: [EntityKind; 5] = [
    EntityKind::Tool,
    EntityKind::Process,
    EntityKind::Boundary,
    EntityKind::Task,
    EntityKind::Model,
];

/// Task source of a toolpath entry
const TASK_SOURCE: &str = "task";

/// Drives one specification through a core
pub struct FlowInterpreter<'a> {
    pub(super) core: &'a Core,
    merge_task_results: bool,
}

impl<'a> FlowInterpreter<'a> {
    /// Interpreter keeping the last task result of every toolpath
    pub fn new(core: &'a Core) -> Self {
        Self {
            core,
            merge_task_results: false,
        }
    }

    /// Interpreter configured like `environment`
    pub fn for_environment(environment: &'a Environment) -> Self {
        Self::new(environment.core()).with_merge_task_results(environment.merge_task_results())
    }

    /// Concatenate the results of all tasks feeding one toolpath instead of keeping the last
    pub fn with_merge_task_results(mut self, merge: bool) -> Self {
        self.merge_task_results = merge;
        self
    }

    /// Build, generate and export everything `document` declares
    pub fn run(&self, document: &Document) -> FlowReport {
        let mut report = FlowReport::default();
        for kind in ENTITY_SECTIONS {
            self.build_section(document, kind, &mut report);
        }
        if let Some(section) = document.section(EntityKind::Toolpath.collection_key()) {
            self.generate_toolpaths(section, &mut report);
        }
        if let Some(section) = document.section("exports") {
            self.run_exports(section, document.base_dir(), &mut report);
        }
        info!(
            "Flow finished: {} entities, {} toolpaths, {} exports, {} skipped",
            report.entities,
            report.toolpaths.len(),
            report.exports.len(),
            report.skipped
        );
        report
    }

    fn build_section(&self, document: &Document, kind: EntityKind, report: &mut FlowReport) {
        let key = kind.collection_key();
        let Some(section) = document.section(key) else {
            return;
        };
        let Some(entries) = section.as_object() else {
            error!(
                "{}",
                FlowError::Section {
                    section: key.to_string(),
                    expected: "a mapping of named entries",
                }
            );
            report.skipped += 1;
            return;
        };
        for (name, spec) in entries {
            let added = Entity::from_spec(kind, name, spec, document.base_dir())
                .map_err(FlowError::from)
                .and_then(|entity| self.add_entity(entity));
            match added {
                Ok(()) => report.entities += 1,
                Err(e) => {
                    error!("Failed to import '{}' into '{}': {}", name, key, e);
                    report.skipped += 1;
                }
            }
        }
    }

    /// Append a constructed entity to its collection under its own name
    ///
    /// A process or task naming a strategy that is not registered is still added, with a
    /// warning; it fails later when a toolpath generates it.
    pub fn add_entity(&self, entity: Entity) -> Result<(), FlowError> {
        let name = entity.name().to_string();
        if let Some((kind, strategy)) = self.unregistered_strategy(&entity) {
            warn!(
                "'{}' uses the {} strategy '{}', which is not registered",
                name, kind, strategy
            );
        }
        match entity {
            Entity::Tool(e) => self.core.collection::<Tool>()?.add(e, Some(&name)),
            Entity::Process(e) => self.core.collection::<Process>()?.add(e, Some(&name)),
            Entity::Boundary(e) => self.core.collection::<Boundary>()?.add(e, Some(&name)),
            Entity::Task(e) => self.core.collection::<Task>()?.add(e, Some(&name)),
            Entity::Model(e) => self.core.collection::<Model>()?.add(e, Some(&name)),
            Entity::Toolpath(e) => self.core.collection::<Toolpath>()?.add(e, Some(&name)),
        }?;
        Ok(())
    }

    /// Strategy kind and name `entity` refers to, when no such strategy is registered
    fn unregistered_strategy<'e>(&self, entity: &'e Entity) -> Option<(&'static str, &'e str)> {
        let (kind, strategy) = match entity {
            Entity::Process(process) => (PROCESS_KIND, process.strategy.as_str()),
            Entity::Task(task) => (TASK_KIND, task.task_type.as_str()),
            _ => return None,
        };
        (!self.core.strategies().contains(kind, strategy)).then_some((kind, strategy))
    }

    fn generate_toolpaths(&self, section: &Value, report: &mut FlowReport) {
        let Some(entries) = section.as_object() else {
            error!(
                "{}",
                FlowError::Section {
                    section: EntityKind::Toolpath.collection_key().to_string(),
                    expected: "a mapping of named entries",
                }
            );
            report.skipped += 1;
            return;
        };
        for (name, spec) in entries {
            let stored = self
                .generate_toolpath(name, spec)
                .and_then(|toolpath| toolpath.map(|t| self.store_toolpath(name, t)).transpose());
            match stored {
                Ok(Some(())) => report.toolpaths.push(name.clone()),
                Ok(None) => {
                    warn!("Toolpath '{}' produced no output", name);
                    report.skipped += 1;
                }
                Err(e) => {
                    error!("Failed to import '{}' into 'toolpaths': {}", name, e);
                    report.skipped += 1;
                }
            }
        }
    }

    /// Generate the toolpath a `toolpaths` entry describes
    ///
    /// Every listed task runs in order. Unresolvable task names and tasks without a result
    /// are logged and left out.
    pub fn generate_toolpath(&self, name: &str, spec: &Value) -> Result<Option<Toolpath>, FlowError> {
        let entry = || format!("toolpath '{}'", name);
        let source = spec.get("source").ok_or_else(|| FlowError::MissingKey {
            entry: entry(),
            key: "source",
        })?;
        let source_type = source
            .get("type")
            .ok_or_else(|| FlowError::MissingKey {
                entry: entry(),
                key: "source.type",
            })?;
        if source_type.as_str() != Some(TASK_SOURCE) {
            return Err(FlowError::Unsupported {
                entry: entry(),
                key: "source.type",
                value: source_type.to_string(),
            });
        }
        let task_names = source.get("tasks").ok_or_else(|| FlowError::MissingKey {
            entry: entry(),
            key: "source.tasks",
        })?;
        let task_names = name_list(task_names).ok_or_else(|| FlowError::Unsupported {
            entry: entry(),
            key: "source.tasks",
            value: task_names.to_string(),
        })?;

        let tasks = self.core.collection::<Task>()?;
        let mut results = Vec::new();
        for task_name in task_names {
            let task = match tasks.get_by_name(task_name) {
                Ok(task) => task,
                Err(e) => {
                    error!("Toolpath '{}' refers to an unknown task: {}", name, e);
                    continue;
                }
            };
            match self.core.run_task(&task, None) {
                Some(toolpath) => results.push(toolpath),
                None => warn!("Task '{}' did not produce a toolpath", task_name),
            }
        }
        Ok(self.combine(name, results))
    }

    fn combine(&self, name: &str, mut results: Vec<Toolpath>) -> Option<Toolpath> {
        if !self.merge_task_results {
            let kept = results.pop();
            if !results.is_empty() {
                info!(
                    "Toolpath '{}' keeps the last task result, discarding {} earlier ones",
                    name,
                    results.len()
                );
            }
            return kept;
        }

        let mut results = results.into_iter();
        let first = results.next()?;
        let tool = first.tool().clone();
        let mut moves = first.moves().to_vec();
        for other in results {
            if other.tool().name() == tool.name() {
                moves.extend_from_slice(other.moves());
            } else {
                warn!(
                    "Not merging a result of tool '{}' into toolpath '{}' of tool '{}'",
                    other.tool().name(),
                    name,
                    tool.name()
                );
            }
        }
        Some(Toolpath::new(moves, tool, first.filters().to_vec()))
    }

    fn store_toolpath(&self, name: &str, toolpath: Toolpath) -> Result<(), FlowError> {
        let collection = EntityKind::Toolpath.collection_key();
        self.core.collection::<Toolpath>()?.add(toolpath, Some(name))?;
        debug!("Stored toolpath '{}'", name);
        self.core.events().emit_with(
            TOOLPATH_GENERATED,
            EventPayload::Entity {
                collection: collection.to_string(),
                name: name.to_string(),
            },
        );
        Ok(())
    }
}

/// A list of names; a single string counts as a list of one
pub(super) fn name_list(value: &Value) -> Option<Vec<&str>> {
    match value {
        Value::String(name) => Some(vec![name.as_str()]),
        Value::Array(items) => items.iter().map(Value::as_str).collect(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_name_list() {
        assert_eq!(name_list(&json!(["a", "b"])), Some(vec!["a", "b"]));
        assert_eq!(name_list(&json!("a")), Some(vec!["a"]));
        assert_eq!(name_list(&json!(["a", 1])), None);
        assert_eq!(name_list(&json!({"a": 1})), None);
    }

    #[test]
    fn test_toolpath_source_errors() {
        let environment = Environment::default();
        let flow = FlowInterpreter::for_environment(&environment);

        let err = flow.generate_toolpath("tp", &json!({})).unwrap_err();
        assert!(matches!(err, FlowError::MissingKey { key: "source", .. }));

        let err = flow
            .generate_toolpath("tp", &json!({"source": {"tasks": []}}))
            .unwrap_err();
        assert!(matches!(err, FlowError::MissingKey { key: "source.type", .. }));

        let err = flow
            .generate_toolpath("tp", &json!({"source": {"type": "model"}}))
            .unwrap_err();
        assert!(matches!(err, FlowError::Unsupported { key: "source.type", .. }));

        let err = flow
            .generate_toolpath("tp", &json!({"source": {"type": "task"}}))
            .unwrap_err();
        assert!(matches!(err, FlowError::MissingKey { key: "source.tasks", .. }));
    }

    #[test]
    fn test_unregistered_strategies_are_flagged_but_added() {
        let environment = Environment::default();
        let flow = FlowInterpreter::for_environment(&environment);

        let known = Entity::Process(Process::new("rough", "slice"));
        assert_eq!(flow.unregistered_strategy(&known), None);
        let unknown = Entity::Process(Process::new("spiral", "spiral"));
        assert_eq!(
            flow.unregistered_strategy(&unknown),
            Some((PROCESS_KIND, "spiral"))
        );
        let mut task = Task::new("engrave");
        task.task_type = "engraving".to_string();
        let task = Entity::Task(task);
        assert_eq!(flow.unregistered_strategy(&task), Some((TASK_KIND, "engraving")));
        assert_eq!(flow.unregistered_strategy(&Entity::Task(Task::new("job"))), None);

        flow.add_entity(unknown).unwrap();
        let processes = environment.core().collection::<Process>().unwrap();
        assert_eq!(processes.names(), vec!["spiral"]);
    }

    #[test]
    fn test_unknown_tasks_yield_nothing() {
        let environment = Environment::default();
        let flow = FlowInterpreter::for_environment(&environment);
        let result = flow
            .generate_toolpath("tp", &json!({"source": {"type": "task", "tasks": ["nope"]}}))
            .unwrap();
        assert!(result.is_none());
    }
}
