//! Running tasks
//!
//! Task references are names. They are resolved right before a task runs, every time, so a
//! renamed or removed entity can never be dereferenced through a stale handle.

use std::rc::Rc;

use tracing::{error, warn};

use super::Core;
use crate::data::{Boundary, CollectionItem, Model, Process, Task, Tool, Toolpath};
use crate::strategy::{TaskEnvironment, TASK_KIND};
use crate::types::ProgressCallback;

impl Core {
    fn resolve<T: CollectionItem>(&self, task: &Task, name: Option<&str>) -> Option<Rc<T>> {
        let name = name?;
        let found = self
            .collection::<T>()
            .and_then(|collection| collection.get_by_name(name));
        match found {
            Ok(entity) => Some(entity),
            Err(e) => {
                warn!("Task '{}' refers to a missing entity: {}", task.name(), e);
                None
            }
        }
    }

    /// Resolve the references of `task` against the current collections
    pub fn resolve_task(&self, task: &Task) -> TaskEnvironment {
        TaskEnvironment {
            tool: self.resolve::<Tool>(task, task.tool.as_deref()),
            process: self.resolve::<Process>(task, task.process.as_deref()),
            bounds: self.resolve::<Boundary>(task, task.bounds.as_deref()),
            collision_models: task
                .collision_models
                .iter()
                .filter_map(|name| self.resolve::<Model>(task, Some(name)))
                .collect(),
        }
    }

    /// Generate the toolpath of `task` with its task strategy
    ///
    /// Returns `None` when the task type is unknown or the strategy produced nothing; the
    /// reason is logged.
    pub fn run_task(&self, task: &Task, progress: Option<ProgressCallback>) -> Option<Toolpath> {
        let Some(record) = self.strategies().get(TASK_KIND, &task.task_type) else {
            error!(
                "Task '{}' uses an unknown task type: {}",
                task.name(),
                task.task_type
            );
            return None;
        };
        let Some(runner) = record.generator.as_task() else {
            error!(
                "Strategy '{}' registered as task type is not a task runner",
                record.name
            );
            return None;
        };
        let environment = self.resolve_task(task);
        runner.run(self, &environment, progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collections::Collection;
    use crate::data::{Move, ToolShape};
    use crate::geometry::{Mesh, Point};
    use crate::strategy::{StrategyRecord, TaskRunner};

    struct Echo;

    impl TaskRunner for Echo {
        fn run(
            &self,
            _core: &Core,
            environment: &TaskEnvironment,
            _progress: Option<ProgressCallback>,
        ) -> Option<Toolpath> {
            let tool = environment.tool.clone()?;
            let moves = vec![Move::cut(Point::new(0.0, 0.0, 0.0))];
            Some(Toolpath::new(moves, tool, Vec::new()))
        }
    }

    fn core_with_collections() -> Core {
        let core = Core::new();
        let bus = core.events().clone();
        let ns = core.namespace();
        ns.publish("tools", Rc::new(Collection::<Tool>::new(bus.clone())))
            .unwrap();
        ns.publish("processes", Rc::new(Collection::<Process>::new(bus.clone())))
            .unwrap();
        ns.publish("bounds", Rc::new(Collection::<Boundary>::new(bus.clone())))
            .unwrap();
        ns.publish("models", Rc::new(Collection::<Model>::new(bus)))
            .unwrap();
        core
    }

    #[test]
    fn test_resolve_task_drops_unknown_names() {
        let core = core_with_collections();
        let tools = core.collection::<Tool>().unwrap();
        tools
            .add(Tool::new("T1", 1, ToolShape::BallNose, 1.0), None)
            .unwrap();
        let models = core.collection::<Model>().unwrap();
        models
            .add(Model::from_mesh("part", Mesh::default()), None)
            .unwrap();

        let mut task = Task::new("job").bound_to("T1", "missing", "missing");
        task.collision_models = vec!["part".to_string(), "ghost".to_string()];
        let env = core.resolve_task(&task);
        assert_eq!(env.tool.unwrap().name(), "T1");
        assert!(env.process.is_none());
        assert!(env.bounds.is_none());
        assert_eq!(env.collision_models.len(), 1);
    }

    #[test]
    fn test_run_task_needs_known_type() {
        let core = core_with_collections();
        core.collection::<Tool>()
            .unwrap()
            .add(Tool::new("T1", 1, ToolShape::FlatBottom, 1.0), None)
            .unwrap();
        let task = Task::new("job").bound_to("T1", "p", "b");
        assert!(core.run_task(&task, None).is_none());

        core.register_strategy("task", StrategyRecord::task("milling", "Milling", Rc::new(Echo)))
            .unwrap();
        let path = core.run_task(&task, None).unwrap();
        assert_eq!(path.moves().len(), 1);
    }
}
