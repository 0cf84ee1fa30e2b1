//! Milling task type
//!
//! Turns a task into a toolpath: check the task is fully bound, compute the bound box, let
//! the process strategy plan the motion grid and drop the grid onto the collision models.

use std::rc::Rc;

use camflow_core::{
    CollectionItem, Core, Model, Plugin, PluginError, ProgressCallback, StrategyRecord,
    TaskEnvironment, TaskRunner, Toolpath, PROCESS_KIND, TASK_KIND,
};
use serde_json::json;
use tracing::{debug, error, info, warn};

/// Name of the milling task type
pub const MILLING_TASK: &str = "milling";

/// The `milling` task runner
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskTypeMilling;

impl TaskTypeMilling {
    /// Models the bound box refers to: the boundary's own references, else the collision models
    fn reference_models(core: &Core, env: &TaskEnvironment, names: &[String]) -> Vec<Rc<Model>> {
        if names.is_empty() {
            return env.collision_models.clone();
        }
        let Ok(models) = core.collection::<Model>() else {
            warn!("Boundary refers to models but no model collection is loaded");
            return Vec::new();
        };
        names
            .iter()
            .filter_map(|name| match models.get_by_name(name) {
                Ok(model) => Some(model),
                Err(e) => {
                    warn!("Ignoring boundary reference: {}", e);
                    None
                }
            })
            .collect()
    }
}

impl TaskRunner for TaskTypeMilling {
    fn run(
        &self,
        core: &Core,
        env: &TaskEnvironment,
        progress: Option<ProgressCallback>,
    ) -> Option<Toolpath> {
        let Some(tool) = &env.tool else {
            error!("A tool must be assigned to the task");
            return None;
        };
        let Some(process) = &env.process else {
            error!("A process must be assigned to the task");
            return None;
        };
        let Some(bounds) = &env.bounds else {
            error!("Bounds must be assigned to the task");
            return None;
        };

        let Some(record) = core.strategies().get(PROCESS_KIND, &process.strategy) else {
            error!(
                "Process '{}' uses an unknown strategy: {}",
                process.name(),
                process.strategy
            );
            return None;
        };
        let Some(strategy) = record.generator.as_process() else {
            error!("Strategy '{}' is not a process strategy", record.name);
            return None;
        };

        let references = Self::reference_models(core, env, &bounds.reference_models);
        let Some(bound) = bounds.get_absolute_limits(tool.radius, &references) else {
            warn!(
                "Bounds '{}' do not yield a valid box for toolpath generation",
                bounds.name()
            );
            return None;
        };

        let (generator, grid) = strategy.plan(process, tool.radius, &bound)?;
        if env.collision_models.is_empty() {
            warn!("No collision model selected; generating without model contact");
        }
        debug!(
            "Generating '{}' with tool '{}' between z {} and {}",
            process.name(),
            tool.name(),
            bound.lower.z,
            bound.upper.z
        );
        let moves = generator.generate(
            &tool.tool_geometry(),
            &env.collision_models,
            &grid,
            bound.lower.z,
            bound.upper.z,
            progress.as_ref(),
        );
        if moves.is_empty() {
            info!("Toolpath generation found no valid moves");
            return None;
        }
        Some(Toolpath::new(moves, tool.clone(), core.toolpath_filters(tool)))
    }
}

/// Plugin registering the `milling` task type
#[derive(Debug, Clone, Copy, Default)]
pub struct MillingPlugin;

impl Plugin for MillingPlugin {
    fn name(&self) -> &str {
        "TaskTypeMilling"
    }

    fn depends(&self) -> &[&'static str] {
        &["Tasks"]
    }

    fn setup(&self, core: &Rc<Core>) -> Result<(), PluginError> {
        let record = StrategyRecord::task(MILLING_TASK, "Milling", Rc::new(TaskTypeMilling))
            .with_parameter("collision_models", json!([]))
            .with_parameter("tool", json!(null))
            .with_parameter("process", json!(null))
            .with_parameter("bounds", json!(null))
            .with_weight(10);
        core.register_strategy(TASK_KIND, record)
            .map_err(|e| PluginError::SetupFailed {
                name: self.name().to_string(),
                reason: e.to_string(),
            })
    }

    fn teardown(&self, core: &Core) {
        if let Err(e) = core.unregister_strategy(TASK_KIND, MILLING_TASK) {
            debug!("Milling task type already gone: {}", e);
        }
    }
}
