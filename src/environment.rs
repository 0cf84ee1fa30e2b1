//! Runtime environment
//!
//! One [`Core`] with the collection plugins and the built-in strategies loaded, configured
//! from the application [`Config`]. Dropping the environment tears every plugin down.

use std::rc::Rc;

use camflow_camtools::{builtin_plugins, ExportOptions, SliceDefaults};
use camflow_core::{collection_plugins, Core, PluginManager};
use camflow_settings::Config;
use tracing::info;

/// A loaded kernel
pub struct Environment {
    manager: PluginManager,
    merge_task_results: bool,
}

impl Environment {
    /// Build a core and load every plugin the configuration does not disable
    pub fn new(config: &Config) -> Self {
        let core = Rc::new(Core::new());
        let mut manager =
            PluginManager::new(core).with_disabled(config.plugins.disabled.iter().cloned());

        let loaded = manager.load_all(collection_plugins())
            + manager.load_all(builtin_plugins(
                slice_defaults(config),
                export_options(config),
            ));
        info!("Environment ready with {} plugins", loaded);

        Self {
            manager,
            merge_task_results: config.generation.merge_task_results,
        }
    }

    /// The kernel
    pub fn core(&self) -> &Rc<Core> {
        self.manager.core()
    }

    /// The plugin manager, for loading or unloading plugins later
    pub fn plugins(&mut self) -> &mut PluginManager {
        &mut self.manager
    }

    /// Whether several tasks feeding one toolpath are merged
    pub fn merge_task_results(&self) -> bool {
        self.merge_task_results
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

fn slice_defaults(config: &Config) -> SliceDefaults {
    SliceDefaults {
        step_down: config.generation.default_step_down,
        overlap: config.generation.default_overlap,
    }
}

fn export_options(config: &Config) -> ExportOptions {
    ExportOptions {
        safety_height: config.export.safety_height,
        decimal_places: config.export.decimal_places,
        line_numbers: config.export.line_numbers,
        header_comment: config.export.header_comment,
    }
}
