//! Plugins
//!
//! A plugin registers its collections, strategies, chain members and namespace entries in
//! `setup` and removes them again in `teardown`. The [`PluginManager`] loads plugins in
//! dependency order and tears them down in reverse.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use tracing::{debug, error, info, warn};

use crate::collections::Collection;
use crate::core::Core;
use crate::data::{Boundary, CollectionItem, Model, Process, Task, Tool, Toolpath};
use crate::error::PluginError;
use crate::event_bus::{self, EventHandler, EventPayload};
use crate::strategy::{PROCESS_KIND, TASK_KIND};

/// A unit of functionality registered with the [`Core`]
pub trait Plugin {
    /// Unique plugin name
    fn name(&self) -> &str;

    /// Names of the plugins that must be loaded first
    fn depends(&self) -> &[&'static str] {
        &[]
    }

    /// Register everything the plugin provides
    fn setup(&self, core: &Rc<Core>) -> Result<(), PluginError>;

    /// Remove everything `setup` registered
    fn teardown(&self, core: &Core);
}

/// Reaction of a collection plugin to a `<kind>-strategy-list-changed` event
type PurgeFn = fn(&Core);

/// Plugin owning the collection of one entity kind
///
/// The collection is published into the namespace under its collection key.
pub struct CollectionPlugin<T: CollectionItem> {
    name: &'static str,
    depends: &'static [&'static str],
    purge: Option<(&'static str, PurgeFn)>,
    handler: RefCell<Option<(String, EventHandler)>>,
    kind: PhantomData<T>,
}

impl<T: CollectionItem> CollectionPlugin<T> {
    fn new(name: &'static str, depends: &'static [&'static str]) -> Self {
        Self {
            name,
            depends,
            purge: None,
            handler: RefCell::new(None),
            kind: PhantomData,
        }
    }

    fn purging_on(mut self, kind: &'static str, purge: PurgeFn) -> Self {
        self.purge = Some((kind, purge));
        self
    }
}

impl<T: CollectionItem> Plugin for CollectionPlugin<T> {
    fn name(&self) -> &str {
        self.name
    }

    fn depends(&self) -> &[&'static str] {
        self.depends
    }

    fn setup(&self, core: &Rc<Core>) -> Result<(), PluginError> {
        let collection = Rc::new(Collection::<T>::new(core.events().clone()));
        core.namespace()
            .publish(T::KIND.collection_key(), collection)
            .map_err(|e| PluginError::SetupFailed {
                name: self.name.to_string(),
                reason: e.to_string(),
            })?;
        if let Some((kind, purge)) = self.purge {
            let weak: Weak<Core> = Rc::downgrade(core);
            let handler: EventHandler = Rc::new(move |_: &EventPayload| {
                if let Some(core) = weak.upgrade() {
                    purge(&core);
                }
            });
            let event = event_bus::strategy_list_changed(kind);
            core.events().subscribe(event.clone(), handler.clone());
            *self.handler.borrow_mut() = Some((event, handler));
        }
        Ok(())
    }

    fn teardown(&self, core: &Core) {
        if let Some((event, handler)) = self.handler.borrow_mut().take() {
            core.events().unsubscribe(&event, &handler);
        }
        if let Some(published) = core.namespace().withdraw(T::KIND.collection_key()) {
            if let Ok(collection) = published.downcast::<Collection<T>>() {
                collection.clear();
            }
        }
    }
}

/// Drop processes whose strategy disappeared, and the tasks using them
fn purge_processes(core: &Core) {
    let Ok(processes) = core.collection::<Process>() else {
        return;
    };
    let obsolete: Vec<String> = processes
        .get_all()
        .iter()
        .filter(|p| !core.strategies().contains(PROCESS_KIND, &p.strategy))
        .map(|p| p.name().to_string())
        .collect();
    if obsolete.is_empty() {
        return;
    }
    if let Ok(tasks) = core.collection::<Task>() {
        tasks.purge(|task| {
            task.process
                .as_ref()
                .is_some_and(|name| obsolete.contains(name))
        });
    }
    processes.purge(|p| obsolete.iter().any(|name| name == p.name()));
}

/// Drop tasks whose task type disappeared
fn purge_tasks(core: &Core) {
    if let Ok(tasks) = core.collection::<Task>() {
        tasks.purge(|task| !core.strategies().contains(TASK_KIND, &task.task_type));
    }
}

/// Plugin owning the tool collection
pub fn tools_plugin() -> CollectionPlugin<Tool> {
    CollectionPlugin::new("Tools", &[])
}

/// Plugin owning the process collection
pub fn processes_plugin() -> CollectionPlugin<Process> {
    CollectionPlugin::new("Processes", &[]).purging_on(PROCESS_KIND, purge_processes)
}

/// Plugin owning the boundary collection
pub fn bounds_plugin() -> CollectionPlugin<Boundary> {
    CollectionPlugin::new("Bounds", &[])
}

/// Plugin owning the task collection
pub fn tasks_plugin() -> CollectionPlugin<Task> {
    CollectionPlugin::new("Tasks", &["Tools", "Processes", "Bounds", "Models"])
        .purging_on(TASK_KIND, purge_tasks)
}

/// Plugin owning the model collection
pub fn models_plugin() -> CollectionPlugin<Model> {
    CollectionPlugin::new("Models", &[])
}

/// Plugin owning the toolpath collection
pub fn toolpaths_plugin() -> CollectionPlugin<Toolpath> {
    CollectionPlugin::new("Toolpaths", &["Tools"])
}

/// The six collection plugins, in loadable order
pub fn collection_plugins() -> Vec<Box<dyn Plugin>> {
    vec![
        Box::new(tools_plugin()),
        Box::new(processes_plugin()),
        Box::new(bounds_plugin()),
        Box::new(models_plugin()),
        Box::new(tasks_plugin()),
        Box::new(toolpaths_plugin()),
    ]
}

/// Loads and unloads plugins against one [`Core`]
pub struct PluginManager {
    core: Rc<Core>,
    loaded: Vec<Box<dyn Plugin>>,
    disabled: Vec<String>,
}

impl PluginManager {
    /// Create a manager for `core`
    pub fn new(core: Rc<Core>) -> Self {
        Self {
            core,
            loaded: Vec::new(),
            disabled: Vec::new(),
        }
    }

    /// Skip the named plugins when loading
    pub fn with_disabled(mut self, disabled: impl IntoIterator<Item = String>) -> Self {
        self.disabled = disabled.into_iter().collect();
        self
    }

    /// The managed core
    pub fn core(&self) -> &Rc<Core> {
        &self.core
    }

    /// Whether a plugin is loaded
    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.iter().any(|p| p.name() == name)
    }

    /// Names of the loaded plugins in load order
    pub fn loaded_names(&self) -> Vec<String> {
        self.loaded.iter().map(|p| p.name().to_string()).collect()
    }

    /// Load a plugin
    ///
    /// Returns `Ok(false)` if the plugin is disabled. Every dependency must already be loaded.
    pub fn load(&mut self, plugin: Box<dyn Plugin>) -> Result<bool, PluginError> {
        let name = plugin.name().to_string();
        if self.disabled.contains(&name) {
            info!("Skipping disabled plugin: {}", name);
            return Ok(false);
        }
        if self.is_loaded(&name) {
            return Err(PluginError::AlreadyLoaded { name });
        }
        if let Some(missing) = plugin.depends().iter().find(|d| !self.is_loaded(d)) {
            return Err(PluginError::MissingDependency {
                name,
                dependency: missing.to_string(),
            });
        }
        plugin.setup(&self.core)?;
        debug!("Loaded plugin {}", name);
        self.loaded.push(plugin);
        self.core
            .events()
            .emit_with(event_bus::PLUGIN_LOADED, EventPayload::Name(name));
        Ok(true)
    }

    /// Load several plugins, logging the ones that fail
    ///
    /// Returns the number of plugins loaded.
    pub fn load_all(&mut self, plugins: Vec<Box<dyn Plugin>>) -> usize {
        let mut count = 0;
        for plugin in plugins {
            let name = plugin.name().to_string();
            match self.load(plugin) {
                Ok(true) => count += 1,
                Ok(false) => {}
                Err(e) => error!("Failed to load plugin {}: {}", name, e),
            }
        }
        count
    }

    /// Tear one plugin down
    ///
    /// Refused while another loaded plugin depends on it.
    pub fn unload(&mut self, name: &str) -> Result<(), PluginError> {
        let pos = self
            .loaded
            .iter()
            .position(|p| p.name() == name)
            .ok_or_else(|| PluginError::NotLoaded {
                name: name.to_string(),
            })?;
        let dependent = self
            .loaded
            .iter()
            .find(|p| p.depends().iter().any(|d| *d == name));
        if let Some(dependent) = dependent {
            return Err(PluginError::StillRequired {
                name: name.to_string(),
                dependent: dependent.name().to_string(),
            });
        }
        let plugin = self.loaded.remove(pos);
        self.teardown(plugin.as_ref());
        Ok(())
    }

    /// Tear every plugin down in reverse load order
    pub fn shutdown(&mut self) {
        while let Some(plugin) = self.loaded.pop() {
            self.teardown(plugin.as_ref());
        }
    }

    fn teardown(&self, plugin: &dyn Plugin) {
        plugin.teardown(&self.core);
        debug!("Unloaded plugin {}", plugin.name());
        self.core.events().emit_with(
            event_bus::PLUGIN_UNLOADED,
            EventPayload::Name(plugin.name().to_string()),
        );
    }
}

impl Drop for PluginManager {
    fn drop(&mut self) {
        if !self.loaded.is_empty() {
            warn!(
                "Plugin manager dropped with {} plugins loaded, tearing them down",
                self.loaded.len()
            );
            self.shutdown();
        }
    }
}

impl std::fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginManager")
            .field("loaded", &self.loaded_names())
            .field("disabled", &self.disabled)
            .finish()
    }
}
