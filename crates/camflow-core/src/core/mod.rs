//! The kernel context
//!
//! One [`Core`] is constructed at start-up and handed to every plugin. It owns the event
//! bus, the extension registries, the namespace and the strategy registry; nothing in the
//! kernel is process-wide.

mod execution;

pub use execution::*;

use std::rc::Rc;

use crate::collections::Collection;
use crate::data::{CollectionItem, Tool, ToolpathFilter};
use crate::error::{CollectionError, RegistryError};
use crate::event_bus::{self, EventBus, EventBusConfig, EventPayload};
use crate::extensions::{ChainRegistry, SectionRegistry};
use crate::namespace::Namespace;
use crate::strategy::{StrategyRecord, StrategyRegistry};

/// Chain every tool's filters pass through before a toolpath is built
///
/// Functions registered on it receive a [`ToolpathFilterRequest`].
pub const TOOLPATH_FILTERS_CHAIN: &str = "toolpath_filters";

/// Argument of the [`TOOLPATH_FILTERS_CHAIN`]
#[derive(Debug, Clone)]
pub struct ToolpathFilterRequest {
    /// The tool the toolpath is cut with
    pub tool: Rc<Tool>,
    /// Filters collected so far; chain functions append or edit
    pub filters: Vec<ToolpathFilter>,
}

/// Kernel context shared by all plugins
pub struct Core {
    events: Rc<EventBus>,
    sections: SectionRegistry,
    chains: ChainRegistry,
    namespace: Namespace,
    strategies: StrategyRegistry,
}

impl Core {
    /// Create a context with a default event bus
    pub fn new() -> Self {
        Self::with_event_config(EventBusConfig::default())
    }

    /// Create a context with a configured event bus
    pub fn with_event_config(config: EventBusConfig) -> Self {
        Self {
            events: Rc::new(EventBus::with_config(config)),
            sections: SectionRegistry::new(),
            chains: ChainRegistry::new(),
            namespace: Namespace::new(),
            strategies: StrategyRegistry::new(),
        }
    }

    /// The event bus
    pub fn events(&self) -> &Rc<EventBus> {
        &self.events
    }

    /// Extension sections
    pub fn sections(&self) -> &SectionRegistry {
        &self.sections
    }

    /// Call chains
    pub fn chains(&self) -> &ChainRegistry {
        &self.chains
    }

    /// Published capabilities
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Registered strategies
    pub fn strategies(&self) -> &StrategyRegistry {
        &self.strategies
    }

    /// Register a strategy and announce `<kind>-strategy-list-changed`
    pub fn register_strategy(&self, kind: &str, record: StrategyRecord) -> Result<(), RegistryError> {
        let name = record.name.clone();
        self.strategies.register(kind, record)?;
        self.events.emit_with(
            &event_bus::strategy_list_changed(kind),
            EventPayload::Name(name),
        );
        Ok(())
    }

    /// Unregister a strategy and announce `<kind>-strategy-list-changed`
    ///
    /// Collections react to the announcement by purging entities bound to the strategy.
    pub fn unregister_strategy(
        &self,
        kind: &str,
        name: &str,
    ) -> Result<Rc<StrategyRecord>, RegistryError> {
        let record = self.strategies.unregister(kind, name)?;
        self.events.emit_with(
            &event_bus::strategy_list_changed(kind),
            EventPayload::Name(name.to_string()),
        );
        Ok(record)
    }

    /// The collection of `T`, as published by its plugin
    pub fn collection<T: CollectionItem>(&self) -> Result<Rc<Collection<T>>, CollectionError> {
        let key = T::KIND.collection_key();
        self.namespace
            .get::<Collection<T>>(key)
            .ok_or_else(|| CollectionError::Unavailable {
                collection: key.to_string(),
            })
    }

    /// Filters of a toolpath cut with `tool`
    ///
    /// Starts with the tool's own filters and passes them through the
    /// [`TOOLPATH_FILTERS_CHAIN`].
    pub fn toolpath_filters(&self, tool: &Rc<Tool>) -> Vec<ToolpathFilter> {
        let mut request = ToolpathFilterRequest {
            tool: tool.clone(),
            filters: tool.toolpath_filters(),
        };
        self.chains.call_chain(TOOLPATH_FILTERS_CHAIN, &mut request);
        request.filters
    }
}

impl Default for Core {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Core {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Core")
            .field("namespace", &self.namespace)
            .field("strategies", &self.strategies)
            .finish()
    }
}
