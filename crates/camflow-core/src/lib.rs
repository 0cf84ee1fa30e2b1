//! # Camflow Core
//!
//! The kernel of Camflow, a declarative CAM execution engine.
//! Provides the event bus, weighted extension points, the namespace of published
//! capabilities, the strategy registry, entity collections and the plugin lifecycle.
//!
//! Everything is single-threaded and owned by one explicitly constructed [`Core`].

pub mod collections;
pub mod core;
pub mod data;
pub mod error;
pub mod event_bus;
pub mod extensions;
pub mod geometry;
pub mod namespace;
pub mod plugins;
pub mod strategy;
pub mod types;

pub use crate::core::{Core, ToolpathFilterRequest, TOOLPATH_FILTERS_CHAIN};

pub use collections::{non_conflicting_name, Collection, MoveDirection};

pub use data::{
    Boundary, BoundsSpecification, CollectionItem, Entity, EntityKind, Model, ModelSource, Move,
    MoveKind, ParameterMap, Process, SpindleSettings, Task, Tool, ToolBoundary, ToolGeometry,
    ToolShape, Toolpath, ToolpathFilter,
};

pub use error::{CollectionError, EntityError, Error, PluginError, RegistryError, Result};

// Re-export event bus for convenience
pub use event_bus::{EmitOutcome, EventBus, EventBusConfig, EventHandler, EventPayload, SubscriptionId};

pub use extensions::{ChainFn, ChainRegistry, Contribution, ContributionOptions, SectionRegistry};

pub use geometry::{BoundBox, Mesh, Point, Triangle};

pub use namespace::Namespace;

pub use plugins::{collection_plugins, CollectionPlugin, Plugin, PluginManager};

pub use strategy::{
    MotionGrid, ParameterControls, ParameterState, PathGenerator, ProcessStrategy,
    StrategyGenerator, StrategyRecord, StrategyRegistry, TaskEnvironment, TaskRunner,
    PROCESS_KIND, TASK_KIND,
};

// Re-export type aliases for convenience
pub use types::{shared, shared_any, ProgressCallback, Shared, SharedAny, SharedVec};
