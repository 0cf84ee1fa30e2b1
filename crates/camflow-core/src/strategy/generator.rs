//! Generator contracts a strategy implements.

use std::rc::Rc;

use crate::core::Core;
use crate::data::{Boundary, Model, Move, Process, Tool, ToolGeometry, Toolpath};
use crate::geometry::{BoundBox, Point};
use crate::types::ProgressCallback;

/// Lines the tool centre follows, in machining order
///
/// Each line is a polyline at a constant layer height; the path generator decides the actual
/// height of every point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MotionGrid {
    lines: Vec<Vec<Point>>,
}

impl MotionGrid {
    /// Create a grid from lines
    pub fn new(lines: Vec<Vec<Point>>) -> Self {
        Self { lines }
    }

    /// The lines
    pub fn lines(&self) -> &[Vec<Point>] {
        &self.lines
    }

    /// Total number of points
    pub fn point_count(&self) -> usize {
        self.lines.iter().map(Vec::len).sum()
    }

    /// True if there is nothing to follow
    pub fn is_empty(&self) -> bool {
        self.lines.iter().all(Vec::is_empty)
    }
}

/// Turns a motion grid into moves around the collision models
pub trait PathGenerator {
    /// Generate the moves
    ///
    /// `progress` receives the fraction done; when it returns `true` generation stops and the
    /// moves produced so far are returned.
    fn generate(
        &self,
        tool: &ToolGeometry,
        models: &[Rc<Model>],
        grid: &MotionGrid,
        min_z: f64,
        max_z: f64,
        progress: Option<&ProgressCallback>,
    ) -> Vec<Move>;
}

/// A process strategy
pub trait ProcessStrategy {
    /// Plan generation for `process` inside `bounds`
    ///
    /// `None` means the strategy rejected the request and already logged why.
    fn plan(
        &self,
        process: &Process,
        tool_radius: f64,
        bounds: &BoundBox,
    ) -> Option<(Box<dyn PathGenerator>, MotionGrid)>;
}

/// The resolved references of a task
///
/// Built from the task's names right before it runs; a reference that does not resolve is
/// `None` (or left out of `collision_models`).
#[derive(Debug, Clone, Default)]
pub struct TaskEnvironment {
    /// The tool
    pub tool: Option<Rc<Tool>>,
    /// The process
    pub process: Option<Rc<Process>>,
    /// The boundary
    pub bounds: Option<Rc<Boundary>>,
    /// Collision models
    pub collision_models: Vec<Rc<Model>>,
}

/// A task strategy
pub trait TaskRunner {
    /// Run a task; `None` means "no result" and the reason was logged
    fn run(
        &self,
        core: &Core,
        environment: &TaskEnvironment,
        progress: Option<ProgressCallback>,
    ) -> Option<Toolpath>;
}

/// Generator of a strategy record
#[derive(Clone)]
pub enum StrategyGenerator {
    /// A process strategy
    Process(Rc<dyn ProcessStrategy>),
    /// A task strategy
    Task(Rc<dyn TaskRunner>),
}

impl StrategyGenerator {
    /// The process strategy, if this is one
    pub fn as_process(&self) -> Option<&Rc<dyn ProcessStrategy>> {
        match self {
            StrategyGenerator::Process(strategy) => Some(strategy),
            StrategyGenerator::Task(_) => None,
        }
    }

    /// The task runner, if this is one
    pub fn as_task(&self) -> Option<&Rc<dyn TaskRunner>> {
        match self {
            StrategyGenerator::Task(runner) => Some(runner),
            StrategyGenerator::Process(_) => None,
        }
    }
}

impl std::fmt::Debug for StrategyGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StrategyGenerator::Process(_) => f.write_str("StrategyGenerator::Process"),
            StrategyGenerator::Task(_) => f.write_str("StrategyGenerator::Task"),
        }
    }
}
