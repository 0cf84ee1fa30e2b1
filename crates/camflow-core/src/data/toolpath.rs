//! Toolpaths
//!
//! A toolpath is the immutable result of generating a task: the moves, the tool that cuts
//! them and the filters an exporter applies around them.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::{AppValues, CollectionItem, EntityKind, Tool};
use crate::geometry::Point;

/// Kind of a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    /// Positioning move at rapid speed
    Rapid,
    /// Cutting move at feed rate
    Cut,
}

/// One straight move to an absolute position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Move {
    /// Move kind
    pub kind: MoveKind,
    /// Target position
    pub position: Point,
}

impl Move {
    /// Rapid move to `position`
    pub fn rapid(position: Point) -> Self {
        Self {
            kind: MoveKind::Rapid,
            position,
        }
    }

    /// Cutting move to `position`
    pub fn cut(position: Point) -> Self {
        Self {
            kind: MoveKind::Cut,
            position,
        }
    }
}

/// Machine settings applied around the moves of a toolpath
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum ToolpathFilter {
    /// Tool change
    SelectTool(u32),
    /// Spindle speed in RPM
    SpindleSpeed(f64),
    /// Spindle on or off
    SpindleEnabled(bool),
    /// Dwell after starting the spindle, in seconds
    SpinUpDelay(f64),
    /// Cutting feed rate in mm/min
    Feedrate(f64),
    /// Height for rapid moves between cuts
    SafetyHeight(f64),
    /// Feed rate for vertical plunges in mm/min
    PlungeFeedrate(f64),
}

/// A generated toolpath
#[derive(Debug, Clone)]
pub struct Toolpath {
    name: String,
    moves: Rc<[Move]>,
    tool: Rc<Tool>,
    filters: Vec<ToolpathFilter>,
    app: AppValues,
}

impl Toolpath {
    /// Create a toolpath; its name is assigned when it is added to a collection
    pub fn new(moves: Vec<Move>, tool: Rc<Tool>, filters: Vec<ToolpathFilter>) -> Self {
        Self {
            name: String::new(),
            moves: moves.into(),
            tool,
            filters,
            app: AppValues::new(),
        }
    }

    /// The moves, in machining order
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// The tool cutting this toolpath
    pub fn tool(&self) -> &Rc<Tool> {
        &self.tool
    }

    /// Filters applied around the moves
    pub fn filters(&self) -> &[ToolpathFilter] {
        &self.filters
    }

    /// Number of cutting moves
    pub fn cut_count(&self) -> usize {
        self.moves.iter().filter(|m| m.kind == MoveKind::Cut).count()
    }
}

impl CollectionItem for Toolpath {
    const KIND: EntityKind = EntityKind::Toolpath;

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
