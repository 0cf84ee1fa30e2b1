//! Slice strategy
//!
//! Removes material layer by layer: every layer is a grid of parallel lines across the
//! bound box, and every point of a line is lifted onto the collision models underneath the
//! tool.

use std::rc::Rc;

use camflow_core::{
    BoundBox, CollectionItem, Core, Model, Move, MotionGrid, PathGenerator, Plugin, PluginError,
    Point, Process, ProcessStrategy, ProgressCallback, StrategyRecord, ToolGeometry, ToolShape,
    PROCESS_KIND,
};
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, error};

use crate::error::ParameterError;

/// Name of the slice strategy
pub const SLICE_STRATEGY: &str = "slice";

/// Direction of the grid lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridDirection {
    /// Lines parallel to the x axis
    X,
    /// Lines parallel to the y axis
    Y,
}

/// Order in which lines are cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MillingStyle {
    /// Alternate direction on every line
    Ignore,
    /// Every line in positive direction
    Climb,
    /// Every line in negative direction
    Conventional,
}

/// Defaults for processes that leave a slice parameter out
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceDefaults {
    /// Layer depth in mm
    pub step_down: f64,
    /// Fraction of the tool diameter neighbouring lines overlap
    pub overlap: f64,
}

impl Default for SliceDefaults {
    fn default() -> Self {
        Self {
            step_down: 1.0,
            overlap: 0.1,
        }
    }
}

/// Validated parameters of one slice request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceSettings {
    /// Layer depth in mm
    pub step_down: f64,
    /// Line overlap fraction
    pub overlap: f64,
    /// Line direction
    pub direction: GridDirection,
    /// Line order
    pub milling_style: MillingStyle,
    /// Material left on the models in mm
    pub material_allowance: f64,
}

/// Numeric parameter `name`, or `default` when the process leaves it out
fn number(process: &Process, name: &str, default: f64) -> Result<f64, ParameterError> {
    match process.parameters.get(name) {
        None => Ok(default),
        Some(value) => value.as_f64().ok_or_else(|| ParameterError::InvalidValue {
            name: name.to_string(),
            reason: format!("expected a number, got {}", value),
        }),
    }
}

/// Text parameter `name`, or `default` when the process leaves it out
fn text<'p>(process: &'p Process, name: &str, default: &'p str) -> Result<&'p str, ParameterError> {
    match process.parameters.get(name) {
        None => Ok(default),
        Some(value) => value.as_str().ok_or_else(|| ParameterError::InvalidValue {
            name: name.to_string(),
            reason: format!("expected a string, got {}", value),
        }),
    }
}

impl SliceSettings {
    /// Read and validate the parameters of `process`
    ///
    /// Absent parameters take their defaults; present ones of the wrong type are rejected.
    pub fn from_process(process: &Process, defaults: &SliceDefaults) -> Result<Self, ParameterError> {
        let step_down = number(process, "step_down", defaults.step_down)?;
        if step_down <= 0.0 {
            return Err(ParameterError::InvalidValue {
                name: "step_down".to_string(),
                reason: "must be positive".to_string(),
            });
        }
        let overlap = number(process, "overlap", defaults.overlap)?;
        if !(0.0..1.0).contains(&overlap) {
            return Err(ParameterError::OutOfRange {
                name: "overlap".to_string(),
                value: overlap,
                min: 0.0,
                max: 1.0,
            });
        }
        let direction = match text(process, "grid_direction", "x")? {
            "x" => GridDirection::X,
            "y" => GridDirection::Y,
            other => {
                return Err(ParameterError::InvalidValue {
                    name: "grid_direction".to_string(),
                    reason: format!("unknown direction '{}'", other),
                })
            }
        };
        let milling_style = match text(process, "milling_style", "ignore")? {
            "ignore" => MillingStyle::Ignore,
            "climb" => MillingStyle::Climb,
            "conventional" => MillingStyle::Conventional,
            other => {
                return Err(ParameterError::InvalidValue {
                    name: "milling_style".to_string(),
                    reason: format!("unknown style '{}'", other),
                })
            }
        };
        let material_allowance = number(process, "material_allowance", 0.0)?;
        if material_allowance < 0.0 {
            return Err(ParameterError::InvalidValue {
                name: "material_allowance".to_string(),
                reason: "must not be negative".to_string(),
            });
        }
        Ok(Self {
            step_down,
            overlap,
            direction,
            milling_style,
            material_allowance,
        })
    }
}

/// Heights of the layers from top to bottom; the last one is always `bottom`
pub fn layer_heights(top: f64, bottom: f64, step_down: f64) -> Vec<f64> {
    let mut layers = Vec::new();
    let mut z = top - step_down;
    while z > bottom + f64::EPSILON {
        layers.push(z);
        z -= step_down;
    }
    layers.push(bottom);
    layers
}

/// Offsets of the lines from `start` to `end`; the last one is always `end`
fn line_offsets(start: f64, end: f64, step: f64) -> Vec<f64> {
    let mut offsets = vec![start];
    let mut value = start + step;
    while value < end - f64::EPSILON {
        offsets.push(value);
        value += step;
    }
    if end > start {
        offsets.push(end);
    }
    offsets
}

/// The `slice` process strategy
#[derive(Debug, Clone, Default)]
pub struct ProcessStrategySlice {
    defaults: SliceDefaults,
}

impl ProcessStrategySlice {
    /// Create the strategy with defaults for omitted parameters
    pub fn new(defaults: SliceDefaults) -> Self {
        Self { defaults }
    }

    /// Build the motion grid for validated settings
    pub fn motion_grid(settings: &SliceSettings, tool_radius: f64, bounds: &BoundBox) -> MotionGrid {
        let stepover = 2.0 * tool_radius * (1.0 - settings.overlap);
        let sample = tool_radius.max(0.1);
        let (across, along) = match settings.direction {
            GridDirection::X => (1, 0),
            GridDirection::Y => (0, 1),
        };
        let rows = line_offsets(bounds.lower[across], bounds.upper[across], stepover);
        let columns = line_offsets(bounds.lower[along], bounds.upper[along], sample);

        let mut lines = Vec::new();
        for z in layer_heights(bounds.upper.z, bounds.lower.z, settings.step_down) {
            for (index, row) in rows.iter().enumerate() {
                let forward = match settings.milling_style {
                    MillingStyle::Ignore => index % 2 == 0,
                    MillingStyle::Climb => true,
                    MillingStyle::Conventional => false,
                };
                let mut line: Vec<Point> = columns
                    .iter()
                    .map(|column| {
                        let mut point = Point::new(0.0, 0.0, z);
                        point[across] = *row;
                        point[along] = *column;
                        point
                    })
                    .collect();
                if !forward {
                    line.reverse();
                }
                lines.push(line);
            }
        }
        MotionGrid::new(lines)
    }
}

impl ProcessStrategy for ProcessStrategySlice {
    fn plan(
        &self,
        process: &Process,
        tool_radius: f64,
        bounds: &BoundBox,
    ) -> Option<(Box<dyn PathGenerator>, MotionGrid)> {
        let settings = match SliceSettings::from_process(process, &self.defaults) {
            Ok(settings) => settings,
            Err(e) => {
                error!("Process '{}' cannot be sliced: {}", process.name(), e);
                return None;
            }
        };
        if tool_radius <= 0.0 {
            error!("Slicing needs a tool with a positive radius");
            return None;
        }
        let grid = Self::motion_grid(&settings, tool_radius, bounds);
        debug!(
            "Slice grid with {} lines and {} points",
            grid.lines().len(),
            grid.point_count()
        );
        let generator = DropCutter {
            material_allowance: settings.material_allowance,
        };
        Some((Box::new(generator), grid))
    }
}

/// Path generator lifting grid points onto the collision models
#[derive(Debug, Clone, Copy, Default)]
pub struct DropCutter {
    /// Material left on the models in mm
    pub material_allowance: f64,
}

/// Rings sampled around the tool centre, as fractions of the radius
const SAMPLE_RINGS: [f64; 3] = [0.0, 0.5, 1.0];

/// Sample points per ring
const SAMPLES_PER_RING: usize = 8;

impl DropCutter {
    /// Lowest tool tip height touching no model around (x, y), if any model is underneath
    pub fn contact_height(&self, tool: &ToolGeometry, models: &[Rc<Model>], x: f64, y: f64) -> Option<f64> {
        let mut highest: Option<f64> = None;
        for fraction in SAMPLE_RINGS {
            let distance = tool.radius * fraction;
            let samples = if fraction == 0.0 { 1 } else { SAMPLES_PER_RING };
            for step in 0..samples {
                let angle = std::f64::consts::TAU * step as f64 / samples as f64;
                let offset = Vector2::new(angle.cos(), angle.sin()) * distance;
                let surface = models
                    .iter()
                    .filter_map(|m| m.mesh().height_at(x + offset.x, y + offset.y))
                    .reduce(f64::max);
                if let Some(surface) = surface {
                    let tip = surface - tip_lift(tool, distance);
                    highest = Some(highest.map_or(tip, |h| h.max(tip)));
                }
            }
        }
        highest.map(|h| h + self.material_allowance)
    }
}

/// How far the tool's cutting surface at `distance` from the axis sits above its tip
fn tip_lift(tool: &ToolGeometry, distance: f64) -> f64 {
    match tool.shape {
        ToolShape::FlatBottom => 0.0,
        ToolShape::BallNose => {
            let r = tool.radius;
            r - (r * r - distance * distance).max(0.0).sqrt()
        }
        ToolShape::Toroidal => {
            let minor = tool.minor_radius;
            let flat = tool.radius - minor;
            if distance <= flat {
                0.0
            } else {
                let d = distance - flat;
                minor - (minor * minor - d * d).max(0.0).sqrt()
            }
        }
    }
}

impl PathGenerator for DropCutter {
    fn generate(
        &self,
        tool: &ToolGeometry,
        models: &[Rc<Model>],
        grid: &MotionGrid,
        min_z: f64,
        max_z: f64,
        progress: Option<&ProgressCallback>,
    ) -> Vec<Move> {
        let total = grid.lines().len();
        let mut moves = Vec::new();
        for (index, line) in grid.lines().iter().enumerate() {
            let Some(first) = line.first() else {
                continue;
            };
            moves.push(Move::rapid(Point::new(first.x, first.y, max_z)));
            for point in line {
                let floor = point.z.max(min_z);
                let z = self
                    .contact_height(tool, models, point.x, point.y)
                    .map_or(floor, |contact| contact.max(floor))
                    .min(max_z);
                moves.push(Move::cut(Point::new(point.x, point.y, z)));
            }
            if let Some(last) = moves.last().copied() {
                moves.push(Move::rapid(Point::new(last.position.x, last.position.y, max_z)));
            }
            if let Some(callback) = progress {
                if callback((index + 1) as f64 / total as f64) {
                    debug!("Path generation stopped after {} of {} lines", index + 1, total);
                    break;
                }
            }
        }
        moves
    }
}

/// Plugin registering the `slice` strategy
#[derive(Debug, Clone, Default)]
pub struct SlicePlugin {
    defaults: SliceDefaults,
}

impl SlicePlugin {
    /// Create the plugin
    pub fn new(defaults: SliceDefaults) -> Self {
        Self { defaults }
    }
}

impl Plugin for SlicePlugin {
    fn name(&self) -> &str {
        "ProcessStrategySlice"
    }

    fn depends(&self) -> &[&'static str] {
        &["Processes"]
    }

    fn setup(&self, core: &Rc<Core>) -> Result<(), PluginError> {
        let record = StrategyRecord::process(
            SLICE_STRATEGY,
            "Slice removal",
            Rc::new(ProcessStrategySlice::new(self.defaults)),
        )
        .with_parameter("overlap", json!(self.defaults.overlap))
        .with_parameter("step_down", json!(self.defaults.step_down))
        .with_parameter("grid_direction", json!("x"))
        .with_parameter("milling_style", json!("ignore"))
        .with_parameter("material_allowance", json!(0.0))
        .with_weight(10);
        core.register_strategy(PROCESS_KIND, record)
            .map_err(|e| PluginError::SetupFailed {
                name: self.name().to_string(),
                reason: e.to_string(),
            })
    }

    fn teardown(&self, core: &Core) {
        if let Err(e) = core.unregister_strategy(PROCESS_KIND, SLICE_STRATEGY) {
            debug!("Slice strategy already gone: {}", e);
        }
    }
}
