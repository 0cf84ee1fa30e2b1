//! Tool definitions
//!
//! This module provides:
//! - Tool shapes and geometry
//! - Spindle and feed settings
//! - The filter chain a tool contributes to every toolpath it produces

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::toolpath::ToolpathFilter;
use super::{AppValues, CollectionItem, EntityKind, FieldReader};
use crate::error::EntityError;

/// Tool shapes for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ToolShape {
    /// Flat end mill
    FlatBottom,
    /// Ball end mill / ball nose
    BallNose,
    /// Corner radius end mill
    Toroidal,
}

impl ToolShape {
    /// Get all tool shapes
    pub fn all() -> &'static [ToolShape] {
        &[ToolShape::FlatBottom, ToolShape::BallNose, ToolShape::Toroidal]
    }
}

impl std::fmt::Display for ToolShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FlatBottom => write!(f, "flat_bottom"),
            Self::BallNose => write!(f, "ball_nose"),
            Self::Toroidal => write!(f, "toroidal"),
        }
    }
}

impl FromStr for ToolShape {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolShape::all()
            .iter()
            .copied()
            .find(|shape| shape.to_string() == s)
            .ok_or(())
    }
}

/// Spindle settings of a tool
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpindleSettings {
    /// Spindle speed in RPM
    pub speed: f64,
    /// Wait for the spindle to spin up before cutting
    pub spin_up_enabled: bool,
    /// Spin-up delay in seconds
    pub spin_up_delay: f64,
}

impl Default for SpindleSettings {
    fn default() -> Self {
        Self {
            speed: 1000.0,
            spin_up_enabled: true,
            spin_up_delay: 3.0,
        }
    }
}

/// Geometry handed to path generators
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolGeometry {
    /// Tool shape
    pub shape: ToolShape,
    /// Cutting radius in mm
    pub radius: f64,
    /// Corner radius in mm (toroidal tools only)
    pub minor_radius: f64,
    /// Usable cutting height in mm
    pub height: f64,
}

/// Default feed rate in mm/min
pub const DEFAULT_FEED: f64 = 200.0;

/// Default usable tool height in mm
pub const DEFAULT_HEIGHT: f64 = 10.0;

/// Complete tool definition
#[derive(Debug, Clone, PartialEq)]
pub struct Tool {
    name: String,
    /// Tool number used for tool changes
    pub tool_id: u32,
    /// Tool shape
    pub shape: ToolShape,
    /// Cutting radius in mm
    pub radius: f64,
    /// Corner radius in mm (toroidal tools only)
    pub toroidal_radius: Option<f64>,
    /// Usable cutting height in mm
    pub height: f64,
    /// Feed rate in mm/min
    pub feed: f64,
    /// Spindle settings
    pub spindle: SpindleSettings,
    app: AppValues,
}

impl Tool {
    /// Create a new tool with basic properties
    pub fn new(name: impl Into<String>, tool_id: u32, shape: ToolShape, radius: f64) -> Self {
        Self {
            name: name.into(),
            tool_id,
            shape,
            radius,
            toroidal_radius: None,
            height: DEFAULT_HEIGHT,
            feed: DEFAULT_FEED,
            spindle: SpindleSettings::default(),
            app: AppValues::new(),
        }
    }

    /// Build a tool from a specification entry
    ///
    /// Requires `shape` and either `radius` or `diameter`.
    pub(crate) fn from_fields(fields: &FieldReader<'_>) -> Result<Self, EntityError> {
        let shape: ToolShape = fields
            .optional_enum("shape")?
            .ok_or_else(|| fields.missing("shape"))?;
        let radius = match (fields.optional_f64("radius")?, fields.optional_f64("diameter")?) {
            (Some(radius), _) => radius,
            (None, Some(diameter)) => diameter / 2.0,
            (None, None) => return Err(fields.missing("radius")),
        };
        if radius <= 0.0 {
            return Err(fields.invalid("radius", "must be positive"));
        }
        let toroidal_radius = fields.optional_f64("toroidal_radius")?;
        if shape == ToolShape::Toroidal {
            match toroidal_radius {
                None => return Err(fields.missing("toroidal_radius")),
                Some(minor) if minor <= 0.0 || minor > radius => {
                    return Err(fields.invalid("toroidal_radius", "must be in (0, radius]"))
                }
                Some(_) => {}
            }
        }
        let feed = fields.optional_f64("feed")?.unwrap_or(DEFAULT_FEED);
        if feed <= 0.0 {
            return Err(fields.invalid("feed", "must be positive"));
        }

        let mut spindle = SpindleSettings::default();
        if let Some(spec) = fields.nested("spindle")? {
            if let Some(speed) = spec.optional_f64("speed")? {
                spindle.speed = speed;
            }
            if let Some(enabled) = spec.optional_bool("spin_up_enabled")? {
                spindle.spin_up_enabled = enabled;
            }
            if let Some(delay) = spec.optional_f64("spin_up_delay")? {
                spindle.spin_up_delay = delay;
            }
        }

        Ok(Self {
            name: fields.entity().to_string(),
            tool_id: fields.optional_u32("tool_id")?.unwrap_or(1),
            shape,
            radius,
            toroidal_radius: toroidal_radius.filter(|_| shape == ToolShape::Toroidal),
            height: fields.optional_f64("height")?.unwrap_or(DEFAULT_HEIGHT),
            feed,
            spindle,
            app: AppValues::new(),
        })
    }

    /// Cutting diameter in mm
    pub fn diameter(&self) -> f64 {
        self.radius * 2.0
    }

    /// Geometry for path generators
    pub fn tool_geometry(&self) -> ToolGeometry {
        ToolGeometry {
            shape: self.shape,
            radius: self.radius,
            minor_radius: match self.shape {
                ToolShape::FlatBottom => 0.0,
                ToolShape::BallNose => self.radius,
                ToolShape::Toroidal => self.toroidal_radius.unwrap_or(0.0),
            },
            height: self.height,
        }
    }

    /// The filters this tool declares for every toolpath it produces
    pub fn toolpath_filters(&self) -> Vec<ToolpathFilter> {
        let mut filters = vec![
            ToolpathFilter::SelectTool(self.tool_id),
            ToolpathFilter::SpindleSpeed(self.spindle.speed),
            ToolpathFilter::SpindleEnabled(true),
        ];
        if self.spindle.spin_up_enabled {
            filters.push(ToolpathFilter::SpinUpDelay(self.spindle.spin_up_delay));
        }
        filters.push(ToolpathFilter::Feedrate(self.feed));
        filters
    }
}

impl CollectionItem for Tool {
    const KIND: EntityKind = EntityKind::Tool;

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
