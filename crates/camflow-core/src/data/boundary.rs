//! Boundaries
//!
//! A boundary describes the region a task may machine, either in absolute coordinates or as
//! margins around a set of models, and how the tool relates to its edge.

use std::rc::Rc;
use std::str::FromStr;

use super::{AppValues, CollectionItem, EntityKind, FieldReader, Model};
use crate::error::EntityError;
use crate::geometry::{combined_extent, BoundBox, Point};

/// How `lower` and `upper` are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundsSpecification {
    /// Absolute machine coordinates
    Absolute,
    /// Distances added around the extent of the reference models
    Margins,
}

impl FromStr for BoundsSpecification {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "absolute" => Ok(Self::Absolute),
            "margins" => Ok(Self::Margins),
            _ => Err(()),
        }
    }
}

/// Where the tool may go relative to the xy edge of the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolBoundary {
    /// Tool centre moves along the edge
    #[default]
    Along,
    /// Tool stays completely inside
    Inside,
    /// Tool may reach completely outside
    Outside,
}

impl FromStr for ToolBoundary {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "along" => Ok(Self::Along),
            "inside" => Ok(Self::Inside),
            "outside" => Ok(Self::Outside),
            _ => Err(()),
        }
    }
}

/// A boundary
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    name: String,
    /// Interpretation of `lower`/`upper`
    pub specification: BoundsSpecification,
    /// Lower corner, or margins below the models
    pub lower: Point,
    /// Upper corner, or margins above the models
    pub upper: Point,
    /// Models the margins refer to; empty means "the task's collision models"
    pub reference_models: Vec<String>,
    /// Tool relation to the xy edge
    pub tool_boundary: ToolBoundary,
    app: AppValues,
}

impl Boundary {
    /// An absolute boundary
    pub fn absolute(name: impl Into<String>, lower: Point, upper: Point) -> Self {
        Self {
            name: name.into(),
            specification: BoundsSpecification::Absolute,
            lower,
            upper,
            reference_models: Vec::new(),
            tool_boundary: ToolBoundary::Along,
            app: AppValues::new(),
        }
    }

    /// A margin boundary around models
    pub fn margins(name: impl Into<String>, lower: Point, upper: Point) -> Self {
        Self {
            specification: BoundsSpecification::Margins,
            ..Self::absolute(name, lower, upper)
        }
    }

    /// Build a boundary from a specification entry
    ///
    /// `specification` defaults to `margins` (with zero margins), matching a boundary that
    /// simply wraps its models.
    pub(crate) fn from_fields(fields: &FieldReader<'_>) -> Result<Self, EntityError> {
        let specification = fields
            .optional_enum("specification")?
            .unwrap_or(BoundsSpecification::Margins);
        let origin = Point::origin();
        let (lower, upper) = match specification {
            BoundsSpecification::Absolute => (
                fields
                    .optional_point("lower")?
                    .ok_or_else(|| fields.missing("lower"))?,
                fields
                    .optional_point("upper")?
                    .ok_or_else(|| fields.missing("upper"))?,
            ),
            BoundsSpecification::Margins => (
                fields.optional_point("lower")?.unwrap_or(origin),
                fields.optional_point("upper")?.unwrap_or(origin),
            ),
        };
        Ok(Self {
            name: fields.entity().to_string(),
            specification,
            lower,
            upper,
            reference_models: fields.string_list("reference_models")?,
            tool_boundary: fields.optional_enum("tool_boundary")?.unwrap_or_default(),
            app: AppValues::new(),
        })
    }

    /// The absolute box a tool of `tool_radius` may move in
    ///
    /// `models` are the models margins refer to. Returns `None` when margins have nothing to
    /// refer to or when the resulting box is inverted in any axis.
    pub fn get_absolute_limits(&self, tool_radius: f64, models: &[Rc<Model>]) -> Option<BoundBox> {
        let (mut low, mut high) = match self.specification {
            BoundsSpecification::Absolute => (self.lower, self.upper),
            BoundsSpecification::Margins => {
                let extent = combined_extent(models.iter().map(|m| m.mesh()))?;
                (
                    extent.lower - self.lower.coords,
                    extent.upper + self.upper.coords,
                )
            }
        };
        let offset = match self.tool_boundary {
            ToolBoundary::Along => 0.0,
            ToolBoundary::Inside => tool_radius,
            ToolBoundary::Outside => -tool_radius,
        };
        for axis in 0..2 {
            low[axis] += offset;
            high[axis] -= offset;
        }
        let bound = BoundBox::new(low, high);
        bound.is_valid().then_some(bound)
    }
}

impl CollectionItem for Boundary {
    const KIND: EntityKind = EntityKind::Boundary;

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
