//! Geometry primitives shared by entities and strategies.
//!
//! Only what the kernel needs to describe its inputs: triangle meshes for models and the
//! axis-aligned bound box that constrains generation.

use nalgebra::{Point3, Vector3};
use std::io::{Read, Seek};

/// Point in machine coordinates (mm)
pub type Point = Point3<f64>;

/// Offset in machine coordinates (mm)
pub type Offset = Vector3<f64>;

/// Axis-aligned box, derived on every generation request and never stored
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundBox {
    /// Lower corner.
    pub lower: Point,
    /// Upper corner.
    pub upper: Point,
}

impl BoundBox {
    /// Create a box from two corners without normalising them
    pub fn new(lower: Point, upper: Point) -> Self {
        Self { lower, upper }
    }

    /// A box is valid if no lower coordinate exceeds its upper counterpart
    pub fn is_valid(&self) -> bool {
        (0..3).all(|axis| self.lower[axis] <= self.upper[axis])
    }

    /// Size along each axis
    pub fn size(&self) -> Offset {
        self.upper - self.lower
    }

    /// Smallest box containing both
    pub fn union(&self, other: &BoundBox) -> BoundBox {
        BoundBox {
            lower: Point::new(
                self.lower.x.min(other.lower.x),
                self.lower.y.min(other.lower.y),
                self.lower.z.min(other.lower.z),
            ),
            upper: Point::new(
                self.upper.x.max(other.upper.x),
                self.upper.y.max(other.upper.y),
                self.upper.z.max(other.upper.z),
            ),
        }
    }

    /// Whether the xy projection of `point` lies inside the box
    pub fn contains_xy(&self, point: &Point) -> bool {
        point.x >= self.lower.x
            && point.x <= self.upper.x
            && point.y >= self.lower.y
            && point.y <= self.upper.y
    }
}

/// A triangle of a model surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Corner points.
    pub vertices: [Point; 3],
}

impl Triangle {
    /// Create a triangle from three corners
    pub fn new(a: Point, b: Point, c: Point) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    /// Bounding box of the triangle
    pub fn bounds(&self) -> BoundBox {
        let [a, b, c] = self.vertices;
        BoundBox::new(
            Point::new(a.x.min(b.x).min(c.x), a.y.min(b.y).min(c.y), a.z.min(b.z).min(c.z)),
            Point::new(a.x.max(b.x).max(c.x), a.y.max(b.y).max(c.y), a.z.max(b.z).max(c.z)),
        )
    }

    /// Height of the triangle's plane above (x, y), if (x, y) lies inside its projection
    ///
    /// Vertical triangles have no usable height and yield `None`.
    pub fn height_at(&self, x: f64, y: f64) -> Option<f64> {
        let [a, b, c] = self.vertices;
        let det = (b.y - c.y) * (a.x - c.x) + (c.x - b.x) * (a.y - c.y);
        if det.abs() < f64::EPSILON {
            return None;
        }
        let l1 = ((b.y - c.y) * (x - c.x) + (c.x - b.x) * (y - c.y)) / det;
        let l2 = ((c.y - a.y) * (x - c.x) + (a.x - c.x) * (y - c.y)) / det;
        let l3 = 1.0 - l1 - l2;
        const TOLERANCE: f64 = -1e-9;
        if l1 < TOLERANCE || l2 < TOLERANCE || l3 < TOLERANCE {
            return None;
        }
        Some(l1 * a.z + l2 * b.z + l3 * c.z)
    }
}

/// Triangle mesh of a model
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    triangles: Vec<Triangle>,
}

impl Mesh {
    /// Create a mesh from triangles
    pub fn new(triangles: Vec<Triangle>) -> Self {
        Self { triangles }
    }

    /// Read an STL stream (ASCII or binary)
    pub fn from_stl<R: Read + Seek>(reader: &mut R) -> std::io::Result<Self> {
        let stl = stl_io::read_stl(reader)?;
        let corner = |index: usize| {
            stl.vertices
                .get(index)
                .map(|v| Point::new(f64::from(v[0]), f64::from(v[1]), f64::from(v[2])))
        };
        let triangles = stl
            .faces
            .iter()
            .filter_map(|face| {
                Some(Triangle::new(
                    corner(face.vertices[0])?,
                    corner(face.vertices[1])?,
                    corner(face.vertices[2])?,
                ))
            })
            .collect();
        Ok(Self::new(triangles))
    }

    /// Triangles of the mesh
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Number of triangles
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// True if the mesh has no triangles
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Bounding box of all triangles, `None` for an empty mesh
    pub fn extent(&self) -> Option<BoundBox> {
        self.triangles
            .iter()
            .map(Triangle::bounds)
            .reduce(|acc, b| acc.union(&b))
    }

    /// Highest surface point above (x, y), if any triangle covers it
    pub fn height_at(&self, x: f64, y: f64) -> Option<f64> {
        self.triangles
            .iter()
            .filter_map(|t| t.height_at(x, y))
            .reduce(f64::max)
    }
}

/// Combined extent of several meshes
pub fn combined_extent<'a>(meshes: impl IntoIterator<Item = &'a Mesh>) -> Option<BoundBox> {
    meshes
        .into_iter()
        .filter_map(Mesh::extent)
        .reduce(|acc, b| acc.union(&b))
}
