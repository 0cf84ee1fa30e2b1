//! Models
//!
//! Collision models are triangle meshes, read from STL files or handed over in memory.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde_json::Value;
use tracing::debug;

use super::{parse_point, AppValues, CollectionItem, EntityKind, FieldReader};
use crate::error::EntityError;
use crate::geometry::{BoundBox, Mesh, Triangle};

/// Where a model's mesh came from
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    /// An STL file
    File {
        /// Resolved file location
        location: PathBuf,
    },
    /// Triangles listed inline or supplied programmatically
    Object,
}

/// A collision model
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    name: String,
    source: ModelSource,
    mesh: Rc<Mesh>,
    app: AppValues,
}

impl Model {
    /// Wrap an in-memory mesh
    pub fn from_mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            source: ModelSource::Object,
            mesh: Rc::new(mesh),
            app: AppValues::new(),
        }
    }

    /// Load an STL file
    pub fn load(name: impl Into<String>, location: &Path) -> Result<Self, EntityError> {
        let name = name.into();
        let load_error = |reason: String| EntityError::ModelLoad {
            entity: name.clone(),
            location: location.display().to_string(),
            reason,
        };
        let file = File::open(location).map_err(|e| load_error(e.to_string()))?;
        let mesh =
            Mesh::from_stl(&mut BufReader::new(file)).map_err(|e| load_error(e.to_string()))?;
        if mesh.is_empty() {
            return Err(load_error("model contains no triangles".to_string()));
        }
        debug!("Loaded model '{}' with {} triangles", name, mesh.len());
        Ok(Self {
            name,
            source: ModelSource::File {
                location: location.to_path_buf(),
            },
            mesh: Rc::new(mesh),
            app: AppValues::new(),
        })
    }

    /// Build a model from a specification entry
    ///
    /// `source.type` is `file` (with `location`, relative to `base_dir`) or `object` (with
    /// `triangles`, each a list of three `[x, y, z]` corners).
    pub(crate) fn from_fields(fields: &FieldReader<'_>, base_dir: &Path) -> Result<Self, EntityError> {
        let source = fields
            .nested("source")?
            .ok_or_else(|| fields.missing("source"))?;
        match source.required_str("type")? {
            "file" => {
                let location = Path::new(source.required_str("location")?);
                let location = if location.is_absolute() {
                    location.to_path_buf()
                } else {
                    base_dir.join(location)
                };
                Self::load(fields.entity(), &location)
            }
            "object" => {
                let triangles = match source.get("triangles") {
                    Some(Value::Array(items)) => items
                        .iter()
                        .map(parse_triangle)
                        .collect::<Option<Vec<_>>>()
                        .ok_or_else(|| {
                            source.invalid("triangles", "expected a list of three [x, y, z] corners")
                        })?,
                    Some(_) => return Err(source.invalid("triangles", "expected a list")),
                    None => return Err(source.missing("triangles")),
                };
                Ok(Self::from_mesh(fields.entity(), Mesh::new(triangles)))
            }
            other => Err(source.invalid("type", format!("unsupported model source '{}'", other))),
        }
    }

    /// Where the mesh came from
    pub fn source(&self) -> &ModelSource {
        &self.source
    }

    /// The mesh
    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    /// Bounding box, `None` for an empty mesh
    pub fn extent(&self) -> Option<BoundBox> {
        self.mesh.extent()
    }
}

fn parse_triangle(value: &Value) -> Option<Triangle> {
    match value.as_array()?.as_slice() {
        [a, b, c] => Some(Triangle::new(parse_point(a)?, parse_point(b)?, parse_point(c)?)),
        _ => None,
    }
}

impl CollectionItem for Model {
    const KIND: EntityKind = EntityKind::Model;

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
