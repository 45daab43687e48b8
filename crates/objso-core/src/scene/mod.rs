//! Scene snapshots handed to the exporter by the host application
//!
//! Everything in here is plain data: the host evaluates its scene graph once
//! per export, fills these structures, and the exporter consumes them object
//! by object. Nothing holds references back into the host.

mod curve;
mod mesh;
mod smooth;

use glam::Mat4;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use curve::{CurveSnapshot, Spline, SplineType};
pub use mesh::{Corner, Edge, Loop, MeshSnapshot, Polygon, VertexWeight};
pub use smooth::{SmoothGroups, compute_smooth_groups};

/// A flattened list of objects ready for export
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    /// Name of the document the scene came from, used in file headers
    #[serde(default)]
    pub source_name: Option<String>,
    /// Directory textures are resolved against
    #[serde(default)]
    pub source_dir: Option<PathBuf>,
    /// Objects in export order, instancers already expanded
    pub objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new(objects: Vec<SceneObject>) -> Self {
        Self {
            objects,
            ..Self::default()
        }
    }

    /// Parse a scene from its JSON representation
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// How an instancing parent spawns its children
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceType {
    #[default]
    None,
    Verts,
    Faces,
    Collection,
}

/// Link from an object to the object parenting it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentLink {
    pub name: String,
    #[serde(default)]
    pub instance_type: InstanceType,
}

/// One object of the scene, paired with its world transform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneObject {
    pub name: String,
    #[serde(default = "identity")]
    pub world_matrix: Mat4,
    #[serde(default)]
    pub parent: Option<ParentLink>,
    pub geometry: Geometry,
}

fn identity() -> Mat4 {
    Mat4::IDENTITY
}

impl SceneObject {
    pub fn mesh(name: impl Into<String>, mesh: MeshSnapshot) -> Self {
        Self {
            name: name.into(),
            world_matrix: Mat4::IDENTITY,
            parent: None,
            geometry: Geometry::Mesh(mesh),
        }
    }

    pub fn curve(name: impl Into<String>, curve: CurveSnapshot) -> Self {
        Self {
            name: name.into(),
            world_matrix: Mat4::IDENTITY,
            parent: None,
            geometry: Geometry::Curve { curve, mesh: None },
        }
    }

    pub fn with_world_matrix(mut self, matrix: Mat4) -> Self {
        self.world_matrix = matrix;
        self
    }

    pub fn with_parent(mut self, parent: ParentLink) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Children placed by a vertex or face instancer are written through
    /// their instancer, never on their own.
    pub fn is_instance_child(&self) -> bool {
        self.parent.as_ref().is_some_and(|p| {
            matches!(p.instance_type, InstanceType::Verts | InstanceType::Faces)
        })
    }
}

/// Geometry attached to an object
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Geometry {
    Mesh(MeshSnapshot),
    /// Curve data plus the host's tessellation of it, used when the curve
    /// cannot be written as OBJ curves
    Curve {
        curve: CurveSnapshot,
        #[serde(default)]
        mesh: Option<MeshSnapshot>,
    },
    /// The host could not produce geometry for this object
    Empty,
}

/// An image referenced by a material
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub name: String,
    pub filepath: PathBuf,
}

/// The slice of a material the exporter cares about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    #[serde(default)]
    pub base_color_texture: Option<Image>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_color_texture: None,
        }
    }

    pub fn with_texture(mut self, image: Image) -> Self {
        self.base_color_texture = Some(image);
        self
    }

    /// The diffuse image, if it points at an actual file
    pub fn diffuse_image(&self) -> Option<&Image> {
        self.base_color_texture
            .as_ref()
            .filter(|image| !image.filepath.as_os_str().is_empty())
    }
}
