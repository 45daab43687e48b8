//! Polygon mesh snapshots

use super::Material;
use crate::{Error, Result};
use glam::{Mat3, Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// One face corner: the vertex it sits on and the loop holding its attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Corner {
    pub vertex: usize,
    #[serde(rename = "loop")]
    pub loop_index: usize,
}

impl Corner {
    pub fn new(vertex: usize, loop_index: usize) -> Self {
        Self { vertex, loop_index }
    }
}

/// A face of the mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub corners: Vec<Corner>,
    #[serde(default)]
    pub material_index: usize,
    #[serde(default)]
    pub use_smooth: bool,
}

impl Polygon {
    /// Build a polygon whose loops are numbered consecutively from `first_loop`
    pub fn from_vertices(vertices: &[usize], first_loop: usize) -> Self {
        Self {
            corners: vertices
                .iter()
                .enumerate()
                .map(|(i, &v)| Corner::new(v, first_loop + i))
                .collect(),
            material_index: 0,
            use_smooth: false,
        }
    }

    pub fn with_material(mut self, index: usize) -> Self {
        self.material_index = index;
        self
    }

    pub fn smooth(mut self, use_smooth: bool) -> Self {
        self.use_smooth = use_smooth;
        self
    }
}

/// Per-corner attributes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Loop {
    #[serde(default)]
    pub normal: Vec3,
    #[serde(default)]
    pub uv: Option<Vec2>,
}

/// An edge between two vertices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub vertices: [usize; 2],
    /// Not used by any face
    #[serde(default)]
    pub is_loose: bool,
    /// Marked sharp, splits smoothing groups
    #[serde(default)]
    pub use_sharp: bool,
}

/// Membership of a vertex in a named vertex group
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VertexWeight {
    pub group: usize,
    pub weight: f32,
}

/// Evaluated geometry of one object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshSnapshot {
    /// Name of the mesh data block, which may differ from the object name
    pub name: String,
    pub positions: Vec<Vec3>,
    pub polygons: Vec<Polygon>,
    pub loops: Vec<Loop>,
    pub edges: Vec<Edge>,
    /// Material slots; an empty slot is `None`
    pub materials: Vec<Option<Material>>,
    /// Vertex group names, indexed by [`VertexWeight::group`]
    pub vertex_groups: Vec<String>,
    /// Per-vertex group assignments, either empty or one entry per vertex
    pub vertex_weights: Vec<Vec<VertexWeight>>,
}

impl MeshSnapshot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Get number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Get number of faces
    pub fn face_count(&self) -> usize {
        self.polygons.len()
    }

    /// Whether the loops carry UV coordinates
    pub fn has_uvs(&self) -> bool {
        self.loops.first().is_some_and(|l| l.uv.is_some())
    }

    /// Whether there is anything to write for this mesh
    pub fn is_empty(&self, count_edges: bool) -> bool {
        let edges = if count_edges { self.edges.len() } else { 0 };
        self.polygons.len() + edges + self.positions.len() == 0
    }

    /// Material assigned to a face, clamped to the available slots
    pub fn face_material(&self, polygon: &Polygon) -> Option<&Material> {
        let slot = polygon
            .material_index
            .min(self.materials.len().saturating_sub(1));
        self.materials.get(slot).and_then(|m| m.as_ref())
    }

    /// Check that every index in the snapshot points at existing data
    pub fn validate(&self) -> Result<()> {
        let verts = self.positions.len();
        let loops = self.loops.len();

        for (face, polygon) in self.polygons.iter().enumerate() {
            if polygon.corners.len() < 3 {
                return Err(Error::invalid_mesh(
                    &self.name,
                    format!("face {} has {} corners", face, polygon.corners.len()),
                ));
            }
            for corner in &polygon.corners {
                if corner.vertex >= verts {
                    return Err(Error::invalid_mesh(
                        &self.name,
                        format!("face {} references vertex {}", face, corner.vertex),
                    ));
                }
                if corner.loop_index >= loops {
                    return Err(Error::invalid_mesh(
                        &self.name,
                        format!("face {} references loop {}", face, corner.loop_index),
                    ));
                }
            }
        }

        if let Some(edge) = self.edges.iter().find(|e| e.vertices.iter().any(|&v| v >= verts)) {
            return Err(Error::invalid_mesh(
                &self.name,
                format!("edge {:?} is out of range", edge.vertices),
            ));
        }

        let with_uv = self.loops.iter().filter(|l| l.uv.is_some()).count();
        if with_uv != 0 && with_uv != loops {
            return Err(Error::invalid_mesh(
                &self.name,
                format!("{} of {} loops carry UVs", with_uv, loops),
            ));
        }

        if !self.vertex_weights.is_empty() {
            if self.vertex_weights.len() != verts {
                return Err(Error::invalid_mesh(
                    &self.name,
                    format!(
                        "{} weight lists for {} vertices",
                        self.vertex_weights.len(),
                        verts
                    ),
                ));
            }
            let groups = self.vertex_groups.len();
            if self.vertex_weights.iter().flatten().any(|w| w.group >= groups) {
                return Err(Error::invalid_mesh(&self.name, "unknown vertex group"));
            }
        }

        Ok(())
    }

    /// Move the mesh into export space.
    ///
    /// Positions go through `matrix`, loop normals through its inverse
    /// transpose. A mirroring matrix turns faces inside out, so in that case
    /// every face's winding is reversed to point its normal outward again.
    pub fn transform(&mut self, matrix: &Mat4) {
        for p in &mut self.positions {
            *p = matrix.transform_point3(*p);
        }

        let linear = Mat3::from_mat4(*matrix);
        let det = linear.determinant();
        let normal_matrix = if det.abs() > f32::EPSILON {
            linear.inverse().transpose()
        } else {
            linear
        };
        for l in &mut self.loops {
            l.normal = (normal_matrix * l.normal).normalize_or_zero();
        }

        if det < 0.0 {
            self.flip_winding();
        }
    }

    /// Reverse the corner order of every face
    pub fn flip_winding(&mut self) {
        for polygon in &mut self.polygons {
            polygon.corners.reverse();
        }
    }
}
