//! Per-mesh UV and normal deduplication
//!
//! Loops repeat the same UV or normal many times over; OBJ lets faces share
//! attribute lines, so each mesh writes only the unique values. Keys are
//! rounded to four decimals, the same precision normals are written with.

use crate::scene::MeshSnapshot;
use glam::{Vec2, Vec3};
use std::collections::HashMap;

const KEY_SCALE: f64 = 10_000.0;

/// Round a component to four decimals, as an integer key
pub fn quantize(value: f32) -> i64 {
    (f64::from(value) * KEY_SCALE).round() as i64
}

/// Inverse of [`quantize`], for writing a key back out
pub fn dequantize(key: i64) -> f64 {
    key as f64 / KEY_SCALE
}

pub type UvKey = (usize, [i64; 2]);
pub type NormalKey = [i64; 3];

pub fn uv_key(vertex: usize, uv: Vec2) -> UvKey {
    (vertex, [quantize(uv.x), quantize(uv.y)])
}

pub fn normal_key(normal: Vec3) -> NormalKey {
    [quantize(normal.x), quantize(normal.y), quantize(normal.z)]
}

/// Unique attribute values plus the index every face corner maps to
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributePool<T> {
    /// Unique values in order of first use
    pub values: Vec<T>,
    /// `corners[face][corner]` indexes into `values`
    corners: Vec<Vec<usize>>,
}

impl<T> AttributePool<T> {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Local (0-based) index of a face corner's value
    pub fn index(&self, face: usize, corner: usize) -> usize {
        self.corners[face][corner]
    }

    fn build<K, F>(mesh: &MeshSnapshot, face_order: &[usize], mut sample: F) -> Self
    where
        K: std::hash::Hash + Eq,
        F: FnMut(usize, usize) -> (K, T),
    {
        let mut lookup: HashMap<K, usize> = HashMap::new();
        let mut values = Vec::new();
        let mut corners = vec![Vec::new(); mesh.polygons.len()];

        for &face in face_order {
            let polygon = &mesh.polygons[face];
            let indices = &mut corners[face];
            indices.reserve(polygon.corners.len());
            for corner in &polygon.corners {
                let (key, value) = sample(corner.vertex, corner.loop_index);
                let index = *lookup.entry(key).or_insert_with(|| {
                    values.push(value);
                    values.len() - 1
                });
                indices.push(index);
            }
        }

        Self { values, corners }
    }
}

/// Deduplicate UVs, keyed by vertex and rounded coordinate.
///
/// Two vertices that happen to land on the same UV still get separate `vt`
/// lines; some importers break when UVs are shared across vertices.
pub fn dedup_uvs(mesh: &MeshSnapshot, face_order: &[usize]) -> AttributePool<Vec2> {
    AttributePool::build(mesh, face_order, |vertex, loop_index| {
        let uv = mesh.loops[loop_index].uv.unwrap_or(Vec2::ZERO);
        (uv_key(vertex, uv), uv)
    })
}

/// Deduplicate loop normals by rounded value, across the whole mesh
pub fn dedup_normals(mesh: &MeshSnapshot, face_order: &[usize]) -> AttributePool<NormalKey> {
    AttributePool::build(mesh, face_order, |_, loop_index| {
        let key = normal_key(mesh.loops[loop_index].normal);
        (key, key)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Corner, Loop, Polygon};

    fn two_triangles(uvs: [[f32; 2]; 6], normals: [Vec3; 6]) -> MeshSnapshot {
        MeshSnapshot {
            name: "Pair".into(),
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::ONE],
            polygons: vec![
                Polygon::from_vertices(&[0, 1, 2], 0),
                Polygon::from_vertices(&[2, 1, 3], 3),
            ],
            loops: (0..6)
                .map(|i| Loop {
                    normal: normals[i],
                    uv: Some(Vec2::from_array(uvs[i])),
                })
                .collect(),
            ..MeshSnapshot::default()
        }
    }

    #[test]
    fn test_quantize_rounds_to_four_decimals() {
        assert_eq!(quantize(0.123_44), 1234);
        assert_eq!(quantize(0.123_46), 1235);
        assert_eq!(quantize(-1.0), -10_000);
        assert!((dequantize(1235) - 0.1235).abs() < 1e-12);
    }

    #[test]
    fn test_uvs_shared_per_vertex_only() {
        // Corners 1 and 4 sit on vertex 1 with the same UV; corner 5 is
        // vertex 3 with the UV of vertex 0.
        let uvs = [
            [0.0, 0.0],
            [1.0, 0.0],
            [0.0, 1.0],
            [0.0, 1.0],
            [1.0, 0.000_01],
            [0.0, 0.0],
        ];
        let mesh = two_triangles(uvs, [Vec3::Z; 6]);
        let pool = dedup_uvs(&mesh, &[0, 1]);

        assert_eq!(pool.len(), 4);
        assert_eq!(pool.index(0, 1), pool.index(1, 1));
        assert_eq!(pool.index(0, 2), pool.index(1, 0));
        assert_ne!(pool.index(0, 0), pool.index(1, 2));
    }

    #[test]
    fn test_normals_shared_across_vertices() {
        let normals = [Vec3::Z, Vec3::Z, Vec3::X, Vec3::X, Vec3::Z, Vec3::Y];
        let mesh = two_triangles([[0.0, 0.0]; 6], normals);
        let pool = dedup_normals(&mesh, &[0, 1]);

        assert_eq!(pool.len(), 3);
        assert_eq!(pool.values[0], [0, 0, 10_000]);
        assert_eq!(pool.index(0, 0), pool.index(1, 1));
        assert_eq!(pool.index(0, 2), pool.index(1, 0));
    }

    #[test]
    fn test_face_order_defines_first_occurrence() {
        let normals = [Vec3::Z, Vec3::Z, Vec3::Z, Vec3::X, Vec3::X, Vec3::X];
        let mesh = two_triangles([[0.0, 0.0]; 6], normals);
        let pool = dedup_normals(&mesh, &[1, 0]);

        assert_eq!(pool.values, vec![[10_000, 0, 0], [0, 0, 10_000]]);
        assert_eq!(pool.index(1, 0), 0);
        assert_eq!(pool.index(0, 0), 1);
    }

    #[test]
    fn test_empty_mesh_gives_empty_pools() {
        let mesh = MeshSnapshot::default();
        assert!(dedup_uvs(&mesh, &[]).is_empty());
        assert!(dedup_normals(&mesh, &[]).is_empty());
    }

    #[test]
    fn test_loop_shared_between_faces() {
        let mut mesh = two_triangles([[0.5, 0.5]; 6], [Vec3::Z; 6]);
        mesh.polygons[1].corners[0] = Corner::new(2, 2);
        let pool = dedup_uvs(&mesh, &[0, 1]);
        assert_eq!(pool.index(1, 0), pool.index(0, 2));
    }
}
