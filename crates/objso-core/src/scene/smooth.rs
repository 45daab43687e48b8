//! Smoothing group computation
//!
//! Smooth faces connected through edges that are neither sharp nor
//! non-manifold end up in the same group. Flat faces get group 0.

use super::MeshSnapshot;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Smoothing group id per face plus the number of distinct groups
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SmoothGroups {
    pub ids: Vec<u32>,
    pub count: usize,
}

impl SmoothGroups {
    /// A single group carries no information over plain smooth flags
    pub fn is_meaningful(&self) -> bool {
        self.count > 1
    }
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

fn face_edges(mesh: &MeshSnapshot, face: usize) -> impl Iterator<Item = (usize, usize)> + '_ {
    let corners = &mesh.polygons[face].corners;
    let n = corners.len();
    (0..n).map(move |i| edge_key(corners[i].vertex, corners[(i + 1) % n].vertex))
}

/// Compute smoothing groups for every face.
///
/// With `use_bitflags` each group id is a single bit, chosen so that no two
/// groups sharing a vertex get the same bit. That caps the id space at 32.
pub fn compute_smooth_groups(mesh: &MeshSnapshot, use_bitflags: bool) -> SmoothGroups {
    let faces = mesh.polygons.len();

    let sharp: HashSet<(usize, usize)> = mesh
        .edges
        .iter()
        .filter(|e| e.use_sharp)
        .map(|e| edge_key(e.vertices[0], e.vertices[1]))
        .collect();

    let mut edge_faces: HashMap<(usize, usize), Vec<usize>> = HashMap::new();
    for face in 0..faces {
        for key in face_edges(mesh, face) {
            edge_faces.entry(key).or_default().push(face);
        }
    }

    let mut ids = vec![0u32; faces];
    let mut groups = 0u32;

    for start in 0..faces {
        if !mesh.polygons[start].use_smooth || ids[start] != 0 {
            continue;
        }
        groups += 1;
        ids[start] = groups;

        let mut stack = vec![start];
        while let Some(face) = stack.pop() {
            for key in face_edges(mesh, face) {
                if sharp.contains(&key) {
                    continue;
                }
                let Some(neighbours) = edge_faces.get(&key) else {
                    continue;
                };
                if neighbours.len() != 2 {
                    continue;
                }
                for &other in neighbours {
                    if other != face && ids[other] == 0 && mesh.polygons[other].use_smooth {
                        ids[other] = groups;
                        stack.push(other);
                    }
                }
            }
        }
    }

    if use_bitflags && groups > 0 {
        let bits = assign_bits(mesh, &ids, groups as usize);
        for id in &mut ids {
            if *id != 0 {
                *id = bits[*id as usize];
            }
        }
        let distinct: BTreeSet<u32> = ids.iter().copied().filter(|&id| id != 0).collect();
        return SmoothGroups {
            ids,
            count: distinct.len(),
        };
    }

    SmoothGroups {
        ids,
        count: groups as usize,
    }
}

/// Greedy colouring of the group adjacency graph with 32 colours
fn assign_bits(mesh: &MeshSnapshot, ids: &[u32], groups: usize) -> Vec<u32> {
    let mut vertex_groups: Vec<BTreeSet<u32>> = vec![BTreeSet::new(); mesh.positions.len()];
    for (face, polygon) in mesh.polygons.iter().enumerate() {
        if ids[face] == 0 {
            continue;
        }
        for corner in &polygon.corners {
            vertex_groups[corner.vertex].insert(ids[face]);
        }
    }

    let mut adjacent: Vec<BTreeSet<u32>> = vec![BTreeSet::new(); groups + 1];
    for touching in &vertex_groups {
        for &a in touching {
            for &b in touching {
                if a != b {
                    adjacent[a as usize].insert(b);
                }
            }
        }
    }

    let mut bits = vec![0u32; groups + 1];
    for group in 1..=groups {
        let used = adjacent[group]
            .iter()
            .fold(0u32, |acc, &other| acc | bits[other as usize]);
        bits[group] = if used == u32::MAX {
            tracing::warn!(
                "Mesh '{}': smoothing group {} has no free bit, sharing bit 0",
                mesh.name,
                group
            );
            1
        } else {
            1 << (!used).trailing_zeros()
        };
    }
    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Edge, Loop, Polygon};
    use glam::Vec3;

    /// Three quads in a row: 0-1-2 with vertices on a 4x2 grid
    fn strip(smooth: [bool; 3]) -> MeshSnapshot {
        let mut positions = Vec::new();
        for y in 0..2 {
            for x in 0..4 {
                positions.push(Vec3::new(x as f32, y as f32, 0.0));
            }
        }
        let polygons = (0..3)
            .map(|i| Polygon::from_vertices(&[i, i + 1, i + 5, i + 4], i * 4).smooth(smooth[i]))
            .collect();
        MeshSnapshot {
            name: "Strip".into(),
            positions,
            polygons,
            loops: vec![Loop::default(); 12],
            ..MeshSnapshot::default()
        }
    }

    #[test]
    fn test_connected_smooth_faces_share_group() {
        let groups = compute_smooth_groups(&strip([true; 3]), false);
        assert_eq!(groups.ids, vec![1, 1, 1]);
        assert_eq!(groups.count, 1);
        assert!(!groups.is_meaningful());
    }

    #[test]
    fn test_flat_face_splits_groups() {
        let groups = compute_smooth_groups(&strip([true, false, true]), false);
        assert_eq!(groups.ids, vec![1, 0, 2]);
        assert_eq!(groups.count, 2);
    }

    #[test]
    fn test_sharp_edge_splits_groups() {
        let mut mesh = strip([true; 3]);
        mesh.edges.push(Edge {
            vertices: [5, 1],
            is_loose: false,
            use_sharp: true,
        });
        let groups = compute_smooth_groups(&mesh, false);
        assert_eq!(groups.ids, vec![1, 2, 2]);
        assert!(groups.is_meaningful());
    }

    #[test]
    fn test_bitflags_reuse_bits_for_distant_groups() {
        let mut mesh = strip([true; 3]);
        for v in [1, 2] {
            mesh.edges.push(Edge {
                vertices: [v, v + 4],
                is_loose: false,
                use_sharp: true,
            });
        }
        let plain = compute_smooth_groups(&mesh, false);
        assert_eq!(plain.ids, vec![1, 2, 3]);

        // Groups 1 and 3 share no vertex, so they can share a bit.
        let flags = compute_smooth_groups(&mesh, true);
        assert_eq!(flags.ids, vec![1, 2, 1]);
        assert_eq!(flags.count, 2);
    }
}
