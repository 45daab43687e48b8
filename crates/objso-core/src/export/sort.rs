//! Face ordering to cut down on `usemtl` and `s` switches

use crate::scene::{MeshSnapshot, Polygon};

/// Smoothing state of a face as it appears in the `s` directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SmoothState {
    Off,
    On,
    Group(u32),
}

impl SmoothState {
    /// Resolve a face's state, preferring its smoothing group when there is one
    pub fn of(polygon: &Polygon, face: usize, groups: Option<&[u32]>) -> Self {
        if !polygon.use_smooth {
            return Self::Off;
        }
        match groups {
            Some(ids) => Self::Group(ids[face]),
            None => Self::On,
        }
    }

    /// Sort key: flat faces first, then by group
    pub fn key(self) -> u32 {
        match self {
            Self::Off => 0,
            Self::On => 1,
            Self::Group(id) => id,
        }
    }
}

/// Order in which faces get written.
///
/// Faces are stably sorted by material slot, then smoothing, so equal
/// contexts end up next to each other. With a single material slot only the
/// smoothing state counts. `keep_order` leaves the source order untouched.
pub fn face_order(mesh: &MeshSnapshot, groups: Option<&[u32]>, keep_order: bool) -> Vec<usize> {
    let mut order: Vec<usize> = (0..mesh.polygons.len()).collect();
    if keep_order {
        return order;
    }

    let by_material = mesh.materials.len() > 1;
    order.sort_by_key(|&face| {
        let polygon = &mesh.polygons[face];
        let material = if by_material {
            polygon.material_index
        } else {
            0
        };
        (material, SmoothState::of(polygon, face, groups).key())
    });
    order
}
