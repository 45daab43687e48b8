//! Running OBJ index counters
//!
//! OBJ indices are 1-based and global to the file, so every object's local
//! indices are shifted by the totals of all objects written before it.

/// Index offsets for one object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexBase {
    pub vertex: usize,
    pub uv: usize,
    pub normal: usize,
}

/// Next free vertex, UV and normal index of the file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalCounters {
    vertex: usize,
    uv: usize,
    normal: usize,
}

impl Default for GlobalCounters {
    fn default() -> Self {
        Self {
            vertex: 1,
            uv: 1,
            normal: 1,
        }
    }
}

impl GlobalCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offsets the next object will be written with
    pub fn base(&self) -> IndexBase {
        IndexBase {
            vertex: self.vertex,
            uv: self.uv,
            normal: self.normal,
        }
    }

    /// Reserve index ranges for one object.
    ///
    /// Returns the offsets before the reservation; the counters then move
    /// past the object's unique attribute counts.
    pub fn allocate(&mut self, vertices: usize, uvs: usize, normals: usize) -> IndexBase {
        let base = self.base();
        self.vertex += vertices;
        self.uv += uvs;
        self.normal += normals;
        base
    }

    /// Number of `v` lines written so far
    pub fn vertices_written(&self) -> usize {
        self.vertex - 1
    }

    /// Number of `vt` lines written so far
    pub fn uvs_written(&self) -> usize {
        self.uv - 1
    }

    /// Number of `vn` lines written so far
    pub fn normals_written(&self) -> usize {
        self.normal - 1
    }
}
