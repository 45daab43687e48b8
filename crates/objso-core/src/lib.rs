//! # objso Core
//!
//! Wavefront OBJ/MTL export for evaluated scene snapshots.
//!
//! A host application flattens its scene into [`scene::Scene`]: one
//! [`scene::SceneObject`] per exported object, with mesh or curve data
//! already evaluated. The exporter transforms each object into the target
//! frame, deduplicates UVs and normals, orders faces so material and
//! smoothing directives change as rarely as possible, and writes a single
//! OBJ file with globally numbered indices plus its material library.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use objso_core::prelude::*;
//!
//! let scene = Scene::from_json(&std::fs::read_to_string("scene.json")?)?;
//! let stats = scene.export_obj_with("scene.obj", &ExportOptions::default().with_uvs(false))?;
//! println!("{stats}");
//! ```
//!
//! ## Conventions
//!
//! - **Scene frame**: right-handed, +Y forward, +Z up
//! - **Default output frame**: -Z forward, +Y up
//! - **Precision**: positions and UVs are written with 6 decimals, normals
//!   and curve parameters with 4

pub mod axis;
pub mod export;
pub mod scene;

mod error;

pub use error::{Error, Result};

/// Prelude module for convenient imports
pub mod prelude {
    // Scene snapshots
    pub use crate::scene::{
        Corner, CurveSnapshot, Edge, Geometry, Image, InstanceType, Loop, Material, MeshSnapshot,
        ParentLink, Polygon, Scene, SceneObject, Spline, SplineType, VertexWeight,
    };

    // Export
    pub use crate::export::{
        ExportContext, ExportOptions, ExportStats, ObjExporter, PathMode, SceneExport,
        export_scene,
    };

    pub use crate::axis::Axis;

    // Math (re-export glam)
    pub use glam::{Mat3, Mat4, Vec2, Vec3};

    // Error handling
    pub use crate::{Error, Result};
}
