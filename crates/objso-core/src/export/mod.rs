//! Export of scene snapshots to Wavefront OBJ and MTL
//!
//! Objects are prepared independently (validation, transform, face sorting,
//! attribute deduplication) and then written strictly in scene order, since
//! OBJ indices are global to the file and MTL names depend on which keys were
//! seen first.

mod counters;
mod curve;
mod dedup;
mod format;
mod material;
mod mtl;
mod obj;
mod path;
mod sort;

use crate::axis::{self, Axis};
use crate::scene::{CurveSnapshot, Geometry, MeshSnapshot, Scene, SceneObject};
use crate::{Error, Result};
use glam::Mat4;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub use counters::{GlobalCounters, IndexBase};
pub use curve::{SplineEncoding, encode_spline, write_curve};
pub use dedup::{AttributePool, NormalKey, UvKey, dedup_normals, dedup_uvs};
pub use material::{MaterialKey, MaterialRegistry, RegisteredMaterial, name_compat};
pub use mtl::write_mtl;
pub use obj::{FaceFormat, MeshStats, PreparedMesh, write_mesh};
pub use path::{FsPathResolver, PathMode, PathResolver, relative_to};
pub use sort::{SmoothState, face_order};

/// Export options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Write loose edges as `l` lines
    pub write_edges: bool,
    /// Compute smoothing groups from sharp edges instead of writing `s 1`
    pub smooth_groups: bool,
    /// Smoothing group ids as bitflags
    pub smooth_groups_bitflags: bool,
    pub write_normals: bool,
    pub write_uvs: bool,
    /// Write `mtllib`/`usemtl` and the MTL file
    pub write_materials: bool,
    /// One `o` line per object
    pub blender_objects: bool,
    /// One `g` line per object, used when `blender_objects` is off
    pub group_by_object: bool,
    /// A `g` line at every material switch
    pub group_by_material: bool,
    /// Write faces in source order
    pub keep_vertex_order: bool,
    /// Polygroup `g` lines from vertex group weights
    pub vertex_groups: bool,
    /// Write poly and B-spline curves as OBJ curves
    pub curves_as_nurbs: bool,
    pub global_scale: f32,
    pub axis_forward: Axis,
    pub axis_up: Axis,
    /// How texture paths are written into the MTL file
    pub path_mode: PathMode,
    /// Prepare objects on the rayon pool
    pub parallel: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            write_edges: true,
            smooth_groups: false,
            smooth_groups_bitflags: false,
            write_normals: true,
            write_uvs: true,
            write_materials: true,
            blender_objects: true,
            group_by_object: false,
            group_by_material: false,
            keep_vertex_order: false,
            vertex_groups: false,
            curves_as_nurbs: false,
            global_scale: 1.0,
            axis_forward: Axis::NegZ,
            axis_up: Axis::Y,
            path_mode: PathMode::Auto,
            parallel: false,
        }
    }
}

impl ExportOptions {
    pub fn with_edges(mut self, enabled: bool) -> Self {
        self.write_edges = enabled;
        self
    }

    pub fn with_smooth_groups(mut self, enabled: bool) -> Self {
        self.smooth_groups = enabled;
        self
    }

    pub fn with_smooth_groups_bitflags(mut self, enabled: bool) -> Self {
        self.smooth_groups_bitflags = enabled;
        self
    }

    pub fn with_normals(mut self, enabled: bool) -> Self {
        self.write_normals = enabled;
        self
    }

    pub fn with_uvs(mut self, enabled: bool) -> Self {
        self.write_uvs = enabled;
        self
    }

    pub fn with_materials(mut self, enabled: bool) -> Self {
        self.write_materials = enabled;
        self
    }

    pub fn with_blender_objects(mut self, enabled: bool) -> Self {
        self.blender_objects = enabled;
        self
    }

    pub fn with_group_by_object(mut self, enabled: bool) -> Self {
        self.group_by_object = enabled;
        self
    }

    pub fn with_group_by_material(mut self, enabled: bool) -> Self {
        self.group_by_material = enabled;
        self
    }

    pub fn with_keep_vertex_order(mut self, enabled: bool) -> Self {
        self.keep_vertex_order = enabled;
        self
    }

    pub fn with_vertex_groups(mut self, enabled: bool) -> Self {
        self.vertex_groups = enabled;
        self
    }

    pub fn with_curves_as_nurbs(mut self, enabled: bool) -> Self {
        self.curves_as_nurbs = enabled;
        self
    }

    pub fn with_global_scale(mut self, scale: f32) -> Self {
        self.global_scale = scale;
        self
    }

    pub fn with_axes(mut self, forward: Axis, up: Axis) -> Self {
        self.axis_forward = forward;
        self.axis_up = up;
        self
    }

    pub fn with_path_mode(mut self, mode: PathMode) -> Self {
        self.path_mode = mode;
        self
    }

    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Scale and axis conversion applied on top of every world matrix
    pub fn global_matrix(&self) -> Result<Mat4> {
        axis::global_matrix(self.global_scale, self.axis_forward, self.axis_up)
    }
}

/// State carried from one object to the next during a run
#[derive(Debug, Clone, Default)]
pub struct ExportContext {
    pub counters: GlobalCounters,
    pub materials: MaterialRegistry,
}

impl ExportContext {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Summary of an export run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    pub objects_written: usize,
    pub objects_skipped: usize,
    /// Objects written as OBJ curves
    pub curves_written: usize,
    pub vertices: usize,
    pub uvs: usize,
    pub normals: usize,
    pub faces: usize,
    pub loose_edges: usize,
    pub materials: usize,
    pub copied_files: usize,
}

impl fmt::Display for ExportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} objects ({} skipped), {} vertices, {} faces, {} materials",
            self.objects_written, self.objects_skipped, self.vertices, self.faces, self.materials
        )?;
        if self.curves_written > 0 {
            write!(f, ", {} curves", self.curves_written)?;
        }
        if self.copied_files > 0 {
            write!(f, ", {} textures copied", self.copied_files)?;
        }
        Ok(())
    }
}

/// An object ready to be written, holding no shared state
#[derive(Debug)]
enum PreparedObject {
    Mesh(Box<PreparedMesh>),
    Curve {
        name: String,
        curve: CurveSnapshot,
        matrix: Mat4,
    },
    Skipped,
}

fn prepare_mesh(
    name: &str,
    mesh: MeshSnapshot,
    matrix: &Mat4,
    options: &ExportOptions,
) -> PreparedObject {
    match PreparedMesh::prepare(name, mesh, matrix, options) {
        Ok(Some(prepared)) => PreparedObject::Mesh(Box::new(prepared)),
        Ok(None) => {
            warn!("Object '{}' has no geometry, skipping", name);
            PreparedObject::Skipped
        }
        Err(e) => {
            warn!("Skipping '{}': {}", name, e);
            PreparedObject::Skipped
        }
    }
}

fn prepare_object(object: SceneObject, global: &Mat4, options: &ExportOptions) -> PreparedObject {
    if object.is_instance_child() {
        debug!("'{}' is instanced by its parent, skipping", object.name);
        return PreparedObject::Skipped;
    }

    let matrix = *global * object.world_matrix;

    match object.geometry {
        Geometry::Mesh(mesh) => prepare_mesh(&object.name, mesh, &matrix, options),
        Geometry::Curve { curve, mesh } => {
            if options.curves_as_nurbs && curve.has_obj_compatible_spline() {
                return PreparedObject::Curve {
                    name: object.name,
                    curve,
                    matrix,
                };
            }
            match mesh {
                Some(mesh) => prepare_mesh(&object.name, mesh, &matrix, options),
                None => {
                    warn!("Curve '{}' has no tessellation, skipping", object.name);
                    PreparedObject::Skipped
                }
            }
        }
        Geometry::Empty => {
            warn!("Object '{}' could not be converted, skipping", object.name);
            PreparedObject::Skipped
        }
    }
}

fn write_prepared<W: Write>(
    w: &mut W,
    prepared: PreparedObject,
    ctx: &mut ExportContext,
    options: &ExportOptions,
    stats: &mut ExportStats,
) -> Result<()> {
    match prepared {
        PreparedObject::Mesh(mesh) => {
            let base = ctx.counters.allocate(
                mesh.vertex_count(),
                mesh.uv_count(),
                mesh.normal_count(),
            );
            debug!(
                "'{}': v {} vt {} vn {} from {:?}",
                mesh.object_name,
                mesh.vertex_count(),
                mesh.uv_count(),
                mesh.normal_count(),
                base
            );
            let written = write_mesh(w, &mesh, base, &mut ctx.materials, options)?;
            stats.objects_written += 1;
            stats.faces += written.faces;
            stats.loose_edges += written.loose_edges;
        }
        PreparedObject::Curve {
            name,
            curve,
            matrix,
        } => {
            let points = write_curve(w, &name, &curve, &matrix)?;
            if points == 0 {
                warn!("Curve '{}' has no writable splines, skipping", name);
                stats.objects_skipped += 1;
                return Ok(());
            }
            ctx.counters.allocate(points, 0, 0);
            debug!("'{}': {} curve control points", name, points);
            stats.objects_written += 1;
            stats.curves_written += 1;
        }
        PreparedObject::Skipped => stats.objects_skipped += 1,
    }
    Ok(())
}

/// Writes scenes to OBJ, plus an MTL library when materials are enabled
#[derive(Debug, Clone, Default)]
pub struct ObjExporter {
    options: ExportOptions,
    source_name: String,
    source_dir: Option<PathBuf>,
}

impl ObjExporter {
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    /// Name written into the file headers
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }

    /// Directory relative texture paths are resolved against
    pub fn with_source_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(dir.into());
        self
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Write the OBJ body for `objects` to any writer.
    ///
    /// `mtllib` names the material library referenced from the header; the
    /// library itself is left to the caller.
    pub fn write_obj<W: Write>(
        &self,
        w: &mut W,
        objects: Vec<SceneObject>,
        mtllib: Option<&str>,
        ctx: &mut ExportContext,
    ) -> Result<ExportStats> {
        let global = self.options.global_matrix()?;
        let mut stats = ExportStats::default();

        writeln!(
            w,
            "# objso v{} OBJ File: '{}'",
            env!("CARGO_PKG_VERSION"),
            self.source_name
        )?;
        writeln!(w, "# Objects: {}", objects.len())?;
        if self.options.write_materials {
            if let Some(mtllib) = mtllib {
                writeln!(w, "mtllib {}", mtllib)?;
            }
        }

        if self.options.parallel {
            let prepared: Vec<PreparedObject> = objects
                .into_par_iter()
                .map(|object| prepare_object(object, &global, &self.options))
                .collect();
            for object in prepared {
                write_prepared(w, object, ctx, &self.options, &mut stats)?;
            }
        } else {
            for object in objects {
                let prepared = prepare_object(object, &global, &self.options);
                write_prepared(w, prepared, ctx, &self.options, &mut stats)?;
            }
        }

        stats.vertices = ctx.counters.vertices_written();
        stats.uvs = ctx.counters.uvs_written();
        stats.normals = ctx.counters.normals_written();
        stats.materials = ctx.materials.len();
        Ok(stats)
    }

    /// Export `objects` to `path`, writing `<stem>.mtl` next to it
    pub fn export(&self, objects: Vec<SceneObject>, path: &Path) -> Result<ExportStats> {
        if path.file_name().is_none() {
            return Err(Error::Export(format!(
                "Output path has no file name: {}",
                path.display()
            )));
        }

        let mtl_path = path.with_extension("mtl");
        let mtllib = mtl_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());

        let mut ctx = ExportContext::new();
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let mut stats = self.write_obj(&mut writer, objects, mtllib.as_deref(), &mut ctx)?;
        writer.flush()?;

        if self.options.write_materials {
            let dest_dir = std::path::absolute(path)?
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let source_dir = match &self.source_dir {
                Some(dir) => std::path::absolute(dir)?,
                None => dest_dir.clone(),
            };
            let mut resolver = FsPathResolver::new(self.options.path_mode, source_dir, dest_dir);

            let file = File::create(&mtl_path)?;
            let mut writer = BufWriter::new(file);
            write_mtl(&mut writer, &ctx.materials, &self.source_name, &mut resolver)?;
            writer.flush()?;

            stats.copied_files = resolver.copy_files()?;
        }

        info!("Exported {}: {}", path.display(), stats);
        Ok(stats)
    }
}

/// Export a whole scene with the given options
pub fn export_scene(scene: Scene, path: &Path, options: &ExportOptions) -> Result<ExportStats> {
    let mut exporter = ObjExporter::new(options.clone());
    if let Some(name) = scene.source_name {
        exporter = exporter.with_source_name(name);
    }
    if let Some(dir) = scene.source_dir {
        exporter = exporter.with_source_dir(dir);
    }
    exporter.export(scene.objects, path)
}

/// Extension trait for exporting scenes
pub trait SceneExport {
    /// Export to OBJ with default options
    fn export_obj<P: AsRef<Path>>(self, path: P) -> Result<ExportStats>;

    /// Export to OBJ with the given options
    fn export_obj_with<P: AsRef<Path>>(self, path: P, options: &ExportOptions)
    -> Result<ExportStats>;
}

impl SceneExport for Scene {
    fn export_obj<P: AsRef<Path>>(self, path: P) -> Result<ExportStats> {
        export_scene(self, path.as_ref(), &ExportOptions::default())
    }

    fn export_obj_with<P: AsRef<Path>>(
        self,
        path: P,
        options: &ExportOptions,
    ) -> Result<ExportStats> {
        export_scene(self, path.as_ref(), options)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::scene::{InstanceType, ParentLink, Polygon, Spline, SplineType};
    use glam::Vec3;

    fn triangle(name: &str) -> MeshSnapshot {
        MeshSnapshot {
            name: name.into(),
            positions: vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            polygons: vec![Polygon::from_vertices(&[0, 1, 2], 0)],
            loops: vec![crate::scene::Loop::default(); 3],
            ..MeshSnapshot::default()
        }
    }

    fn identity_options() -> ExportOptions {
        ExportOptions::default()
            .with_axes(Axis::Y, Axis::Z)
            .with_normals(false)
    }

    fn render(objects: Vec<SceneObject>, options: ExportOptions) -> (String, ExportStats) {
        let exporter = ObjExporter::new(options).with_source_name("test");
        let mut ctx = ExportContext::new();
        let mut out = Vec::new();
        let stats = exporter
            .write_obj(&mut out, objects, Some("test.mtl"), &mut ctx)
            .unwrap();
        (String::from_utf8(out).unwrap(), stats)
    }

    #[test]
    fn test_options_json_defaults() {
        let options: ExportOptions = serde_json::from_str(r#"{"write_uvs": false}"#).unwrap();
        assert!(!options.write_uvs);
        assert!(options.write_normals);
        assert_eq!(options.axis_forward, Axis::NegZ);

        let options: ExportOptions =
            serde_json::from_str(r#"{"axis_forward": "Y", "axis_up": "Z", "path_mode": "copy"}"#)
                .unwrap();
        assert_eq!(options.axis_forward, Axis::Y);
        assert_eq!(options.path_mode, PathMode::Copy);
    }

    #[test]
    fn test_header() {
        let (text, _) = render(vec![], identity_options());
        let mut lines = text.lines();
        assert!(lines.next().unwrap().ends_with("OBJ File: 'test'"));
        assert_eq!(lines.next(), Some("# Objects: 0"));
        assert_eq!(lines.next(), Some("mtllib test.mtl"));

        let (text, _) = render(vec![], identity_options().with_materials(false));
        assert!(!text.contains("mtllib"));
    }

    #[test]
    fn test_second_object_offsets_indices() {
        let objects = vec![
            SceneObject::mesh("A", triangle("A")),
            SceneObject::mesh("B", triangle("B")),
        ];
        let (text, stats) = render(objects, identity_options());

        let faces: Vec<&str> = text.lines().filter(|l| l.starts_with("f ")).collect();
        assert_eq!(faces, vec!["f 1 2 3", "f 4 5 6"]);
        assert_eq!(stats.vertices, 6);
        assert_eq!(stats.objects_written, 2);
    }

    #[test]
    fn test_invalid_object_leaves_counters_alone() {
        let mut broken = triangle("Broken");
        broken.polygons[0].corners[2].vertex = 9;
        let objects = vec![
            SceneObject::mesh("Broken", broken),
            SceneObject::mesh("Good", triangle("Good")),
        ];
        let (text, stats) = render(objects, identity_options());

        assert!(text.contains("f 1 2 3"));
        assert!(!text.contains("o Broken"));
        assert_eq!(stats.objects_skipped, 1);
        assert_eq!(stats.vertices, 3);
    }

    #[test]
    fn test_instance_children_and_empty_objects_skipped() {
        let child = SceneObject::mesh("child", triangle("child")).with_parent(ParentLink {
            name: "emitter".into(),
            instance_type: InstanceType::Faces,
        });
        let empty = SceneObject {
            geometry: Geometry::Empty,
            ..SceneObject::mesh("empty", MeshSnapshot::default())
        };
        let (text, stats) = render(vec![child, empty], identity_options());

        assert!(!text.contains("\nv "));
        assert_eq!(stats.objects_skipped, 2);
        assert_eq!(stats.objects_written, 0);
    }

    #[test]
    fn test_curve_without_writable_splines_is_skipped() {
        let mut bezier = Spline::nurbs(vec![Vec3::ZERO, Vec3::X, Vec3::Y], 3);
        bezier.kind = SplineType::Bezier;
        let lonely = Spline::poly(vec![Vec3::ZERO]);
        let objects = vec![
            SceneObject::curve("Wire", CurveSnapshot::new("Wire", vec![bezier, lonely])),
            SceneObject::mesh("Tri", triangle("Tri")),
        ];
        let (text, stats) = render(objects, identity_options().with_curves_as_nurbs(true));

        assert!(!text.contains("cstype"));
        assert!(text.contains("f 1 2 3"));
        assert_eq!(stats.objects_skipped, 1);
        assert_eq!(stats.objects_written, 1);
        assert_eq!(stats.curves_written, 0);
    }

    #[test]
    fn test_world_and_global_matrix_applied() {
        let object = SceneObject::mesh("T", triangle("T"))
            .with_world_matrix(Mat4::from_translation(Vec3::new(0.0, 0.0, 2.0)));
        let (text, _) = render(vec![object], ExportOptions::default().with_global_scale(2.0));
        // Z up becomes Y up, then everything doubles
        assert!(text.contains("v 0.000000 4.000000 0.000000\n"));
        assert!(text.contains("v 2.000000 4.000000 0.000000\n"));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let objects: Vec<SceneObject> = (0..8)
            .map(|i| SceneObject::mesh(format!("T{}", i), triangle(&format!("T{}", i))))
            .collect();
        let (sequential, _) = render(objects.clone(), identity_options());
        let (parallel, _) = render(objects, identity_options().with_parallel(true));
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_bad_axes_rejected() {
        let exporter = ObjExporter::new(ExportOptions::default().with_axes(Axis::Z, Axis::NegZ));
        let result = exporter.write_obj(
            &mut Vec::new(),
            vec![],
            None,
            &mut ExportContext::new(),
        );
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[test]
    fn test_stats_display() {
        let stats = ExportStats {
            objects_written: 2,
            vertices: 6,
            faces: 2,
            materials: 1,
            ..ExportStats::default()
        };
        assert_eq!(
            stats.to_string(),
            "2 objects (0 skipped), 6 vertices, 2 faces, 1 materials"
        );
    }
}
