//! OBJ output for mesh objects

#![allow(clippy::uninlined_format_args)]

use super::ExportOptions;
use super::counters::IndexBase;
use super::dedup::{AttributePool, NormalKey, dedup_normals, dedup_uvs};
use super::format::{fmt_normal, fmt6};
use super::material::{MaterialKey, MaterialRegistry, name_compat};
use super::sort::{SmoothState, face_order};
use crate::Result;
use crate::scene::{MeshSnapshot, Polygon, compute_smooth_groups};
use glam::{Mat4, Vec2};
use std::collections::HashMap;
use std::io::Write;

/// Which attributes a face corner token carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaceFormat {
    /// `v`
    Vertex,
    /// `v/vt`
    VertexUv,
    /// `v//vn`
    VertexNormal,
    /// `v/vt/vn`
    VertexUvNormal,
}

impl FaceFormat {
    pub fn new(uvs: bool, normals: bool) -> Self {
        match (uvs, normals) {
            (false, false) => Self::Vertex,
            (true, false) => Self::VertexUv,
            (false, true) => Self::VertexNormal,
            (true, true) => Self::VertexUvNormal,
        }
    }
}

/// A mesh in export space with its face order and attribute pools settled.
///
/// Nothing here touches the shared counters or the material registry, so
/// preparation can fail or run out of order without affecting the file.
#[derive(Debug, Clone)]
pub struct PreparedMesh {
    pub object_name: String,
    pub mesh: MeshSnapshot,
    pub face_order: Vec<usize>,
    pub smooth_groups: Option<Vec<u32>>,
    pub uvs: Option<AttributePool<Vec2>>,
    pub normals: Option<AttributePool<NormalKey>>,
}

impl PreparedMesh {
    /// Validate, transform, sort and deduplicate one mesh.
    ///
    /// Returns `Ok(None)` when the mesh has nothing to write.
    pub fn prepare(
        object_name: &str,
        mut mesh: MeshSnapshot,
        matrix: &Mat4,
        options: &ExportOptions,
    ) -> Result<Option<Self>> {
        mesh.validate()?;
        if mesh.is_empty(options.write_edges) {
            return Ok(None);
        }

        mesh.transform(matrix);

        let smooth_groups = if (options.smooth_groups || options.smooth_groups_bitflags)
            && !mesh.polygons.is_empty()
        {
            let groups = compute_smooth_groups(&mesh, options.smooth_groups_bitflags);
            groups.is_meaningful().then_some(groups.ids)
        } else {
            None
        };

        let face_order = face_order(&mesh, smooth_groups.as_deref(), options.keep_vertex_order);

        let uvs = (options.write_uvs && mesh.has_uvs()).then(|| dedup_uvs(&mesh, &face_order));
        let normals = (options.write_normals && !mesh.polygons.is_empty())
            .then(|| dedup_normals(&mesh, &face_order));

        Ok(Some(Self {
            object_name: object_name.to_string(),
            mesh,
            face_order,
            smooth_groups,
            uvs,
            normals,
        }))
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.positions.len()
    }

    pub fn uv_count(&self) -> usize {
        self.uvs.as_ref().map_or(0, AttributePool::len)
    }

    pub fn normal_count(&self) -> usize {
        self.normals.as_ref().map_or(0, AttributePool::len)
    }

    fn data_name(&self) -> &str {
        if self.mesh.name.is_empty() {
            &self.object_name
        } else {
            &self.mesh.name
        }
    }

    /// Name used on the `o`/`g` line
    pub fn display_name(&self) -> String {
        let data = self.data_name();
        if data == self.object_name {
            name_compat(Some(&self.object_name))
        } else {
            format!(
                "{}_{}",
                name_compat(Some(&self.object_name)),
                name_compat(Some(data))
            )
        }
    }

    fn material_group_prefix(&self) -> String {
        format!(
            "{}_{}",
            name_compat(Some(&self.object_name)),
            name_compat(Some(self.data_name()))
        )
    }

    fn face_format(&self) -> FaceFormat {
        FaceFormat::new(self.uvs.is_some(), self.normals.is_some())
    }
}

/// Counts of what [`write_mesh`] emitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshStats {
    pub faces: usize,
    pub loose_edges: usize,
}

/// Vertex group with the largest summed weight over a face's vertices
fn dominant_vertex_group(mesh: &MeshSnapshot, polygon: &Polygon) -> String {
    if mesh.vertex_weights.is_empty() {
        return "(null)".to_string();
    }

    let mut totals: HashMap<usize, f32> = HashMap::new();
    for corner in &polygon.corners {
        for weight in &mesh.vertex_weights[corner.vertex] {
            *totals.entry(weight.group).or_insert(0.0) += weight.weight;
        }
    }

    totals
        .into_iter()
        .map(|(group, weight)| (weight, mesh.vertex_groups[group].as_str()))
        .max_by(|a, b| a.0.total_cmp(&b.0).then_with(|| a.1.cmp(b.1)))
        .map_or_else(|| "(null)".to_string(), |(_, name)| name.to_string())
}

/// Write one prepared mesh with the given index offsets.
///
/// Material and smoothing directives are only emitted when the context
/// actually changes between consecutive faces.
pub fn write_mesh<W: Write>(
    w: &mut W,
    prepared: &PreparedMesh,
    base: IndexBase,
    materials: &mut MaterialRegistry,
    options: &ExportOptions,
) -> Result<MeshStats> {
    let mesh = &prepared.mesh;
    let mut stats = MeshStats::default();

    if options.blender_objects {
        writeln!(w, "o {}", prepared.display_name())?;
    } else if options.group_by_object {
        writeln!(w, "g {}", prepared.display_name())?;
    }

    for p in &mesh.positions {
        writeln!(w, "v {} {} {}", fmt6(p.x), fmt6(p.y), fmt6(p.z))?;
    }

    if let Some(uvs) = &prepared.uvs {
        for uv in &uvs.values {
            writeln!(w, "vt {} {}", fmt6(uv.x), fmt6(uv.y))?;
        }
    }

    if let Some(normals) = &prepared.normals {
        for key in &normals.values {
            writeln!(w, "vn {}", fmt_normal(key))?;
        }
    }

    let polygroups = options.vertex_groups && !mesh.vertex_groups.is_empty();
    let mut current_group = String::new();
    let mut current_material: Option<MaterialKey> = None;
    let mut current_smooth: Option<SmoothState> = None;
    let format = prepared.face_format();

    for &face in &prepared.face_order {
        let polygon = &mesh.polygons[face];
        let smooth = SmoothState::of(polygon, face, prepared.smooth_groups.as_deref());
        let material = mesh.face_material(polygon);
        let key = MaterialKey::for_face(material);

        if polygroups {
            let group = dominant_vertex_group(mesh, polygon);
            if group != current_group {
                writeln!(w, "g {}", group)?;
                current_group = group;
            }
        }

        if current_material.as_ref() != Some(&key) {
            if key.is_null() {
                if options.group_by_material {
                    writeln!(w, "g {}", prepared.material_group_prefix())?;
                }
                if options.write_materials {
                    writeln!(w, "usemtl (null)")?;
                }
            } else {
                let name = materials.resolve(&key, material);
                if options.group_by_material {
                    writeln!(w, "g {}_{}", prepared.material_group_prefix(), name)?;
                }
                if options.write_materials {
                    writeln!(w, "usemtl {}", name)?;
                }
            }
            current_material = Some(key);
        }

        if current_smooth != Some(smooth) {
            match smooth {
                SmoothState::Off => writeln!(w, "s off")?,
                SmoothState::On => writeln!(w, "s 1")?,
                SmoothState::Group(id) => writeln!(w, "s {}", id)?,
            }
            current_smooth = Some(smooth);
        }

        write!(w, "f")?;
        for (corner_index, corner) in polygon.corners.iter().enumerate() {
            let v = base.vertex + corner.vertex;
            let uv = || {
                prepared
                    .uvs
                    .as_ref()
                    .map_or(0, |pool| pool.index(face, corner_index))
                    + base.uv
            };
            let vn = || {
                prepared
                    .normals
                    .as_ref()
                    .map_or(0, |pool| pool.index(face, corner_index))
                    + base.normal
            };
            match format {
                FaceFormat::Vertex => write!(w, " {}", v)?,
                FaceFormat::VertexUv => write!(w, " {}/{}", v, uv())?,
                FaceFormat::VertexNormal => write!(w, " {}//{}", v, vn())?,
                FaceFormat::VertexUvNormal => write!(w, " {}/{}/{}", v, uv(), vn())?,
            }
        }
        writeln!(w)?;
        stats.faces += 1;
    }

    if options.write_edges {
        for edge in mesh.edges.iter().filter(|e| e.is_loose) {
            writeln!(
                w,
                "l {} {}",
                base.vertex + edge.vertices[0],
                base.vertex + edge.vertices[1]
            )?;
            stats.loose_edges += 1;
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::scene::{Edge, Loop, Material, VertexWeight};
    use glam::Vec3;

    fn options() -> ExportOptions {
        ExportOptions::default()
            .with_normals(false)
            .with_uvs(false)
    }

    fn base() -> IndexBase {
        IndexBase {
            vertex: 1,
            uv: 1,
            normal: 1,
        }
    }

    fn two_quads() -> MeshSnapshot {
        MeshSnapshot {
            name: "Plane".into(),
            positions: vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(2.0, 1.0, 0.0),
            ],
            polygons: vec![
                Polygon::from_vertices(&[0, 1, 4, 3], 0),
                Polygon::from_vertices(&[1, 2, 5, 4], 4),
            ],
            loops: (0..8)
                .map(|i| Loop {
                    normal: Vec3::Z,
                    uv: Some(Vec2::new(i as f32 * 0.125, 0.0)),
                })
                .collect(),
            ..MeshSnapshot::default()
        }
    }

    fn render(prepared: &PreparedMesh, base: IndexBase, options: &ExportOptions) -> String {
        let mut registry = MaterialRegistry::new();
        let mut out = Vec::new();
        write_mesh(&mut out, prepared, base, &mut registry, options).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn prepare(mesh: MeshSnapshot, options: &ExportOptions) -> PreparedMesh {
        PreparedMesh::prepare("Plane", mesh, &Mat4::IDENTITY, options)
            .unwrap()
            .unwrap()
    }

    fn lines_starting<'a>(text: &'a str, prefix: &str) -> Vec<&'a str> {
        text.lines().filter(|l| l.starts_with(prefix)).collect()
    }

    #[test]
    fn test_face_format_selection() {
        assert_eq!(FaceFormat::new(false, false), FaceFormat::Vertex);
        assert_eq!(FaceFormat::new(true, true), FaceFormat::VertexUvNormal);
        assert_eq!(FaceFormat::new(false, true), FaceFormat::VertexNormal);
    }

    #[test]
    fn test_vertex_only_faces() {
        let opts = options();
        let text = render(&prepare(two_quads(), &opts), base(), &opts);

        assert_eq!(lines_starting(&text, "v ").len(), 6);
        assert_eq!(
            lines_starting(&text, "f "),
            vec!["f 1 2 5 4", "f 2 3 6 5"]
        );
        assert!(text.starts_with("o Plane\n"));
        assert_eq!(lines_starting(&text, "usemtl"), vec!["usemtl (null)"]);
        assert_eq!(lines_starting(&text, "s "), vec!["s off"]);
    }

    #[test]
    fn test_all_attribute_tokens_use_bases() {
        let opts = ExportOptions::default();
        let prepared = prepare(two_quads(), &opts);
        assert_eq!(prepared.uv_count(), 8);
        assert_eq!(prepared.normal_count(), 1);

        let text = render(
            &prepared,
            IndexBase {
                vertex: 11,
                uv: 21,
                normal: 31,
            },
            &opts,
        );
        assert_eq!(
            lines_starting(&text, "f "),
            vec![
                "f 11/21/31 12/22/31 15/23/31 14/24/31",
                "f 12/25/31 13/26/31 16/27/31 15/28/31"
            ]
        );
        assert_eq!(lines_starting(&text, "vn "), vec!["vn 0.0000 0.0000 1.0000"]);
        assert_eq!(lines_starting(&text, "vt ")[1], "vt 0.125000 0.000000");
    }

    #[test]
    fn test_normal_only_tokens() {
        let opts = ExportOptions::default().with_uvs(false);
        let text = render(&prepare(two_quads(), &opts), base(), &opts);
        assert_eq!(lines_starting(&text, "f ")[0], "f 1//1 2//1 5//1 4//1");
        assert!(lines_starting(&text, "vt ").is_empty());
    }

    #[test]
    fn test_smooth_switch_emitted_once_per_change() {
        let mut mesh = two_quads();
        mesh.polygons[1].use_smooth = true;
        mesh.polygons.push(Polygon::from_vertices(&[0, 1, 4], 0).smooth(true));

        let opts = options();
        let text = render(&prepare(mesh, &opts), base(), &opts);
        assert_eq!(lines_starting(&text, "s "), vec!["s off", "s 1"]);
    }

    #[test]
    fn test_keep_vertex_order_alternates_smoothing() {
        let mut mesh = two_quads();
        mesh.polygons[0].use_smooth = true;
        mesh.polygons.push(Polygon::from_vertices(&[0, 1, 4], 0).smooth(true));

        let opts = options().with_keep_vertex_order(true);
        let text = render(&prepare(mesh, &opts), base(), &opts);
        assert_eq!(lines_starting(&text, "s "), vec!["s 1", "s off", "s 1"]);
    }

    #[test]
    fn test_material_switches_and_groups() {
        let mut mesh = two_quads();
        mesh.materials = vec![Some(Material::new("Red Paint")), None];
        mesh.polygons[1].material_index = 1;

        let opts = options().with_group_by_material(true);
        let text = render(&prepare(mesh, &opts), base(), &opts);

        let directives: Vec<&str> = text
            .lines()
            .filter(|l| l.starts_with("g ") || l.starts_with("usemtl"))
            .collect();
        assert_eq!(
            directives,
            vec![
                "g Plane_Plane_Red_Paint",
                "usemtl Red_Paint",
                "g Plane_Plane",
                "usemtl (null)"
            ]
        );
    }

    #[test]
    fn test_no_usemtl_without_materials_output() {
        let mut mesh = two_quads();
        mesh.materials = vec![Some(Material::new("M"))];
        let opts = options().with_materials(false);
        let text = render(&prepare(mesh, &opts), base(), &opts);
        assert!(lines_starting(&text, "usemtl").is_empty());
    }

    #[test]
    fn test_loose_edges() {
        let mut mesh = two_quads();
        mesh.edges = vec![
            Edge {
                vertices: [0, 1],
                is_loose: false,
                use_sharp: false,
            },
            Edge {
                vertices: [3, 5],
                is_loose: true,
                use_sharp: false,
            },
        ];
        let opts = options();
        let text = render(
            &prepare(mesh.clone(), &opts),
            IndexBase {
                vertex: 5,
                uv: 1,
                normal: 1,
            },
            &opts,
        );
        assert_eq!(lines_starting(&text, "l "), vec!["l 8 10"]);

        let opts = options().with_edges(false);
        let text = render(&prepare(mesh, &opts), base(), &opts);
        assert!(lines_starting(&text, "l ").is_empty());
    }

    #[test]
    fn test_polygroups_follow_dominant_weight() {
        let mut mesh = two_quads();
        mesh.vertex_groups = vec!["left".into(), "right".into()];
        let left = VertexWeight {
            group: 0,
            weight: 1.0,
        };
        let right = VertexWeight {
            group: 1,
            weight: 1.0,
        };
        mesh.vertex_weights = vec![
            vec![left],
            vec![left, right],
            vec![right],
            vec![left],
            vec![left, right],
            vec![right],
        ];

        let opts = options().with_vertex_groups(true);
        let text = render(&prepare(mesh, &opts), base(), &opts);
        assert_eq!(lines_starting(&text, "g "), vec!["g left", "g right"]);
    }

    #[test]
    fn test_display_name_combines_object_and_data() {
        let opts = options();
        let prepared = PreparedMesh::prepare("Big Rock", two_quads(), &Mat4::IDENTITY, &opts)
            .unwrap()
            .unwrap();
        assert_eq!(prepared.display_name(), "Big_Rock_Plane");

        let mut mesh = two_quads();
        mesh.name = String::new();
        let prepared = PreparedMesh::prepare("Rock", mesh, &Mat4::IDENTITY, &opts)
            .unwrap()
            .unwrap();
        assert_eq!(prepared.display_name(), "Rock");
    }

    #[test]
    fn test_empty_mesh_is_skipped() {
        let prepared =
            PreparedMesh::prepare("Nothing", MeshSnapshot::default(), &Mat4::IDENTITY, &options())
                .unwrap();
        assert!(prepared.is_none());
    }

    #[test]
    fn test_smoothing_groups_written() {
        let mut mesh = two_quads();
        for polygon in &mut mesh.polygons {
            polygon.use_smooth = true;
        }
        mesh.edges.push(Edge {
            vertices: [1, 4],
            is_loose: false,
            use_sharp: true,
        });

        let opts = options().with_smooth_groups(true);
        let text = render(&prepare(mesh, &opts), base(), &opts);
        assert_eq!(lines_starting(&text, "s "), vec!["s 1", "s 2"]);
    }
}
