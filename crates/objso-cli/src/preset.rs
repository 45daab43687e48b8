//! Export presets: JSON option files plus command-line overrides

use anyhow::{Context, Result};
use clap::Args;
use objso_core::axis::Axis;
use objso_core::export::{ExportOptions, PathMode};
use std::fs;
use std::path::Path;

/// Load a preset, falling back to the default options when no file is given
pub fn load_preset(path: Option<&Path>) -> Result<ExportOptions> {
    let Some(path) = path else {
        return Ok(ExportOptions::default());
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read preset {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse preset {}", path.display()))
}

/// Write options as a preset file
pub fn save_preset(options: &ExportOptions, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create preset directory")?;
    }

    let json = serde_json::to_string_pretty(options).context("Failed to serialize preset")?;

    fs::write(path, json).context("Failed to write preset file")
}

fn parse_path_mode(value: &str) -> std::result::Result<PathMode, String> {
    serde_json::from_value(serde_json::Value::String(value.to_lowercase()))
        .map_err(|_| format!("unknown path mode '{value}'"))
}

/// Options given on the command line, applied on top of the preset
#[derive(Args, Debug, Clone, Default)]
pub struct Overrides {
    /// Don't write vertex normals
    #[arg(long)]
    no_normals: bool,

    /// Don't write UV coordinates
    #[arg(long)]
    no_uvs: bool,

    /// Don't write materials or the MTL file
    #[arg(long)]
    no_materials: bool,

    /// Don't write loose edges
    #[arg(long)]
    no_edges: bool,

    /// Compute smoothing groups from sharp edges
    #[arg(long)]
    smooth_groups: bool,

    /// Write smoothing groups as bitflags
    #[arg(long)]
    smooth_groups_bitflags: bool,

    /// Write `g` lines instead of `o` lines per object
    #[arg(long)]
    group_by_object: bool,

    /// Write a `g` line at every material change
    #[arg(long)]
    group_by_material: bool,

    /// Write faces in their source order
    #[arg(long)]
    keep_vertex_order: bool,

    /// Write polygroups from vertex groups
    #[arg(long)]
    vertex_groups: bool,

    /// Write poly and NURBS curves as OBJ curves
    #[arg(long)]
    nurbs: bool,

    /// Uniform scale applied to every object
    #[arg(long)]
    scale: Option<f32>,

    /// Forward axis of the output (X, Y, Z, -X, -Y, -Z)
    #[arg(long, allow_hyphen_values = true)]
    forward: Option<Axis>,

    /// Up axis of the output
    #[arg(long, allow_hyphen_values = true)]
    up: Option<Axis>,

    /// Texture path mode (auto, absolute, relative, match, strip, copy)
    #[arg(long, value_parser = parse_path_mode)]
    path_mode: Option<PathMode>,

    /// Prepare objects in parallel
    #[arg(long)]
    parallel: bool,
}

impl Overrides {
    pub fn apply(&self, mut options: ExportOptions) -> ExportOptions {
        if self.no_normals {
            options.write_normals = false;
        }
        if self.no_uvs {
            options.write_uvs = false;
        }
        if self.no_materials {
            options.write_materials = false;
        }
        if self.no_edges {
            options.write_edges = false;
        }
        if self.smooth_groups {
            options.smooth_groups = true;
        }
        if self.smooth_groups_bitflags {
            options.smooth_groups_bitflags = true;
        }
        if self.group_by_object {
            options.blender_objects = false;
            options.group_by_object = true;
        }
        if self.group_by_material {
            options.group_by_material = true;
        }
        if self.keep_vertex_order {
            options.keep_vertex_order = true;
        }
        if self.vertex_groups {
            options.vertex_groups = true;
        }
        if self.nurbs {
            options.curves_as_nurbs = true;
        }
        if let Some(scale) = self.scale {
            options.global_scale = scale;
        }
        if let Some(forward) = self.forward {
            options.axis_forward = forward;
        }
        if let Some(up) = self.up {
            options.axis_up = up;
        }
        if let Some(mode) = self.path_mode {
            options.path_mode = mode;
        }
        if self.parallel {
            options.parallel = true;
        }
        options
    }
}
