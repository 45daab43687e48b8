//! objso CLI - Command-line interface for OBJ/MTL scene export

mod preset;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use objso_core::prelude::*;
use preset::{Overrides, load_preset, save_preset};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "objso")]
#[command(about = "Export scene snapshots to Wavefront OBJ/MTL", long_about = None)]
#[command(version)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a JSON scene document to OBJ
    Export {
        /// Scene document
        scene: PathBuf,

        /// Output OBJ file; the MTL file is written next to it
        #[arg(short, long)]
        output: PathBuf,

        /// JSON preset with export options
        #[arg(short, long)]
        preset: Option<PathBuf>,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Write the default export options as a preset file
    Preset {
        /// Preset file to write (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the objects of a scene document
    Info {
        /// Scene document
        scene: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();

    match cli.command {
        Commands::Export {
            scene,
            output,
            preset,
            overrides,
        } => {
            let options = overrides.apply(load_preset(preset.as_deref())?);
            run_export(&scene, &output, &options)?;
        }
        Commands::Preset { output } => {
            run_preset(output.as_deref())?;
        }
        Commands::Info { scene } => {
            run_info(&scene)?;
        }
    }

    Ok(())
}

fn load_scene(path: &Path) -> Result<Scene> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scene {}", path.display()))?;
    let mut scene = Scene::from_json(&json)
        .with_context(|| format!("Failed to parse scene {}", path.display()))?;

    // Relative texture paths are relative to the document unless it says otherwise
    if scene.source_dir.is_none() {
        scene.source_dir = path.parent().map(Path::to_path_buf);
    }
    if scene.source_name.is_none() {
        scene.source_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
    }
    Ok(scene)
}

fn run_export(scene_path: &Path, output: &Path, options: &ExportOptions) -> Result<()> {
    println!("Exporting {}...", scene_path.display());

    let scene = load_scene(scene_path)?;
    let stats = scene
        .export_obj_with(output, options)
        .with_context(|| format!("Failed to export {}", output.display()))?;

    println!("{}", stats);
    println!("Saved to: {}", output.display());
    if options.write_materials {
        println!("Materials: {}", output.with_extension("mtl").display());
    }

    Ok(())
}

fn run_preset(output: Option<&Path>) -> Result<()> {
    let options = ExportOptions::default();
    match output {
        Some(path) => {
            save_preset(&options, path)?;
            println!("Saved preset to: {}", path.display());
        }
        None => {
            println!("{}", serde_json::to_string_pretty(&options)?);
        }
    }
    Ok(())
}

fn run_info(scene_path: &Path) -> Result<()> {
    let scene = load_scene(scene_path)?;

    println!("Scene: {}", scene_path.display());
    println!("Objects: {}", scene.objects.len());
    for object in &scene.objects {
        let summary = match &object.geometry {
            Geometry::Mesh(mesh) => format!(
                "mesh, {} vertices, {} faces",
                mesh.vertex_count(),
                mesh.face_count()
            ),
            Geometry::Curve { curve, mesh } => format!(
                "curve, {} splines{}",
                curve.splines.len(),
                if mesh.is_some() { ", tessellated" } else { "" }
            ),
            Geometry::Empty => "no geometry".to_string(),
        };
        let instanced = if object.is_instance_child() {
            " (instanced)"
        } else {
            ""
        };
        println!("  {}: {}{}", object.name, summary, instanced);
    }

    Ok(())
}
