//! Texture path references written into the MTL file

use crate::scene::Image;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// How texture paths are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathMode {
    /// Relative when the texture lives under the output directory, else absolute
    #[default]
    Auto,
    Absolute,
    Relative,
    /// Keep whatever kind of path the scene used
    Match,
    /// File name only
    Strip,
    /// Copy the texture next to the output and reference the copy
    Copy,
}

/// Turns an image reference into the path written after `map_Kd`
pub trait PathResolver {
    fn resolve(&mut self, image: &Image) -> String;
}

/// Filesystem-backed resolver that remembers which files need copying
#[derive(Debug, Clone)]
pub struct FsPathResolver {
    mode: PathMode,
    source_dir: PathBuf,
    dest_dir: PathBuf,
    copy_set: BTreeSet<(PathBuf, PathBuf)>,
}

impl FsPathResolver {
    pub fn new(mode: PathMode, source_dir: impl Into<PathBuf>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            mode,
            source_dir: source_dir.into(),
            dest_dir: dest_dir.into(),
            copy_set: BTreeSet::new(),
        }
    }

    /// Pending (source, destination) copies
    pub fn copy_set(&self) -> &BTreeSet<(PathBuf, PathBuf)> {
        &self.copy_set
    }

    /// Copy every collected texture; returns how many files were copied
    pub fn copy_files(&self) -> Result<usize> {
        let mut copied = 0;
        for (src, dst) in &self.copy_set {
            if src == dst {
                continue;
            }
            if !src.is_file() {
                tracing::warn!("Texture '{}' not found, not copied", src.display());
                continue;
            }
            if let Some(parent) = dst.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(src, dst)?;
            copied += 1;
        }
        Ok(copied)
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            normalize(path)
        } else {
            normalize(&self.source_dir.join(path))
        }
    }

    fn relative_or_absolute(&self, absolute: &Path) -> PathBuf {
        relative_to(absolute, &normalize(&self.dest_dir)).unwrap_or_else(|| absolute.to_path_buf())
    }
}

impl PathResolver for FsPathResolver {
    fn resolve(&mut self, image: &Image) -> String {
        let absolute = self.absolute(&image.filepath);
        let dest = normalize(&self.dest_dir);

        let resolved = match self.mode {
            PathMode::Absolute => absolute,
            PathMode::Relative => self.relative_or_absolute(&absolute),
            PathMode::Auto => {
                if absolute.starts_with(&dest) {
                    self.relative_or_absolute(&absolute)
                } else {
                    absolute
                }
            }
            PathMode::Match => {
                if image.filepath.is_absolute() {
                    absolute
                } else {
                    self.relative_or_absolute(&absolute)
                }
            }
            PathMode::Strip => file_name(&absolute),
            PathMode::Copy => {
                let target = dest.join(file_name(&absolute));
                self.copy_set.insert((absolute, target.clone()));
                self.relative_or_absolute(&target)
            }
        };

        resolved.to_string_lossy().into_owned()
    }
}

fn file_name(path: &Path) -> PathBuf {
    path.file_name().map(PathBuf::from).unwrap_or_default()
}

/// Lexically resolve `.` and `..` components
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Path of `path` as seen from `base`; both must be absolute and share a root
pub fn relative_to(path: &Path, base: &Path) -> Option<PathBuf> {
    if path.is_absolute() != base.is_absolute() {
        return None;
    }

    let path: Vec<Component> = path.components().collect();
    let base: Vec<Component> = base.components().collect();

    if path.first() != base.first() {
        return None;
    }

    let common = path
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..base.len() {
        out.push("..");
    }
    for component in &path[common..] {
        out.push(component.as_os_str());
    }
    Some(out)
}
