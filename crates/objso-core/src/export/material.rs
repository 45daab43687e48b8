//! Material name registry
//!
//! Every distinct (material, image) pair used by the export gets exactly one
//! MTL name for the whole run. Names are derived from the material name and
//! only grow a suffix when two keys would otherwise collide.

use crate::scene::Material;
use std::collections::HashMap;

/// Replace spaces so a name survives OBJ's whitespace-separated syntax
pub fn name_compat(name: Option<&str>) -> String {
    match name {
        Some(name) => name.replace(' ', "_"),
        None => "None".to_string(),
    }
}

/// Identity of a `usemtl` target
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MaterialKey {
    pub material: Option<String>,
    pub image: Option<String>,
}

impl MaterialKey {
    pub fn new(material: Option<&str>, image: Option<&str>) -> Self {
        Self {
            material: material.map(str::to_string),
            image: image.map(str::to_string),
        }
    }

    /// Key for a mesh face; per-face images don't exist, so only the
    /// material name takes part
    pub fn for_face(material: Option<&Material>) -> Self {
        Self::new(material.map(|m| m.name.as_str()), None)
    }

    /// Faces without any material
    pub fn is_null(&self) -> bool {
        self.material.is_none() && self.image.is_none()
    }
}

/// A resolved registry entry
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredMaterial {
    pub key: MaterialKey,
    pub name: String,
    pub material: Option<Material>,
}

/// All materials referenced so far, in first-use order
#[derive(Debug, Clone, Default)]
pub struct MaterialRegistry {
    entries: Vec<RegisteredMaterial>,
    by_key: HashMap<MaterialKey, usize>,
    by_name: HashMap<String, usize>,
}

impl MaterialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name already issued to `key`, if any
    pub fn get(&self, key: &MaterialKey) -> Option<&str> {
        self.by_key
            .get(key)
            .map(|&index| self.entries[index].name.as_str())
    }

    /// Entries in the order their keys were first resolved
    pub fn iter(&self) -> impl Iterator<Item = &RegisteredMaterial> {
        self.entries.iter()
    }

    /// Return the MTL name for `key`, issuing a new one on first use.
    ///
    /// The base name is the material name. If another key already owns it,
    /// the image name (or `NONE`) is appended; if that is taken as well, a
    /// counter replaces it until the name is free.
    pub fn resolve(&mut self, key: &MaterialKey, material: Option<&Material>) -> &str {
        if let Some(&index) = self.by_key.get(key) {
            return &self.entries[index].name;
        }

        let base = name_compat(key.material.as_deref());
        let mut name = base.clone();
        if self.by_name.contains_key(&name) {
            name = match &key.image {
                Some(image) => format!("{}_{}", base, name_compat(Some(image))),
                None => format!("{}_NONE", base),
            };
            let mut n = 0usize;
            while self.by_name.contains_key(&name) {
                name = format!("{}_{}", base, n);
                n += 1;
            }
        }

        let index = self.entries.len();
        self.entries.push(RegisteredMaterial {
            key: key.clone(),
            name: name.clone(),
            material: material.cloned(),
        });
        self.by_key.insert(key.clone(), index);
        self.by_name.insert(name, index);
        &self.entries[index].name
    }
}
