//! MTL material library output

use super::material::MaterialRegistry;
use super::path::PathResolver;
use crate::Result;
use std::io::Write;

/// Write every registered material, in the order it was first used.
///
/// Only the diffuse texture is carried over; materials without one get a
/// bare `newmtl` block.
pub fn write_mtl<W: Write>(
    w: &mut W,
    materials: &MaterialRegistry,
    source_name: &str,
    resolver: &mut dyn PathResolver,
) -> Result<()> {
    writeln!(w, "# objso MTL File: '{}'", source_name)?;
    writeln!(w, "# Material Count: {}", materials.len())?;

    for entry in materials.iter() {
        writeln!(w)?;
        writeln!(w, "newmtl {}", entry.name)?;

        if let Some(image) = entry.material.as_ref().and_then(|m| m.diffuse_image()) {
            writeln!(w, "map_Kd {}", resolver.resolve(image))?;
        }
    }

    Ok(())
}
