//! OBJ free-form curve output (`cstype`/`deg`/`curv`/`parm`)
//!
//! Poly and B-spline curves are written as curves instead of tessellated
//! geometry. Control points are referenced with negative indices, so the
//! output does not depend on the running vertex counter.

use super::format::{fmt4, fmt6};
use super::material::name_compat;
use crate::Result;
use crate::scene::{CurveSnapshot, Spline, SplineType};
use glam::Mat4;
use std::io::Write;
use tracing::warn;

/// The `curv` and `parm` payload of one spline
#[derive(Debug, Clone, PartialEq)]
pub struct SplineEncoding {
    pub degree: u32,
    /// Relative control point indices, `-1` being the last point written
    pub indices: Vec<i64>,
    /// Knot values in `[0, 1]`
    pub params: Vec<f64>,
}

/// Build the `curv`/`parm` data for a spline, or `None` if it can't be written
pub fn encode_spline(spline: &Spline) -> Option<SplineEncoding> {
    if spline.kind == SplineType::Bezier || spline.is_surface() {
        return None;
    }

    let degree = spline.degree();
    let points = spline.points.len();
    if degree == 0 || points <= degree as usize {
        return None;
    }

    let mut indices: Vec<i64> = (0..points as i64).map(|i| -(i + 1)).collect();
    let mut point_count = points;

    if spline.cyclic {
        if degree == 1 {
            // The closing segment goes back to the first point
            indices.push(-1);
            point_count += 1;
        } else {
            let wrap: Vec<i64> = indices[..degree as usize].to_vec();
            indices.extend(wrap);
            point_count += degree as usize;
        }
    }

    let total = (degree as usize + 1) + point_count;
    let divisor = (total - 1) as f64;
    let mut params: Vec<f64> = (0..total).map(|i| i as f64 / divisor).collect();

    if !spline.cyclic && spline.endpoint {
        let clamped = degree as usize + 1;
        for value in &mut params[..clamped] {
            *value = 0.0;
        }
        for value in &mut params[total - clamped..] {
            *value = 1.0;
        }
    }

    Some(SplineEncoding {
        degree,
        indices,
        params,
    })
}

/// Write every compatible spline of a curve object.
///
/// Returns the number of `v` lines written; curves never add UVs or normals.
pub fn write_curve<W: Write>(
    w: &mut W,
    object_name: &str,
    curve: &CurveSnapshot,
    matrix: &Mat4,
) -> Result<usize> {
    let mut total_points = 0;

    for spline in &curve.splines {
        if spline.kind == SplineType::Bezier {
            warn!(
                "Bezier curve '{}': only poly and nurbs curves supported",
                object_name
            );
            continue;
        }
        if spline.is_surface() {
            warn!(
                "Surface '{}': only poly and nurbs curves supported",
                object_name
            );
            continue;
        }
        if let Err(e) = spline.validate(object_name) {
            warn!("{}, skipping spline", e);
            continue;
        }
        let Some(encoding) = encode_spline(spline) else {
            warn!(
                "Curve '{}': order {} needs more than {} points, skipping spline",
                object_name,
                spline.order_u,
                spline.points.len()
            );
            continue;
        };

        for point in &spline.points {
            let p = matrix.transform_point3(*point);
            writeln!(w, "v {} {} {}", fmt6(p.x), fmt6(p.y), fmt6(p.z))?;
        }
        total_points += spline.points.len();

        writeln!(w, "g {}", name_compat(Some(object_name)))?;
        writeln!(w, "cstype bspline")?;
        writeln!(w, "deg {}", encoding.degree)?;

        let indices: Vec<String> = encoding.indices.iter().map(|i| i.to_string()).collect();
        writeln!(w, "curv 0.0 1.0 {}", indices.join(" "))?;

        let params: Vec<String> = encoding.params.iter().map(|&p| fmt4(p)).collect();
        writeln!(w, "parm u {}", params.join(" "))?;
        writeln!(w, "end")?;
    }

    Ok(total_points)
}
