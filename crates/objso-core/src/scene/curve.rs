//! Curve snapshots

use crate::{Error, Result};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Kind of spline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplineType {
    /// Straight segments between control points
    Poly,
    /// Uniform B-spline
    Nurbs,
    Bezier,
}

/// A single spline of a curve object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spline {
    #[serde(rename = "type")]
    pub kind: SplineType,
    pub points: Vec<Vec3>,
    /// Order in U (degree + 1)
    #[serde(default = "default_order")]
    pub order_u: u32,
    /// Number of point rows in V, more than one makes this a surface
    #[serde(default = "default_rows")]
    pub point_count_v: u32,
    #[serde(default)]
    pub cyclic: bool,
    /// Clamp the curve to its end points
    #[serde(default)]
    pub endpoint: bool,
}

fn default_order() -> u32 {
    4
}

fn default_rows() -> u32 {
    1
}

impl Spline {
    pub fn poly(points: Vec<Vec3>) -> Self {
        Self {
            kind: SplineType::Poly,
            points,
            order_u: 2,
            point_count_v: 1,
            cyclic: false,
            endpoint: false,
        }
    }

    pub fn nurbs(points: Vec<Vec3>, order_u: u32) -> Self {
        Self {
            kind: SplineType::Nurbs,
            points,
            order_u,
            point_count_v: 1,
            cyclic: false,
            endpoint: false,
        }
    }

    pub fn cyclic(mut self, cyclic: bool) -> Self {
        self.cyclic = cyclic;
        self
    }

    pub fn endpoint(mut self, endpoint: bool) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Degree written to `deg`: 1 for poly splines, `order - 1` otherwise
    pub fn degree(&self) -> u32 {
        match self.kind {
            SplineType::Poly => 1,
            _ => self.order_u.saturating_sub(1),
        }
    }

    pub fn is_surface(&self) -> bool {
        self.point_count_v > 1
    }

    /// Poly and B-spline curves map onto OBJ curves; bezier and surfaces don't
    pub fn is_obj_compatible(&self) -> bool {
        self.kind != SplineType::Bezier && !self.is_surface()
    }

    /// Check the spline can be encoded; `curve` names it in the error
    pub fn validate(&self, curve: &str) -> Result<()> {
        if self.kind != SplineType::Poly && self.order_u < 2 {
            return Err(Error::invalid_curve(
                curve,
                format!("spline has order {}", self.order_u),
            ));
        }
        if self.points.iter().any(|p| !p.is_finite()) {
            return Err(Error::invalid_curve(
                curve,
                "spline has non-finite control points",
            ));
        }
        Ok(())
    }
}

/// Curve data of one object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveSnapshot {
    pub name: String,
    pub splines: Vec<Spline>,
}

impl CurveSnapshot {
    pub fn new(name: impl Into<String>, splines: Vec<Spline>) -> Self {
        Self {
            name: name.into(),
            splines,
        }
    }

    /// The object can go through the curve writer if at least one spline
    /// can; the others get skipped individually.
    pub fn has_obj_compatible_spline(&self) -> bool {
        self.splines.iter().any(Spline::is_obj_compatible)
    }
}
