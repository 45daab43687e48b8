//! Axis conversion between the scene's Z-up frame and the target frame
//!
//! Scenes come in with +Y forward and +Z up. OBJ consumers usually expect
//! -Z forward and +Y up, which is the default conversion.

use crate::{Error, Result};
use glam::{Mat3, Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A signed coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    #[serde(rename = "X")]
    X,
    #[serde(rename = "Y")]
    Y,
    #[serde(rename = "Z")]
    Z,
    #[serde(rename = "-X")]
    NegX,
    #[serde(rename = "-Y")]
    NegY,
    #[serde(rename = "-Z")]
    NegZ,
}

impl Axis {
    pub fn to_vec3(self) -> Vec3 {
        match self {
            Self::X => Vec3::X,
            Self::Y => Vec3::Y,
            Self::Z => Vec3::Z,
            Self::NegX => Vec3::NEG_X,
            Self::NegY => Vec3::NEG_Y,
            Self::NegZ => Vec3::NEG_Z,
        }
    }

    /// Index of the unsigned axis (0 = X, 1 = Y, 2 = Z)
    fn index(self) -> usize {
        match self {
            Self::X | Self::NegX => 0,
            Self::Y | Self::NegY => 1,
            Self::Z | Self::NegZ => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::X => "X",
            Self::Y => "Y",
            Self::Z => "Z",
            Self::NegX => "-X",
            Self::NegY => "-Y",
            Self::NegZ => "-Z",
        };
        f.write_str(s)
    }
}

impl FromStr for Axis {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "X" => Ok(Self::X),
            "Y" => Ok(Self::Y),
            "Z" => Ok(Self::Z),
            "-X" => Ok(Self::NegX),
            "-Y" => Ok(Self::NegY),
            "-Z" => Ok(Self::NegZ),
            _ => Err(Error::InvalidParameter(format!("unknown axis '{}'", s))),
        }
    }
}

/// Rotation taking the scene frame (forward +Y, up +Z) to the given frame
pub fn axis_conversion(forward: Axis, up: Axis) -> Result<Mat3> {
    if forward.index() == up.index() {
        return Err(Error::InvalidParameter(format!(
            "forward ({}) and up ({}) must use different axes",
            forward, up
        )));
    }

    let forward = forward.to_vec3();
    let up = up.to_vec3();
    // Columns are the images of +X, +Y, +Z; +X stays the right-hand side.
    Ok(Mat3::from_cols(forward.cross(up), forward, up))
}

/// Scale followed by axis conversion, applied on top of every world matrix
pub fn global_matrix(scale: f32, forward: Axis, up: Axis) -> Result<Mat4> {
    if !(scale.is_finite() && scale > 0.0) {
        return Err(Error::InvalidParameter(format!(
            "global scale must be positive, got {}",
            scale
        )));
    }
    let rotation = axis_conversion(forward, up)?;
    Ok(Mat4::from_scale(Vec3::splat(scale)) * Mat4::from_mat3(rotation))
}
