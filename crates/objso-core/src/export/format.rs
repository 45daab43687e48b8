//! Number formatting shared by the writers
//!
//! Positions and UVs are written with six decimals, normals and curve
//! parameters with four. The four-decimal width matches the rounding used
//! for normal deduplication keys.

use super::dedup::{NormalKey, dequantize};

pub fn fmt6(value: f32) -> String {
    format!("{:.6}", value)
}

pub fn fmt4(value: f64) -> String {
    format!("{:.4}", value)
}

/// A normal line payload, written from its rounded key
pub fn fmt_normal(key: &NormalKey) -> String {
    format!(
        "{} {} {}",
        fmt4(dequantize(key[0])),
        fmt4(dequantize(key[1])),
        fmt4(dequantize(key[2]))
    )
}
