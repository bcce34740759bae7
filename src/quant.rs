// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quantization tables and quality scaling.
//!
//! Holds the two standard Annex K base matrices and derives quality-scaled
//! tables from them: `scale = q < 50 ? 5000/q : 200 − 2q`, each entry
//! `clamp(floor((base·scale + 50)/100), 1, 255)`. All tables are kept in
//! natural (row-major) order; the zigzag unpacking happens at the DQT
//! segment boundary.

use crate::error::{Error, Result};

/// Quantization table: 64 values in natural (row-major) order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantTable {
    /// Quantization values, indexed by row * 8 + col.
    pub values: [u16; 64],
}

impl QuantTable {
    pub fn new(values: [u16; 64]) -> Self {
        Self { values }
    }
}

/// Standard luminance quantization matrix (ITU-T T.81 Table K.1), natural order.
pub const STD_LUMINANCE_QUANT: [u16; 64] = [
    16, 11, 10, 16, 24, 40, 51, 61,
    12, 12, 14, 19, 26, 58, 60, 55,
    14, 13, 16, 24, 40, 57, 69, 56,
    14, 17, 22, 29, 51, 87, 80, 62,
    18, 22, 37, 56, 68, 109, 103, 77,
    24, 35, 55, 64, 81, 104, 113, 92,
    49, 64, 78, 87, 103, 121, 120, 101,
    72, 92, 95, 98, 112, 100, 103, 99,
];

/// Standard chrominance quantization matrix (ITU-T T.81 Table K.2), natural order.
pub const STD_CHROMINANCE_QUANT: [u16; 64] = [
    17, 18, 24, 47, 99, 99, 99, 99,
    18, 21, 26, 66, 99, 99, 99, 99,
    24, 26, 56, 99, 99, 99, 99, 99,
    47, 66, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99,
];

/// Map a quality setting in [1, 100] to the libjpeg-style percentage scale
/// factor.
pub fn scale_factor(quality: u8) -> Result<u32> {
    if quality < 1 || quality > 100 {
        return Err(Error::InvalidQuality(quality));
    }
    let q = quality as u32;
    Ok(if q < 50 { 5000 / q } else { 200 - 2 * q })
}

/// Scale a base matrix by quality. Every entry lands in [1, 255].
pub fn scaled_table(base: &[u16; 64], quality: u8) -> Result<QuantTable> {
    let sf = scale_factor(quality)?;
    let mut values = [0u16; 64];
    for (v, &b) in values.iter_mut().zip(base.iter()) {
        *v = (((b as u32) * sf + 50) / 100).clamp(1, 255) as u16;
    }
    Ok(QuantTable::new(values))
}
