// SPDX-License-Identifier: MIT OR Apache-2.0

//! DCT coefficient storage and the 8×8 block transform.
//!
//! Provides [`DctGrid`], the arena of quantized coefficient blocks for one
//! image component, and the separable two-pass forward/inverse DCT-II used
//! by the pixel paths. Quantization is folded into the block transforms:
//! [`idct_block`] dequantizes on the way in, [`dct_block`] quantizes on the
//! way out, so the grids always hold quantized values.

use std::sync::OnceLock;

/// Pre-computed 8×8 cosine table.
/// `COSINE[u][x] = cos((2*x + 1) * u * PI / 16)`
static COSINE: OnceLock<[[f64; 8]; 8]> = OnceLock::new();

/// Per-pass normalization: 0.5 · C(u), with C(0) = 1/√2 and C(u>0) = 1.
static NORM: OnceLock<[f64; 8]> = OnceLock::new();

fn cosine_table() -> &'static [[f64; 8]; 8] {
    COSINE.get_or_init(|| {
        let mut table = [[0.0f64; 8]; 8];
        for u in 0..8 {
            for x in 0..8 {
                table[u][x] = ((2 * x + 1) as f64 * u as f64 * std::f64::consts::PI / 16.0).cos();
            }
        }
        table
    })
}

fn norm_table() -> &'static [f64; 8] {
    NORM.get_or_init(|| {
        let mut n = [0.5f64; 8];
        n[0] = 0.5 / (2.0f64).sqrt();
        n
    })
}

/// Grid of quantized DCT coefficients for one image component.
///
/// Coefficients are stored in block-raster order. Within each block,
/// the 64 coefficients are in natural (row-major) order, i.e. index = row * 8 + col.
/// Allocated once when the first scan begins and mutated in place by every
/// subsequent scan.
#[derive(Debug, Clone)]
pub struct DctGrid {
    /// Number of 8×8 blocks horizontally.
    blocks_wide: usize,
    /// Number of 8×8 blocks vertically.
    blocks_tall: usize,
    /// Flat storage: blocks_tall * blocks_wide * 64 coefficients.
    coeffs: Vec<i16>,
}

impl DctGrid {
    /// Create a new grid initialized to zero.
    pub fn new(blocks_wide: usize, blocks_tall: usize) -> Self {
        Self {
            blocks_wide,
            blocks_tall,
            coeffs: vec![0i16; blocks_wide * blocks_tall * 64],
        }
    }

    pub fn blocks_wide(&self) -> usize {
        self.blocks_wide
    }

    pub fn blocks_tall(&self) -> usize {
        self.blocks_tall
    }

    /// Get a coefficient value.
    /// - `br`, `bc`: block row and column (0-based)
    /// - `i`, `j`: frequency row and column within the block (0–7)
    pub fn get(&self, br: usize, bc: usize, i: usize, j: usize) -> i16 {
        self.coeffs[self.index(br, bc, i, j)]
    }

    /// Set a coefficient value.
    pub fn set(&mut self, br: usize, bc: usize, i: usize, j: usize, val: i16) {
        let idx = self.index(br, bc, i, j);
        self.coeffs[idx] = val;
    }

    /// Get a reference to the 64-coefficient block at (br, bc).
    pub fn block(&self, br: usize, bc: usize) -> &[i16] {
        let start = (br * self.blocks_wide + bc) * 64;
        &self.coeffs[start..start + 64]
    }

    /// Get a mutable reference to the 64-coefficient block at (br, bc).
    pub fn block_mut(&mut self, br: usize, bc: usize) -> &mut [i16] {
        let start = (br * self.blocks_wide + bc) * 64;
        &mut self.coeffs[start..start + 64]
    }

    /// Total number of blocks.
    pub fn total_blocks(&self) -> usize {
        self.blocks_wide * self.blocks_tall
    }

    fn index(&self, br: usize, bc: usize, i: usize, j: usize) -> usize {
        debug_assert!(br < self.blocks_tall, "block row {br} >= {}", self.blocks_tall);
        debug_assert!(bc < self.blocks_wide, "block col {bc} >= {}", self.blocks_wide);
        debug_assert!(i < 8 && j < 8);
        (br * self.blocks_wide + bc) * 64 + i * 8 + j
    }
}

/// Dequantize + 8×8 IDCT → 64 spatial-domain sample values.
///
/// Input: quantized DCT coefficients in natural (row-major) order.
/// Output: level-shifted sample values (approximately 0–255); callers clamp.
pub fn idct_block(quantized: &[i16; 64], qt: &[u16; 64]) -> [f64; 64] {
    let cos = cosine_table();
    let c = norm_table();

    // Dequantize
    let mut f = [0.0f64; 64];
    for i in 0..64 {
        f[i] = quantized[i] as f64 * qt[i] as f64;
    }

    // Separable IDCT: columns then rows.
    let mut temp = [0.0f64; 64];
    for col in 0..8 {
        for y in 0..8 {
            let mut sum = 0.0;
            for v in 0..8 {
                sum += c[v] * f[v * 8 + col] * cos[v][y];
            }
            temp[y * 8 + col] = sum;
        }
    }

    let mut samples = [0.0f64; 64];
    for row in 0..8 {
        for x in 0..8 {
            let mut sum = 0.0;
            for u in 0..8 {
                sum += c[u] * temp[row * 8 + u] * cos[u][x];
            }
            samples[row * 8 + x] = sum + 128.0;
        }
    }

    samples
}

/// 8×8 forward DCT + quantize → 64 DCT coefficients.
///
/// Input: sample values (expected ~0–255).
/// Output: quantized DCT coefficients in natural (row-major) order.
pub fn dct_block(samples: &[f64; 64], qt: &[u16; 64]) -> [i16; 64] {
    let cos = cosine_table();
    let c = norm_table();

    // Level shift: subtract 128
    let mut shifted = [0.0f64; 64];
    for i in 0..64 {
        shifted[i] = samples[i] - 128.0;
    }

    // Separable forward DCT: rows then columns.
    let mut temp = [0.0f64; 64];
    for row in 0..8 {
        for u in 0..8 {
            let mut sum = 0.0;
            for x in 0..8 {
                sum += shifted[row * 8 + x] * cos[u][x];
            }
            temp[row * 8 + u] = c[u] * sum;
        }
    }

    let mut coeffs = [0.0f64; 64];
    for col in 0..8 {
        for v in 0..8 {
            let mut sum = 0.0;
            for y in 0..8 {
                sum += temp[y * 8 + col] * cos[v][y];
            }
            coeffs[v * 8 + col] = c[v] * sum;
        }
    }

    // Quantize
    let mut quantized = [0i16; 64];
    for i in 0..64 {
        quantized[i] = (coeffs[i] / qt[i] as f64).round() as i16;
    }
    quantized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_get_set() {
        let mut grid = DctGrid::new(2, 3);
        assert_eq!(grid.blocks_wide(), 2);
        assert_eq!(grid.blocks_tall(), 3);
        assert_eq!(grid.total_blocks(), 6);

        // All initialized to zero
        assert_eq!(grid.get(0, 0, 0, 0), 0);
        assert_eq!(grid.get(2, 1, 7, 7), 0);

        grid.set(1, 0, 3, 4, 42);
        assert_eq!(grid.get(1, 0, 3, 4), 42);

        // Other positions unchanged
        assert_eq!(grid.get(1, 0, 3, 3), 0);
        assert_eq!(grid.get(0, 0, 3, 4), 0);
    }

    #[test]
    fn block_slice_access() {
        let mut grid = DctGrid::new(1, 1);
        grid.set(0, 0, 0, 0, 100); // DC
        grid.set(0, 0, 7, 7, -50);

        let blk = grid.block(0, 0);
        assert_eq!(blk[0], 100);
        assert_eq!(blk[63], -50);
        assert_eq!(blk.len(), 64);
    }

    #[test]
    fn block_mut_access() {
        let mut grid = DctGrid::new(2, 2);
        let blk = grid.block_mut(1, 1);
        for (i, v) in blk.iter_mut().enumerate() {
            *v = i as i16;
        }
        assert_eq!(grid.get(1, 1, 0, 0), 0);
        assert_eq!(grid.get(1, 1, 0, 1), 1);
        assert_eq!(grid.get(1, 1, 7, 7), 63);
        // Other block untouched
        assert_eq!(grid.get(0, 0, 0, 0), 0);
    }

    #[test]
    fn idct_dct_roundtrip() {
        let mut quantized = [0i16; 64];
        quantized[0] = 100; // DC
        quantized[1] = 10;
        quantized[8] = -5;
        quantized[9] = 3;

        // Unity quantization table
        let qt = [1u16; 64];

        let samples = idct_block(&quantized, &qt);
        let recovered = dct_block(&samples, &qt);

        for i in 0..64 {
            assert!(
                (quantized[i] - recovered[i]).abs() <= 1,
                "Mismatch at index {i}: expected {}, got {}",
                quantized[i],
                recovered[i]
            );
        }
    }

    #[test]
    fn dc_only_block_produces_flat_samples() {
        let mut quantized = [0i16; 64];
        quantized[0] = 16; // DC coefficient
        let qt = [1u16; 64];

        let samples = idct_block(&quantized, &qt);

        // All samples should be approximately the same value.
        // DC contribution = (0.5/√2)² · 16 = 16/8 = 2
        let expected = 128.0 + 16.0 / 8.0;
        let dc_val = samples[0];
        for i in 0..64 {
            assert!(
                (samples[i] - dc_val).abs() < 1e-10,
                "Sample {i} = {}, expected uniform {}",
                samples[i],
                dc_val
            );
        }
        assert!((dc_val - expected).abs() < 1e-10);
    }

    #[test]
    fn idct_dct_roundtrip_with_quant() {
        let qt = crate::quant::STD_LUMINANCE_QUANT;

        let mut quantized = [0i16; 64];
        quantized[0] = 50;
        quantized[1] = -3;
        quantized[8] = 2;

        let samples = idct_block(&quantized, &qt);
        let recovered = dct_block(&samples, &qt);

        for i in 0..64 {
            assert!(
                (quantized[i] - recovered[i]).abs() <= 1,
                "Mismatch at index {i}: expected {}, got {}",
                quantized[i],
                recovered[i]
            );
        }
    }
}
