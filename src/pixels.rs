// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pixel-domain paths: coefficient grids to RGBA and back.
//!
//! Decoding runs the inverse transform per component into block-aligned
//! sample planes, then assembles RGBA with nearest-neighbor chroma
//! upsampling. Encoding converts RGBA to 4:4:4 YCbCr planes padded by edge
//! replication and runs the forward transform per block.

use crate::color::{clamp_u8, rgb_to_ycbcr, ycbcr_to_rgb};
use crate::dct::{dct_block, idct_block, DctGrid};
use crate::error::{Error, Result};
use crate::frame::FrameInfo;
use crate::quant::QuantTable;

fn quant_for<'a>(tables: &'a [Option<QuantTable>; 4], id: u8) -> Result<&'a QuantTable> {
    tables
        .get(id as usize)
        .and_then(|t| t.as_ref())
        .ok_or(Error::MissingTable { kind: "quantization", id })
}

/// Inverse-transform one component's grid into a block-aligned sample plane.
/// The plane is `blocks_wide*8` samples wide.
fn component_plane(grid: &DctGrid, qt: &QuantTable) -> Vec<f64> {
    let plane_w = grid.blocks_wide() * 8;
    let plane_h = grid.blocks_tall() * 8;
    let mut plane = vec![0.0f64; plane_w * plane_h];

    for br in 0..grid.blocks_tall() {
        for bc in 0..grid.blocks_wide() {
            let mut coeffs = [0i16; 64];
            coeffs.copy_from_slice(grid.block(br, bc));
            let samples = idct_block(&coeffs, &qt.values);
            for row in 0..8 {
                let dst = (br * 8 + row) * plane_w + bc * 8;
                plane[dst..dst + 8].copy_from_slice(&samples[row * 8..row * 8 + 8]);
            }
        }
    }
    plane
}

/// Reconstruct the RGBA pixel buffer from decoded coefficient grids.
///
/// Grayscale (single-component) frames replicate luma into R, G and B.
/// Subsampled chroma is upsampled nearest-neighbor: component sample
/// `(x·h/maxH, y·v/maxV)` for output pixel `(x, y)`. Alpha is always 255.
pub fn decode_to_rgba(
    frame: &FrameInfo,
    grids: &[DctGrid],
    quant_tables: &[Option<QuantTable>; 4],
) -> Result<Vec<u8>> {
    let width = frame.width as usize;
    let height = frame.height as usize;

    let mut planes = Vec::with_capacity(frame.components.len());
    for (i, comp) in frame.components.iter().enumerate() {
        let qt = quant_for(quant_tables, comp.quant_table_id)?;
        planes.push(component_plane(&grids[i], qt));
    }

    let sample = |comp_idx: usize, x: usize, y: usize| -> f64 {
        let comp = &frame.components[comp_idx];
        let plane_w = grids[comp_idx].blocks_wide() * 8;
        let plane_h = grids[comp_idx].blocks_tall() * 8;
        let sx = (x * comp.h_sampling as usize / frame.max_h_sampling as usize).min(plane_w - 1);
        let sy = (y * comp.v_sampling as usize / frame.max_v_sampling as usize).min(plane_h - 1);
        planes[comp_idx][sy * plane_w + sx]
    };

    let mut rgba = vec![0u8; width * height * 4];
    for y in 0..height {
        for x in 0..width {
            let (r, g, b) = if frame.components.len() == 1 {
                let v = clamp_u8(sample(0, x, y));
                (v, v, v)
            } else {
                ycbcr_to_rgb(sample(0, x, y), sample(1, x, y), sample(2, x, y))
            };
            let dst = (y * width + x) * 4;
            rgba[dst] = r;
            rgba[dst + 1] = g;
            rgba[dst + 2] = b;
            rgba[dst + 3] = 255;
        }
    }
    Ok(rgba)
}

/// Forward-transform an RGBA buffer into 4:4:4 YCbCr coefficient grids.
///
/// `frame` must describe a 3-component frame with 1x1 sampling throughout.
/// Edge pixels are replicated to fill the block-aligned padding, which keeps
/// boundary blocks smooth and cheap to code.
pub fn encode_from_rgba(
    frame: &FrameInfo,
    quant_tables: &[Option<QuantTable>; 4],
    rgba: &[u8],
) -> Result<Vec<DctGrid>> {
    let width = frame.width as usize;
    let height = frame.height as usize;
    let expected = width * height * 4;
    if rgba.len() != expected {
        return Err(Error::InvalidPixelBuffer {
            expected,
            actual: rgba.len(),
        });
    }

    let blocks_wide = frame.blocks_wide(0);
    let blocks_tall = frame.blocks_tall(0);
    let plane_w = blocks_wide * 8;
    let plane_h = blocks_tall * 8;

    // Convert to YCbCr planes with edge-replicated padding.
    let mut y_plane = vec![0.0f64; plane_w * plane_h];
    let mut cb_plane = vec![0.0f64; plane_w * plane_h];
    let mut cr_plane = vec![0.0f64; plane_w * plane_h];
    for py in 0..plane_h {
        let sy = py.min(height - 1);
        for px in 0..plane_w {
            let sx = px.min(width - 1);
            let src = (sy * width + sx) * 4;
            let (y, cb, cr) = rgb_to_ycbcr(
                rgba[src] as f64,
                rgba[src + 1] as f64,
                rgba[src + 2] as f64,
            );
            let dst = py * plane_w + px;
            y_plane[dst] = y;
            cb_plane[dst] = cb;
            cr_plane[dst] = cr;
        }
    }

    let mut grids = Vec::with_capacity(3);
    for (comp_idx, plane) in [&y_plane, &cb_plane, &cr_plane].into_iter().enumerate() {
        let comp = &frame.components[comp_idx];
        let qt = quant_for(quant_tables, comp.quant_table_id)?;
        let mut grid = DctGrid::new(blocks_wide, blocks_tall);
        for br in 0..blocks_tall {
            for bc in 0..blocks_wide {
                let mut samples = [0.0f64; 64];
                for row in 0..8 {
                    let src = (br * 8 + row) * plane_w + bc * 8;
                    samples[row * 8..row * 8 + 8].copy_from_slice(&plane[src..src + 8]);
                }
                let coeffs = dct_block(&samples, &qt.values);
                grid.block_mut(br, bc).copy_from_slice(&coeffs);
            }
        }
        grids.push(grid);
    }
    Ok(grids)
}
