// SPDX-License-Identifier: MIT OR Apache-2.0

//! JPEG frame header (SOF0/SOF2) parsing and writing.
//!
//! Extracts image dimensions, component information, and sampling factors
//! from the Start of Frame marker segment, and serializes them back.

use crate::error::{Error, Result};

/// Information about one image component from SOF.
#[derive(Debug, Clone)]
pub struct Component {
    /// Component ID (typically 1=Y, 2=Cb, 3=Cr).
    pub id: u8,
    /// Horizontal sampling factor (1–4).
    pub h_sampling: u8,
    /// Vertical sampling factor (1–4).
    pub v_sampling: u8,
    /// Quantization table ID (0–3).
    pub quant_table_id: u8,
}

/// Frame information parsed from a SOF0/SOF2 marker.
#[derive(Debug, Clone)]
pub struct FrameInfo {
    /// Sample precision in bits (must be 8).
    pub precision: u8,
    /// Image height in pixels.
    pub height: u16,
    /// Image width in pixels.
    pub width: u16,
    /// Components in the frame.
    pub components: Vec<Component>,
    /// Maximum horizontal sampling factor across all components.
    pub max_h_sampling: u8,
    /// Maximum vertical sampling factor across all components.
    pub max_v_sampling: u8,
    /// MCU width in pixels (= max_h_sampling * 8).
    pub mcu_width: u16,
    /// MCU height in pixels (= max_v_sampling * 8).
    pub mcu_height: u16,
    /// Number of MCUs horizontally.
    pub mcus_wide: u16,
    /// Number of MCUs vertically.
    pub mcus_tall: u16,
    /// Whether this is a progressive JPEG (SOF2). False for baseline (SOF0).
    pub is_progressive: bool,
}

impl FrameInfo {
    /// Build frame info from dimensions and components, deriving the
    /// sampling maxima and MCU grid.
    pub fn new(
        width: u16,
        height: u16,
        components: Vec<Component>,
        is_progressive: bool,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions);
        }
        if components.is_empty() {
            return Err(Error::Unsupported("frame with no components"));
        }

        let mut max_h = 0u8;
        let mut max_v = 0u8;
        for comp in &components {
            if comp.h_sampling == 0
                || comp.v_sampling == 0
                || comp.h_sampling > 4
                || comp.v_sampling > 4
            {
                return Err(Error::InvalidDimensions);
            }
            if comp.quant_table_id > 3 {
                return Err(Error::InvalidMarkerData("quant table ID out of range"));
            }
            max_h = max_h.max(comp.h_sampling);
            max_v = max_v.max(comp.v_sampling);
        }

        let mcu_width = (max_h as u16) * 8;
        let mcu_height = (max_v as u16) * 8;
        // Ceil-divide in usize: width + mcu_width - 1 can exceed u16 for
        // dimensions near 65535.
        let mcus_wide =
            ((width as usize + mcu_width as usize - 1) / mcu_width as usize) as u16;
        let mcus_tall =
            ((height as usize + mcu_height as usize - 1) / mcu_height as usize) as u16;

        Ok(FrameInfo {
            precision: 8,
            height,
            width,
            components,
            max_h_sampling: max_h,
            max_v_sampling: max_v,
            mcu_width,
            mcu_height,
            mcus_wide,
            mcus_tall,
            is_progressive,
        })
    }

    /// Number of 8×8 blocks wide for a component's grid (MCU-padded, as used
    /// by interleaved scans).
    pub fn blocks_wide(&self, comp_idx: usize) -> usize {
        let comp = &self.components[comp_idx];
        (self.mcus_wide as usize) * (comp.h_sampling as usize)
    }

    /// Number of 8×8 blocks tall for a component's grid (MCU-padded).
    pub fn blocks_tall(&self, comp_idx: usize) -> usize {
        let comp = &self.components[comp_idx];
        (self.mcus_tall as usize) * (comp.v_sampling as usize)
    }

    /// Blocks wide actually covered by a non-interleaved scan:
    /// `ceil(width·h / (8·maxH))`. For MCU-exact images this equals
    /// [`FrameInfo::blocks_wide`]; at ragged right edges it can be smaller.
    pub fn scan_blocks_wide(&self, comp_idx: usize) -> usize {
        let comp = &self.components[comp_idx];
        let num = self.width as usize * comp.h_sampling as usize;
        let den = 8 * self.max_h_sampling as usize;
        (num + den - 1) / den
    }

    /// Blocks tall covered by a non-interleaved scan: `ceil(height·v / (8·maxV))`.
    pub fn scan_blocks_tall(&self, comp_idx: usize) -> usize {
        let comp = &self.components[comp_idx];
        let num = self.height as usize * comp.v_sampling as usize;
        let den = 8 * self.max_v_sampling as usize;
        (num + den - 1) / den
    }
}

/// Parse a SOF0/SOF2 marker segment body (after the 2-byte length).
/// `progressive` should be true for SOF2 markers.
pub fn parse_sof(data: &[u8], progressive: bool) -> Result<FrameInfo> {
    if data.len() < 6 {
        return Err(Error::UnexpectedEof);
    }

    let precision = data[0];
    if precision != 8 {
        return Err(Error::UnsupportedPrecision(precision));
    }

    let height = u16::from_be_bytes([data[1], data[2]]);
    let width = u16::from_be_bytes([data[3], data[4]]);
    let num_components = data[5] as usize;

    if num_components != 1 && num_components != 3 {
        return Err(Error::Unsupported("component count outside {1, 3}"));
    }
    if data.len() < 6 + num_components * 3 {
        return Err(Error::UnexpectedEof);
    }

    let mut components = Vec::with_capacity(num_components);
    for i in 0..num_components {
        let offset = 6 + i * 3;
        let id = data[offset];
        let sampling = data[offset + 1];
        components.push(Component {
            id,
            h_sampling: sampling >> 4,
            v_sampling: sampling & 0x0F,
            quant_table_id: data[offset + 2],
        });
    }

    FrameInfo::new(width, height, components, progressive)
}

/// Serialize a SOF segment body (without marker or length field).
pub fn write_sof_body(frame: &FrameInfo) -> Vec<u8> {
    let mut out = Vec::with_capacity(6 + frame.components.len() * 3);
    out.push(frame.precision);
    out.extend_from_slice(&frame.height.to_be_bytes());
    out.extend_from_slice(&frame.width.to_be_bytes());
    out.push(frame.components.len() as u8);
    for comp in &frame.components {
        out.push(comp.id);
        out.push((comp.h_sampling << 4) | (comp.v_sampling & 0x0F));
        out.push(comp.quant_table_id);
    }
    out
}
