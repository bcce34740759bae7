// SPDX-License-Identifier: MIT OR Apache-2.0

//! Quantized-coefficient extraction and injection.
//!
//! The [`QuantizedCoefficients`] bundle is the boundary type for callers
//! that transform DCT coefficients directly: extraction runs the container
//! and scan machinery without the inverse transform, and injection runs only
//! the entropy-encode half, so a pixel decode never happens in between.

use crate::codec::JpegImage;
use crate::dct::DctGrid;
use crate::error::{Error, Result};
use crate::format::ImageFormat;
use crate::frame::{Component, FrameInfo};
use crate::quant::QuantTable;

/// One image component's worth of extracted coefficients.
#[derive(Debug, Clone)]
pub struct CoefficientComponent {
    pub id: u8,
    pub h_sampling: u8,
    pub v_sampling: u8,
    pub quant_table_id: u8,
    /// Quantized DCT coefficients, MCU-padded, natural order within blocks.
    pub grid: DctGrid,
}

/// A complete image in quantized-coefficient form.
///
/// Tagged with the source [`ImageFormat`] so injection can refuse bundles
/// that did not come from this codec.
#[derive(Debug, Clone)]
pub struct QuantizedCoefficients {
    pub format: ImageFormat,
    pub width: u16,
    pub height: u16,
    pub is_progressive: bool,
    pub mcus_wide: u16,
    pub mcus_tall: u16,
    pub restart_interval: u16,
    pub components: Vec<CoefficientComponent>,
    pub quant_tables: [Option<QuantTable>; 4],
}

/// Decode a JPEG down to its quantized coefficients, skipping the inverse
/// transform and color conversion entirely.
pub fn extract_coefficients(data: &[u8]) -> Result<QuantizedCoefficients> {
    let image = JpegImage::from_bytes(data, false)?;
    let (frame, grids, quant_tables, restart_interval) = image.into_parts();

    let components = frame
        .components
        .iter()
        .zip(grids)
        .map(|(comp, grid)| CoefficientComponent {
            id: comp.id,
            h_sampling: comp.h_sampling,
            v_sampling: comp.v_sampling,
            quant_table_id: comp.quant_table_id,
            grid,
        })
        .collect();

    Ok(QuantizedCoefficients {
        format: ImageFormat::Jpeg,
        width: frame.width,
        height: frame.height,
        is_progressive: frame.is_progressive,
        mcus_wide: frame.mcus_wide,
        mcus_tall: frame.mcus_tall,
        restart_interval,
        components,
        quant_tables,
    })
}

/// Entropy-encode a coefficient bundle back into a JPEG byte stream.
///
/// No forward DCT runs; the coefficients go to the scan encoder as they
/// are. `progressive` overrides the bundle's own mode when set.
pub fn encode_from_coefficients(
    coefficients: &QuantizedCoefficients,
    progressive: Option<bool>,
) -> Result<Vec<u8>> {
    if coefficients.format != ImageFormat::Jpeg {
        return Err(Error::UnsupportedFormat);
    }
    if coefficients.components.is_empty() {
        return Err(Error::InvalidCoefficients("bundle has no components"));
    }

    let components: Vec<Component> = coefficients
        .components
        .iter()
        .map(|c| Component {
            id: c.id,
            h_sampling: c.h_sampling,
            v_sampling: c.v_sampling,
            quant_table_id: c.quant_table_id,
        })
        .collect();
    let frame = FrameInfo::new(
        coefficients.width,
        coefficients.height,
        components,
        coefficients.is_progressive,
    )?;

    let mut grids = Vec::with_capacity(coefficients.components.len());
    for (i, cc) in coefficients.components.iter().enumerate() {
        if cc.grid.blocks_wide() != frame.blocks_wide(i)
            || cc.grid.blocks_tall() != frame.blocks_tall(i)
        {
            return Err(Error::InvalidCoefficients("grid does not match frame geometry"));
        }
        if coefficients.quant_tables[cc.quant_table_id as usize].is_none() {
            return Err(Error::InvalidCoefficients("component references absent quant table"));
        }
        grids.push(cc.grid.clone());
    }

    let image = JpegImage::from_parts(
        frame,
        grids,
        coefficients.quant_tables.clone(),
        coefficients.restart_interval,
    );
    image.to_bytes(progressive.unwrap_or(coefficients.is_progressive))
}
