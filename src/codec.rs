// SPDX-License-Identifier: MIT OR Apache-2.0

//! Whole-image decode/encode orchestration.
//!
//! [`JpegImage`] holds a parsed frame: header info, quantization tables and
//! the per-component grids of quantized DCT coefficients. Decoding walks the
//! marker sequence and runs each scan through the scan machine; encoding
//! always writes a canonical stream (JFIF APP0, standard Huffman tables,
//! fixed segment order) from whatever the grids contain.

use crate::dct::DctGrid;
use crate::error::{Error, Result};
use crate::frame::{parse_sof, write_sof_body, FrameInfo};
use crate::huffman::{HuffmanDecodeTable, HuffmanEncodeTable};
use crate::marker::{self, SosParams};
use crate::pixels;
use crate::quant::{scaled_table, QuantTable, STD_CHROMINANCE_QUANT, STD_LUMINANCE_QUANT};
use crate::scan::{self, DecodeReport, ScanComponent};
use crate::tables::{
    parse_dht, parse_dqt, std_ac_chrominance, std_ac_luminance, std_dc_chrominance,
    std_dc_luminance, write_dht, write_dqt,
};

/// A JPEG image held as quantized DCT coefficients.
pub struct JpegImage {
    frame: FrameInfo,
    /// One coefficient grid per frame component, MCU-padded.
    grids: Vec<DctGrid>,
    quant_tables: [Option<QuantTable>; 4],
    restart_interval: u16,
    report: DecodeReport,
    /// JFIF pixel density in dots per inch, when the source declared one.
    density: Option<(u16, u16)>,
}

impl JpegImage {
    /// Parse a JPEG byte stream, baseline or progressive.
    ///
    /// In tolerant mode, undecodable blocks keep their prior contents and
    /// are recorded in the [`DecodeReport`] instead of aborting.
    pub fn from_bytes(data: &[u8], tolerant: bool) -> Result<Self> {
        let (entries, scan_starts) = marker::iterate_markers(data)?;

        let mut frame: Option<FrameInfo> = None;
        let mut grids: Vec<DctGrid> = Vec::new();
        let mut quant_tables: [Option<QuantTable>; 4] = [None, None, None, None];
        let mut dc_tables: [Option<HuffmanDecodeTable>; 4] = [None, None, None, None];
        let mut ac_tables: [Option<HuffmanDecodeTable>; 4] = [None, None, None, None];
        let mut restart_interval = 0u16;
        let mut density = None;
        let mut report = DecodeReport::default();
        let mut scans_done = 0usize;

        for entry in &entries {
            match entry.marker {
                marker::DQT => {
                    for (id, table) in parse_dqt(&entry.data)? {
                        quant_tables[id as usize] = Some(table);
                    }
                }
                marker::DHT => {
                    for (class, id, spec) in parse_dht(&entry.data)? {
                        let table = HuffmanDecodeTable::build(&spec.bits, &spec.values)?;
                        if class == 0 {
                            dc_tables[id as usize] = Some(table);
                        } else {
                            ac_tables[id as usize] = Some(table);
                        }
                    }
                }
                marker::SOF0 | marker::SOF2 => {
                    if frame.is_some() {
                        return Err(Error::InvalidMarkerData("multiple SOF markers"));
                    }
                    frame = Some(parse_sof(&entry.data, entry.marker == marker::SOF2)?);
                }
                marker::DRI => {
                    restart_interval = marker::parse_dri(&entry.data)?;
                }
                marker::APP0 => {
                    if density.is_none() {
                        density = parse_app0_density(&entry.data);
                    }
                }
                marker::SOS => {
                    let frame = frame
                        .as_ref()
                        .ok_or(Error::InvalidMarkerData("SOS before SOF"))?;
                    if scans_done > 0 && !frame.is_progressive {
                        // A second scan in a baseline file is trailing data.
                        break;
                    }
                    if grids.is_empty() {
                        grids = (0..frame.components.len())
                            .map(|i| DctGrid::new(frame.blocks_wide(i), frame.blocks_tall(i)))
                            .collect();
                    }

                    let selectors = marker::parse_sos(&entry.data)?;
                    let scan_components = resolve_scan_components(frame, &selectors)?;
                    let scan_start = scan_starts[scans_done];

                    if frame.is_progressive {
                        let params = marker::parse_sos_params(&entry.data)?;
                        scan::decode_progressive_scan(
                            data,
                            scan_start,
                            frame,
                            &scan_components,
                            params,
                            &dc_tables,
                            &ac_tables,
                            &mut grids,
                            restart_interval,
                            tolerant,
                            &mut report,
                        )?;
                    } else {
                        scan::decode_scan(
                            data,
                            scan_start,
                            frame,
                            &scan_components,
                            &dc_tables,
                            &ac_tables,
                            &mut grids,
                            restart_interval,
                            tolerant,
                            &mut report,
                        )?;
                    }
                    scans_done += 1;
                }
                marker::EOI => break,
                _ => {}
            }
        }

        let frame = frame.ok_or(Error::InvalidMarkerData("no SOF marker"))?;
        if scans_done == 0 {
            return Err(Error::InvalidMarkerData("no scan data"));
        }
        // Every component's quant table must have been declared.
        for comp in &frame.components {
            if quant_tables[comp.quant_table_id as usize].is_none() {
                return Err(Error::MissingTable {
                    kind: "quantization",
                    id: comp.quant_table_id,
                });
            }
        }

        Ok(Self {
            frame,
            grids,
            quant_tables,
            restart_interval,
            report,
            density,
        })
    }

    /// Build an image from an RGBA pixel buffer: 3-component YCbCr, 4:4:4,
    /// quality-scaled standard quantization tables.
    pub fn from_pixels(width: u16, height: u16, rgba: &[u8], quality: u8) -> Result<Self> {
        use crate::frame::Component;
        let frame = FrameInfo::new(
            width,
            height,
            vec![
                Component { id: 1, h_sampling: 1, v_sampling: 1, quant_table_id: 0 },
                Component { id: 2, h_sampling: 1, v_sampling: 1, quant_table_id: 1 },
                Component { id: 3, h_sampling: 1, v_sampling: 1, quant_table_id: 1 },
            ],
            false,
        )?;
        let quant_tables = [
            Some(scaled_table(&STD_LUMINANCE_QUANT, quality)?),
            Some(scaled_table(&STD_CHROMINANCE_QUANT, quality)?),
            None,
            None,
        ];
        let grids = pixels::encode_from_rgba(&frame, &quant_tables, rgba)?;
        Ok(Self {
            frame,
            grids,
            quant_tables,
            restart_interval: 0,
            report: DecodeReport::default(),
            density: None,
        })
    }

    /// Reconstruct the RGBA pixel buffer (width × height × 4, alpha 255).
    pub fn to_pixels(&self) -> Result<Vec<u8>> {
        pixels::decode_to_rgba(&self.frame, &self.grids, &self.quant_tables)
    }

    /// Serialize to a JPEG byte stream, baseline (SOF0) or progressive
    /// (SOF2). The output is canonical: JFIF APP0, quantization tables,
    /// frame header, standard Huffman tables, then the scan script.
    pub fn to_bytes(&self, progressive: bool) -> Result<Vec<u8>> {
        let mut frame = self.frame.clone();
        frame.is_progressive = progressive;

        let mut out = Vec::new();
        out.push(0xFF);
        out.push(marker::SOI);
        marker::push_segment(&mut out, marker::APP0, &marker::write_app0_body(self.density));

        let mut used_qt: Vec<u8> = frame.components.iter().map(|c| c.quant_table_id).collect();
        used_qt.sort_unstable();
        used_qt.dedup();
        for id in used_qt {
            let table = self.quant_tables[id as usize]
                .as_ref()
                .ok_or(Error::MissingTable { kind: "quantization", id })?;
            marker::push_segment(&mut out, marker::DQT, &write_dqt(id, table));
        }

        let sof = if progressive { marker::SOF2 } else { marker::SOF0 };
        marker::push_segment(&mut out, sof, &write_sof_body(&frame));

        // Standard Huffman tables; chroma set only for multi-component frames.
        let dcl = std_dc_luminance();
        let acl = std_ac_luminance();
        marker::push_segment(&mut out, marker::DHT, &write_dht(0, 0, &dcl));
        marker::push_segment(&mut out, marker::DHT, &write_dht(1, 0, &acl));
        if frame.components.len() > 1 {
            let dcc = std_dc_chrominance();
            let acc = std_ac_chrominance();
            marker::push_segment(&mut out, marker::DHT, &write_dht(0, 1, &dcc));
            marker::push_segment(&mut out, marker::DHT, &write_dht(1, 1, &acc));
        }

        let enc_dc: [Option<HuffmanEncodeTable>; 4] = [
            Some(HuffmanEncodeTable::build(&dcl.bits, &dcl.values)),
            {
                let dcc = std_dc_chrominance();
                Some(HuffmanEncodeTable::build(&dcc.bits, &dcc.values))
            },
            None,
            None,
        ];
        let enc_ac: [Option<HuffmanEncodeTable>; 4] = [
            Some(HuffmanEncodeTable::build(&acl.bits, &acl.values)),
            {
                let acc = std_ac_chrominance();
                Some(HuffmanEncodeTable::build(&acc.bits, &acc.values))
            },
            None,
            None,
        ];

        let scan_components: Vec<ScanComponent> = frame
            .components
            .iter()
            .enumerate()
            .map(|(i, _)| ScanComponent {
                comp_idx: i,
                dc_table_id: if i == 0 { 0 } else { 1 },
                ac_table_id: if i == 0 { 0 } else { 1 },
            })
            .collect();
        let selectors: Vec<(u8, u8, u8)> = scan_components
            .iter()
            .map(|sc| {
                (
                    frame.components[sc.comp_idx].id,
                    sc.dc_table_id,
                    sc.ac_table_id,
                )
            })
            .collect();

        if progressive {
            // DC scan over all components, then one full-band AC scan per
            // component.
            marker::push_segment(
                &mut out,
                marker::SOS,
                &marker::write_sos_body(&selectors, SosParams { ss: 0, se: 0, ah: 0, al: 0 }),
            );
            out.extend_from_slice(&scan::encode_progressive_dc_scan(
                &frame,
                &scan_components,
                &enc_dc,
                &self.grids,
            )?);
            for (i, sc) in scan_components.iter().enumerate() {
                marker::push_segment(
                    &mut out,
                    marker::SOS,
                    &marker::write_sos_body(
                        &selectors[i..=i],
                        SosParams { ss: 1, se: 63, ah: 0, al: 0 },
                    ),
                );
                out.extend_from_slice(&scan::encode_progressive_ac_scan(
                    &frame,
                    *sc,
                    &enc_ac,
                    &self.grids,
                )?);
            }
        } else {
            if self.restart_interval > 0 {
                marker::push_segment(
                    &mut out,
                    marker::DRI,
                    &marker::write_dri_body(self.restart_interval),
                );
            }
            marker::push_segment(
                &mut out,
                marker::SOS,
                &marker::write_sos_body(&selectors, SosParams::BASELINE),
            );
            out.extend_from_slice(&scan::encode_scan(
                &frame,
                &scan_components,
                &enc_dc,
                &enc_ac,
                &self.grids,
                self.restart_interval,
            )?);
        }

        out.push(0xFF);
        out.push(marker::EOI);
        Ok(out)
    }

    pub fn width(&self) -> u16 {
        self.frame.width
    }

    pub fn height(&self) -> u16 {
        self.frame.height
    }

    pub fn is_progressive(&self) -> bool {
        self.frame.is_progressive
    }

    pub fn frame(&self) -> &FrameInfo {
        &self.frame
    }

    pub fn grids(&self) -> &[DctGrid] {
        &self.grids
    }

    pub fn grids_mut(&mut self) -> &mut [DctGrid] {
        &mut self.grids
    }

    pub fn quant_tables(&self) -> &[Option<QuantTable>; 4] {
        &self.quant_tables
    }

    pub fn restart_interval(&self) -> u16 {
        self.restart_interval
    }

    /// Tolerant-mode outcome of the decode that produced this image.
    pub fn report(&self) -> &DecodeReport {
        &self.report
    }

    pub fn density(&self) -> Option<(u16, u16)> {
        self.density
    }

    pub fn set_density(&mut self, density: Option<(u16, u16)>) {
        self.density = density;
    }

    pub(crate) fn into_parts(self) -> (FrameInfo, Vec<DctGrid>, [Option<QuantTable>; 4], u16) {
        (self.frame, self.grids, self.quant_tables, self.restart_interval)
    }

    pub(crate) fn from_parts(
        frame: FrameInfo,
        grids: Vec<DctGrid>,
        quant_tables: [Option<QuantTable>; 4],
        restart_interval: u16,
    ) -> Self {
        Self {
            frame,
            grids,
            quant_tables,
            restart_interval,
            report: DecodeReport::default(),
            density: None,
        }
    }
}

/// Map SOS component selectors onto frame component indices.
fn resolve_scan_components(
    frame: &FrameInfo,
    selectors: &[(u8, u8, u8)],
) -> Result<Vec<ScanComponent>> {
    selectors
        .iter()
        .map(|&(comp_id, dc_id, ac_id)| {
            let comp_idx = frame
                .components
                .iter()
                .position(|c| c.id == comp_id)
                .ok_or(Error::UnknownComponentId(comp_id))?;
            Ok(ScanComponent {
                comp_idx,
                dc_table_id: dc_id,
                ac_table_id: ac_id,
            })
        })
        .collect()
}

/// Pull the pixel density out of a JFIF APP0 body, if it declares one in
/// dots per inch.
fn parse_app0_density(data: &[u8]) -> Option<(u16, u16)> {
    if data.len() >= 12 && &data[0..5] == b"JFIF\0" && data[7] == 1 {
        let x = u16::from_be_bytes([data[8], data[9]]);
        let y = u16::from_be_bytes([data[10], data[11]]);
        if x > 0 && y > 0 {
            return Some((x, y));
        }
    }
    None
}
