// SPDX-License-Identifier: MIT OR Apache-2.0

//! Entropy-coded scan decoding and encoding.
//!
//! One baseline scan carries every component interleaved by MCU; progressive
//! scans carry a spectral band of one or more components and accumulate into
//! the coefficient grids across scans. DC predictors persist across blocks
//! and reset only at restart markers. All decode paths work on a copy of the
//! target block and commit on success, so a failed block leaves its prior
//! contents intact when tolerant mode keeps going.

use crate::bitio::{BitReader, BitWriter};
use crate::dct::DctGrid;
use crate::error::{Error, Result};
use crate::frame::FrameInfo;
use crate::huffman::{encode_value, extend_sign, HuffmanDecodeTable, HuffmanEncodeTable};
use crate::marker::SosParams;
use crate::zigzag::ZIGZAG_TO_NATURAL;

/// Coefficients are clamped to this magnitude before symbol formation so
/// every DC difference and AC value stays within the standard Huffman
/// tables (sizes 0-11 and 1-10 respectively).
const COEFF_CLAMP: i16 = 1023;

/// One component's slot in a scan: which frame component it is and which
/// entropy tables it uses.
#[derive(Debug, Clone, Copy)]
pub struct ScanComponent {
    /// Index into `FrameInfo::components`.
    pub comp_idx: usize,
    pub dc_table_id: u8,
    pub ac_table_id: u8,
}

/// One block that failed to decode in tolerant mode.
#[derive(Debug, Clone)]
pub struct BlockFailure {
    pub comp_idx: usize,
    pub block_row: usize,
    pub block_col: usize,
    pub error: Error,
}

/// Accumulated tolerant-mode outcome: which blocks failed, and why.
#[derive(Debug, Clone, Default)]
pub struct DecodeReport {
    pub failures: Vec<BlockFailure>,
}

impl DecodeReport {
    pub fn failed_blocks(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

fn lookup<'a, T>(tables: &'a [Option<T>; 4], kind: &'static str, id: u8) -> Result<&'a T> {
    tables
        .get(id as usize)
        .and_then(|t| t.as_ref())
        .ok_or(Error::MissingTable { kind, id })
}

/// Decode one baseline 8x8 block into `block` (natural order, initially zero).
/// `pred` is the running DC predictor for this component.
fn decode_baseline_block(
    reader: &mut BitReader,
    dc_table: &HuffmanDecodeTable,
    ac_table: &HuffmanDecodeTable,
    pred: &mut i16,
    block: &mut [i16; 64],
) -> Result<()> {
    // DC difference
    let t = dc_table.decode(reader)?;
    let diff = if t == 0 {
        0
    } else {
        if t > 11 {
            return Err(Error::HuffmanDecode("DC size exceeds 11"));
        }
        extend_sign(reader.read_bits(t)?, t)
    };
    *pred = pred.wrapping_add(diff);
    block[0] = *pred;

    // AC run/size pairs up to zigzag index 63
    let mut k = 1usize;
    while k <= 63 {
        let rs = ac_table.decode(reader)?;
        let run = (rs >> 4) as usize;
        let size = rs & 0x0F;
        if size == 0 {
            if run == 15 {
                k += 16; // ZRL
                continue;
            }
            break; // EOB
        }
        k += run;
        if k > 63 {
            return Err(Error::HuffmanDecode("AC run past end of block"));
        }
        block[ZIGZAG_TO_NATURAL[k]] = extend_sign(reader.read_bits(size)?, size);
        k += 1;
    }
    Ok(())
}

/// Decode a baseline scan into the component grids.
///
/// `scan_start` is the offset of the first entropy-coded byte. Grids are
/// indexed by the frame component index. In tolerant mode, failed blocks are
/// recorded in `report` and decoding continues until the entropy data is
/// exhausted.
pub fn decode_scan(
    data: &[u8],
    scan_start: usize,
    frame: &FrameInfo,
    scan_components: &[ScanComponent],
    dc_tables: &[Option<HuffmanDecodeTable>; 4],
    ac_tables: &[Option<HuffmanDecodeTable>; 4],
    grids: &mut [DctGrid],
    restart_interval: u16,
    tolerant: bool,
    report: &mut DecodeReport,
) -> Result<()> {
    let mut reader = BitReader::new(data, scan_start);
    let mut preds = vec![0i16; scan_components.len()];

    log::debug!(
        "decoding baseline scan: {} components, restart interval {}",
        scan_components.len(),
        restart_interval
    );

    let interleaved = scan_components.len() > 1;
    let units = scan_units(frame, scan_components, interleaved);

    let mut units_done = 0usize;
    'scan: for unit in 0..units {
        if scan_ended_early(&reader, tolerant)? {
            break;
        }
        if restart_interval > 0 && units_done > 0 && units_done % restart_interval as usize == 0 {
            handle_restart(&mut reader, &mut preds, &mut 0, tolerant)?;
        }
        units_done += 1;

        for (sc_idx, sc) in scan_components.iter().enumerate() {
            let dc = lookup(dc_tables, "DC Huffman", sc.dc_table_id)?;
            let ac = lookup(ac_tables, "AC Huffman", sc.ac_table_id)?;
            let comp = &frame.components[sc.comp_idx];
            let blocks = if interleaved {
                comp.h_sampling as usize * comp.v_sampling as usize
            } else {
                1
            };

            for b in 0..blocks {
                let (br, bc) = if interleaved {
                    let mcu_row = unit / frame.mcus_wide as usize;
                    let mcu_col = unit % frame.mcus_wide as usize;
                    let v = b / comp.h_sampling as usize;
                    let h = b % comp.h_sampling as usize;
                    (
                        mcu_row * comp.v_sampling as usize + v,
                        mcu_col * comp.h_sampling as usize + h,
                    )
                } else {
                    let wide = frame.scan_blocks_wide(sc.comp_idx);
                    (unit / wide, unit % wide)
                };

                let mut block = [0i16; 64];
                let mut pred = preds[sc_idx];
                match decode_baseline_block(&mut reader, dc, ac, &mut pred, &mut block) {
                    Ok(()) => {
                        grids[sc.comp_idx].block_mut(br, bc).copy_from_slice(&block);
                        preds[sc_idx] = pred;
                    }
                    Err(e) => {
                        if !tolerant {
                            return Err(e);
                        }
                        log::warn!(
                            "block ({br},{bc}) of component {} failed to decode: {e}",
                            sc.comp_idx
                        );
                        report.failures.push(BlockFailure {
                            comp_idx: sc.comp_idx,
                            block_row: br,
                            block_col: bc,
                            error: e.clone(),
                        });
                        if entropy_exhausted(&reader, &e) {
                            break 'scan;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

/// Number of decode units in a scan: MCUs when interleaved, blocks of the
/// single component otherwise.
fn scan_units(frame: &FrameInfo, scan_components: &[ScanComponent], interleaved: bool) -> usize {
    if interleaved {
        frame.mcus_wide as usize * frame.mcus_tall as usize
    } else {
        let idx = scan_components[0].comp_idx;
        frame.scan_blocks_wide(idx) * frame.scan_blocks_tall(idx)
    }
}

/// True when continuing past a failed block cannot produce anything: the
/// entropy data ran out or a non-restart marker ended the scan.
fn entropy_exhausted(reader: &BitReader, error: &Error) -> bool {
    if matches!(error, Error::UnexpectedEof) {
        return true;
    }
    matches!(reader.marker_found(), Some(m) if !(0xD0..=0xD7).contains(&m))
}

/// Check whether a non-restart marker already ended the entropy data. With
/// units still pending that is a short scan: strict mode errors, tolerant
/// mode stops and keeps what was decoded.
fn scan_ended_early(reader: &BitReader, tolerant: bool) -> Result<bool> {
    match reader.marker_found() {
        Some(m) if !(0xD0..=0xD7).contains(&m) => {
            if !tolerant {
                return Err(Error::UnexpectedEof);
            }
            log::warn!("entropy data ended early at marker 0x{m:02X}");
            Ok(true)
        }
        _ => Ok(false),
    }
}

fn handle_restart(
    reader: &mut BitReader,
    preds: &mut [i16],
    eob_run: &mut u32,
    tolerant: bool,
) -> Result<()> {
    match reader.check_restart_marker()? {
        Some(_) => {
            preds.fill(0);
            *eob_run = 0;
            Ok(())
        }
        None if tolerant => {
            log::warn!("expected restart marker not found, continuing");
            Ok(())
        }
        None => Err(Error::HuffmanDecode("expected restart marker")),
    }
}

/// Decode one progressive scan into the component grids.
///
/// Dispatches on the SOS spectral/approximation parameters: DC scans
/// (Ss = 0) may be interleaved; AC scans carry exactly one component.
pub fn decode_progressive_scan(
    data: &[u8],
    scan_start: usize,
    frame: &FrameInfo,
    scan_components: &[ScanComponent],
    params: SosParams,
    dc_tables: &[Option<HuffmanDecodeTable>; 4],
    ac_tables: &[Option<HuffmanDecodeTable>; 4],
    grids: &mut [DctGrid],
    restart_interval: u16,
    tolerant: bool,
    report: &mut DecodeReport,
) -> Result<()> {
    if params.ss > 63 || params.se > 63 || params.ss > params.se {
        return Err(Error::InvalidMarkerData("invalid spectral selection"));
    }
    if params.ss == 0 && params.se != 0 {
        return Err(Error::InvalidMarkerData("DC scan with nonzero Se"));
    }
    if params.ss > 0 && scan_components.len() != 1 {
        return Err(Error::InvalidMarkerData("interleaved AC scan"));
    }

    log::debug!(
        "decoding progressive scan: Ss={} Se={} Ah={} Al={}, {} components",
        params.ss,
        params.se,
        params.ah,
        params.al,
        scan_components.len()
    );

    let mut reader = BitReader::new(data, scan_start);
    let mut preds = vec![0i16; scan_components.len()];
    let mut eob_run = 0u32;

    let interleaved = params.ss == 0 && scan_components.len() > 1;
    let units = scan_units(frame, scan_components, interleaved);

    let mut units_done = 0usize;
    'scan: for unit in 0..units {
        if scan_ended_early(&reader, tolerant)? {
            break;
        }
        if restart_interval > 0 && units_done > 0 && units_done % restart_interval as usize == 0 {
            handle_restart(&mut reader, &mut preds, &mut eob_run, tolerant)?;
        }
        units_done += 1;

        for (sc_idx, sc) in scan_components.iter().enumerate() {
            let comp = &frame.components[sc.comp_idx];
            let blocks = if interleaved {
                comp.h_sampling as usize * comp.v_sampling as usize
            } else {
                1
            };

            for b in 0..blocks {
                let (br, bc) = if interleaved {
                    let mcu_row = unit / frame.mcus_wide as usize;
                    let mcu_col = unit % frame.mcus_wide as usize;
                    let v = b / comp.h_sampling as usize;
                    let h = b % comp.h_sampling as usize;
                    (
                        mcu_row * comp.v_sampling as usize + v,
                        mcu_col * comp.h_sampling as usize + h,
                    )
                } else {
                    let wide = frame.scan_blocks_wide(sc.comp_idx);
                    (unit / wide, unit % wide)
                };

                let mut block = [0i16; 64];
                block.copy_from_slice(grids[sc.comp_idx].block(br, bc));
                let mut pred = preds[sc_idx];
                let mut run = eob_run;

                let result = if params.ss == 0 {
                    if params.ah == 0 {
                        let dc = lookup(dc_tables, "DC Huffman", sc.dc_table_id)?;
                        decode_dc_first(&mut reader, dc, params.al, &mut pred, &mut block)
                    } else {
                        decode_dc_refine(&mut reader, params.al, &mut block)
                    }
                } else {
                    let ac = lookup(ac_tables, "AC Huffman", sc.ac_table_id)?;
                    if params.ah == 0 {
                        decode_ac_first(&mut reader, ac, params, &mut run, &mut block)
                    } else {
                        decode_ac_refine(&mut reader, ac, params, &mut run, &mut block)
                    }
                };

                match result {
                    Ok(()) => {
                        grids[sc.comp_idx].block_mut(br, bc).copy_from_slice(&block);
                        preds[sc_idx] = pred;
                        eob_run = run;
                    }
                    Err(e) => {
                        if !tolerant {
                            return Err(e);
                        }
                        log::warn!(
                            "block ({br},{bc}) of component {} failed to decode: {e}",
                            sc.comp_idx
                        );
                        report.failures.push(BlockFailure {
                            comp_idx: sc.comp_idx,
                            block_row: br,
                            block_col: bc,
                            error: e.clone(),
                        });
                        if entropy_exhausted(&reader, &e) {
                            break 'scan;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

/// DC first scan: decode the DC difference and store it shifted left by Al.
pub(crate) fn decode_dc_first(
    reader: &mut BitReader,
    dc_table: &HuffmanDecodeTable,
    al: u8,
    pred: &mut i16,
    block: &mut [i16; 64],
) -> Result<()> {
    let t = dc_table.decode(reader)?;
    let diff = if t == 0 {
        0
    } else {
        if t > 11 {
            return Err(Error::HuffmanDecode("DC size exceeds 11"));
        }
        extend_sign(reader.read_bits(t)?, t)
    };
    *pred = pred.wrapping_add(diff);
    block[0] = *pred << al;
    Ok(())
}

/// DC refinement scan: one correction bit per block.
pub(crate) fn decode_dc_refine(
    reader: &mut BitReader,
    al: u8,
    block: &mut [i16; 64],
) -> Result<()> {
    if reader.read_bit()? == 1 {
        block[0] |= 1 << al;
    }
    Ok(())
}

/// AC first scan: run/size pairs and EOBn end-of-band runs over the
/// spectral band, values shifted left by Al.
pub(crate) fn decode_ac_first(
    reader: &mut BitReader,
    ac_table: &HuffmanDecodeTable,
    params: SosParams,
    eob_run: &mut u32,
    block: &mut [i16; 64],
) -> Result<()> {
    if *eob_run > 0 {
        *eob_run -= 1;
        return Ok(());
    }

    let mut k = params.ss as usize;
    while k <= params.se as usize {
        let rs = ac_table.decode(reader)?;
        let run = (rs >> 4) as usize;
        let size = rs & 0x0F;
        if size == 0 {
            if run == 15 {
                k += 16; // ZRL
                continue;
            }
            // EOBn: run length 2^run - 1 more blocks after this one
            *eob_run = (1u32 << run) - 1;
            if run > 0 {
                *eob_run += reader.read_bits(run as u8)? as u32;
            }
            break;
        }
        k += run;
        if k > params.se as usize {
            return Err(Error::HuffmanDecode("AC run past end of band"));
        }
        block[ZIGZAG_TO_NATURAL[k]] = extend_sign(reader.read_bits(size)?, size) << params.al;
        k += 1;
    }
    Ok(())
}

/// AC refinement scan (ITU-T T.81 G.7): newly-nonzero coefficients arrive as
/// size-1 symbols, and every already-nonzero coefficient passed along the way
/// carries one correction bit.
pub(crate) fn decode_ac_refine(
    reader: &mut BitReader,
    ac_table: &HuffmanDecodeTable,
    params: SosParams,
    eob_run: &mut u32,
    block: &mut [i16; 64],
) -> Result<()> {
    let p1 = 1i16 << params.al;
    let m1 = -1i16 << params.al;
    let se = params.se as usize;
    let mut k = params.ss as usize;

    if *eob_run == 0 {
        while k <= se {
            let rs = ac_table.decode(reader)?;
            let mut run = (rs >> 4) as usize;
            let size = rs & 0x0F;
            let mut newval = 0i16;
            if size != 0 {
                if size != 1 {
                    return Err(Error::HuffmanDecode("refinement size must be 1"));
                }
                newval = if reader.read_bit()? == 1 { p1 } else { m1 };
            } else if run != 15 {
                *eob_run = 1u32 << run;
                if run > 0 {
                    *eob_run += reader.read_bits(run as u8)? as u32;
                }
                break;
            }

            // Advance over `run` zero-history coefficients, refining every
            // nonzero one passed along the way.
            while k <= se {
                let idx = ZIGZAG_TO_NATURAL[k];
                if block[idx] != 0 {
                    if reader.read_bit()? == 1 && (block[idx] & p1) == 0 {
                        block[idx] += if block[idx] >= 0 { p1 } else { m1 };
                    }
                } else {
                    if run == 0 {
                        break;
                    }
                    run -= 1;
                }
                k += 1;
            }
            if newval != 0 && k <= se {
                block[ZIGZAG_TO_NATURAL[k]] = newval;
            }
            k += 1;
        }
    }

    if *eob_run > 0 {
        // End of band: correction bits only for the remaining nonzero
        // coefficients.
        while k <= se {
            let idx = ZIGZAG_TO_NATURAL[k];
            if block[idx] != 0 && reader.read_bit()? == 1 && (block[idx] & p1) == 0 {
                block[idx] += if block[idx] >= 0 { p1 } else { m1 };
            }
            k += 1;
        }
        *eob_run -= 1;
    }
    Ok(())
}

fn clamp_coeff(v: i16) -> i16 {
    v.clamp(-COEFF_CLAMP, COEFF_CLAMP)
}

/// Encode one baseline block: DC difference then AC run/size pairs.
fn encode_baseline_block(
    writer: &mut BitWriter,
    dc_table: &HuffmanEncodeTable,
    ac_table: &HuffmanEncodeTable,
    pred: &mut i16,
    block: &[i16],
) -> Result<()> {
    let dc = clamp_coeff(block[0]);
    let diff = dc - *pred;
    *pred = dc;
    let (bits, size) = encode_value(diff);
    let (code, len) = dc_table.encode(size)?;
    writer.write_bits(code, len);
    if size > 0 {
        writer.write_bits(bits, size);
    }

    let mut run = 0usize;
    for k in 1..=63usize {
        let v = clamp_coeff(block[ZIGZAG_TO_NATURAL[k]]);
        if v == 0 {
            run += 1;
            continue;
        }
        while run >= 16 {
            let (code, len) = ac_table.encode(0xF0)?; // ZRL
            writer.write_bits(code, len);
            run -= 16;
        }
        let (bits, size) = encode_value(v);
        let (code, len) = ac_table.encode(((run as u8) << 4) | size)?;
        writer.write_bits(code, len);
        writer.write_bits(bits, size);
        run = 0;
    }
    if run > 0 {
        let (code, len) = ac_table.encode(0x00)?; // EOB
        writer.write_bits(code, len);
    }
    Ok(())
}

/// Encode a baseline scan over all scan components, interleaved by MCU.
/// Emits restart markers every `restart_interval` MCUs when the interval is
/// nonzero.
pub fn encode_scan(
    frame: &FrameInfo,
    scan_components: &[ScanComponent],
    dc_tables: &[Option<HuffmanEncodeTable>; 4],
    ac_tables: &[Option<HuffmanEncodeTable>; 4],
    grids: &[DctGrid],
    restart_interval: u16,
) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    let mut writer = BitWriter::new();
    let mut preds = vec![0i16; scan_components.len()];

    let interleaved = scan_components.len() > 1;
    let units = scan_units(frame, scan_components, interleaved);
    let mut rst = 0u8;

    for unit in 0..units {
        if restart_interval > 0 && unit > 0 && unit % restart_interval as usize == 0 {
            let finished = std::mem::replace(&mut writer, BitWriter::new());
            out.extend_from_slice(&finished.flush());
            out.push(0xFF);
            out.push(0xD0 + rst);
            rst = (rst + 1) & 0x07;
            preds.fill(0);
        }

        for (sc_idx, sc) in scan_components.iter().enumerate() {
            let dc = lookup(dc_tables, "DC Huffman", sc.dc_table_id)?;
            let ac = lookup(ac_tables, "AC Huffman", sc.ac_table_id)?;
            let comp = &frame.components[sc.comp_idx];
            let blocks = if interleaved {
                comp.h_sampling as usize * comp.v_sampling as usize
            } else {
                1
            };

            for b in 0..blocks {
                let (br, bc) = if interleaved {
                    let mcu_row = unit / frame.mcus_wide as usize;
                    let mcu_col = unit % frame.mcus_wide as usize;
                    let v = b / comp.h_sampling as usize;
                    let h = b % comp.h_sampling as usize;
                    (
                        mcu_row * comp.v_sampling as usize + v,
                        mcu_col * comp.h_sampling as usize + h,
                    )
                } else {
                    let wide = frame.scan_blocks_wide(sc.comp_idx);
                    (unit / wide, unit % wide)
                };
                encode_baseline_block(
                    &mut writer,
                    dc,
                    ac,
                    &mut preds[sc_idx],
                    grids[sc.comp_idx].block(br, bc),
                )?;
            }
        }
    }

    out.extend_from_slice(&writer.flush());
    Ok(out)
}

/// Encode the interleaved DC scan of the progressive script (Ss=0, Ah=Al=0).
pub fn encode_progressive_dc_scan(
    frame: &FrameInfo,
    scan_components: &[ScanComponent],
    dc_tables: &[Option<HuffmanEncodeTable>; 4],
    grids: &[DctGrid],
) -> Result<Vec<u8>> {
    let mut writer = BitWriter::new();
    let mut preds = vec![0i16; scan_components.len()];

    let interleaved = scan_components.len() > 1;
    let units = scan_units(frame, scan_components, interleaved);

    for unit in 0..units {
        for (sc_idx, sc) in scan_components.iter().enumerate() {
            let dc = lookup(dc_tables, "DC Huffman", sc.dc_table_id)?;
            let comp = &frame.components[sc.comp_idx];
            let blocks = if interleaved {
                comp.h_sampling as usize * comp.v_sampling as usize
            } else {
                1
            };

            for b in 0..blocks {
                let (br, bc) = if interleaved {
                    let mcu_row = unit / frame.mcus_wide as usize;
                    let mcu_col = unit % frame.mcus_wide as usize;
                    let v = b / comp.h_sampling as usize;
                    let h = b % comp.h_sampling as usize;
                    (
                        mcu_row * comp.v_sampling as usize + v,
                        mcu_col * comp.h_sampling as usize + h,
                    )
                } else {
                    let wide = frame.scan_blocks_wide(sc.comp_idx);
                    (unit / wide, unit % wide)
                };

                let value = clamp_coeff(grids[sc.comp_idx].block(br, bc)[0]);
                let diff = value - preds[sc_idx];
                preds[sc_idx] = value;
                let (bits, size) = encode_value(diff);
                let (code, len) = dc.encode(size)?;
                writer.write_bits(code, len);
                if size > 0 {
                    writer.write_bits(bits, size);
                }
            }
        }
    }

    Ok(writer.flush())
}

/// Encode one non-interleaved AC scan of the progressive script
/// (Ss=1, Se=63, Ah=Al=0). Uses plain EOB runs of length one.
pub fn encode_progressive_ac_scan(
    frame: &FrameInfo,
    sc: ScanComponent,
    ac_tables: &[Option<HuffmanEncodeTable>; 4],
    grids: &[DctGrid],
) -> Result<Vec<u8>> {
    let ac = lookup(ac_tables, "AC Huffman", sc.ac_table_id)?;
    let mut writer = BitWriter::new();

    let wide = frame.scan_blocks_wide(sc.comp_idx);
    let tall = frame.scan_blocks_tall(sc.comp_idx);

    for br in 0..tall {
        for bc in 0..wide {
            let block = grids[sc.comp_idx].block(br, bc);
            let mut run = 0usize;
            let mut emitted = false;
            for k in 1..=63usize {
                let v = clamp_coeff(block[ZIGZAG_TO_NATURAL[k]]);
                if v == 0 {
                    run += 1;
                    continue;
                }
                while run >= 16 {
                    let (code, len) = ac.encode(0xF0)?;
                    writer.write_bits(code, len);
                    run -= 16;
                }
                let (bits, size) = encode_value(v);
                let (code, len) = ac.encode(((run as u8) << 4) | size)?;
                writer.write_bits(code, len);
                writer.write_bits(bits, size);
                run = 0;
                emitted = true;
            }
            if run > 0 || !emitted {
                let (code, len) = ac.encode(0x00)?; // EOB0
                writer.write_bits(code, len);
            }
        }
    }

    Ok(writer.flush())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Component;
    use crate::tables::{
        std_ac_chrominance, std_ac_luminance, std_dc_chrominance, std_dc_luminance,
    };

    fn decode_tables() -> (
        [Option<HuffmanDecodeTable>; 4],
        [Option<HuffmanDecodeTable>; 4],
    ) {
        let dcl = std_dc_luminance();
        let dcc = std_dc_chrominance();
        let acl = std_ac_luminance();
        let acc = std_ac_chrominance();
        (
            [
                Some(HuffmanDecodeTable::build(&dcl.bits, &dcl.values).unwrap()),
                Some(HuffmanDecodeTable::build(&dcc.bits, &dcc.values).unwrap()),
                None,
                None,
            ],
            [
                Some(HuffmanDecodeTable::build(&acl.bits, &acl.values).unwrap()),
                Some(HuffmanDecodeTable::build(&acc.bits, &acc.values).unwrap()),
                None,
                None,
            ],
        )
    }

    fn encode_tables() -> (
        [Option<HuffmanEncodeTable>; 4],
        [Option<HuffmanEncodeTable>; 4],
    ) {
        let dcl = std_dc_luminance();
        let dcc = std_dc_chrominance();
        let acl = std_ac_luminance();
        let acc = std_ac_chrominance();
        (
            [
                Some(HuffmanEncodeTable::build(&dcl.bits, &dcl.values)),
                Some(HuffmanEncodeTable::build(&dcc.bits, &dcc.values)),
                None,
                None,
            ],
            [
                Some(HuffmanEncodeTable::build(&acl.bits, &acl.values)),
                Some(HuffmanEncodeTable::build(&acc.bits, &acc.values)),
                None,
                None,
            ],
        )
    }

    fn gray_frame(width: u16, height: u16) -> FrameInfo {
        FrameInfo::new(
            width,
            height,
            vec![Component {
                id: 1,
                h_sampling: 1,
                v_sampling: 1,
                quant_table_id: 0,
            }],
            false,
        )
        .unwrap()
    }

    fn ycbcr_frame(width: u16, height: u16) -> FrameInfo {
        FrameInfo::new(
            width,
            height,
            vec![
                Component { id: 1, h_sampling: 1, v_sampling: 1, quant_table_id: 0 },
                Component { id: 2, h_sampling: 1, v_sampling: 1, quant_table_id: 1 },
                Component { id: 3, h_sampling: 1, v_sampling: 1, quant_table_id: 1 },
            ],
            false,
        )
        .unwrap()
    }

    fn fill_test_grid(grid: &mut DctGrid, seed: i16) {
        for br in 0..grid.blocks_tall() {
            for bc in 0..grid.blocks_wide() {
                let block = grid.block_mut(br, bc);
                block[0] = seed + (br as i16) * 7 - (bc as i16) * 3;
                block[1] = -seed / 2;
                block[9] = 4;
                block[26] = -1;
            }
        }
    }

    #[test]
    fn baseline_scan_roundtrip_grayscale() {
        let frame = gray_frame(24, 16);
        let scan = [ScanComponent { comp_idx: 0, dc_table_id: 0, ac_table_id: 0 }];
        let mut grids = vec![DctGrid::new(frame.blocks_wide(0), frame.blocks_tall(0))];
        fill_test_grid(&mut grids[0], 50);

        let (enc_dc, enc_ac) = encode_tables();
        let bytes = encode_scan(&frame, &scan, &enc_dc, &enc_ac, &grids, 0).unwrap();

        let (dec_dc, dec_ac) = decode_tables();
        let mut decoded = vec![DctGrid::new(frame.blocks_wide(0), frame.blocks_tall(0))];
        let mut report = DecodeReport::default();
        decode_scan(
            &bytes, 0, &frame, &scan, &dec_dc, &dec_ac, &mut decoded, 0, false, &mut report,
        )
        .unwrap();

        for br in 0..grids[0].blocks_tall() {
            for bc in 0..grids[0].blocks_wide() {
                assert_eq!(decoded[0].block(br, bc), grids[0].block(br, bc));
            }
        }
    }

    #[test]
    fn baseline_scan_roundtrip_interleaved() {
        let frame = ycbcr_frame(16, 8);
        let scan = [
            ScanComponent { comp_idx: 0, dc_table_id: 0, ac_table_id: 0 },
            ScanComponent { comp_idx: 1, dc_table_id: 1, ac_table_id: 1 },
            ScanComponent { comp_idx: 2, dc_table_id: 1, ac_table_id: 1 },
        ];
        let mut grids: Vec<DctGrid> = (0..3)
            .map(|i| {
                let mut g = DctGrid::new(frame.blocks_wide(i), frame.blocks_tall(i));
                fill_test_grid(&mut g, 20 + i as i16 * 10);
                g
            })
            .collect();
        grids[2].set(0, 1, 7, 7, -300);

        let (enc_dc, enc_ac) = encode_tables();
        let bytes = encode_scan(&frame, &scan, &enc_dc, &enc_ac, &grids, 0).unwrap();

        let (dec_dc, dec_ac) = decode_tables();
        let mut decoded: Vec<DctGrid> = (0..3)
            .map(|i| DctGrid::new(frame.blocks_wide(i), frame.blocks_tall(i)))
            .collect();
        let mut report = DecodeReport::default();
        decode_scan(
            &bytes, 0, &frame, &scan, &dec_dc, &dec_ac, &mut decoded, 0, false, &mut report,
        )
        .unwrap();

        for c in 0..3 {
            for br in 0..grids[c].blocks_tall() {
                for bc in 0..grids[c].blocks_wide() {
                    assert_eq!(decoded[c].block(br, bc), grids[c].block(br, bc), "component {c}");
                }
            }
        }
    }

    #[test]
    fn baseline_scan_roundtrip_with_restarts() {
        let frame = gray_frame(48, 8); // 6 MCUs
        let scan = [ScanComponent { comp_idx: 0, dc_table_id: 0, ac_table_id: 0 }];
        let mut grids = vec![DctGrid::new(frame.blocks_wide(0), frame.blocks_tall(0))];
        fill_test_grid(&mut grids[0], 100);

        let (enc_dc, enc_ac) = encode_tables();
        let bytes = encode_scan(&frame, &scan, &enc_dc, &enc_ac, &grids, 2).unwrap();

        // Restart markers should appear in the stream
        assert!(bytes.windows(2).any(|w| w == [0xFF, 0xD0]));
        assert!(bytes.windows(2).any(|w| w == [0xFF, 0xD1]));

        let (dec_dc, dec_ac) = decode_tables();
        let mut decoded = vec![DctGrid::new(frame.blocks_wide(0), frame.blocks_tall(0))];
        let mut report = DecodeReport::default();
        decode_scan(
            &bytes, 0, &frame, &scan, &dec_dc, &dec_ac, &mut decoded, 2, false, &mut report,
        )
        .unwrap();

        for bc in 0..grids[0].blocks_wide() {
            assert_eq!(decoded[0].block(0, bc), grids[0].block(0, bc));
        }
    }

    #[test]
    fn encode_clamps_oversized_coefficients() {
        let frame = gray_frame(8, 8);
        let scan = [ScanComponent { comp_idx: 0, dc_table_id: 0, ac_table_id: 0 }];
        let mut grids = vec![DctGrid::new(1, 1)];
        grids[0].set(0, 0, 0, 0, 8000);
        grids[0].set(0, 0, 0, 3, -8000);

        let (enc_dc, enc_ac) = encode_tables();
        let bytes = encode_scan(&frame, &scan, &enc_dc, &enc_ac, &grids, 0).unwrap();

        let (dec_dc, dec_ac) = decode_tables();
        let mut decoded = vec![DctGrid::new(1, 1)];
        let mut report = DecodeReport::default();
        decode_scan(
            &bytes, 0, &frame, &scan, &dec_dc, &dec_ac, &mut decoded, 0, false, &mut report,
        )
        .unwrap();

        assert_eq!(decoded[0].get(0, 0, 0, 0), 1023);
        assert_eq!(decoded[0].get(0, 0, 0, 3), -1023);
    }

    #[test]
    fn tolerant_mode_records_failures() {
        let frame = gray_frame(32, 8); // 4 blocks
        let scan = [ScanComponent { comp_idx: 0, dc_table_id: 0, ac_table_id: 0 }];
        let mut grids = vec![DctGrid::new(frame.blocks_wide(0), frame.blocks_tall(0))];
        fill_test_grid(&mut grids[0], 60);

        let (enc_dc, enc_ac) = encode_tables();
        let mut bytes = encode_scan(&frame, &scan, &enc_dc, &enc_ac, &grids, 0).unwrap();
        // Truncate mid-stream so later blocks cannot decode
        bytes.truncate(bytes.len() / 2);

        let (dec_dc, dec_ac) = decode_tables();
        let mut decoded = vec![DctGrid::new(frame.blocks_wide(0), frame.blocks_tall(0))];
        let mut report = DecodeReport::default();
        let result = decode_scan(
            &bytes, 0, &frame, &scan, &dec_dc, &dec_ac, &mut decoded, 0, true, &mut report,
        );
        assert!(result.is_ok());
        assert!(!report.is_clean());

        // Strict mode errors out instead
        let mut decoded = vec![DctGrid::new(frame.blocks_wide(0), frame.blocks_tall(0))];
        let mut report = DecodeReport::default();
        let result = decode_scan(
            &bytes, 0, &frame, &scan, &dec_dc, &dec_ac, &mut decoded, 0, false, &mut report,
        );
        assert!(result.is_err());
    }

    #[test]
    fn progressive_dc_and_ac_scans_roundtrip() {
        let frame = FrameInfo::new(
            16,
            8,
            vec![
                Component { id: 1, h_sampling: 1, v_sampling: 1, quant_table_id: 0 },
                Component { id: 2, h_sampling: 1, v_sampling: 1, quant_table_id: 1 },
                Component { id: 3, h_sampling: 1, v_sampling: 1, quant_table_id: 1 },
            ],
            true,
        )
        .unwrap();
        let scan = [
            ScanComponent { comp_idx: 0, dc_table_id: 0, ac_table_id: 0 },
            ScanComponent { comp_idx: 1, dc_table_id: 1, ac_table_id: 1 },
            ScanComponent { comp_idx: 2, dc_table_id: 1, ac_table_id: 1 },
        ];
        let mut grids: Vec<DctGrid> = (0..3)
            .map(|i| {
                let mut g = DctGrid::new(frame.blocks_wide(i), frame.blocks_tall(i));
                fill_test_grid(&mut g, 30 + i as i16 * 5);
                g
            })
            .collect();
        grids[1].set(0, 0, 5, 5, 17);

        let (enc_dc, enc_ac) = encode_tables();
        let dc_bytes = encode_progressive_dc_scan(&frame, &scan, &enc_dc, &grids).unwrap();
        let ac_bytes: Vec<Vec<u8>> = (0..3)
            .map(|i| encode_progressive_ac_scan(&frame, scan[i], &enc_ac, &grids).unwrap())
            .collect();

        let (dec_dc, dec_ac) = decode_tables();
        let mut decoded: Vec<DctGrid> = (0..3)
            .map(|i| DctGrid::new(frame.blocks_wide(i), frame.blocks_tall(i)))
            .collect();
        let mut report = DecodeReport::default();

        decode_progressive_scan(
            &dc_bytes,
            0,
            &frame,
            &scan,
            SosParams { ss: 0, se: 0, ah: 0, al: 0 },
            &dec_dc,
            &dec_ac,
            &mut decoded,
            0,
            false,
            &mut report,
        )
        .unwrap();

        for (i, bytes) in ac_bytes.iter().enumerate() {
            decode_progressive_scan(
                bytes,
                0,
                &frame,
                &scan[i..=i],
                SosParams { ss: 1, se: 63, ah: 0, al: 0 },
                &dec_dc,
                &dec_ac,
                &mut decoded,
                0,
                false,
                &mut report,
            )
            .unwrap();
        }

        for c in 0..3 {
            for br in 0..grids[c].blocks_tall() {
                for bc in 0..grids[c].blocks_wide() {
                    assert_eq!(decoded[c].block(br, bc), grids[c].block(br, bc), "component {c}");
                }
            }
        }
    }

    #[test]
    fn interleaved_ac_scan_rejected() {
        let frame = ycbcr_frame(8, 8);
        let scan = [
            ScanComponent { comp_idx: 0, dc_table_id: 0, ac_table_id: 0 },
            ScanComponent { comp_idx: 1, dc_table_id: 1, ac_table_id: 1 },
        ];
        let (dec_dc, dec_ac) = decode_tables();
        let mut grids: Vec<DctGrid> = (0..3).map(|_| DctGrid::new(1, 1)).collect();
        let mut report = DecodeReport::default();
        let result = decode_progressive_scan(
            &[0u8; 4],
            0,
            &frame,
            &scan,
            SosParams { ss: 1, se: 63, ah: 0, al: 0 },
            &dec_dc,
            &dec_ac,
            &mut grids,
            0,
            false,
            &mut report,
        );
        assert!(matches!(result, Err(Error::InvalidMarkerData(_))));
    }

    #[test]
    fn dc_refine_sets_the_approximation_bit() {
        let mut block = [0i16; 64];
        block[0] = 2; // value 1 at Al=1 from the first scan

        let mut w = BitWriter::new();
        w.write_bits(1, 1);
        let bytes = w.flush();
        let mut reader = BitReader::new(&bytes, 0);
        decode_dc_refine(&mut reader, 0, &mut block).unwrap();
        assert_eq!(block[0], 3);
    }

    #[test]
    fn ac_refine_applies_correction_bits() {
        // History: coefficient 2 at zigzag index 1 (from an Al=1 first scan).
        // The refinement scan sends EOB (eob run of 1) and then one
        // correction bit per nonzero coefficient in the band.
        let spec = std_ac_luminance();
        let enc = HuffmanEncodeTable::build(&spec.bits, &spec.values);
        let dec = HuffmanDecodeTable::build(&spec.bits, &spec.values).unwrap();

        let mut w = BitWriter::new();
        let (code, len) = enc.encode(0x00).unwrap(); // EOB0
        w.write_bits(code, len);
        w.write_bits(1, 1); // correction bit for the coefficient at index 1
        let bytes = w.flush();

        let mut block = [0i16; 64];
        block[ZIGZAG_TO_NATURAL[1]] = 2;

        let mut reader = BitReader::new(&bytes, 0);
        let mut eob_run = 0u32;
        decode_ac_refine(
            &mut reader,
            &dec,
            SosParams { ss: 1, se: 63, ah: 1, al: 0 },
            &mut eob_run,
            &mut block,
        )
        .unwrap();

        assert_eq!(block[ZIGZAG_TO_NATURAL[1]], 3);
        assert_eq!(eob_run, 0);
    }

    #[test]
    fn ac_refine_inserts_new_coefficient() {
        // No history. The scan introduces a single new coefficient +1 at
        // zigzag index 1, then ends the band.
        let spec = std_ac_luminance();
        let enc = HuffmanEncodeTable::build(&spec.bits, &spec.values);
        let dec = HuffmanDecodeTable::build(&spec.bits, &spec.values).unwrap();

        let mut w = BitWriter::new();
        let (code, len) = enc.encode(0x01).unwrap(); // run 0, size 1
        w.write_bits(code, len);
        w.write_bits(1, 1); // sign bit: positive
        let (code, len) = enc.encode(0x00).unwrap(); // EOB for the rest
        w.write_bits(code, len);
        let bytes = w.flush();

        let mut block = [0i16; 64];
        let mut reader = BitReader::new(&bytes, 0);
        let mut eob_run = 0u32;
        decode_ac_refine(
            &mut reader,
            &dec,
            SosParams { ss: 1, se: 63, ah: 1, al: 0 },
            &mut eob_run,
            &mut block,
        )
        .unwrap();

        assert_eq!(block[ZIGZAG_TO_NATURAL[1]], 1);
    }
}
