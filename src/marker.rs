// SPDX-License-Identifier: MIT OR Apache-2.0

//! JPEG marker parsing, iteration, and segment writing.
//!
//! Walks the marker segments in a JPEG byte stream, extracting headers
//! (DQT, DHT, SOF, DRI, SOS) and skipping unrecognized segments via their
//! length field. Payload-carrying markers are followed by a 2-byte
//! big-endian length that includes itself; standalone markers (SOI, EOI,
//! RSTn) have none.

use crate::error::{Error, Result};

/// JPEG marker constants.
pub const SOI: u8 = 0xD8;
pub const EOI: u8 = 0xD9;
pub const SOF0: u8 = 0xC0;
pub const SOF2: u8 = 0xC2;
pub const DHT: u8 = 0xC4;
pub const DQT: u8 = 0xDB;
pub const DRI: u8 = 0xDD;
pub const SOS: u8 = 0xDA;
pub const APP0: u8 = 0xE0;
pub const COM: u8 = 0xFE;

/// Parsed marker with position information.
pub struct MarkerEntry {
    pub marker: u8,
    /// Segment data (empty for standalone markers like SOI, EOI, RST).
    pub data: Vec<u8>,
    /// Byte offset of the marker (the 0xFF byte) in the original data.
    pub offset: usize,
}

/// Spectral selection and successive approximation parameters from an SOS header.
#[derive(Debug, Clone, Copy)]
pub struct SosParams {
    /// Start of spectral selection (zigzag index 0-63).
    pub ss: u8,
    /// End of spectral selection (zigzag index 0-63).
    pub se: u8,
    /// Successive approximation high bit (0 = first scan for this band).
    pub ah: u8,
    /// Successive approximation low bit (point transform).
    pub al: u8,
}

impl SosParams {
    /// The fixed parameters of a baseline scan.
    pub const BASELINE: SosParams = SosParams { ss: 0, se: 63, ah: 0, al: 0 };
}

/// Iterate over every marker in a JPEG byte stream, handling multiple scans.
///
/// Returns all marker entries (including multiple SOS markers for
/// progressive files) and, for each SOS, the byte offset where its
/// entropy-coded data begins. A stream that ends inside scan data without a
/// trailing EOI is accepted; markers seen so far are returned.
pub fn iterate_markers(data: &[u8]) -> Result<(Vec<MarkerEntry>, Vec<usize>)> {
    let mut entries = Vec::new();
    let mut scan_starts = Vec::new();

    // Check SOI
    if data.len() < 2 || data[0] != 0xFF || data[1] != SOI {
        return Err(Error::Signature);
    }
    entries.push(MarkerEntry {
        marker: SOI,
        data: Vec::new(),
        offset: 0,
    });
    let mut pos = 2;

    loop {
        // Find next 0xFF
        while pos < data.len() && data[pos] != 0xFF {
            pos += 1;
        }
        if pos + 1 >= data.len() {
            return Err(Error::UnexpectedEof);
        }

        // Skip padding 0xFF bytes
        while pos + 1 < data.len() && data[pos + 1] == 0xFF {
            pos += 1;
        }
        if pos + 1 >= data.len() {
            return Err(Error::UnexpectedEof);
        }

        let marker_offset = pos;
        let marker = data[pos + 1];
        pos += 2;

        // Byte-stuffed 0xFF00 shouldn't appear outside scan data; skip gracefully
        if marker == 0x00 {
            continue;
        }

        // Standalone markers (no length field)
        if marker == EOI || (marker >= 0xD0 && marker <= 0xD7) {
            entries.push(MarkerEntry {
                marker,
                data: Vec::new(),
                offset: marker_offset,
            });
            if marker == EOI {
                return Ok((entries, scan_starts));
            }
            continue;
        }

        if is_unsupported(marker) {
            return Err(Error::Unsupported("non-baseline/progressive frame type"));
        }

        // Read segment length (self-inclusive)
        if pos + 2 > data.len() {
            return Err(Error::UnexpectedEof);
        }
        let length = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
        if length < 2 || pos + length > data.len() {
            return Err(Error::InvalidMarkerData("invalid segment length"));
        }
        let segment_data = data[pos + 2..pos + length].to_vec();

        entries.push(MarkerEntry {
            marker,
            data: segment_data,
            offset: marker_offset,
        });

        pos += length;

        // For SOS: record scan start and skip past entropy-coded data
        if marker == SOS {
            scan_starts.push(pos);
            match skip_scan_data(data, pos) {
                Ok(next) => pos = next,
                // Truncated after scan data (no EOI) — accept what we have
                Err(Error::UnexpectedEof) => return Ok((entries, scan_starts)),
                Err(e) => return Err(e),
            }
        }
    }
}

fn is_unsupported(marker: u8) -> bool {
    matches!(
        marker,
        0xC1 // SOF1 extended sequential
        | 0xC3 // SOF3 lossless
        | 0xC5..=0xC7 // SOF5-7 differential
        | 0xC9..=0xCB // SOF9-11 arithmetic
        | 0xCD..=0xCF // SOF13-15 differential arithmetic
    )
}

/// Skip past entropy-coded scan data to find the next marker.
///
/// Starting from `pos` (the first byte of entropy-coded data after an SOS
/// header), scans forward for a 0xFF byte followed by a non-zero, non-RST
/// marker byte. Returns the byte offset of the 0xFF byte of the next marker.
pub fn skip_scan_data(data: &[u8], mut pos: usize) -> Result<usize> {
    while pos < data.len() {
        if data[pos] != 0xFF {
            pos += 1;
            continue;
        }
        if pos + 1 >= data.len() {
            return Err(Error::UnexpectedEof);
        }
        let next = data[pos + 1];
        if next == 0x00 {
            // Byte-stuffed 0xFF — skip both bytes
            pos += 2;
            continue;
        }
        if next >= 0xD0 && next <= 0xD7 {
            // Restart marker — part of the scan
            pos += 2;
            continue;
        }
        if next == 0xFF {
            // Fill byte
            pos += 1;
            continue;
        }
        return Ok(pos);
    }
    Err(Error::UnexpectedEof)
}

/// Parse an SOS (Start of Scan) header.
/// Returns component selectors: (component_id, dc_table_id, ac_table_id) per scan component.
pub fn parse_sos(data: &[u8]) -> Result<Vec<(u8, u8, u8)>> {
    if data.is_empty() {
        return Err(Error::InvalidMarkerData("empty SOS"));
    }
    let num_components = data[0] as usize;
    if num_components == 0 {
        return Err(Error::InvalidMarkerData("SOS with no components"));
    }
    if data.len() < 1 + num_components * 2 + 3 {
        return Err(Error::UnexpectedEof);
    }

    let mut selectors = Vec::with_capacity(num_components);
    for i in 0..num_components {
        let offset = 1 + i * 2;
        let comp_id = data[offset];
        let td_ta = data[offset + 1];
        selectors.push((comp_id, td_ta >> 4, td_ta & 0x0F));
    }

    Ok(selectors)
}

/// Parse the spectral selection / successive approximation parameters from an
/// SOS header. These are the last 3 bytes of the header data: Ss, Se, Ah_Al.
pub fn parse_sos_params(data: &[u8]) -> Result<SosParams> {
    if data.is_empty() {
        return Err(Error::InvalidMarkerData("empty SOS"));
    }
    let num_components = data[0] as usize;
    let params_offset = 1 + num_components * 2;
    if data.len() < params_offset + 3 {
        return Err(Error::UnexpectedEof);
    }
    let ss = data[params_offset];
    let se = data[params_offset + 1];
    let ah_al = data[params_offset + 2];
    Ok(SosParams {
        ss,
        se,
        ah: ah_al >> 4,
        al: ah_al & 0x0F,
    })
}

/// Serialize an SOS segment body from component selectors and scan parameters.
pub fn write_sos_body(selectors: &[(u8, u8, u8)], params: SosParams) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + selectors.len() * 2 + 3);
    out.push(selectors.len() as u8);
    for &(comp_id, dc_id, ac_id) in selectors {
        out.push(comp_id);
        out.push((dc_id << 4) | (ac_id & 0x0F));
    }
    out.push(params.ss);
    out.push(params.se);
    out.push((params.ah << 4) | (params.al & 0x0F));
    out
}

/// Parse DRI (Define Restart Interval) marker data.
pub fn parse_dri(data: &[u8]) -> Result<u16> {
    if data.len() < 2 {
        return Err(Error::UnexpectedEof);
    }
    Ok(u16::from_be_bytes([data[0], data[1]]))
}

/// Serialize a DRI segment body.
pub fn write_dri_body(interval: u16) -> Vec<u8> {
    interval.to_be_bytes().to_vec()
}

/// Serialize a JFIF APP0 segment body. `density` is (x, y) in dots per inch;
/// without it the segment declares a 1:1 aspect ratio with no unit.
pub fn write_app0_body(density: Option<(u16, u16)>) -> Vec<u8> {
    let mut out = Vec::with_capacity(14);
    out.extend_from_slice(b"JFIF\0");
    out.push(1); // version 1.01
    out.push(1);
    match density {
        Some((x, y)) => {
            out.push(1); // dots per inch
            out.extend_from_slice(&x.to_be_bytes());
            out.extend_from_slice(&y.to_be_bytes());
        }
        None => {
            out.push(0); // no units, aspect ratio only
            out.extend_from_slice(&1u16.to_be_bytes());
            out.extend_from_slice(&1u16.to_be_bytes());
        }
    }
    out.push(0); // no thumbnail
    out.push(0);
    out
}

/// Append a full marker segment (0xFF, marker, self-inclusive length, body).
pub fn push_segment(out: &mut Vec<u8>, marker: u8, body: &[u8]) {
    out.push(0xFF);
    out.push(marker);
    let length = (body.len() + 2) as u16;
    out.extend_from_slice(&length.to_be_bytes());
    out.extend_from_slice(body);
}
