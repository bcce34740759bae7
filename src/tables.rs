// SPDX-License-Identifier: MIT OR Apache-2.0

//! DQT and DHT segment codecs, plus the standard Annex K Huffman tables
//! used for every encode.
//!
//! Quantization values travel in zigzag order inside DQT segments but are
//! stored in natural order everywhere else; the reorder happens here.

use crate::error::{Error, Result};
use crate::quant::QuantTable;
use crate::zigzag::ZIGZAG_TO_NATURAL;

/// A Huffman table specification: the (bits, values) pair a DHT segment
/// carries, from which both encode and decode tables are derived.
#[derive(Debug, Clone)]
pub struct HuffmanSpec {
    /// counts[i] = number of codes of length i+1.
    pub bits: [u8; 16],
    /// Symbol values in order of increasing code length.
    pub values: Vec<u8>,
}

/// Parse a DQT segment body. One segment may define several tables.
/// Returns (table_id, table) pairs with values unpacked to natural order.
pub fn parse_dqt(data: &[u8]) -> Result<Vec<(u8, QuantTable)>> {
    let mut tables = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let pq_tq = data[pos];
        let precision = pq_tq >> 4;
        let table_id = pq_tq & 0x0F;
        pos += 1;

        if table_id > 3 {
            return Err(Error::InvalidMarkerData("DQT table ID out of range"));
        }

        let mut values = [0u16; 64];
        if precision == 0 {
            // 8-bit values
            if pos + 64 > data.len() {
                return Err(Error::UnexpectedEof);
            }
            for i in 0..64 {
                values[ZIGZAG_TO_NATURAL[i]] = data[pos + i] as u16;
            }
            pos += 64;
        } else {
            // 16-bit values
            if pos + 128 > data.len() {
                return Err(Error::UnexpectedEof);
            }
            for i in 0..64 {
                values[ZIGZAG_TO_NATURAL[i]] =
                    u16::from_be_bytes([data[pos + i * 2], data[pos + i * 2 + 1]]);
            }
            pos += 128;
        }

        tables.push((table_id, QuantTable::new(values)));
    }

    Ok(tables)
}

/// Serialize one quantization table as a DQT segment body (zigzag order).
/// Values above 255 force 16-bit precision.
pub fn write_dqt(table_id: u8, table: &QuantTable) -> Vec<u8> {
    let wide = table.values.iter().any(|&v| v > 255);
    let mut out = Vec::with_capacity(1 + if wide { 128 } else { 64 });
    out.push(((wide as u8) << 4) | (table_id & 0x0F));
    for i in 0..64 {
        let v = table.values[ZIGZAG_TO_NATURAL[i]];
        if wide {
            out.extend_from_slice(&v.to_be_bytes());
        } else {
            out.push(v as u8);
        }
    }
    out
}

/// Parse a DHT segment body. One segment may define several tables.
/// Returns (class, table_id, spec) tuples, class 0 = DC, 1 = AC.
pub fn parse_dht(data: &[u8]) -> Result<Vec<(u8, u8, HuffmanSpec)>> {
    let mut specs = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        if pos + 17 > data.len() {
            return Err(Error::UnexpectedEof);
        }
        let tc_th = data[pos];
        let class = tc_th >> 4;
        let table_id = tc_th & 0x0F;
        pos += 1;

        if class > 1 {
            return Err(Error::InvalidMarkerData("DHT class out of range"));
        }
        if table_id > 3 {
            return Err(Error::InvalidMarkerData("DHT table ID out of range"));
        }

        let mut bits = [0u8; 16];
        bits.copy_from_slice(&data[pos..pos + 16]);
        pos += 16;

        let total: usize = bits.iter().map(|&b| b as usize).sum();
        if pos + total > data.len() {
            return Err(Error::UnexpectedEof);
        }
        let values = data[pos..pos + total].to_vec();
        pos += total;

        specs.push((class, table_id, HuffmanSpec { bits, values }));
    }

    Ok(specs)
}

/// Serialize one Huffman table as a DHT segment body.
pub fn write_dht(class: u8, table_id: u8, spec: &HuffmanSpec) -> Vec<u8> {
    let mut out = Vec::with_capacity(17 + spec.values.len());
    out.push((class << 4) | (table_id & 0x0F));
    out.extend_from_slice(&spec.bits);
    out.extend_from_slice(&spec.values);
    out
}

/// Standard luminance DC Huffman table (ITU-T T.81 Table K.3).
pub fn std_dc_luminance() -> HuffmanSpec {
    HuffmanSpec {
        bits: [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0],
        values: vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
    }
}

/// Standard chrominance DC Huffman table (ITU-T T.81 Table K.4).
pub fn std_dc_chrominance() -> HuffmanSpec {
    HuffmanSpec {
        bits: [0, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0],
        values: vec![0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
    }
}

/// Standard luminance AC Huffman table (ITU-T T.81 Table K.5).
pub fn std_ac_luminance() -> HuffmanSpec {
    HuffmanSpec {
        bits: [0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 125],
        values: vec![
            0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06, 0x13, 0x51,
            0x61, 0x07, 0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xA1, 0x08, 0x23, 0x42, 0xB1, 0xC1,
            0x15, 0x52, 0xD1, 0xF0, 0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0A, 0x16, 0x17, 0x18,
            0x19, 0x1A, 0x25, 0x26, 0x27, 0x28, 0x29, 0x2A, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39,
            0x3A, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49, 0x4A, 0x53, 0x54, 0x55, 0x56, 0x57,
            0x58, 0x59, 0x5A, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69, 0x6A, 0x73, 0x74, 0x75,
            0x76, 0x77, 0x78, 0x79, 0x7A, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89, 0x8A, 0x92,
            0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9A, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7,
            0xA8, 0xA9, 0xAA, 0xB2, 0xB3, 0xB4, 0xB5, 0xB6, 0xB7, 0xB8, 0xB9, 0xBA, 0xC2, 0xC3,
            0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0xCA, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6, 0xD7, 0xD8,
            0xD9, 0xDA, 0xE1, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0xEA, 0xF1, 0xF2,
            0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0xFA,
        ],
    }
}

/// Standard chrominance AC Huffman table (ITU-T T.81 Table K.6).
pub fn std_ac_chrominance() -> HuffmanSpec {
    HuffmanSpec {
        bits: [0, 2, 1, 2, 4, 4, 3, 4, 7, 5, 4, 4, 0, 1, 2, 119],
        values: vec![
            0x00, 0x01, 0x02, 0x03, 0x11, 0x04, 0x05, 0x21, 0x31, 0x06, 0x12, 0x41, 0x51, 0x07,
            0x61, 0x71, 0x13, 0x22, 0x32, 0x81, 0x08, 0x14, 0x42, 0x91, 0xA1, 0xB1, 0xC1, 0x09,
            0x23, 0x33, 0x52, 0xF0, 0x15, 0x62, 0x72, 0xD1, 0x0A, 0x16, 0x24, 0x34, 0xE1, 0x25,
            0xF1, 0x17, 0x18, 0x19, 0x1A, 0x26, 0x27, 0x28, 0x29, 0x2A, 0x35, 0x36, 0x37, 0x38,
            0x39, 0x3A, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49, 0x4A, 0x53, 0x54, 0x55, 0x56,
            0x57, 0x58, 0x59, 0x5A, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69, 0x6A, 0x73, 0x74,
            0x75, 0x76, 0x77, 0x78, 0x79, 0x7A, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89,
            0x8A, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9A, 0xA2, 0xA3, 0xA4, 0xA5,
            0xA6, 0xA7, 0xA8, 0xA9, 0xAA, 0xB2, 0xB3, 0xB4, 0xB5, 0xB6, 0xB7, 0xB8, 0xB9, 0xBA,
            0xC2, 0xC3, 0xC4, 0xC5, 0xC6, 0xC7, 0xC8, 0xC9, 0xCA, 0xD2, 0xD3, 0xD4, 0xD5, 0xD6,
            0xD7, 0xD8, 0xD9, 0xDA, 0xE2, 0xE3, 0xE4, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0xEA, 0xF2,
            0xF3, 0xF4, 0xF5, 0xF6, 0xF7, 0xF8, 0xF9, 0xFA,
        ],
    }
}
