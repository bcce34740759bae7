// SPDX-License-Identifier: MIT OR Apache-2.0

//! Huffman coding tables for JPEG entropy decoding and encoding.
//!
//! Codes are canonical per ITU-T T.81 Annex C: starting from 0 at length 1,
//! each length's codes are consecutive, and the running code is left-shifted
//! between lengths. The decode side uses the per-length
//! `min_code`/`max_code`/`val_ptr` scheme of Annex F (Figure F.16).

use crate::bitio::BitReader;
use crate::error::{Error, Result};

/// Huffman decode table.
///
/// Indexed by code length 1–16; entry 0 is unused. `max_code` is −1 for
/// lengths with no codes, so the running-code comparison never matches them.
pub struct HuffmanDecodeTable {
    min_code: [i32; 17],
    max_code: [i32; 17],
    /// Offset of each length's first symbol in `huffval`.
    val_ptr: [usize; 17],
    /// Symbol values in order of increasing code length.
    huffval: Vec<u8>,
}

impl HuffmanDecodeTable {
    /// Build a decode table from JPEG-style counts and symbols.
    ///
    /// `bits`: counts[i] = number of codes of length i+1 (16 entries).
    /// `huffval`: the symbols, in order of increasing code length.
    pub fn build(bits: &[u8; 16], huffval: &[u8]) -> Result<Self> {
        let total: usize = bits.iter().map(|&b| b as usize).sum();
        if total != huffval.len() {
            return Err(Error::InvalidMarkerData("DHT symbol count mismatch"));
        }

        let mut min_code = [0i32; 17];
        let mut max_code = [-1i32; 17];
        let mut val_ptr = [0usize; 17];

        let mut code: i32 = 0;
        let mut si = 0usize;
        for length in 1..=16usize {
            let count = bits[length - 1] as usize;
            if count > 0 {
                val_ptr[length] = si;
                min_code[length] = code;
                code += count as i32;
                max_code[length] = code - 1;
                si += count;
            }
            code <<= 1;
        }

        Ok(Self {
            min_code,
            max_code,
            val_ptr,
            huffval: huffval.to_vec(),
        })
    }

    /// Decode one Huffman symbol from the bit stream.
    ///
    /// Reads one bit at a time into a running code; at each length, if the
    /// code falls within that length's range, the symbol is resolved through
    /// `val_ptr`. Fails if no length in 1..16 matches.
    pub fn decode(&self, reader: &mut BitReader) -> Result<u8> {
        let mut code: i32 = 0;
        for length in 1..=16usize {
            code = (code << 1) | reader.read_bit()? as i32;
            if code <= self.max_code[length] {
                let idx = self.val_ptr[length] + (code - self.min_code[length]) as usize;
                return self
                    .huffval
                    .get(idx)
                    .copied()
                    .ok_or(Error::HuffmanDecode("symbol index out of range"));
            }
        }
        Err(Error::HuffmanDecode("no code matched within 16 bits"))
    }
}

/// Huffman encode table: maps symbol → (code_bits, code_length).
pub struct HuffmanEncodeTable {
    /// For each of the 256 possible symbols: (code, length).
    /// Length 0 means the symbol is not in the table.
    table: [(u16, u8); 256],
}

impl HuffmanEncodeTable {
    /// Build an encode table from JPEG-style counts and symbols.
    ///
    /// Produces the same canonical code assignment as
    /// [`HuffmanDecodeTable::build`], stored per symbol.
    pub fn build(bits: &[u8; 16], huffval: &[u8]) -> Self {
        let mut table = [(0u16, 0u8); 256];
        let mut code: u32 = 0;
        let mut si = 0;

        for length in 1..=16u8 {
            let count = bits[(length - 1) as usize] as usize;
            for _ in 0..count {
                if si < huffval.len() {
                    let symbol = huffval[si] as usize;
                    table[symbol] = (code as u16, length);
                    si += 1;
                }
                code += 1;
            }
            code <<= 1;
        }

        Self { table }
    }

    /// Encode a symbol: returns (code_bits, code_length).
    /// Returns `Err` if the symbol has no code in this table.
    pub fn encode(&self, symbol: u8) -> Result<(u16, u8)> {
        let (code, len) = self.table[symbol as usize];
        if len == 0 {
            Err(Error::MissingHuffmanSymbol(symbol))
        } else {
            Ok((code, len))
        }
    }
}

/// Extend a signed value from its JPEG "additional bits" representation.
///
/// Per ITU-T T.81 Table F.1: if the high bit is 0, the value is negative.
pub fn extend_sign(value: u16, bits: u8) -> i16 {
    if bits == 0 {
        return 0;
    }
    let half = 1i32 << (bits - 1);
    if (value as i32) < half {
        // Negative value
        (value as i32 - (1i32 << bits) + 1) as i16
    } else {
        value as i16
    }
}

/// Encode a signed value into JPEG "additional bits" representation.
/// Returns (magnitude_bits, category/size).
pub fn encode_value(value: i16) -> (u16, u8) {
    if value == 0 {
        return (0, 0);
    }
    let abs = value.unsigned_abs();
    let size = 16 - abs.leading_zeros() as u8;
    let bits = if value > 0 {
        value as u16
    } else {
        // For negative values, JPEG uses one's complement
        (value - 1) as u16
    };
    (bits & ((1u16 << size) - 1), size)
}
