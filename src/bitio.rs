// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bit-level I/O for JPEG entropy-coded data.
//!
//! Provides [`BitReader`] for decoding and [`BitWriter`] for encoding the
//! entropy-coded scan data. Both handle JPEG byte-stuffing (0xFF -> 0xFF 0x00)
//! and operate in MSB-first bit order.

use crate::error::{Error, Result};

/// Bit-level reader for JPEG entropy-coded data.
///
/// Handles JPEG byte-stuffing (0xFF00 → 0xFF) and marker detection: a 0xFF
/// followed by a restart marker is surfaced through
/// [`BitReader::check_restart_marker`]; any other marker sets
/// [`BitReader::marker_found`] and ends the entropy data (further reads are
/// fed zero fill so an in-flight block can finish). Bits are read MSB-first
/// from a 32-bit internal buffer.
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
    /// Bit buffer. The low `bits_left` positions hold the unread bits.
    buf: u32,
    bits_left: u8,
    /// Set when a marker (0xFF followed by non-zero byte) is found in the stream.
    marker_found: Option<u8>,
}

impl<'a> BitReader<'a> {
    /// Create a new BitReader over the given byte slice.
    /// `pos` should point to the first byte of entropy-coded data (after SOS header).
    pub fn new(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos,
            buf: 0,
            bits_left: 0,
            marker_found: None,
        }
    }

    /// Read `count` bits (1–16) and return them right-aligned.
    pub fn read_bits(&mut self, count: u8) -> Result<u16> {
        debug_assert!(count >= 1 && count <= 16);
        while self.bits_left < count {
            self.fill_byte()?;
        }
        self.bits_left -= count;
        let val = (self.buf >> self.bits_left) & ((1u32 << count) - 1);
        Ok(val as u16)
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<u16> {
        self.read_bits(1)
    }

    /// Align to the next byte boundary by discarding remaining bits in the current byte.
    pub fn byte_align(&mut self) {
        self.bits_left = 0;
        self.buf = 0;
    }

    /// Current byte position in the underlying data.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the marker byte if a marker was encountered during reading.
    pub fn marker_found(&self) -> Option<u8> {
        self.marker_found
    }

    /// Check if a restart marker (0xFFD0–0xFFD7) is present.
    /// Checks both the `marker_found` flag (set if `fill_byte` already consumed
    /// a RST marker during Huffman decoding) and the next bytes in the stream.
    /// If found, consume the marker and return the marker's low nibble (0–7).
    pub fn check_restart_marker(&mut self) -> Result<Option<u8>> {
        self.byte_align();

        // Case 1: fill_byte already consumed a RST marker during Huffman decoding
        if let Some(m) = self.marker_found {
            if (m & 0xF8) == 0xD0 {
                self.marker_found = None;
                return Ok(Some(m & 0x07));
            }
        }

        // Case 2: RST marker is at the current position in the stream
        // Also skip any fill 0xFF bytes before the marker
        while self.pos + 1 < self.data.len() && self.data[self.pos] == 0xFF {
            let next = self.data[self.pos + 1];
            if next == 0xFF {
                // Fill byte — skip it
                self.pos += 1;
                continue;
            }
            if (next & 0xF8) == 0xD0 {
                let rst = next & 0x07;
                self.pos += 2;
                return Ok(Some(rst));
            }
            break;
        }

        Ok(None)
    }

    fn fill_byte(&mut self) -> Result<()> {
        if self.marker_found.is_some() {
            // Entropy data ended at a marker. Feed zero fill so the block
            // being decoded can run to completion; the scan loop inspects
            // `marker_found` and stops.
            self.buf <<= 8;
            self.bits_left += 8;
            return Ok(());
        }
        if self.pos >= self.data.len() {
            return Err(Error::UnexpectedEof);
        }
        let byte = self.data[self.pos];
        self.pos += 1;

        if byte == 0xFF {
            if self.pos >= self.data.len() {
                return Err(Error::UnexpectedEof);
            }
            let next = self.data[self.pos];
            if next == 0x00 {
                // Byte-stuffed 0xFF
                self.pos += 1;
            } else {
                // This is a marker — signal it and stop consuming data
                self.marker_found = Some(next);
                self.pos += 1;
                self.buf <<= 8;
                self.bits_left += 8;
                return Ok(());
            }
        }

        self.buf = (self.buf << 8) | (byte as u32);
        self.bits_left += 8;
        Ok(())
    }
}

/// Bit-level writer for JPEG entropy-coded data.
///
/// Handles byte-stuffing (0xFF → 0xFF 0x00). MSB-first bit order.
pub struct BitWriter {
    output: Vec<u8>,
    buf: u8,
    bits_used: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self {
            output: Vec::new(),
            buf: 0,
            bits_used: 0,
        }
    }

    /// Write `count` bits (1–16) from the low bits of `value`.
    pub fn write_bits(&mut self, value: u16, count: u8) {
        debug_assert!(count >= 1 && count <= 16);
        // Write bits MSB-first
        for i in (0..count).rev() {
            let bit = (value >> i) & 1;
            self.buf = (self.buf << 1) | (bit as u8);
            self.bits_used += 1;
            if self.bits_used == 8 {
                self.emit_byte(self.buf);
                self.buf = 0;
                self.bits_used = 0;
            }
        }
    }

    /// Zero-pad the final partial byte and return the stuffed output.
    pub fn flush(mut self) -> Vec<u8> {
        if self.bits_used > 0 {
            let remaining = 8 - self.bits_used;
            self.buf <<= remaining;
            self.emit_byte(self.buf);
        }
        self.output
    }

    fn emit_byte(&mut self, byte: u8) {
        self.output.push(byte);
        if byte == 0xFF {
            self.output.push(0x00); // Byte-stuffing
        }
    }
}

impl Default for BitWriter {
    fn default() -> Self {
        Self::new()
    }
}
