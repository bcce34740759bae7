// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for JPEG parsing and encoding.

use thiserror::Error;

/// Errors that can occur during JPEG parsing, encoding, or coefficient
/// injection.
///
/// Signature and header errors abort a decode immediately. Scan-body errors
/// ([`Error::HuffmanDecode`], [`Error::UnexpectedEof`]) are recoverable per
/// block when [`crate::DecodeOptions::tolerant`] is set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Missing SOI (0xFFD8) at start of data — not a JPEG stream.
    #[error("missing SOI marker (not a JPEG)")]
    Signature,
    /// Input data is too short or truncated.
    #[error("unexpected end of JPEG data")]
    UnexpectedEof,
    /// Frame type the codec does not handle (lossless, arithmetic, ...).
    #[error("unsupported JPEG feature: {0}")]
    Unsupported(&'static str),
    /// Sample precision other than 8 bits.
    #[error("unsupported sample precision: {0}-bit")]
    UnsupportedPrecision(u8),
    /// A marker segment has invalid or inconsistent length/content.
    #[error("invalid marker data: {0}")]
    InvalidMarkerData(&'static str),
    /// No Huffman code matched within 16 bits, or the entropy data is
    /// otherwise undecodable.
    #[error("entropy decode failed: {0}")]
    HuffmanDecode(&'static str),
    /// A scan references a Huffman or quantization table that was never
    /// declared.
    #[error("missing {kind} table {id}")]
    MissingTable { kind: &'static str, id: u8 },
    /// A coefficient value produced a symbol absent from the encode table.
    #[error("Huffman table has no code for symbol {0:#04x}")]
    MissingHuffmanSymbol(u8),
    /// Component ID referenced in SOS not found in SOF.
    #[error("unknown component ID in SOS: {0}")]
    UnknownComponentId(u8),
    /// Image dimensions or sampling factors are invalid.
    #[error("invalid image dimensions or sampling factors")]
    InvalidDimensions,
    /// Encode quality outside [1, 100].
    #[error("quality {0} out of range [1, 100]")]
    InvalidQuality(u8),
    /// A pixel buffer does not match its declared dimensions.
    #[error("expected {expected} bytes of RGBA pixel data, got {actual}")]
    InvalidPixelBuffer { expected: usize, actual: usize },
    /// A coefficient bundle is missing required fields or is mis-shaped.
    #[error("invalid coefficient bundle: {0}")]
    InvalidCoefficients(&'static str),
    /// A coefficient bundle's format tag does not match this codec.
    #[error("coefficient bundle format does not match the JPEG codec")]
    UnsupportedFormat,
}

pub type Result<T> = std::result::Result<T, Error>;
