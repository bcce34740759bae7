// SPDX-License-Identifier: MIT OR Apache-2.0

//! # lumajpeg
//!
//! Pure-Rust JPEG codec with direct access to quantized DCT coefficients.
//! Decodes baseline (SOF0) and progressive (SOF2) streams, encodes both,
//! and exposes the coefficient layer so callers can transform an image in
//! the frequency domain and re-encode it without a lossy pixel round trip.
//!
//! The pixel boundary is plain RGBA8. Tolerant decoding keeps going past
//! corrupted blocks and reports them instead of failing.
//!
//! # Quick start
//!
//! ```rust
//! use lumajpeg::{JpegImage, extract_coefficients, encode_from_coefficients};
//!
//! let rgba = vec![200u8; 16 * 16 * 4];
//! let jpeg = JpegImage::from_pixels(16, 16, &rgba, 85)
//!     .unwrap()
//!     .to_bytes(false)
//!     .unwrap();
//!
//! // Frequency-domain round trip, no pixel decode in between.
//! let coeffs = extract_coefficients(&jpeg).unwrap();
//! let again = encode_from_coefficients(&coeffs, None).unwrap();
//! assert_eq!(extract_coefficients(&again).unwrap().width, 16);
//! ```

pub mod bitio;
pub mod codec;
pub mod coefficients;
pub mod color;
pub mod dct;
pub mod error;
pub mod format;
pub mod frame;
pub mod huffman;
pub mod marker;
pub mod pixels;
pub mod quant;
pub mod scan;
pub mod tables;
pub mod zigzag;

pub use codec::JpegImage;
pub use coefficients::{
    encode_from_coefficients, extract_coefficients, CoefficientComponent, QuantizedCoefficients,
};
pub use dct::DctGrid;
pub use error::{Error, Result};
pub use format::{
    DecodeOptions, EncodeOptions, FormatCodec, ImageFormat, JpegFormat, PixelImage,
};
pub use frame::FrameInfo;
pub use quant::QuantTable;
pub use scan::{BlockFailure, DecodeReport};
