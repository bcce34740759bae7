// SPDX-License-Identifier: MIT OR Apache-2.0

//! Format facade: the closed set of image formats and the codec trait
//! dispatching over it.
//!
//! Only JPEG is implemented; the enum keeps the dispatch point explicit so a
//! coefficient bundle always carries the format it came from.

use crate::codec::JpegImage;
use crate::error::{Error, Result};
use crate::scan::DecodeReport;

/// The image formats this crate knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ImageFormat {
    Jpeg,
}

/// A decoded image: tightly packed RGBA8 samples.
#[derive(Debug, Clone)]
pub struct PixelImage {
    pub width: u32,
    pub height: u32,
    /// `width * height * 4` bytes, row-major RGBA. Alpha is 255 on decode.
    pub data: Vec<u8>,
}

/// Encoder settings.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Quality in [1, 100].
    pub quality: u8,
    /// Write a progressive (SOF2) stream instead of baseline.
    pub progressive: bool,
    /// JFIF pixel density in dots per inch, written into APP0 when set.
    pub density: Option<(u16, u16)>,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            quality: 85,
            progressive: false,
            density: None,
        }
    }
}

/// Decoder settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    /// Keep decoding past undecodable blocks, collecting them in the
    /// [`DecodeReport`] instead of failing.
    pub tolerant: bool,
}

/// A pixel codec for one [`ImageFormat`].
pub trait FormatCodec {
    fn format(&self) -> ImageFormat;

    /// Cheap signature probe; no full parse.
    fn detect(&self, data: &[u8]) -> bool;

    fn decode(&self, data: &[u8], options: DecodeOptions) -> Result<(PixelImage, DecodeReport)>;

    fn encode(&self, image: &PixelImage, options: EncodeOptions) -> Result<Vec<u8>>;
}

/// The JPEG implementation of [`FormatCodec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegFormat;

impl FormatCodec for JpegFormat {
    fn format(&self) -> ImageFormat {
        ImageFormat::Jpeg
    }

    fn detect(&self, data: &[u8]) -> bool {
        data.len() >= 2 && data[0] == 0xFF && data[1] == 0xD8
    }

    fn decode(&self, data: &[u8], options: DecodeOptions) -> Result<(PixelImage, DecodeReport)> {
        let image = JpegImage::from_bytes(data, options.tolerant)?;
        let pixels = image.to_pixels()?;
        Ok((
            PixelImage {
                width: image.width() as u32,
                height: image.height() as u32,
                data: pixels,
            },
            image.report().clone(),
        ))
    }

    fn encode(&self, image: &PixelImage, options: EncodeOptions) -> Result<Vec<u8>> {
        if image.width == 0 || image.height == 0 || image.width > u16::MAX as u32
            || image.height > u16::MAX as u32
        {
            return Err(Error::InvalidDimensions);
        }
        let mut jpeg = JpegImage::from_pixels(
            image.width as u16,
            image.height as u16,
            &image.data,
            options.quality,
        )?;
        jpeg.set_density(options.density);
        jpeg.to_bytes(options.progressive)
    }
}
