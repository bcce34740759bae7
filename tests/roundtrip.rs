// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pixel round-trip tests through the full encode/decode pipeline.

use lumajpeg::{DecodeOptions, EncodeOptions, FormatCodec, JpegFormat, JpegImage, PixelImage};
use rand::Rng;

fn max_channel_error(a: &[u8], b: &[u8]) -> i32 {
    a.iter()
        .zip(b.iter())
        .enumerate()
        .filter(|(i, _)| i % 4 != 3) // alpha is always exact
        .map(|(_, (x, y))| (*x as i32 - *y as i32).abs())
        .max()
        .unwrap_or(0)
}

fn gradient_rgba(width: usize, height: usize) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            rgba.push((x * 255 / width.max(1)) as u8);
            rgba.push((y * 255 / height.max(1)) as u8);
            rgba.push(((x + y) * 127 / (width + height).max(1)) as u8);
            rgba.push(255);
        }
    }
    rgba
}

#[test]
fn quality_100_roundtrip_is_near_lossless() {
    let rgba = gradient_rgba(32, 32);
    let img = JpegImage::from_pixels(32, 32, &rgba, 100).unwrap();
    let bytes = img.to_bytes(false).unwrap();

    let decoded = JpegImage::from_bytes(&bytes, false).unwrap();
    let out = decoded.to_pixels().unwrap();
    assert_eq!(out.len(), rgba.len());
    assert!(
        max_channel_error(&rgba, &out) <= 3,
        "error {} exceeds tolerance",
        max_channel_error(&rgba, &out)
    );
}

#[test]
fn four_chained_roundtrips_never_fail() {
    let mut rgba = gradient_rgba(24, 17);
    for pass in 0..4 {
        let img = JpegImage::from_pixels(24, 17, &rgba, 80)
            .unwrap_or_else(|e| panic!("encode failed on pass {pass}: {e}"));
        let bytes = img.to_bytes(false).unwrap();
        let decoded = JpegImage::from_bytes(&bytes, false)
            .unwrap_or_else(|e| panic!("decode failed on pass {pass}: {e}"));
        rgba = decoded.to_pixels().unwrap();
        assert_eq!(rgba.len(), 24 * 17 * 4);
    }
}

#[test]
fn two_by_two_four_color_image() {
    // Red, green / blue, yellow
    let rgba = vec![
        255, 0, 0, 255, 0, 255, 0, 255, //
        0, 0, 255, 255, 255, 255, 0, 255,
    ];
    let img = JpegImage::from_pixels(2, 2, &rgba, 85).unwrap();
    let bytes = img.to_bytes(false).unwrap();

    let decoded = JpegImage::from_bytes(&bytes, false).unwrap();
    assert_eq!(decoded.width(), 2);
    assert_eq!(decoded.height(), 2);
    let out = decoded.to_pixels().unwrap();
    assert_eq!(out.len(), 16);
    assert!(out.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn checkerboard_recompression_stabilizes() {
    let mut rgba = Vec::new();
    for y in 0..8 {
        for x in 0..8 {
            let v = if (x + y) % 2 == 0 { 255u8 } else { 0 };
            rgba.extend_from_slice(&[v, v, v, 255]);
        }
    }
    for _ in 0..4 {
        let img = JpegImage::from_pixels(8, 8, &rgba, 75).unwrap();
        let bytes = img.to_bytes(false).unwrap();
        rgba = JpegImage::from_bytes(&bytes, false)
            .unwrap()
            .to_pixels()
            .unwrap();
    }
    assert_eq!(rgba.len(), 8 * 8 * 4);
}

#[test]
fn non_multiple_of_8_dimensions_are_exact() {
    for (w, h) in [(1u16, 1u16), (7, 3), (9, 9), (17, 23), (33, 1)] {
        let rgba = gradient_rgba(w as usize, h as usize);
        let img = JpegImage::from_pixels(w, h, &rgba, 90).unwrap();
        let bytes = img.to_bytes(false).unwrap();

        let decoded = JpegImage::from_bytes(&bytes, false).unwrap();
        assert_eq!(decoded.width(), w, "{w}x{h}");
        assert_eq!(decoded.height(), h, "{w}x{h}");
        assert_eq!(decoded.to_pixels().unwrap().len(), w as usize * h as usize * 4);
    }
}

#[test]
fn noise_image_roundtrip() {
    let mut rng = rand::rng();
    let mut rgba = Vec::with_capacity(40 * 30 * 4);
    for _ in 0..(40 * 30) {
        rgba.push(rng.random_range(0..=255u16) as u8);
        rgba.push(rng.random_range(0..=255u16) as u8);
        rgba.push(rng.random_range(0..=255u16) as u8);
        rgba.push(255);
    }

    for quality in [30u8, 60, 95] {
        let img = JpegImage::from_pixels(40, 30, &rgba, quality).unwrap();
        let bytes = img.to_bytes(false).unwrap();
        let decoded = JpegImage::from_bytes(&bytes, false).unwrap();
        assert!(decoded.report().is_clean());
        assert_eq!(decoded.to_pixels().unwrap().len(), rgba.len());
    }
}

#[test]
fn facade_roundtrip_matches_direct_path() {
    let codec = JpegFormat;
    let image = PixelImage {
        width: 20,
        height: 12,
        data: gradient_rgba(20, 12),
    };
    let bytes = codec
        .encode(&image, EncodeOptions { quality: 90, ..Default::default() })
        .unwrap();

    let (via_facade, report) = codec.decode(&bytes, DecodeOptions::default()).unwrap();
    assert!(report.is_clean());

    let direct = JpegImage::from_bytes(&bytes, false)
        .unwrap()
        .to_pixels()
        .unwrap();
    assert_eq!(via_facade.data, direct);
}
