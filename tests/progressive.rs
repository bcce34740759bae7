// SPDX-License-Identifier: MIT OR Apache-2.0

//! Progressive (SOF2) encode/decode behavior.

use lumajpeg::marker;
use lumajpeg::JpegImage;

fn gradient_rgba(width: usize, height: usize) -> Vec<u8> {
    let mut rgba = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            rgba.push((x * 255 / width.max(1)) as u8);
            rgba.push((y * 255 / height.max(1)) as u8);
            rgba.push(90);
            rgba.push(255);
        }
    }
    rgba
}

#[test]
fn progressive_decode_equals_baseline_decode() {
    let rgba = gradient_rgba(40, 28);
    let img = JpegImage::from_pixels(40, 28, &rgba, 85).unwrap();

    let baseline = JpegImage::from_bytes(&img.to_bytes(false).unwrap(), false).unwrap();
    let progressive = JpegImage::from_bytes(&img.to_bytes(true).unwrap(), false).unwrap();

    assert!(!baseline.is_progressive());
    assert!(progressive.is_progressive());

    // Same coefficients in, same pixels out.
    assert_eq!(
        baseline.to_pixels().unwrap(),
        progressive.to_pixels().unwrap()
    );
}

#[test]
fn progressive_stream_has_one_dc_and_three_ac_scans() {
    let rgba = gradient_rgba(16, 16);
    let bytes = JpegImage::from_pixels(16, 16, &rgba, 85)
        .unwrap()
        .to_bytes(true)
        .unwrap();

    let (entries, scan_starts) = marker::iterate_markers(&bytes).unwrap();
    let sos_count = entries.iter().filter(|e| e.marker == marker::SOS).count();
    assert_eq!(sos_count, 4);
    assert_eq!(scan_starts.len(), 4);
    assert!(entries.iter().any(|e| e.marker == marker::SOF2));
    assert!(entries.iter().all(|e| e.marker != marker::SOF0));
}

#[test]
fn progressive_non_mcu_aligned_dimensions() {
    for (w, h) in [(9u16, 7u16), (15, 15), (31, 2)] {
        let rgba = gradient_rgba(w as usize, h as usize);
        let img = JpegImage::from_pixels(w, h, &rgba, 90).unwrap();
        let decoded = JpegImage::from_bytes(&img.to_bytes(true).unwrap(), false).unwrap();
        assert_eq!(decoded.width(), w);
        assert_eq!(decoded.height(), h);
        assert_eq!(
            decoded.to_pixels().unwrap(),
            JpegImage::from_bytes(&img.to_bytes(false).unwrap(), false)
                .unwrap()
                .to_pixels()
                .unwrap(),
            "{w}x{h}"
        );
    }
}

#[test]
fn progressive_reencode_preserves_mode() {
    let rgba = gradient_rgba(16, 8);
    let bytes = JpegImage::from_pixels(16, 8, &rgba, 85)
        .unwrap()
        .to_bytes(true)
        .unwrap();

    let decoded = JpegImage::from_bytes(&bytes, false).unwrap();
    let again = decoded.to_bytes(decoded.is_progressive()).unwrap();
    let reparsed = JpegImage::from_bytes(&again, false).unwrap();
    assert!(reparsed.is_progressive());
    assert_eq!(decoded.to_pixels().unwrap(), reparsed.to_pixels().unwrap());
}
