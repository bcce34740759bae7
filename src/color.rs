// SPDX-License-Identifier: MIT OR Apache-2.0

//! RGB ↔ YCbCr color transforms (ITU-R BT.601 coefficients).
//!
//! Single-component (grayscale) frames bypass these entirely; the luma
//! sample is replicated into all three RGB channels by the pixel path.

/// Convert one RGB sample to YCbCr. Chroma channels carry the +128 offset.
pub fn rgb_to_ycbcr(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let y = 0.299 * r + 0.587 * g + 0.114 * b;
    let cb = -0.168736 * r - 0.331264 * g + 0.5 * b + 128.0;
    let cr = 0.5 * r - 0.418688 * g - 0.081312 * b + 128.0;
    (y, cb, cr)
}

/// Convert one YCbCr sample back to RGB, clamped to [0, 255].
pub fn ycbcr_to_rgb(y: f64, cb: f64, cr: f64) -> (u8, u8, u8) {
    let r = y + 1.402 * (cr - 128.0);
    let g = y - 0.344136 * (cb - 128.0) - 0.714136 * (cr - 128.0);
    let b = y + 1.772 * (cb - 128.0);
    (clamp_u8(r), clamp_u8(g), clamp_u8(b))
}

/// Clamp a sample value to the [0, 255] byte range.
pub fn clamp_u8(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
