//! Bitmap → device wire format.
//!
//! The device panel takes a packed 1-bit image: 16 bytes per row,
//! 40 rows, most-significant bit first. A pixel is lit when the mean of
//! its three colour channels exceeds [`LUMA_THRESHOLD`]. Inputs that are
//! not 128×40 are resampled first.
//!
//! Encoding is pure: identical pixels always produce identical bytes,
//! which the scheduler relies on for its unchanged-frame skip.

use image::imageops::{self, FilterType};

use crate::frame::{EncodedFrame, FRAME_HEIGHT, FRAME_WIDTH, Frame};

/// Channel mean above which a pixel is on.
pub const LUMA_THRESHOLD: u16 = 127;

/// Stateless frame encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCodec;

impl FrameCodec {
    /// Pack `bitmap` into the 640-byte device format.
    pub fn encode(bitmap: &Frame) -> EncodedFrame {
        if bitmap.dimensions() == (FRAME_WIDTH, FRAME_HEIGHT) {
            pack(bitmap)
        } else {
            let resized = imageops::resize(bitmap, FRAME_WIDTH, FRAME_HEIGHT, FilterType::Lanczos3);
            pack(&resized)
        }
    }
}

fn pack(bitmap: &Frame) -> EncodedFrame {
    let mut out = EncodedFrame::blank();
    for (x, y, px) in bitmap.enumerate_pixels() {
        let [r, g, b] = px.0;
        let mean = (r as u16 + g as u16 + b as u16) / 3;
        if mean > LUMA_THRESHOLD {
            out.set(x, y);
        }
    }
    out
}

// ── Tests ────────────────────────────────────────────────────────
