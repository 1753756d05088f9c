//! Shared frame types for the render → encode → send pipeline.
//!
//! A [`Frame`] is the RGB bitmap a renderer hands back for one tick.
//! An [`EncodedFrame`] is the packed 1-bit wire image the device
//! service expects: 40 rows of 16 bytes, most-significant bit first.

use image::RgbImage;

// ── Panel geometry ───────────────────────────────────────────────

/// Panel width in pixels.
pub const FRAME_WIDTH: u32 = 128;

/// Panel height in pixels.
pub const FRAME_HEIGHT: u32 = 40;

/// Bytes per packed row (128 bits).
pub const ROW_BYTES: usize = FRAME_WIDTH as usize / 8;

/// Total size of an encoded frame on the wire.
pub const ENCODED_FRAME_LEN: usize = ROW_BYTES * FRAME_HEIGHT as usize;

/// A rendered bitmap. Normally 128×40; other sizes are rescaled by the codec.
pub type Frame = RgbImage;

// ── EncodedFrame ─────────────────────────────────────────────────

/// A packed 128×40 monochrome image, always exactly 640 bytes.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EncodedFrame {
    data: [u8; ENCODED_FRAME_LEN],
}

impl EncodedFrame {
    /// An all-off frame.
    pub const fn blank() -> Self {
        Self {
            data: [0u8; ENCODED_FRAME_LEN],
        }
    }

    /// Wrap an already packed buffer.
    pub const fn from_bytes(data: [u8; ENCODED_FRAME_LEN]) -> Self {
        Self { data }
    }

    /// The packed bytes, row-major.
    pub fn as_bytes(&self) -> &[u8; ENCODED_FRAME_LEN] {
        &self.data
    }

    /// Whether pixel `(x, y)` is lit.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the 128×40 panel.
    pub fn pixel(&self, x: u32, y: u32) -> bool {
        assert!(x < FRAME_WIDTH && y < FRAME_HEIGHT, "pixel out of bounds");
        let byte = self.data[y as usize * ROW_BYTES + x as usize / 8];
        byte & (1 << (7 - (x % 8))) != 0
    }

    /// Number of lit pixels.
    pub fn lit_count(&self) -> u32 {
        self.data.iter().map(|b| b.count_ones()).sum()
    }

    pub(crate) fn set(&mut self, x: u32, y: u32) {
        self.data[y as usize * ROW_BYTES + x as usize / 8] |= 1 << (7 - (x % 8));
    }
}

impl Default for EncodedFrame {
    fn default() -> Self {
        Self::blank()
    }
}

impl std::fmt::Debug for EncodedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodedFrame")
            .field("len", &ENCODED_FRAME_LEN)
            .field("lit", &self.lit_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geometry_constants() {
        assert_eq!(ROW_BYTES, 16);
        assert_eq!(ENCODED_FRAME_LEN, 640);
    }

    #[test]
    fn set_and_read_back_pixel() {
        let mut f = EncodedFrame::blank();
        f.set(9, 2);
        assert!(f.pixel(9, 2));
        assert!(!f.pixel(8, 2));
        assert_eq!(f.as_bytes()[2 * 16 + 1], 0b0100_0000);
        assert_eq!(f.lit_count(), 1);
    }

    #[test]
    #[should_panic]
    fn pixel_out_of_bounds_panics() {
        EncodedFrame::blank().pixel(128, 0);
    }
}
