//! Whole-frame change detection between consecutive ticks.
//!
//! The device service is driven at a fixed frame rate even when nothing
//! on screen moved. [`LastFrame`] remembers the most recently sent
//! [`EncodedFrame`] so the scheduler can skip byte-identical frames.

use crate::frame::EncodedFrame;

// ── LastFrame ────────────────────────────────────────────────────

/// The most recently transmitted frame, owned by the render loop.
///
/// The first call (or the call after [`reset`](Self::reset)) to
/// [`differs`](Self::differs) always reports a change.
#[derive(Debug, Default)]
pub struct LastFrame {
    previous: Option<EncodedFrame>,
    sent_count: u64,
}

impl LastFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when `current` must be transmitted.
    pub fn differs(&self, current: &EncodedFrame) -> bool {
        match &self.previous {
            Some(prev) => prev.as_bytes() != current.as_bytes(),
            None => true,
        }
    }

    /// Remember `frame` as the one now on the device.
    pub fn record(&mut self, frame: EncodedFrame) {
        self.previous = Some(frame);
        self.sent_count += 1;
    }

    /// Forget the previous frame, forcing the next one out.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Frames recorded since construction.
    pub fn sent_count(&self) -> u64 {
        self.sent_count
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::ENCODED_FRAME_LEN;

    fn make_frame(fill: u8) -> EncodedFrame {
        EncodedFrame::from_bytes([fill; ENCODED_FRAME_LEN])
    }

    #[test]
    fn first_frame_differs() {
        let last = LastFrame::new();
        assert!(last.differs(&make_frame(0)));
    }

    #[test]
    fn identical_frame_does_not_differ() {
        let mut last = LastFrame::new();
        last.record(make_frame(0xAA));
        assert!(!last.differs(&make_frame(0xAA)));
    }

    #[test]
    fn single_byte_change_differs() {
        let mut last = LastFrame::new();
        last.record(make_frame(0));

        let mut bytes = [0u8; ENCODED_FRAME_LEN];
        bytes[639] = 0x01;
        assert!(last.differs(&EncodedFrame::from_bytes(bytes)));
    }

    #[test]
    fn reset_forces_resend() {
        let mut last = LastFrame::new();
        last.record(make_frame(0));
        last.reset();
        assert!(last.differs(&make_frame(0)));
        assert_eq!(last.sent_count(), 1);
    }
}
