//! Media panel: `artist - title`, elapsed/total time and a progress bar.
//!
//! A line wider than the panel scrolls left [`SCROLL_STEP`] pixels per
//! frame and wraps around with a gap. The scroll offset restarts when
//! the text changes.

use embedded_graphics::mono_font::iso_8859_1::FONT_6X10;
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{PrimitiveStyle, Rectangle};

use super::{Canvas, text_width};
use crate::frame::{FRAME_HEIGHT, FRAME_WIDTH};
use crate::media::MediaSample;

/// Pixels the title line moves per rendered frame.
pub const SCROLL_STEP: i32 = 2;
/// Height of the progress bar along the bottom edge.
pub const PROGRESS_BAR_HEIGHT: u32 = 5;

const SCROLL_GAP: i32 = 24;
const TITLE_Y: i32 = 4;
const TIME_Y: i32 = 19;

/// Media drawing state carried between frames.
#[derive(Debug, Default)]
pub struct MediaPanel {
    line: String,
    offset: i32,
}

impl MediaPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw(&mut self, canvas: &mut Canvas, media: &MediaSample) {
        let line = display_line(media);
        if line != self.line {
            self.line = line;
            self.offset = 0;
        }

        let width = text_width(&self.line, &FONT_6X10);
        if width <= FRAME_WIDTH as i32 {
            canvas.text_centered(&self.line, TITLE_Y, &FONT_6X10);
        } else {
            let period = width + SCROLL_GAP;
            canvas.text(&self.line, -self.offset, TITLE_Y, &FONT_6X10);
            canvas.text(&self.line, period - self.offset, TITLE_Y, &FONT_6X10);
            self.offset = (self.offset + SCROLL_STEP) % period;
        }

        let times = format!(
            "{} / {}",
            format_time(media.position_ms),
            format_time(media.duration_ms)
        );
        canvas.text_centered(&times, TIME_Y, &FONT_6X10);

        let filled = (media.progress_ratio() * f64::from(FRAME_WIDTH)).round() as u32;
        if filled > 0 {
            let bar = Rectangle::new(
                Point::new(0, (FRAME_HEIGHT - PROGRESS_BAR_HEIGHT) as i32),
                Size::new(filled, PROGRESS_BAR_HEIGHT),
            );
            let Ok(()) = bar
                .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
                .draw(canvas);
        }
    }

    /// Current scroll offset in pixels.
    pub fn offset(&self) -> i32 {
        self.offset
    }
}

fn display_line(media: &MediaSample) -> String {
    if media.artist.is_empty() {
        media.title.clone()
    } else {
        format!("{} - {}", media.artist, media.title)
    }
}

/// `m:ss`, or `h:mm:ss` from one hour up.
fn format_time(ms: f64) -> String {
    let total = if ms.is_finite() && ms > 0.0 {
        (ms / 1000.0) as u64
    } else {
        0
    };
    let (h, m, s) = (total / 3600, (total / 60) % 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaOrigin;
    use std::time::Instant;

    fn sample(title: &str, position_ms: f64, duration_ms: f64) -> MediaSample {
        MediaSample {
            title: title.into(),
            artist: String::new(),
            position_ms,
            duration_ms,
            is_playing: true,
            observed_at: Instant::now(),
            origin: MediaOrigin::Session,
        }
    }

    #[test]
    fn time_formatting() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(61_500.0), "1:01");
        assert_eq!(format_time(3_725_000.0), "1:02:05");
        assert_eq!(format_time(f64::NAN), "0:00");
    }

    #[test]
    fn artist_prefix_only_when_known() {
        let mut m = sample("Song", 0.0, 0.0);
        assert_eq!(display_line(&m), "Song");
        m.artist = "Band".into();
        assert_eq!(display_line(&m), "Band - Song");
    }

    #[test]
    fn short_line_does_not_scroll() {
        let mut panel = MediaPanel::new();
        let m = sample("Short", 0.0, 0.0);
        for _ in 0..3 {
            panel.draw(&mut Canvas::new(), &m);
        }
        assert_eq!(panel.offset(), 0);
    }

    #[test]
    fn long_line_scrolls_two_pixels_and_resets_on_change() {
        let mut panel = MediaPanel::new();
        let long = sample("An extremely long track title that cannot fit", 0.0, 0.0);
        panel.draw(&mut Canvas::new(), &long);
        panel.draw(&mut Canvas::new(), &long);
        assert_eq!(panel.offset(), 2 * SCROLL_STEP);

        panel.draw(&mut Canvas::new(), &sample("Other", 0.0, 0.0));
        assert_eq!(panel.offset(), 0);
    }

    #[test]
    fn scroll_wraps_around() {
        let mut panel = MediaPanel::new();
        let long = sample("An extremely long track title that cannot fit", 0.0, 0.0);
        let period = text_width(&display_line(&long), &FONT_6X10) + SCROLL_GAP;
        for _ in 0..(period / SCROLL_STEP + 1) {
            panel.draw(&mut Canvas::new(), &long);
        }
        assert!(panel.offset() < period);
    }

    #[test]
    fn progress_bar_tracks_position() {
        let mut panel = MediaPanel::new();
        let mut half = Canvas::new();
        panel.draw(&mut half, &sample("x", 50.0, 100.0));
        let bottom = FRAME_HEIGHT - 1;
        assert!(half.is_on(0, bottom));
        assert!(half.is_on(63, bottom));
        assert!(!half.is_on(64, bottom));

        let mut none = Canvas::new();
        panel.draw(&mut none, &sample("x", 0.0, 0.0));
        assert!(!none.is_on(0, bottom));
    }
}
