//! Drawing routines behind the renderer interface the scheduler consumes.
//!
//! | Panel    | Module        | Input                          |
//! |----------|---------------|--------------------------------|
//! | Clock    | [`clock`]     | local wall-clock time          |
//! | Hardware | [`hardware`]  | [`HardwareStats`]              |
//! | Media    | [`media`]     | [`MediaSample`] + scroll state |
//!
//! Panels draw with `embedded-graphics` onto a [`Canvas`], which is then
//! exported as the RGB [`Frame`] the codec expects.

pub mod clock;
pub mod hardware;
pub mod media;

use std::convert::Infallible;

use chrono::{DateTime, Local};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Baseline, Text};
use image::Rgb;

use crate::error::OledError;
use crate::frame::{FRAME_HEIGHT, FRAME_WIDTH, Frame};
use crate::hardware::HardwareStats;
use crate::media::MediaSample;

pub use media::MediaPanel;

/// One drawing call per render source.
pub trait FrameRenderer: Send {
    fn render_clock(&mut self, now: DateTime<Local>) -> Result<Frame, OledError>;
    fn render_hardware(&mut self, stats: &HardwareStats) -> Result<Frame, OledError>;
    fn render_media(&mut self, media: &MediaSample) -> Result<Frame, OledError>;
}

// ── Canvas ───────────────────────────────────────────────────────

/// 128×40 one-bit drawing surface.
#[derive(Clone)]
pub struct Canvas {
    pixels: Vec<bool>,
}

impl Canvas {
    pub fn new() -> Self {
        Self {
            pixels: vec![false; (FRAME_WIDTH * FRAME_HEIGHT) as usize],
        }
    }

    pub fn is_on(&self, x: u32, y: u32) -> bool {
        x < FRAME_WIDTH && y < FRAME_HEIGHT && self.pixels[(y * FRAME_WIDTH + x) as usize]
    }

    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|p| **p).count()
    }

    /// Draw `text` with its top-left corner at `(x, y)`.
    pub fn text(&mut self, text: &str, x: i32, y: i32, font: &MonoFont<'_>) {
        let style = MonoTextStyle::new(font, BinaryColor::On);
        let Ok(_) = Text::with_baseline(text, Point::new(x, y), style, Baseline::Top).draw(self);
    }

    /// Draw `text` horizontally centered on the canvas.
    pub fn text_centered(&mut self, text: &str, y: i32, font: &MonoFont<'_>) {
        let x = (FRAME_WIDTH as i32 - text_width(text, font)) / 2;
        self.text(text, x, y, font);
    }

    /// White-on-black RGB export.
    pub fn into_frame(self) -> Frame {
        Frame::from_fn(FRAME_WIDTH, FRAME_HEIGHT, |x, y| {
            if self.pixels[(y * FRAME_WIDTH + x) as usize] {
                Rgb([255, 255, 255])
            } else {
                Rgb([0, 0, 0])
            }
        })
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new()
    }
}

impl OriginDimensions for Canvas {
    fn size(&self) -> Size {
        Size::new(FRAME_WIDTH, FRAME_HEIGHT)
    }
}

impl DrawTarget for Canvas {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if point.x < 0 || point.y < 0 {
                continue;
            }
            let (x, y) = (point.x as u32, point.y as u32);
            if x < FRAME_WIDTH && y < FRAME_HEIGHT {
                self.pixels[(y * FRAME_WIDTH + x) as usize] = color.is_on();
            }
        }
        Ok(())
    }
}

/// Rendered width in pixels of `text` in a monospace font.
pub fn text_width(text: &str, font: &MonoFont<'_>) -> i32 {
    let advance = font.character_size.width + font.character_spacing;
    (text.chars().count() as u32 * advance) as i32
}

// ── OledRenderer ─────────────────────────────────────────────────

/// The built-in panel set.
pub struct OledRenderer {
    clock_seconds: bool,
    media: MediaPanel,
}

impl OledRenderer {
    pub fn new(clock_seconds: bool) -> Self {
        Self {
            clock_seconds,
            media: MediaPanel::new(),
        }
    }
}

impl FrameRenderer for OledRenderer {
    fn render_clock(&mut self, now: DateTime<Local>) -> Result<Frame, OledError> {
        let mut canvas = Canvas::new();
        clock::draw(&mut canvas, &now, self.clock_seconds);
        Ok(canvas.into_frame())
    }

    fn render_hardware(&mut self, stats: &HardwareStats) -> Result<Frame, OledError> {
        let mut canvas = Canvas::new();
        hardware::draw(&mut canvas, stats);
        Ok(canvas.into_frame())
    }

    fn render_media(&mut self, media: &MediaSample) -> Result<Frame, OledError> {
        let mut canvas = Canvas::new();
        self.media.draw(&mut canvas, media);
        Ok(canvas.into_frame())
    }
}
