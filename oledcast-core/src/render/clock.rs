//! Clock panel: large `HH:MM` (optionally `:SS`) over a date line.

use chrono::{DateTime, TimeZone};
use embedded_graphics::mono_font::iso_8859_1::{FONT_6X10, FONT_10X20};

use super::{Canvas, text_width};
use crate::frame::FRAME_WIDTH;

const TIME_Y: i32 = 2;
const DATE_Y: i32 = 27;

pub fn draw<Tz: TimeZone>(canvas: &mut Canvas, now: &DateTime<Tz>, seconds: bool)
where
    Tz::Offset: std::fmt::Display,
{
    let hm = now.format("%H:%M").to_string();
    let date = now.format("%d %b %Y").to_string();

    if seconds {
        // Seconds ride small next to the big digits, aligned to their baseline.
        let ss = now.format(":%S").to_string();
        let total = text_width(&hm, &FONT_10X20) + text_width(&ss, &FONT_6X10);
        let x = (FRAME_WIDTH as i32 - total) / 2;
        canvas.text(&hm, x, TIME_Y, &FONT_10X20);
        canvas.text(&ss, x + text_width(&hm, &FONT_10X20), TIME_Y + 8, &FONT_6X10);
    } else {
        canvas.text_centered(&hm, TIME_Y, &FONT_10X20);
    }

    canvas.text_centered(&date, DATE_Y, &FONT_6X10);
}
