//! Hardware panel: three columns (CPU, GPU, RAM), each with a label,
//! a temperature or usage line and a load line.

use embedded_graphics::mono_font::iso_8859_1::FONT_6X10;

use super::{Canvas, text_width};
use crate::frame::FRAME_WIDTH;
use crate::hardware::HardwareStats;

const COLUMN_WIDTH: i32 = FRAME_WIDTH as i32 / 3;
const LABEL_Y: i32 = 1;
const LINE1_Y: i32 = 14;
const LINE2_Y: i32 = 27;

pub fn draw(canvas: &mut Canvas, stats: &HardwareStats) {
    let columns = [
        ("CPU", temp(stats.cpu_temp), load(stats.cpu_load)),
        ("GPU", temp(stats.gpu_temp), load(stats.gpu_load)),
        ("RAM", ram_used(stats.ram_used_gb), ram_percent(stats)),
    ];

    for (i, (label, line1, line2)) in columns.iter().enumerate() {
        let left = i as i32 * COLUMN_WIDTH;
        centered_in_column(canvas, label, left, LABEL_Y);
        centered_in_column(canvas, line1, left, LINE1_Y);
        centered_in_column(canvas, line2, left, LINE2_Y);
    }
}

fn centered_in_column(canvas: &mut Canvas, text: &str, left: i32, y: i32) {
    let x = left + (COLUMN_WIDTH - text_width(text, &FONT_6X10)) / 2;
    canvas.text(text, x, y, &FONT_6X10);
}

fn temp(value: Option<f32>) -> String {
    value.map_or_else(|| "--".to_string(), |t| format!("{}°", t.round()))
}

fn load(value: Option<f32>) -> String {
    format!("{}%", value.unwrap_or(0.0).round())
}

fn ram_used(value: Option<f32>) -> String {
    value.map_or_else(|| "--".to_string(), |gb| format!("{gb:.1}G"))
}

fn ram_percent(stats: &HardwareStats) -> String {
    match stats.ram_used_gb {
        Some(used) if stats.ram_total_gb > 0.0 => {
            format!("{}%", (used / stats.ram_total_gb * 100.0).round())
        }
        _ => "0%".to_string(),
    }
}
