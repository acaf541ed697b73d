//! Layout helpers shared by the screens
//!
//! ```text
//!  row 0  [title]      [Status]
//!  ─────────────────────────────  y = 10
//!  row 1  button 0         button 4
//!  row 2  button 1         button 5
//!  row 3  button 2         button 6
//!  row 4  button 3         button 7
//! ```
//!
//! Text is placed on a grid of 7 pixel columns; left buttons start at
//! column 0, right buttons end at column 17.

use core::fmt::Write;

use heapless::String;
use pendant_display::{Canvas, CHAR_WIDTH, WIDTH};
use pendant_protocol::MachineStatus;

use crate::config::{RIGHT_COLUMN, ROWS};
use crate::context::Context;

/// Longest formatted coordinate, `-99999.999`
pub type CoordText = String<12>;

const HOLD_TEXT: &str = "\x03";
const PLACEHOLDER_TEXT: &str = "\x04";

/// Pixel x of a text column
pub fn column_x(column: i32) -> i32 {
    column * CHAR_WIDTH
}

/// Draw `text` at a grid position
pub fn text_at(canvas: &mut Canvas<'_>, column: i32, row: usize, text: &str) {
    canvas.text(column_x(column), ROWS[row.min(4)], text);
}

/// Draw bold `text` at a grid position
pub fn bold_at(canvas: &mut Canvas<'_>, column: i32, row: usize, text: &str) {
    canvas.text_bold(column_x(column), ROWS[row.min(4)], text);
}

fn char_count(text: &str) -> i32 {
    text.chars().count() as i32
}

/// Title bar: optional inverted title, the machine status and a rule
pub fn status_line(canvas: &mut Canvas<'_>, ctx: &Context, title: Option<&str>) {
    canvas.set_color(true);
    if let Some(title) = title.filter(|t| !t.is_empty()) {
        let len = char_count(title);
        let x = (50 - len * CHAR_WIDTH) / 2;
        canvas.fill_box(x - 2, 0, len * CHAR_WIDTH + 4, 10);
        canvas.set_color(false);
        canvas.text(x, 1, title);
        canvas.set_color(true);
    }

    let machine = &ctx.machine;
    let mut label: String<20> = String::new();
    let _ = label.push_str(machine.status.name());
    if machine.status == MachineStatus::Run && machine.job_running && machine.progress >= 0 {
        let _ = write!(label, " {:3}%", machine.progress);
    }
    let x = 55;
    canvas.text(x, 0, "[");
    canvas.text(x + CHAR_WIDTH, 0, &label);
    canvas.text(x + (char_count(&label) + 1) * CHAR_WIDTH, 0, "]");
    rule(canvas);
}

/// Horizontal line under the title row
pub fn rule(canvas: &mut Canvas<'_>) {
    canvas.fill_box(0, 10, WIDTH as i32, 1);
}

/// Placeholder marks for buttons that do nothing on this screen
pub fn unused_buttons(canvas: &mut Canvas<'_>, mask: u8) {
    canvas.set_color(true);
    for i in 0..8u8 {
        if mask & (1 << i) == 0 {
            continue;
        }
        if i < 4 {
            text_at(canvas, 0, usize::from(i) + 1, PLACEHOLDER_TEXT);
        } else {
            text_at(canvas, RIGHT_COLUMN, usize::from(i) - 3, PLACEHOLDER_TEXT);
        }
    }
}

/// Row of a button label
pub fn button_row(button: u8) -> usize {
    if button < 4 {
        usize::from(button) + 1
    } else {
        usize::from(button.min(7)) - 3
    }
}

/// Draw a button label next to its physical button
///
/// Hold buttons get a hold marker and are shown inverted while the press
/// still belongs to this screen.
pub fn button(canvas: &mut Canvas<'_>, ctx: &Context, index: u8, label: &str, hold: bool) {
    canvas.set_color(true);
    let len = char_count(label);
    let y = ROWS[button_row(index)];
    let pressed = hold && ctx.buttons.is_down(index);

    if index < 4 {
        let mut column = 0;
        if hold {
            if pressed {
                canvas.fill_box(0, y - 1, len * CHAR_WIDTH + 9, 10);
                canvas.set_color(false);
            }
            canvas.text(0, y, HOLD_TEXT);
            column += 1;
        }
        canvas.text(column_x(column) + 1, y, label);
    } else {
        let mut column = RIGHT_COLUMN - len;
        if hold {
            if pressed {
                canvas.fill_box(column_x(column), y - 1, len * CHAR_WIDTH + 9, 10);
                canvas.set_color(false);
            }
            canvas.text(column_x(RIGHT_COLUMN) + 2, y, HOLD_TEXT);
            column -= 1;
        }
        canvas.text(column_x(column) + 8, y, label);
    }
    canvas.set_color(true);
}

/// Blank the label area of one button
pub fn clear_button(canvas: &mut Canvas<'_>, index: u8) {
    let y = ROWS[button_row(index)];
    let half = WIDTH as i32 / 2;
    let x = if index < 4 { 0 } else { half };
    canvas.set_color(false);
    canvas.fill_box(x, y - 1, half, 10);
    canvas.set_color(true);
}

/// Format a length in mm for display, `%8.3f` inches or `%8.2f` mm
pub fn format_coord(value_mm: f32, inches: bool) -> CoordText {
    let mut text = CoordText::new();
    let _ = if inches {
        write!(text, "{:8.3}", value_mm / 25.4)
    } else {
        write!(text, "{:8.2}", value_mm)
    };
    text
}

/// Coordinate of `axis` in the current space and unit
pub fn coord_text(ctx: &Context, axis: usize) -> CoordText {
    format_coord(ctx.machine.coordinate(axis, ctx.work_space), ctx.machine.inches)
}
