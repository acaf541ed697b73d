//! Host defined dialog
//!
//! ```text
//!  row 0   title (or the status line when empty)
//!  row 1   line 1      ◀── button 0 checks a checklist item on this row
//!  row 2   line 2      ◀── button 1
//!  row 3   line 3      ◀── button 2
//!  row 4   [left]                  [right]
//!          button 3                button 7
//! ```
//!
//! Every dialog with a non zero id gets exactly one `DIALOG:<id>,<n>`
//! answer: 1 or 2 for the buttons, 0 when it is closed any other way.
//! While checklist items are unchecked neither button responds.

use pendant_display::{Canvas, WIDTH};
use pendant_protocol::commands::CHAR_CHECKED;
use pendant_protocol::{DeviceMessage, DialogRequest};

use super::draw;
use super::{Screen, Transition};
use crate::config::{DIALOG_WAIT_MS, ROWS};
use crate::context::Context;

const BUTTON_1: u8 = 3;
const BUTTON_2: u8 = 7;
const BUTTONS: [u8; 2] = [BUTTON_1, BUTTON_2];

#[derive(Debug, Default)]
pub struct Dialog {
    request: DialogRequest,
    /// Set when a waiting button was pressed, the dialog closes shortly after
    dismiss_time: u32,
    drawn: Option<(u32, u8)>,
}

impl Dialog {
    /// Show a new request
    pub fn load(&mut self, request: DialogRequest) {
        self.request = request;
        self.dismiss_time = 0;
    }

    /// Answer a pending dialog with 0
    pub fn cancel(&mut self, ctx: &mut Context) {
        if self.request.id != 0 {
            self.respond(ctx, 0);
        }
    }

    pub fn id(&self) -> u32 {
        self.request.id
    }

    pub fn request(&self) -> &DialogRequest {
        &self.request
    }

    fn respond(&mut self, ctx: &mut Context, button: u8) {
        ctx.send(DeviceMessage::DialogResponse {
            id: self.request.id,
            button,
        });
        self.request.id = 0;
    }

    /// Answer with `index + 1`, closing now or after the wait delay
    fn finish(&mut self, ctx: &mut Context, index: usize) -> Transition {
        self.respond(ctx, index as u8 + 1);
        if self.request.wait_flags & (1 << index) != 0 {
            self.dismiss_time = ctx.now;
            Transition::Stay
        } else {
            Transition::Close
        }
    }

    /// Flip the checklist item on `line` to checked
    fn check(&mut self, line: usize) -> bool {
        let bit = 1u8 << (line - 1);
        if self.request.check_flags & bit == 0 {
            return false;
        }
        self.request.check_flags &= !bit;
        let text = &mut self.request.lines[line];
        let rest: heapless::String<18> = text.chars().skip(1).collect();
        text.clear();
        let _ = text.push(CHAR_CHECKED);
        let _ = text.push_str(&rest);
        true
    }

    fn draw_line(&self, canvas: &mut Canvas<'_>, row: usize, center: bool) {
        let line = self.request.lines[row].as_str();
        let x = if center {
            (WIDTH as i32 - Canvas::text_width(line)) / 2
        } else {
            1
        };
        canvas.text(x, ROWS[row], line);
    }
}

impl Screen for Dialog {
    fn deactivate(&mut self, ctx: &mut Context) {
        self.cancel(ctx);
    }

    fn update(&mut self, ctx: &mut Context) -> Transition {
        if self.dismiss_time != 0 {
            if ctx.since(self.dismiss_time) > DIALOG_WAIT_MS {
                return Transition::Close;
            }
            return Transition::Stay;
        }

        let button = ctx.buttons.current();
        if let Some(b @ 0..=2) = button {
            self.check(usize::from(b) + 1);
        }
        if self.request.check_flags != 0 {
            return Transition::Stay;
        }

        if self.request.is_auto_ack() && !ctx.buttons.any_pressed() {
            return self.finish(ctx, 0);
        }

        for (index, &b) in BUTTONS.iter().enumerate() {
            let fired = if self.request.hold_flags & (1 << index) != 0 {
                ctx.buttons.held(b)
            } else {
                button == Some(b)
            };
            if fired {
                return self.finish(ctx, index);
            }
        }
        Transition::Stay
    }

    fn draw(&mut self, canvas: &mut Canvas<'_>, ctx: &Context, full: bool) {
        let snapshot = (self.request.id, self.request.check_flags);
        let changed = self.drawn != Some(snapshot);
        self.drawn = Some(snapshot);
        if !full && !changed {
            return;
        }
        if !full {
            canvas.clear();
        }

        if self.request.lines[0].is_empty() {
            draw::status_line(canvas, ctx, None);
        } else {
            draw::rule(canvas);
            self.draw_line(canvas, 0, true);
        }
        for row in 1..4 {
            let left = self.request.align_flags & (1 << (row - 1)) != 0;
            self.draw_line(canvas, row, !left);
        }

        let request = &self.request;
        if request.check_flags == 0 && !request.is_auto_ack() {
            draw::button(canvas, ctx, BUTTON_1, &request.buttons[0], request.hold_flags & 1 != 0);
        }
        draw::button(canvas, ctx, BUTTON_2, &request.buttons[1], request.hold_flags & 2 != 0);
    }
}
