//! Shown while the host or the controller is missing

use heapless::String;
use pendant_display::Canvas;
use pendant_protocol::commands::NAME_LEN;
use pendant_protocol::MachineStatus;

use super::{Screen, Transition};
use crate::context::Context;

const CHECKED: &str = "\x02";
const UNCHECKED: &str = "\x01";

#[derive(Debug, Default)]
pub struct Welcome {
    drawn_name: Option<String<NAME_LEN>>,
    drawn_connected: Option<bool>,
}

impl Screen for Welcome {
    fn update(&mut self, ctx: &mut Context) -> Transition {
        if ctx.connected && ctx.machine.status != MachineStatus::Disconnected {
            Transition::Close
        } else {
            Transition::Stay
        }
    }

    fn draw(&mut self, canvas: &mut Canvas<'_>, ctx: &Context, full: bool) {
        let name = &ctx.settings.name;
        let draw_name = full || self.drawn_name.as_ref() != Some(name);
        let draw_connected = full || self.drawn_connected != Some(ctx.connected);
        self.drawn_name = Some(name.clone());
        self.drawn_connected = Some(ctx.connected);

        canvas.set_color(true);
        if full {
            canvas.text(13, 36, "Connected to PC");
            canvas.text(13, 52, "Connected to CNC");
            canvas.text(1, 52, UNCHECKED);
        }
        if draw_name {
            canvas.fill_box(0, 7, 128, 14);
            canvas.set_color(false);
            let width = Canvas::text_width(name);
            canvas.text(64 - width / 2, 10, name);
            canvas.set_color(true);
        }
        if draw_connected {
            canvas.text(1, 36, if ctx.connected { CHECKED } else { UNCHECKED });
        }
    }
}
