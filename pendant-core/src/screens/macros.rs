//! Host defined macro buttons
//!
//! Slots come from `MACROS:`; empty labels are unused and ignored. Each
//! slot fires on click or, when its hold flag is set, on hold.

use pendant_display::Canvas;
use pendant_protocol::commands::MACRO_COUNT;
use pendant_protocol::DeviceMessage;

use super::draw;
use super::{Screen, Transition};
use crate::context::Context;

const BUTTON_BACK: u8 = 7;

#[derive(Debug, Default)]
pub struct Macros;

impl Screen for Macros {
    fn update(&mut self, ctx: &mut Context) -> Transition {
        let unused = ctx.macros.unused_mask();
        for slot in 0..MACRO_COUNT as u8 {
            if unused & (1 << slot) != 0 {
                continue;
            }
            let fired = if ctx.macros.needs_hold(usize::from(slot)) {
                ctx.buttons.held(slot)
            } else {
                ctx.buttons.clicked(slot)
            };
            if fired {
                ctx.send(DeviceMessage::RunMacro(slot + 1));
                return Transition::Stay;
            }
        }

        if ctx.buttons.current() == Some(BUTTON_BACK) {
            Transition::Close
        } else {
            Transition::Stay
        }
    }

    fn draw(&mut self, canvas: &mut Canvas<'_>, ctx: &Context, full: bool) {
        if !full {
            return;
        }
        let unused = ctx.macros.unused_mask();
        draw::status_line(canvas, ctx, None);
        draw::unused_buttons(canvas, unused);
        for (slot, name) in ctx.macros.names.iter().enumerate() {
            if unused & (1 << slot) != 0 {
                continue;
            }
            draw::button(canvas, ctx, slot as u8, name, ctx.macros.needs_hold(slot));
        }
        draw::text_at(canvas, 14, 4, "Back");
    }
}
