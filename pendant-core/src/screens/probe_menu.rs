//! Probe sub-menu, shown when tool length measurement is configured

use pendant_display::Canvas;

use super::draw;
use super::{ProbeMode, Screen, ScreenRequest, Transition};
use crate::context::Context;

const BUTTON_PROBE_Z: u8 = 0;
const BUTTON_PROBE_REF_TOOL: u8 = 1;
const BUTTON_PROBE_NEW_TOOL: u8 = 2;
const BUTTON_BACK: u8 = 7;

#[derive(Debug, Default)]
pub struct ProbeMenu;

fn probe(mode: ProbeMode) -> Transition {
    Transition::Open(ScreenRequest::ZProbe { mode, notify: true })
}

impl Screen for ProbeMenu {
    fn update(&mut self, ctx: &mut Context) -> Transition {
        match ctx.buttons.current() {
            Some(BUTTON_PROBE_Z) => probe(ProbeMode::Z),
            Some(BUTTON_PROBE_REF_TOOL) => probe(ProbeMode::ReferenceTool),
            Some(BUTTON_PROBE_NEW_TOOL) if ctx.machine.tlo.has_ref() => probe(ProbeMode::NewTool),
            Some(BUTTON_BACK) => Transition::Close,
            _ => Transition::Stay,
        }
    }

    fn draw(&mut self, canvas: &mut Canvas<'_>, ctx: &Context, full: bool) {
        if !full {
            return;
        }
        draw::status_line(canvas, ctx, None);
        let mut unused = 0x78u8;
        draw::button(canvas, ctx, BUTTON_PROBE_Z, "Probe Z", false);
        draw::button(canvas, ctx, BUTTON_PROBE_REF_TOOL, "Probe Ref Tool", false);
        if ctx.machine.tlo.has_ref() {
            draw::button(canvas, ctx, BUTTON_PROBE_NEW_TOOL, "Probe New Tool", false);
        } else {
            unused |= 1 << BUTTON_PROBE_NEW_TOOL;
        }
        draw::button(canvas, ctx, BUTTON_BACK, "Back", false);
        draw::unused_buttons(canvas, unused);
    }
}
