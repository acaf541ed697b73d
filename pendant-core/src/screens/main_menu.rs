//! Default screen: coordinates, homing and the sub-menus

use pendant_display::Canvas;
use pendant_protocol::DeviceMessage;

use super::draw::{self, CoordText};
use super::{ProbeMode, Screen, ScreenRequest, Transition};
use crate::config::BUTTON_JOYSTICK;
use crate::context::Context;

const BUTTON_X: u8 = 0;
const BUTTON_Y: u8 = 1;
const BUTTON_Z: u8 = 2;
const BUTTON_HOME: u8 = 3;
const BUTTON_WCS: u8 = 4;
const BUTTON_PROBE: u8 = 5;
const BUTTON_STOP: u8 = 5;
const BUTTON_JOB: u8 = 6;
const BUTTON_MACROS: u8 = 7;

const AXIS_LABELS: [&str; 3] = ["X", "Y", "Z"];

#[derive(Debug, Clone, PartialEq)]
struct Drawn {
    coords: [CoordText; 3],
    work_space: bool,
    can_show_stop: bool,
}

#[derive(Debug, Default)]
pub struct MainMenu {
    drawn: Option<Drawn>,
}

impl Screen for MainMenu {
    fn update(&mut self, ctx: &mut Context) -> Transition {
        let button = ctx.buttons.current();
        if button == Some(BUTTON_WCS) {
            ctx.work_space = !ctx.work_space;
            return Transition::Stay;
        }

        if ctx.machine.is_idle() {
            let jog = |axis| Transition::Open(ScreenRequest::Jog { axis });
            match button {
                Some(BUTTON_X) => return jog(1),
                Some(BUTTON_Y) => return jog(2),
                Some(BUTTON_Z) => return jog(4),
                Some(BUTTON_JOYSTICK) => return jog(3),
                _ => {}
            }
            if ctx.buttons.held(BUTTON_HOME) {
                ctx.send(DeviceMessage::Home);
                return Transition::Stay;
            }
            match button {
                Some(BUTTON_PROBE) => {
                    let request = if ctx.machine.tlo.enabled() {
                        ScreenRequest::ProbeMenu
                    } else {
                        ScreenRequest::ZProbe {
                            mode: ProbeMode::Z,
                            notify: true,
                        }
                    };
                    Transition::Open(request)
                }
                Some(BUTTON_JOB) => {
                    ctx.send(DeviceMessage::JobMenu);
                    Transition::Stay
                }
                Some(BUTTON_MACROS) => Transition::Open(ScreenRequest::Macro),
                _ => Transition::Stay,
            }
        } else if ctx.can_show_stop && button == Some(BUTTON_STOP) {
            ctx.send(DeviceMessage::Stop);
            Transition::Stay
        } else if ctx.machine.job_running && button == Some(BUTTON_JOB) {
            Transition::Open(ScreenRequest::Run)
        } else {
            Transition::Stay
        }
    }

    fn draw(&mut self, canvas: &mut Canvas<'_>, ctx: &Context, full: bool) {
        let now = Drawn {
            coords: [
                draw::coord_text(ctx, 0),
                draw::coord_text(ctx, 1),
                draw::coord_text(ctx, 2),
            ],
            work_space: ctx.work_space,
            can_show_stop: ctx.can_show_stop,
        };
        let previous = self.drawn.replace(now.clone());
        let layout_changed = previous
            .as_ref()
            .map_or(true, |p| p.work_space != now.work_space || p.can_show_stop != now.can_show_stop);
        if !full && layout_changed {
            canvas.clear();
        }
        let full = full || layout_changed;

        for (axis, coord) in now.coords.iter().enumerate() {
            let unchanged = previous.as_ref().is_some_and(|p| p.coords[axis] == *coord);
            if full || !unchanged {
                draw::text_at(canvas, 0, axis + 1, AXIS_LABELS[axis]);
                draw::text_at(canvas, 2, axis + 1, coord);
            }
        }
        if !full {
            return;
        }

        draw::status_line(canvas, ctx, None);
        let space = if ctx.work_space { "WCS" } else { "MCS" };
        draw::button(canvas, ctx, BUTTON_WCS, space, false);
        if ctx.machine.is_idle() {
            draw::button(canvas, ctx, BUTTON_PROBE, "Probe>", false);
            draw::button(canvas, ctx, BUTTON_JOB, "Job>", false);
            draw::button(canvas, ctx, BUTTON_MACROS, "Macros>", false);
            draw::button(canvas, ctx, BUTTON_HOME, "Home", true);
        } else {
            let mut unused = 0xE8u8;
            if ctx.can_show_stop {
                draw::button(canvas, ctx, BUTTON_STOP, "STOP", false);
                unused &= !(1 << BUTTON_STOP);
            }
            if ctx.machine.job_running {
                draw::button(canvas, ctx, BUTTON_JOB, "Job>", false);
                unused &= !(1 << BUTTON_JOB);
            }
            draw::unused_buttons(canvas, unused);
        }
    }
}
