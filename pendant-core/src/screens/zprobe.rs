//! Z probing and tool length measurement
//!
//! In Z mode the operator confirms the probe clip is connected; in the
//! tool modes the host reports whether the spindle sits over the tool
//! sensor. Up/Down jog the Z axis while held and the probe cycle starts on
//! a hold of Probe once confirmed.
//!
//! Entering the screen locks Up/Down until both have been seen released,
//! so a button that was already down does not start a motion.

use pendant_display::Canvas;
use pendant_protocol::{DeviceMessage, MachineStatus, ProbeCommand};

use super::draw;
use super::{Screen, ScreenRequest, Transition};
use crate::config::{PROBE_BUSY_GUARD_MS, ROWS};
use crate::context::Context;

const BUTTON_CONNECT: u8 = 0;
const BUTTON_UP: u8 = 1;
const BUTTON_DOWN: u8 = 2;
const BUTTON_STOP: u8 = 5;
const BUTTON_PROBE: u8 = 6;
const BUTTON_BACK: u8 = 7;

/// What is being probed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProbeMode {
    /// Touch plate on the work piece
    #[default]
    Z,
    /// Measure the reference tool on the tool sensor
    ReferenceTool,
    /// Measure a new tool against the reference
    NewTool,
}

impl ProbeMode {
    /// Mode from its wire digit
    pub fn from_digit(digit: u8) -> Option<Self> {
        match digit {
            0 => Some(Self::Z),
            1 => Some(Self::ReferenceTool),
            2 => Some(Self::NewTool),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Z => 0,
            Self::ReferenceTool => 1,
            Self::NewTool => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Drawn {
    mode: ProbeMode,
    jogging_up: bool,
    jogging_down: bool,
    confirmed: bool,
    probe: bool,
    stop: bool,
}

#[derive(Debug, Default)]
pub struct ZProbe {
    mode: ProbeMode,
    confirmed: bool,
    jogging_up: bool,
    jogging_down: bool,
    /// Up/Down ignored until both are released
    input_locked: bool,
    drawn: Option<Drawn>,
}

impl ZProbe {
    /// Select the probing mode, optionally telling the host
    pub fn set_mode(&mut self, mode: ProbeMode, notify: bool, ctx: &mut Context) {
        self.mode = mode;
        if notify {
            ctx.send(DeviceMessage::Probe(ProbeCommand::Enter(mode.as_u8())));
        }
    }

    pub fn mode(&self) -> ProbeMode {
        self.mode
    }

    fn stop_jogging(&mut self, ctx: &mut Context) {
        ctx.send(DeviceMessage::Probe(ProbeCommand::ZStop));
        self.jogging_up = false;
        self.jogging_down = false;
    }

    fn probe_available(&self, ctx: &Context) -> bool {
        self.confirmed && ctx.machine.is_idle()
    }

    fn snapshot(&self, ctx: &Context) -> Drawn {
        Drawn {
            mode: self.mode,
            jogging_up: self.jogging_up,
            jogging_down: self.jogging_down,
            confirmed: self.confirmed,
            probe: self.probe_available(ctx),
            stop: ctx.can_show_stop,
        }
    }
}

impl Screen for ZProbe {
    fn activate(&mut self, _ctx: &mut Context) {
        self.confirmed = false;
        self.jogging_up = false;
        self.jogging_down = false;
        self.input_locked = true;
    }

    fn deactivate(&mut self, ctx: &mut Context) {
        if self.jogging_up || self.jogging_down {
            self.stop_jogging(ctx);
        }
    }

    fn update(&mut self, ctx: &mut Context) -> Transition {
        let button = ctx.buttons.current();
        let up = ctx.buttons.pressed(BUTTON_UP);
        let down = ctx.buttons.pressed(BUTTON_DOWN);

        if self.input_locked && !up && !down {
            self.input_locked = false;
        }

        let jogging = self.jogging_up || self.jogging_down;
        if !self.input_locked
            && !jogging
            && ctx.machine.status == MachineStatus::Idle
            && ctx.since(ctx.last_busy) > PROBE_BUSY_GUARD_MS
        {
            if up {
                ctx.send(DeviceMessage::Probe(ProbeCommand::ZUp));
                self.jogging_up = true;
            } else if down {
                ctx.send(DeviceMessage::Probe(ProbeCommand::ZDown));
                self.jogging_down = true;
            }
        }
        if (self.jogging_up && !up) || (self.jogging_down && !down) {
            self.stop_jogging(ctx);
        }

        if self.mode != ProbeMode::Z {
            self.confirmed = ctx.machine.tlo.in_position();
        }

        if button == Some(BUTTON_CONNECT) {
            if self.mode == ProbeMode::Z {
                ctx.send(DeviceMessage::Probe(ProbeCommand::Connect));
                self.confirmed = true;
            } else {
                ctx.send(DeviceMessage::Probe(ProbeCommand::GotoSensor));
            }
        } else if button == Some(BUTTON_BACK) {
            ctx.send(DeviceMessage::Probe(ProbeCommand::Cancel));
            if ctx.machine.tlo.enabled() {
                return Transition::Open(ScreenRequest::ProbeMenu);
            }
            return Transition::Close;
        } else if self.probe_available(ctx) && ctx.buttons.held(BUTTON_PROBE) {
            ctx.send(DeviceMessage::Probe(ProbeCommand::Start(self.mode.as_u8())));
            return Transition::Close;
        } else if ctx.can_show_stop && button == Some(BUTTON_STOP) {
            ctx.send(DeviceMessage::Stop);
        }
        Transition::Stay
    }

    fn draw(&mut self, canvas: &mut Canvas<'_>, ctx: &Context, full: bool) {
        let snapshot = self.snapshot(ctx);
        if !full && self.drawn == Some(snapshot) {
            return;
        }
        if !full {
            canvas.clear();
        }
        self.drawn = Some(snapshot);

        draw::status_line(canvas, ctx, None);
        let mut unused = 0x78u8;

        if self.jogging_up {
            canvas.fill_box(0, ROWS[2] - 1, 4 * 7 + 2, 10);
            canvas.set_color(false);
        }
        draw::text_at(canvas, 0, 2, "Z Up");
        canvas.set_color(true);
        if self.jogging_down {
            canvas.fill_box(0, ROWS[3] - 1, 6 * 7 + 2, 10);
            canvas.set_color(false);
        }
        draw::text_at(canvas, 0, 3, "Z Down");
        canvas.set_color(true);

        if snapshot.probe {
            draw::button(canvas, ctx, BUTTON_PROBE, "Probe", true);
            unused &= !(1 << BUTTON_PROBE);
        }
        draw::button(canvas, ctx, BUTTON_BACK, "Back", false);
        draw::text_at(canvas, 0, 1, if self.confirmed { "\x02" } else { "\x01" });
        let prompt = if self.mode == ProbeMode::Z {
            "Connect probe"
        } else {
            "Go to sensor"
        };
        draw::text_at(canvas, 2, 1, prompt);

        if snapshot.stop {
            draw::button(canvas, ctx, BUTTON_STOP, "STOP", false);
            unused &= !(1 << BUTTON_STOP);
        }
        draw::unused_buttons(canvas, unused);
    }
}
