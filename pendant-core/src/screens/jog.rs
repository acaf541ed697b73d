//! Jogging with the hand wheel or the joystick
//!
//! A single selected axis (X = 1, Y = 2, Z = 4) follows the hand wheel,
//! each click moving by the selected rate. Selecting X and Y together
//! (axis 3) drives both from the joystick instead.
//!
//! The Rate button is a tap/hold button: releasing it early cycles the
//! rate, keeping it down shows "Mul" after half the hold time and the full
//! hold rounds the axis position to a multiple of the rate.

use core::fmt::Write;

use heapless::String;
use pendant_display::Canvas;
use pendant_protocol::commands::DEFAULT_JOG_RATES;
use pendant_protocol::{CoordSpace, DeviceMessage, MachineStatus};

use super::draw::{self, CoordText};
use super::{Screen, Transition};
use crate::config::{
    BUTTON_JOYSTICK, HOLD_MS, JOG_ACTION_DELAY_MS, JOG_INACTIVITY_MS, JOG_XY_RESEND_MS, ROWS,
    SHOW_STOP_MS,
};
use crate::context::Context;

const BUTTON_X: u8 = 0;
const BUTTON_Y: u8 = 1;
const BUTTON_Z: u8 = 2;
const BUTTON_RATE: u8 = 3;
const BUTTON_WCS: u8 = 4;
const BUTTON_GOTO0: u8 = 5;
const BUTTON_STOP: u8 = 5;
const BUTTON_SET0: u8 = 6;
const BUTTON_BACK: u8 = 7;

const AXIS_XY: u8 = 3;
const AXIS_LABELS: [&str; 3] = ["X", "Y", "Z"];

/// Axis letter of a single axis selection
fn axis_name(axis: u8) -> char {
    match axis {
        1 => 'X',
        2 => 'Y',
        4 => 'Z',
        _ => ' ',
    }
}

fn single_axis(axis: u8) -> bool {
    axis & axis.wrapping_sub(1) == 0
}

fn coord_space(ctx: &Context) -> CoordSpace {
    if ctx.work_space {
        CoordSpace::Work
    } else {
        CoordSpace::Machine
    }
}

/// True if a joystick axis moving from `old` to `new` must be sent at once
fn urgent(old: i8, new: i8) -> bool {
    let reversed = i16::from(old) * i16::from(new) < 0;
    reversed || new.unsigned_abs() > old.unsigned_abs()
}

#[derive(Debug, Clone, PartialEq)]
struct Layout {
    axis: u8,
    work_space: bool,
    inches: bool,
    rate: u16,
    show_round: bool,
    show_actions: bool,
    show_stop: bool,
}

#[derive(Debug, Default)]
pub struct Jog {
    axis: u8,
    /// Selected entry of the host's jog rates, kept between activations
    rate_index: usize,
    last_input: u32,
    /// When Rate went down, 0 while up
    rate_down_time: u32,
    show_round: bool,
    show_actions: bool,
    show_stop: bool,
    last_xy: (i8, i8),
    last_xy_time: u32,
    drawn: Option<(Layout, [CoordText; 3])>,
}

impl Jog {
    /// Select the jogged axes
    pub fn set_axis(&mut self, axis: u8) {
        self.axis = axis;
    }

    pub fn axis(&self) -> u8 {
        self.axis
    }

    /// Current rate in thousandths of an inch or hundredths of a mm
    pub fn rate(&self, ctx: &Context) -> u16 {
        let rates = &ctx.machine.jog_rates;
        match rates.len() {
            0 => DEFAULT_JOG_RATES[0],
            len => rates[self.rate_index.min(len - 1)],
        }
    }

    fn cycle_rate(&mut self, ctx: &Context) {
        let len = ctx.machine.jog_rates.len().max(1);
        self.rate_index = (self.rate_index.min(len - 1) + 1) % len;
    }

    fn update_single_axis(&mut self, ctx: &mut Context, button: Option<u8>) {
        let axis = axis_name(self.axis);
        self.show_round =
            self.rate_down_time != 0 && ctx.since(self.rate_down_time) > u32::from(HOLD_MS / 2);
        if button == Some(BUTTON_RATE) {
            self.rate_down_time = ctx.now;
        }
        if self.show_round && ctx.buttons.held(BUTTON_RATE) {
            ctx.send(DeviceMessage::RoundJog {
                inches: ctx.machine.inches,
                space: coord_space(ctx),
                axis,
                rate: self.rate(ctx),
            });
        } else if !self.show_round && ctx.buttons.released(BUTTON_RATE) {
            self.cycle_rate(ctx);
        }

        if self.show_actions && ctx.machine.status == MachineStatus::Idle {
            if ctx.buttons.held(BUTTON_SET0) && ctx.work_space {
                ctx.send(DeviceMessage::SetZero { axis });
            } else if ctx.buttons.held(BUTTON_GOTO0) {
                ctx.send(DeviceMessage::GotoZero {
                    space: coord_space(ctx),
                    axis,
                });
            }
        } else if self.show_stop && button == Some(BUTTON_STOP) {
            ctx.send(DeviceMessage::Stop);
        }

        let clicks = ctx.take_wheel();
        if clicks != 0 {
            self.last_input = ctx.now;
            let status = ctx.machine.status;
            if matches!(
                status,
                MachineStatus::Idle | MachineStatus::Jog | MachineStatus::Running
            ) {
                ctx.send(DeviceMessage::WheelJog {
                    inches: ctx.machine.inches,
                    axis,
                    clicks,
                    rate: self.rate(ctx),
                });
            }
        }
    }

    fn update_joystick(&mut self, ctx: &mut Context) {
        ctx.take_wheel();
        let (x, y) = ctx.joystick_position();
        if x != 0 || y != 0 {
            self.last_input = ctx.now;
        }
        let (old_x, old_y) = self.last_xy;
        if (x, y) == self.last_xy {
            return;
        }
        let due = (x, y) == (0, 0)
            || urgent(old_x, x)
            || urgent(old_y, y)
            || ctx.since(self.last_xy_time) >= JOG_XY_RESEND_MS;
        if due {
            ctx.send(DeviceMessage::JoystickJog { x, y });
            self.last_xy = (x, y);
            self.last_xy_time = ctx.now;
        }
    }

    fn layout(&self, ctx: &Context) -> Layout {
        Layout {
            axis: self.axis,
            work_space: ctx.work_space,
            inches: ctx.machine.inches,
            rate: self.rate(ctx),
            show_round: self.show_round,
            show_actions: self.show_actions,
            show_stop: self.show_stop,
        }
    }

    fn draw_coord(&self, canvas: &mut Canvas<'_>, axis: usize, text: &str) {
        let row = axis + 1;
        if self.axis & (1 << axis) != 0 {
            canvas.fill_box(0, ROWS[row] - 1, 8, 10);
            canvas.set_color(false);
            draw::text_at(canvas, 0, row, AXIS_LABELS[axis]);
            canvas.set_color(true);
            draw::bold_at(canvas, 2, row, text);
        } else {
            draw::text_at(canvas, 0, row, AXIS_LABELS[axis]);
            draw::text_at(canvas, 2, row, text);
        }
    }

    fn draw_buttons(&self, canvas: &mut Canvas<'_>, ctx: &Context, layout: &Layout) {
        if !single_axis(self.axis) {
            draw::unused_buttons(canvas, 0x68);
            draw::button(canvas, ctx, BUTTON_BACK, "Back", false);
            return;
        }

        let verb = if layout.show_round { "Mul " } else { "Rate " };
        let rate = layout.rate;
        let mut label: String<16> = String::new();
        let _ = if layout.inches {
            write!(label, "{}{}.{:03}", verb, rate / 1000, rate % 1000)
        } else {
            write!(label, "{}{:2}.{:02}", verb, rate / 100, rate % 100)
        };
        draw::button(canvas, ctx, BUTTON_RATE, &label, layout.show_round);

        if layout.show_actions {
            draw::button(canvas, ctx, BUTTON_GOTO0, "To 0", true);
            if layout.work_space {
                draw::button(canvas, ctx, BUTTON_SET0, "Set 0", true);
            } else {
                draw::unused_buttons(canvas, 0x40);
            }
        } else if layout.show_stop {
            draw::button(canvas, ctx, BUTTON_STOP, "STOP", false);
            draw::unused_buttons(canvas, 0x40);
        } else {
            draw::unused_buttons(canvas, 0x60);
        }
        draw::button(canvas, ctx, BUTTON_BACK, "Back", false);
    }
}

impl Screen for Jog {
    fn activate(&mut self, ctx: &mut Context) {
        self.last_input = ctx.now;
        self.rate_down_time = 0;
        self.show_stop = false;
        self.show_actions = true;
        self.show_round = false;
        self.last_xy = ctx.joystick_position();
        self.last_xy_time = ctx.now;
        ctx.take_wheel();
    }

    fn update(&mut self, ctx: &mut Context) -> Transition {
        let status = ctx.machine.status;
        if !status.is_inactive() && status != MachineStatus::Jog && status != MachineStatus::Running
        {
            return Transition::Close;
        }

        // Before the input refresh, otherwise Stop would hide itself
        self.show_stop = ctx.can_show_stop && ctx.since(self.last_input) > SHOW_STOP_MS;
        if self.show_actions {
            if !status.is_inactive() {
                self.show_actions = false;
            }
        } else if ctx.since(ctx.last_busy) > JOG_ACTION_DELAY_MS {
            self.show_actions = true;
        }

        if ctx.buttons.any_pressed() {
            self.last_input = ctx.now;
        }
        if ctx.since(self.last_input) > JOG_INACTIVITY_MS {
            return Transition::Close;
        }

        let button = ctx.buttons.current();
        match button {
            Some(BUTTON_X) => {
                self.axis = if ctx.buttons.pressed(BUTTON_Y) { AXIS_XY } else { 1 };
            }
            Some(BUTTON_Y) => {
                self.axis = if ctx.buttons.pressed(BUTTON_X) { AXIS_XY } else { 2 };
            }
            Some(BUTTON_Z) => self.axis = 4,
            Some(BUTTON_JOYSTICK) => self.axis = AXIS_XY,
            Some(BUTTON_WCS) => ctx.work_space = !ctx.work_space,
            Some(BUTTON_BACK) => return Transition::Close,
            _ => {}
        }

        if single_axis(self.axis) {
            self.update_single_axis(ctx, button);
        } else {
            self.update_joystick(ctx);
        }

        if !ctx.buttons.pressed(BUTTON_RATE) {
            self.rate_down_time = 0;
            self.show_round = false;
        }
        Transition::Stay
    }

    fn draw(&mut self, canvas: &mut Canvas<'_>, ctx: &Context, full: bool) {
        let layout = self.layout(ctx);
        let coords = [
            draw::coord_text(ctx, 0),
            draw::coord_text(ctx, 1),
            draw::coord_text(ctx, 2),
        ];
        let previous = self.drawn.replace((layout.clone(), coords.clone()));
        let layout_changed = previous.as_ref().map_or(true, |(p, _)| *p != layout);
        if !full && layout_changed {
            canvas.clear();
        }
        let full = full || layout_changed;

        for (axis, coord) in coords.iter().enumerate() {
            let unchanged = previous.as_ref().is_some_and(|(_, p)| p[axis] == *coord);
            if full || !unchanged {
                self.draw_coord(canvas, axis, coord);
            }
        }
        if !full {
            return;
        }

        draw::status_line(canvas, ctx, None);
        draw::text_at(canvas, 13, 1, if layout.work_space { "WCS" } else { "MCS" });
        self.draw_buttons(canvas, ctx, &layout);
    }
}
