//! Joystick calibration driven by the host
//!
//! The host records raw samples from `RAWJOY:` while the operator moves
//! the stick. Stage 0 captures the full range, stages 1-8 sample the
//! resting position to size the dead zone. Each OK sends `CAL:<stage>`.
//!
//! Streaming of raw samples is independent of the screen being active:
//! `CAL:STARTJ` turns it on and `CAL:STOPJ` off.

use core::fmt::Write;

use heapless::String;
use pendant_display::Canvas;
use pendant_protocol::DeviceMessage;

use super::draw;
use super::{Screen, Transition};
use crate::context::Context;

const BUTTON_OK: u8 = 3;
const BUTTON_BACK: u8 = 7;

/// Dead zone sampling stages after the range stage
pub const DEADZONE_STAGES: u8 = 8;

#[derive(Debug, Default)]
pub struct Calibration {
    /// Current stage, `None` once every stage was confirmed
    stage: Option<u8>,
    streaming: bool,
    /// Last raw sample sent to the host
    last_sent: Option<(u16, u16)>,
    drawn_stage: Option<Option<u8>>,
}

impl Calibration {
    pub fn stage(&self) -> Option<u8> {
        self.stage
    }

    /// Stream raw samples every tick they change
    pub fn start_streaming(&mut self, ctx: &mut Context) {
        self.streaming = true;
        self.send_raw(ctx, true);
    }

    pub fn stop_streaming(&mut self) {
        self.streaming = false;
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Send `RAWJOY:` if forced or the raw sample moved
    pub fn send_raw(&mut self, ctx: &mut Context, force: bool) {
        let sample = (ctx.joystick.x, ctx.joystick.y);
        if force || self.last_sent != Some(sample) {
            ctx.send(DeviceMessage::RawJoystick {
                x: sample.0,
                y: sample.1,
            });
            self.last_sent = Some(sample);
        }
    }
}

impl Screen for Calibration {
    fn activate(&mut self, ctx: &mut Context) {
        self.send_raw(ctx, true);
        self.stage = Some(0);
    }

    fn deactivate(&mut self, ctx: &mut Context) {
        ctx.send(DeviceMessage::CalCancel);
    }

    fn update(&mut self, ctx: &mut Context) -> Transition {
        match ctx.buttons.current() {
            Some(BUTTON_OK) => {
                if let Some(stage) = self.stage {
                    ctx.send(DeviceMessage::CalStage(stage));
                    self.stage = (stage < DEADZONE_STAGES).then_some(stage + 1);
                }
                Transition::Stay
            }
            Some(BUTTON_BACK) => Transition::Close,
            _ => Transition::Stay,
        }
    }

    fn draw(&mut self, canvas: &mut Canvas<'_>, ctx: &Context, full: bool) {
        let changed = self.drawn_stage != Some(self.stage);
        self.drawn_stage = Some(self.stage);
        if !full && !changed {
            return;
        }
        if !full {
            canvas.clear();
        }

        match self.stage {
            Some(0) => {
                draw::text_at(canvas, 0, 0, "[Calibrate Range]");
                draw::text_at(canvas, 2, 1, "Move stick to");
                draw::text_at(canvas, 3, 2, "all corners");
                draw::text_at(canvas, 2, 3, "and press OK");
                draw::button(canvas, ctx, BUTTON_OK, "OK", false);
            }
            Some(stage) => {
                draw::text_at(canvas, 0, 0, "[Calibrate Center]");
                draw::text_at(canvas, 3, 1, "Move stick,");
                draw::text_at(canvas, 2, 2, "release, then");
                draw::text_at(canvas, 4, 3, "press OK");
                let mut label: String<16> = String::new();
                let _ = write!(label, "OK [{}/{}]", stage, DEADZONE_STAGES);
                draw::button(canvas, ctx, BUTTON_OK, &label, false);
            }
            None => {}
        }
        draw::button(canvas, ctx, BUTTON_BACK, "Back", false);
        draw::unused_buttons(canvas, 0x77);
    }
}
