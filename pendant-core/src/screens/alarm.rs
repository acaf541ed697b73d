//! Alarm screen with a Dismiss button
//!
//! Dismissing sends `DISMISS` and starts a timer. The timer also starts on
//! its own once the alarm clears without a dismissal. When it expires the
//! screen closes if the alarm is gone, otherwise Dismiss comes back.

use pendant_display::Canvas;
use pendant_protocol::{DeviceMessage, MachineStatus};

use super::draw;
use super::{Screen, Transition};
use crate::config::ALARM_DISMISS_MS;
use crate::context::Context;

const BUTTON_DISMISS: u8 = 7;

/// Animation phase drawn while not dismissed
const PHASE_BUTTON: u32 = 4;

#[derive(Debug, Default)]
pub struct Alarm {
    dismissed: bool,
    /// Start of the dismiss timer, 0 when not running
    dismiss_time: u32,
    drawn_phase: Option<u32>,
}

impl Alarm {
    fn phase(&self, now: u32) -> u32 {
        if self.dismissed {
            (now.wrapping_sub(self.dismiss_time) / 200) % 3
        } else {
            PHASE_BUTTON
        }
    }
}

impl Screen for Alarm {
    fn activate(&mut self, _ctx: &mut Context) {
        self.dismissed = false;
        self.dismiss_time = 0;
    }

    fn update(&mut self, ctx: &mut Context) -> Transition {
        if self.dismiss_time == 0 && ctx.buttons.current() == Some(BUTTON_DISMISS) {
            ctx.send(DeviceMessage::Dismiss);
            self.dismissed = true;
            self.dismiss_time = ctx.now;
        }

        let alarm = ctx.machine.status == MachineStatus::Alarm;
        if !alarm && !self.dismissed && self.dismiss_time == 0 {
            self.dismiss_time = ctx.now;
        }

        if self.dismiss_time != 0 && ctx.since(self.dismiss_time) > ALARM_DISMISS_MS {
            self.dismissed = false;
            self.dismiss_time = 0;
            if !alarm {
                return Transition::Close;
            }
        }
        Transition::Stay
    }

    fn draw(&mut self, canvas: &mut Canvas<'_>, ctx: &Context, full: bool) {
        let phase = self.phase(ctx.now);
        let draw_button = full || self.drawn_phase != Some(phase);
        self.drawn_phase = Some(phase);

        if full {
            draw::text_at(canvas, 5, 0, "[Alarm]");
            draw::unused_buttons(canvas, 0x7F);
            draw::text_at(canvas, 3, 1, "Check the PC");
            draw::text_at(canvas, 3, 2, "for details");
        }
        if draw_button {
            if self.dismissed {
                draw::clear_button(canvas, BUTTON_DISMISS);
                draw::text_at(canvas, 14 + phase as i32, 4, "\x04");
            } else {
                draw::button(canvas, ctx, BUTTON_DISMISS, "Dismiss", false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::testing::*;

    fn alarm_context() -> Context {
        let mut ctx = idle_context();
        ctx.machine.status = MachineStatus::Alarm;
        ctx
    }

    #[test]
    fn test_dismiss_then_clear_closes() {
        let mut ctx = alarm_context();
        let mut screen = Alarm::default();
        screen.activate(&mut ctx);

        press(&mut ctx, BUTTON_DISMISS);
        assert_eq!(screen.update(&mut ctx), Transition::Stay);
        assert_eq!(sent(&mut ctx).as_str(), "DISMISS\n");

        ctx.machine.status = MachineStatus::Idle;
        tick(&mut ctx, 0, 500);
        assert_eq!(screen.update(&mut ctx), Transition::Stay);
        tick(&mut ctx, 0, 501);
        assert_eq!(screen.update(&mut ctx), Transition::Close);
    }

    #[test]
    fn test_dismiss_while_alarm_persists_rearms() {
        let mut ctx = alarm_context();
        let mut screen = Alarm::default();
        screen.activate(&mut ctx);
        press(&mut ctx, BUTTON_DISMISS);
        screen.update(&mut ctx);
        sent(&mut ctx);

        // Clicking again while pending does nothing
        press(&mut ctx, BUTTON_DISMISS);
        screen.update(&mut ctx);
        assert_eq!(sent(&mut ctx).as_str(), "");

        tick(&mut ctx, 0, 1001);
        assert_eq!(screen.update(&mut ctx), Transition::Stay);
        assert!(!screen.dismissed);

        press(&mut ctx, BUTTON_DISMISS);
        screen.update(&mut ctx);
        assert_eq!(sent(&mut ctx).as_str(), "DISMISS\n");
    }

    #[test]
    fn test_alarm_clearing_on_its_own_closes() {
        let mut ctx = alarm_context();
        let mut screen = Alarm::default();
        screen.activate(&mut ctx);
        assert_eq!(screen.update(&mut ctx), Transition::Stay);

        ctx.machine.status = MachineStatus::Idle;
        assert_eq!(screen.update(&mut ctx), Transition::Stay);
        tick(&mut ctx, 0, 1000);
        assert_eq!(screen.update(&mut ctx), Transition::Stay);
        tick(&mut ctx, 0, 1);
        assert_eq!(screen.update(&mut ctx), Transition::Close);
        assert_eq!(sent(&mut ctx).as_str(), "");
    }

    #[test]
    fn test_pending_dismissal_animates() {
        let mut ctx = alarm_context();
        let mut screen = Alarm::default();
        screen.activate(&mut ctx);
        let frame = render(&mut screen, &ctx);
        assert!(lit(&frame, 70, 55, 57, 9));

        press(&mut ctx, BUTTON_DISMISS);
        screen.update(&mut ctx);
        let first = screen.phase(ctx.now);
        ctx.now += 200;
        assert_ne!(screen.phase(ctx.now), first);
    }
}
