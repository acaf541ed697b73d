//! Job control and overrides
//!
//! ```text
//!  [JOB]          [Running 42%]
//!  X  12.00                Pause
//!  Y   3.50                 STOP
//!  Z  -1.00                    -
//!  F 100%           S 100%
//!  ▲ button 3         button 7 ▲
//! ```
//!
//! Clicking F or S captures the hand wheel for feed or spindle speed
//! overrides until the wheel rests for the override timeout. Holding the
//! captured button resets the override.

use core::fmt::Write;

use heapless::String;
use pendant_display::{Canvas, WIDTH};
use pendant_protocol::{DeviceMessage, JobCommand, MachineStatus};

use super::draw::{self, CoordText};
use super::{Screen, Transition};
use crate::config::{OVERRIDE_TIMEOUT_MS, ROWS};
use crate::context::Context;

const BUTTON_FEED: u8 = 3;
const BUTTON_SPEED: u8 = 7;
const BUTTON_RUN: u8 = 4;
const BUTTON_PAUSE: u8 = 4;
const BUTTON_RESUME: u8 = 4;
const BUTTON_BACK: u8 = 5;
const BUTTON_STOP: u8 = 5;
const BUTTON_RPM0: u8 = 6;

const AXIS_LABELS: [&str; 3] = ["X", "Y", "Z"];

/// Job phase derived from the machine status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JobState {
    /// Ready to start
    Idle,
    Running,
    /// Stopping, not yet paused
    Pausing,
    /// Paused, not clear to resume
    Paused,
    /// Paused and clear to resume
    PausedReady,
    Other,
}

impl JobState {
    pub fn from_status(status: MachineStatus) -> Self {
        match status {
            MachineStatus::Idle => JobState::Idle,
            MachineStatus::Run
            | MachineStatus::Running
            | MachineStatus::Resuming
            | MachineStatus::Door3Resuming => JobState::Running,
            MachineStatus::Hold1Stopping | MachineStatus::Door2Stopping => JobState::Pausing,
            MachineStatus::Door1Opened | MachineStatus::Paused => JobState::Paused,
            MachineStatus::Hold0Complete | MachineStatus::Door0Closed => JobState::PausedReady,
            _ => JobState::Other,
        }
    }
}

/// What this screen did to the job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum JobProgress {
    #[default]
    NotStarted,
    Started,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    inches: bool,
    state: JobState,
    spindle_turning: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Overrides {
    feed: u16,
    speed: u16,
    real_feed: u16,
    real_speed: u16,
    captured: Option<u8>,
}

#[derive(Debug, Clone, PartialEq)]
struct Drawn {
    layout: Layout,
    coords: [CoordText; 3],
    overrides: Overrides,
}

#[derive(Debug, Default)]
pub struct Run {
    /// Button whose override owns the wheel
    captured: Option<u8>,
    override_time: u32,
    job: JobProgress,
    drawn: Option<Drawn>,
}

impl Run {
    pub fn captured(&self) -> Option<u8> {
        self.captured
    }

    fn override_message(button: u8, delta: i16) -> DeviceMessage<'static> {
        if button == BUTTON_SPEED {
            DeviceMessage::SpeedOverride(delta)
        } else {
            DeviceMessage::FeedOverride(delta)
        }
    }

    /// Wheel and hold handling while an override is captured
    ///
    /// Returns true if the tick was consumed.
    fn update_override(&mut self, ctx: &mut Context, wheel: i16) -> bool {
        let Some(button) = self.captured else {
            return false;
        };
        if wheel != 0 {
            self.override_time = ctx.now;
            ctx.send(Self::override_message(button, wheel));
            return true;
        }
        if ctx.since(self.override_time) > OVERRIDE_TIMEOUT_MS {
            self.captured = None;
            self.override_time = 0;
            return false;
        }
        if ctx.buttons.held(button) {
            ctx.send(Self::override_message(button, 0));
            return true;
        }
        false
    }

    fn send_job(ctx: &mut Context, command: JobCommand) -> Transition {
        ctx.send(DeviceMessage::Job(command));
        Transition::Stay
    }

    fn draw_buttons(&self, canvas: &mut Canvas<'_>, ctx: &Context, layout: &Layout) {
        let mut shown = 0u8;
        let buttons: &[(u8, &str, bool)] = match layout.state {
            JobState::Idle => &[(BUTTON_RUN, "Run", true), (BUTTON_BACK, "Back", false)],
            JobState::Running => &[(BUTTON_PAUSE, "Pause", false), (BUTTON_STOP, "STOP", false)],
            // STOP stays while pausing to avoid flicker
            JobState::Pausing => &[(BUTTON_STOP, "STOP", false)],
            JobState::Paused if layout.spindle_turning => {
                &[(BUTTON_RPM0, "RPM 0", false), (BUTTON_STOP, "STOP", false)]
            }
            JobState::Paused => &[(BUTTON_STOP, "STOP", false)],
            JobState::PausedReady if layout.spindle_turning => &[
                (BUTTON_RESUME, "Resume", true),
                (BUTTON_STOP, "STOP", false),
                (BUTTON_RPM0, "RPM 0", false),
            ],
            JobState::PausedReady => {
                &[(BUTTON_RESUME, "Resume", true), (BUTTON_STOP, "STOP", false)]
            }
            JobState::Other => &[],
        };
        for &(button, label, hold) in buttons {
            draw::button(canvas, ctx, button, label, hold);
            shown |= 1 << button;
        }
        draw::unused_buttons(canvas, 0x70 & !shown);
    }

    fn draw_overrides(canvas: &mut Canvas<'_>, values: &Overrides) {
        let y = ROWS[4];
        let mut text: String<20> = String::new();

        let _ = write!(text, "F {:3}%", values.feed);
        if values.captured == Some(BUTTON_FEED) {
            draw::bold_at(canvas, 0, 4, &text);
            if values.real_feed != 0 {
                text.clear();
                let _ = write!(text, "{}mm/min", values.real_feed);
                canvas.fill_box(49, y - 1, Canvas::text_width(&text) + 2, 10);
                canvas.set_color(false);
                draw::text_at(canvas, 7, 4, &text);
                canvas.set_color(true);
            }
        } else if values.captured != Some(BUTTON_SPEED) || values.real_speed == 0 {
            draw::text_at(canvas, 0, 4, &text);
        }

        text.clear();
        let _ = write!(text, "S {:3}%", values.speed);
        if values.captured == Some(BUTTON_SPEED) {
            draw::bold_at(canvas, 12, 4, &text);
            if values.real_speed != 0 {
                text.clear();
                let _ = write!(text, "{}rpm", values.real_speed);
                let len = text.chars().count() as i32;
                canvas.fill_box(77 - len * 7, y - 1, len * 7 + 2, 10);
                canvas.set_color(false);
                draw::text_at(canvas, 11 - len, 4, &text);
                canvas.set_color(true);
            }
        } else if values.captured != Some(BUTTON_FEED) || values.real_feed == 0 {
            draw::text_at(canvas, 12, 4, &text);
        }
    }
}

impl Screen for Run {
    fn activate(&mut self, ctx: &mut Context) {
        self.captured = None;
        self.override_time = 0;
        self.job = JobProgress::NotStarted;
        ctx.take_wheel();
    }

    fn update(&mut self, ctx: &mut Context) -> Transition {
        let button = ctx.buttons.current();
        let state = JobState::from_status(ctx.machine.status);

        let wheel = ctx.take_wheel();
        if self.update_override(ctx, wheel) {
            return Transition::Stay;
        }

        if state != JobState::Other && matches!(button, Some(BUTTON_FEED | BUTTON_SPEED)) {
            self.captured = button;
            self.override_time = ctx.now;
            return Transition::Stay;
        }

        match state {
            JobState::Running => match button {
                Some(BUTTON_PAUSE) => Self::send_job(ctx, JobCommand::Pause),
                Some(BUTTON_STOP) => Self::send_job(ctx, JobCommand::Stop),
                _ => Transition::Stay,
            },
            JobState::Paused => match button {
                Some(BUTTON_STOP) => Self::send_job(ctx, JobCommand::Stop),
                Some(BUTTON_RPM0) => Self::send_job(ctx, JobCommand::SpindleOff),
                _ => Transition::Stay,
            },
            JobState::PausedReady => {
                if ctx.buttons.held(BUTTON_RESUME) {
                    return Self::send_job(ctx, JobCommand::Resume);
                }
                match button {
                    Some(BUTTON_STOP) => {
                        self.job = JobProgress::Stopped;
                        Self::send_job(ctx, JobCommand::Stop)
                    }
                    Some(BUTTON_RPM0) => Self::send_job(ctx, JobCommand::SpindleOff),
                    _ => Transition::Stay,
                }
            }
            JobState::Idle => {
                if button == Some(BUTTON_BACK) {
                    return Transition::Close;
                }
                match self.job {
                    JobProgress::NotStarted if ctx.buttons.held(BUTTON_RUN) => {
                        self.job = JobProgress::Started;
                        Self::send_job(ctx, JobCommand::Start)
                    }
                    JobProgress::Stopped => Transition::Close,
                    _ => Transition::Stay,
                }
            }
            JobState::Pausing => Transition::Stay,
            JobState::Other => Transition::Close,
        }
    }

    fn draw(&mut self, canvas: &mut Canvas<'_>, ctx: &Context, full: bool) {
        let machine = &ctx.machine;
        let now = Drawn {
            layout: Layout {
                inches: machine.inches,
                state: JobState::from_status(machine.status),
                spindle_turning: machine.real_speed > 0,
            },
            coords: [
                draw::format_coord(machine.work[0], machine.inches),
                draw::format_coord(machine.work[1], machine.inches),
                draw::format_coord(machine.work[2], machine.inches),
            ],
            overrides: Overrides {
                feed: machine.feed_override,
                speed: machine.speed_override,
                real_feed: machine.real_feed,
                real_speed: machine.real_speed,
                captured: self.captured,
            },
        };
        let previous = self.drawn.replace(now.clone());
        let layout_changed = previous.as_ref().map_or(true, |p| p.layout != now.layout);
        if !full && layout_changed {
            canvas.clear();
        }
        let full = full || layout_changed;

        if full {
            draw::status_line(canvas, ctx, Some("JOB"));
            self.draw_buttons(canvas, ctx, &now.layout);
        }

        for (axis, coord) in now.coords.iter().enumerate() {
            let unchanged = previous.as_ref().is_some_and(|p| p.coords[axis] == *coord);
            if full || !unchanged {
                draw::text_at(canvas, 0, axis + 1, AXIS_LABELS[axis]);
                draw::text_at(canvas, 2, axis + 1, coord);
            }
        }

        let overrides_changed = previous.as_ref().map_or(true, |p| {
            let (old, new) = (p.overrides, now.overrides);
            old.feed != new.feed
                || old.speed != new.speed
                || old.captured != new.captured
                || (new.captured.is_some()
                    && (old.real_feed != new.real_feed || old.real_speed != new.real_speed))
        });
        if full || overrides_changed {
            if !full {
                canvas.set_color(false);
                canvas.fill_box(0, ROWS[4] - 1, WIDTH as i32, 10);
                canvas.set_color(true);
            }
            Self::draw_overrides(canvas, &now.overrides);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screens::testing::*;

    fn run_screen(ctx: &mut Context, status: MachineStatus) -> Run {
        ctx.machine.status = status;
        let mut screen = Run::default();
        screen.activate(ctx);
        screen
    }

    #[test]
    fn test_state_decoding() {
        assert_eq!(JobState::from_status(MachineStatus::Idle), JobState::Idle);
        assert_eq!(JobState::from_status(MachineStatus::Door3Resuming), JobState::Running);
        assert_eq!(JobState::from_status(MachineStatus::Hold1Stopping), JobState::Pausing);
        assert_eq!(JobState::from_status(MachineStatus::Door1Opened), JobState::Paused);
        assert_eq!(JobState::from_status(MachineStatus::Hold0Complete), JobState::PausedReady);
        assert_eq!(JobState::from_status(MachineStatus::Alarm), JobState::Other);
    }

    #[test]
    fn test_running_controls() {
        let mut ctx = idle_context();
        let mut screen = run_screen(&mut ctx, MachineStatus::Running);
        press(&mut ctx, BUTTON_PAUSE);
        screen.update(&mut ctx);
        assert_eq!(sent(&mut ctx).as_str(), "JOB:PAUSE\n");
        press(&mut ctx, BUTTON_STOP);
        screen.update(&mut ctx);
        assert_eq!(sent(&mut ctx).as_str(), "JOB:STOP\n");
    }

    #[test]
    fn test_override_captures_wheel() {
        let mut ctx = idle_context();
        let mut screen = run_screen(&mut ctx, MachineStatus::Running);
        ctx.add_wheel(5);
        screen.update(&mut ctx);
        assert_eq!(sent(&mut ctx).as_str(), "");

        press(&mut ctx, BUTTON_FEED);
        screen.update(&mut ctx);
        assert_eq!(screen.captured(), Some(BUTTON_FEED));

        ctx.add_wheel(-2);
        screen.update(&mut ctx);
        assert_eq!(sent(&mut ctx).as_str(), "FEED:-2\n");

        tick(&mut ctx, 1 << BUTTON_FEED, 1001);
        screen.update(&mut ctx);
        assert_eq!(sent(&mut ctx).as_str(), "FEED:0\n");
    }

    #[test]
    fn test_override_times_out() {
        let mut ctx = idle_context();
        let mut screen = run_screen(&mut ctx, MachineStatus::Running);
        press(&mut ctx, BUTTON_SPEED);
        screen.update(&mut ctx);
        release(&mut ctx);
        ctx.add_wheel(1);
        screen.update(&mut ctx);
        assert_eq!(sent(&mut ctx).as_str(), "SPEED:1\n");

        tick(&mut ctx, 0, 10001);
        screen.update(&mut ctx);
        assert_eq!(screen.captured(), None);
        ctx.add_wheel(1);
        screen.update(&mut ctx);
        assert_eq!(sent(&mut ctx).as_str(), "");
    }

    #[test]
    fn test_start_once_then_back() {
        let mut ctx = idle_context();
        let mut screen = run_screen(&mut ctx, MachineStatus::Idle);
        hold(&mut ctx, BUTTON_RUN);
        screen.update(&mut ctx);
        assert_eq!(sent(&mut ctx).as_str(), "JOB:START\n");

        release(&mut ctx);
        hold(&mut ctx, BUTTON_RUN);
        screen.update(&mut ctx);
        assert_eq!(sent(&mut ctx).as_str(), "");

        release(&mut ctx);
        press(&mut ctx, BUTTON_BACK);
        assert_eq!(screen.update(&mut ctx), Transition::Close);
    }

    #[test]
    fn test_stopped_job_closes_when_idle() {
        let mut ctx = idle_context();
        let mut screen = run_screen(&mut ctx, MachineStatus::Door0Closed);
        press(&mut ctx, BUTTON_STOP);
        assert_eq!(screen.update(&mut ctx), Transition::Stay);
        assert_eq!(sent(&mut ctx).as_str(), "JOB:STOP\n");

        ctx.machine.status = MachineStatus::Idle;
        tick(&mut ctx, 0, 10);
        assert_eq!(screen.update(&mut ctx), Transition::Close);
    }

    #[test]
    fn test_paused_ready_controls() {
        let mut ctx = idle_context();
        let mut screen = run_screen(&mut ctx, MachineStatus::Hold0Complete);
        press(&mut ctx, BUTTON_RPM0);
        screen.update(&mut ctx);
        assert_eq!(sent(&mut ctx).as_str(), "JOB:RPM0\n");

        release(&mut ctx);
        hold(&mut ctx, BUTTON_RESUME);
        screen.update(&mut ctx);
        assert_eq!(sent(&mut ctx).as_str(), "JOB:RESUME\n");
    }

    #[test]
    fn test_other_state_closes() {
        let mut ctx = idle_context();
        let mut screen = run_screen(&mut ctx, MachineStatus::Home);
        assert_eq!(screen.update(&mut ctx), Transition::Close);
    }

    #[test]
    fn test_captured_feed_shows_real_feed() {
        let mut ctx = idle_context();
        let mut screen = run_screen(&mut ctx, MachineStatus::Running);
        ctx.machine.real_feed = 1200;
        let frame = render(&mut screen, &ctx);
        assert!(!lit(&frame, 49, ROWS[4] - 1, 1, 1));

        press(&mut ctx, BUTTON_FEED);
        screen.update(&mut ctx);
        let frame = render(&mut screen, &ctx);
        assert!(lit(&frame, 49, ROWS[4] - 1, 1, 1));
    }
}
