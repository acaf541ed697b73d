//! Screen state machine
//!
//! Exactly one screen is active. Screens never switch directly; their
//! `update` returns a [`Transition`] and the [`Screens`] dispatcher runs
//! the deactivate/activate pair. There is no history: closing a screen
//! always lands on Welcome, Alarm or Main depending on the link and the
//! machine status.
//!
//! ```text
//!              link down                 alarm
//!   any ─────────────────▶ Welcome   any ───────▶ Alarm
//!
//!   Main ──▶ Jog | ProbeMenu | ZProbe | Macro | Run
//!   ProbeMenu ──▶ ZProbe ──▶ ProbeMenu (TLO enabled)
//!   host ──▶ Dialog | Run | ZProbe | Calibration
//! ```

pub mod alarm;
pub mod calibration;
pub mod dialog;
pub mod draw;
pub mod frame;
pub mod jog;
pub mod macros;
pub mod main_menu;
pub mod probe_menu;
pub mod run;
pub mod welcome;
pub mod zprobe;

use pendant_display::Canvas;
use pendant_protocol::{CalCommand, DialogRequest, MachineStatus, MacroTable};

use crate::context::Context;

pub use alarm::Alarm;
pub use calibration::Calibration;
pub use dialog::Dialog;
pub use frame::FrameTracker;
pub use jog::Jog;
pub use macros::Macros;
pub use main_menu::MainMenu;
pub use probe_menu::ProbeMenu;
pub use run::Run;
pub use welcome::Welcome;
pub use zprobe::{ProbeMode, ZProbe};

/// Screen variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScreenKind {
    Welcome,
    Main,
    Jog,
    Run,
    Macro,
    Calibration,
    ProbeMenu,
    ZProbe,
    Dialog,
    Alarm,
}

/// A screen to activate, with its entry parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScreenRequest {
    Welcome,
    Main,
    /// Jog with an axis selection, X = 1, Y = 2, XY = 3, Z = 4
    Jog { axis: u8 },
    Run,
    Macro,
    Calibration,
    ProbeMenu,
    /// Probe screen; `notify` tells the host which mode was entered
    ZProbe { mode: ProbeMode, notify: bool },
    Dialog,
    Alarm,
}

impl ScreenRequest {
    pub fn kind(self) -> ScreenKind {
        match self {
            ScreenRequest::Welcome => ScreenKind::Welcome,
            ScreenRequest::Main => ScreenKind::Main,
            ScreenRequest::Jog { .. } => ScreenKind::Jog,
            ScreenRequest::Run => ScreenKind::Run,
            ScreenRequest::Macro => ScreenKind::Macro,
            ScreenRequest::Calibration => ScreenKind::Calibration,
            ScreenRequest::ProbeMenu => ScreenKind::ProbeMenu,
            ScreenRequest::ZProbe { .. } => ScreenKind::ZProbe,
            ScreenRequest::Dialog => ScreenKind::Dialog,
            ScreenRequest::Alarm => ScreenKind::Alarm,
        }
    }
}

/// What a screen wants after its update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    Stay,
    Open(ScreenRequest),
    /// Go back to the default screen
    Close,
}

/// Behavior common to all screens
pub trait Screen {
    /// Entering the screen; also runs when it is requested while active
    fn activate(&mut self, _ctx: &mut Context) {}

    /// Another screen is taking over
    fn deactivate(&mut self, _ctx: &mut Context) {}

    /// Interpret input for one tick
    fn update(&mut self, ctx: &mut Context) -> Transition;

    /// Paint the screen; `full` means the canvas was blanked
    fn draw(&mut self, canvas: &mut Canvas<'_>, ctx: &Context, full: bool);
}

/// All screens and the active one
#[derive(Debug, Default)]
pub struct Screens {
    current: Option<ScreenKind>,
    frame: FrameTracker,
    welcome: Welcome,
    main: MainMenu,
    jog: Jog,
    run: Run,
    macros: Macros,
    calibration: Calibration,
    probe_menu: ProbeMenu,
    zprobe: ZProbe,
    dialog: Dialog,
    alarm: Alarm,
}

impl Screens {
    pub fn new() -> Self {
        Self::default()
    }

    /// The active screen, Welcome before the first activation
    pub fn current(&self) -> ScreenKind {
        self.current.unwrap_or(ScreenKind::Welcome)
    }

    fn screen_mut(&mut self, kind: ScreenKind) -> &mut dyn Screen {
        match kind {
            ScreenKind::Welcome => &mut self.welcome,
            ScreenKind::Main => &mut self.main,
            ScreenKind::Jog => &mut self.jog,
            ScreenKind::Run => &mut self.run,
            ScreenKind::Macro => &mut self.macros,
            ScreenKind::Calibration => &mut self.calibration,
            ScreenKind::ProbeMenu => &mut self.probe_menu,
            ScreenKind::ZProbe => &mut self.zprobe,
            ScreenKind::Dialog => &mut self.dialog,
            ScreenKind::Alarm => &mut self.alarm,
        }
    }

    /// Make a screen active
    ///
    /// Returns true if the active screen changed. A real change
    /// deactivates the previous screen, releases all buttons and forces a
    /// full redraw.
    pub fn activate(&mut self, request: ScreenRequest, ctx: &mut Context) -> bool {
        let kind = request.kind();
        let changed = self.current != Some(kind);
        if changed {
            if let Some(previous) = self.current {
                self.screen_mut(previous).deactivate(ctx);
            }
            ctx.buttons.release_all();
            self.frame.invalidate();
            self.current = Some(kind);
        }
        match request {
            ScreenRequest::Jog { axis } => {
                self.jog.activate(ctx);
                self.jog.set_axis(axis);
            }
            ScreenRequest::ZProbe { mode, notify } => {
                self.zprobe.activate(ctx);
                self.zprobe.set_mode(mode, notify, ctx);
            }
            _ => self.screen_mut(kind).activate(ctx),
        }
        changed
    }

    /// Where a closing screen lands
    pub fn default_request(ctx: &Context) -> ScreenRequest {
        if ctx.link_down() {
            ScreenRequest::Welcome
        } else if ctx.machine.status == MachineStatus::Alarm {
            ScreenRequest::Alarm
        } else {
            ScreenRequest::Main
        }
    }

    /// Close `kind` if it is the active screen
    pub fn close(&mut self, kind: ScreenKind, ctx: &mut Context) -> bool {
        if self.current() != kind {
            return false;
        }
        self.activate(Self::default_request(ctx), ctx)
    }

    /// Apply the link and alarm overrides
    ///
    /// Returns true if a screen was forced. The link check comes first, so
    /// a disconnected pendant shows Welcome even while the last reported
    /// status was an alarm. Calibration keeps running without a link.
    pub fn force(&mut self, ctx: &mut Context) -> bool {
        if ctx.link_down() {
            if self.current() == ScreenKind::Calibration {
                return false;
            }
            if self.current != Some(ScreenKind::Welcome) {
                self.activate(ScreenRequest::Welcome, ctx);
            }
            return true;
        }
        if ctx.machine.status == MachineStatus::Alarm {
            if self.current != Some(ScreenKind::Alarm) {
                self.activate(ScreenRequest::Alarm, ctx);
            }
            return true;
        }
        false
    }

    /// Run the active screen's update and follow its transition
    ///
    /// Returns true if the active screen changed.
    pub fn update(&mut self, ctx: &mut Context) -> bool {
        let kind = self.current();
        match self.screen_mut(kind).update(ctx) {
            Transition::Stay => false,
            Transition::Open(request) => self.activate(request, ctx),
            Transition::Close => self.close(kind, ctx),
        }
    }

    /// Start a frame, returns true if the canvas must be redrawn from blank
    pub fn begin_frame(&mut self, ctx: &Context) -> bool {
        self.frame.begin(ctx)
    }

    /// Paint the active screen
    pub fn draw(&mut self, canvas: &mut Canvas<'_>, ctx: &Context, full: bool) {
        let kind = self.current();
        self.screen_mut(kind).draw(canvas, ctx, full);
    }

    /// Handle `CAL:`
    pub fn calibration_command(&mut self, command: CalCommand, ctx: &mut Context) -> bool {
        match command {
            CalCommand::StartCalibration => self.activate(ScreenRequest::Calibration, ctx),
            CalCommand::StopCalibration => self.close(ScreenKind::Calibration, ctx),
            CalCommand::StartJoystick => {
                self.calibration.start_streaming(ctx);
                false
            }
            CalCommand::StopJoystick => {
                self.calibration.stop_streaming();
                self.close(ScreenKind::Calibration, ctx)
            }
            CalCommand::Unknown => false,
        }
    }

    /// Stream raw joystick samples while the host calibrates
    pub fn stream_joystick(&mut self, ctx: &mut Context) {
        if self.calibration.is_streaming() {
            self.calibration.send_raw(ctx, false);
        }
    }

    /// Handle `DIALOG:`
    ///
    /// A dialog still waiting for an answer is answered with 0 before it
    /// is replaced.
    pub fn open_dialog(&mut self, request: DialogRequest, ctx: &mut Context) -> bool {
        let changed = if self.current() == ScreenKind::Dialog {
            self.dialog.cancel(ctx);
            self.frame.invalidate();
            false
        } else {
            self.activate(ScreenRequest::Dialog, ctx)
        };
        self.dialog.load(request);
        changed
    }

    /// Mode of the probe screen, kept while it is inactive
    pub fn probe_mode(&self) -> ProbeMode {
        self.zprobe.mode()
    }

    /// Handle `MACROS:`
    pub fn set_macros(&mut self, table: MacroTable, ctx: &mut Context) {
        ctx.macros = table;
        if self.current() == ScreenKind::Macro {
            self.frame.invalidate();
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_starts_on_welcome() {
        let screens = Screens::new();
        assert_eq!(screens.current(), ScreenKind::Welcome);
    }

    #[test]
    fn test_close_lands_on_default() {
        let mut ctx = idle_context();
        let mut screens = Screens::new();
        screens.activate(ScreenRequest::Macro, &mut ctx);
        assert!(screens.close(ScreenKind::Macro, &mut ctx));
        assert_eq!(screens.current(), ScreenKind::Main);

        // Only the active screen can close itself
        assert!(!screens.close(ScreenKind::Macro, &mut ctx));

        screens.activate(ScreenRequest::Macro, &mut ctx);
        ctx.machine.status = MachineStatus::Alarm;
        screens.close(ScreenKind::Macro, &mut ctx);
        assert_eq!(screens.current(), ScreenKind::Alarm);
    }

    #[test]
    fn test_force_priority() {
        let mut ctx = idle_context();
        let mut screens = Screens::new();
        screens.activate(ScreenRequest::Main, &mut ctx);

        ctx.machine.status = MachineStatus::Alarm;
        ctx.connected = false;
        assert!(screens.force(&mut ctx));
        assert_eq!(screens.current(), ScreenKind::Welcome);

        ctx.connected = true;
        assert!(screens.force(&mut ctx));
        assert_eq!(screens.current(), ScreenKind::Alarm);

        ctx.machine.status = MachineStatus::Idle;
        assert!(!screens.force(&mut ctx));
        assert_eq!(screens.current(), ScreenKind::Alarm);
    }

    #[test]
    fn test_calibration_survives_disconnect() {
        let mut ctx = idle_context();
        let mut screens = Screens::new();
        screens.calibration_command(CalCommand::StartCalibration, &mut ctx);
        assert_eq!(screens.current(), ScreenKind::Calibration);
        ctx.connected = false;
        assert!(!screens.force(&mut ctx));
        assert_eq!(screens.current(), ScreenKind::Calibration);

        screens.calibration_command(CalCommand::StopCalibration, &mut ctx);
        assert_eq!(screens.current(), ScreenKind::Welcome);
    }

    #[test]
    fn test_activation_releases_buttons() {
        let mut ctx = idle_context();
        let mut screens = Screens::new();
        screens.activate(ScreenRequest::Main, &mut ctx);
        press(&mut ctx, 0);
        assert!(ctx.buttons.is_down(0));
        screens.activate(ScreenRequest::Jog { axis: 1 }, &mut ctx);
        assert!(!ctx.buttons.is_down(0));
        // Keeping the button down does not produce a hold on the new screen
        tick(&mut ctx, 1, 1500);
        assert!(!ctx.buttons.held(0));
    }

    #[test]
    fn test_replaced_dialog_is_answered() {
        let mut ctx = idle_context();
        let mut screens = Screens::new();
        screens.activate(ScreenRequest::Main, &mut ctx);
        screens.open_dialog(DialogRequest::parse("5|T|a|b|c|OK,Cancel"), &mut ctx);
        assert_eq!(screens.current(), ScreenKind::Dialog);
        assert_eq!(sent(&mut ctx).as_str(), "");

        screens.open_dialog(DialogRequest::parse("6|T|a|b|c|OK,Cancel"), &mut ctx);
        assert_eq!(sent(&mut ctx).as_str(), "DIALOG:5,0\n");

        screens.activate(ScreenRequest::Main, &mut ctx);
        assert_eq!(sent(&mut ctx).as_str(), "DIALOG:6,0\n");
    }

    #[test]
    fn test_macros_force_redraw() {
        let mut ctx = idle_context();
        let mut screens = Screens::new();
        screens.activate(ScreenRequest::Macro, &mut ctx);
        screens.begin_frame(&ctx);
        assert!(!screens.begin_frame(&ctx));
        screens.set_macros(MacroTable::parse("0|A|||||||"), &mut ctx);
        assert!(screens.begin_frame(&ctx));
        assert_eq!(ctx.macros.names[0].as_str(), "A");
    }
}
